//! Local return page for the popup flow
//!
//! A terminal has no window handle to watch. Instead the popup's `returnTo`
//! points here, and a hit on `/close` counts as the window closing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};
use tiny_http::{Header, Response, Server};
use url::Url;
use vaultlink_core::PopupWindow;

pub const CLOSE_PATH: &str = "/close";

const CLOSE_PAGE: &str = "<!doctype html><html><body>\
<p>Authorization finished. You can close this window and return to the terminal.</p>\
<script>window.close()</script></body></html>";

pub struct ReturnListener {
    server: Arc<Server>,
    close_url: Url,
    closed: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ReturnListener {
    /// Bind on an ephemeral loopback port
    pub fn bind() -> Result<Self> {
        let server = Server::http("127.0.0.1:0")
            .map_err(|e| anyhow!("Failed to bind return listener: {}", e))?;
        let addr = server
            .server_addr()
            .to_ip()
            .context("Return listener has no IP address")?;
        let close_url = Url::parse(&format!("http://{}{}", addr, CLOSE_PATH))?;

        let server = Arc::new(server);
        let closed = Arc::new(AtomicBool::new(false));
        let thread = {
            let server = server.clone();
            let closed = closed.clone();
            thread::spawn(move || serve(&server, &closed))
        };

        tracing::debug!(url = %close_url, "Return listener started");
        Ok(Self {
            server,
            close_url,
            closed,
            thread: Some(thread),
        })
    }

    pub fn close_url(&self) -> &Url {
        &self.close_url
    }

    /// Handle for a freshly opened popup
    pub fn window(&self) -> ListenerWindow {
        self.closed.store(false, Ordering::SeqCst);
        ListenerWindow {
            closed: self.closed.clone(),
        }
    }
}

impl Drop for ReturnListener {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn serve(server: &Server, closed: &AtomicBool) {
    for request in server.incoming_requests() {
        let path = request.url().split('?').next().unwrap_or_default();
        let response = if path == CLOSE_PATH {
            closed.store(true, Ordering::SeqCst);
            tracing::info!("Authorization returned to the local close page");
            let page = Response::from_string(CLOSE_PAGE);
            match Header::from_bytes("Content-Type", "text/html; charset=utf-8") {
                Ok(header) => page.with_header(header),
                Err(()) => page,
            }
        } else {
            Response::from_string("Not found").with_status_code(404)
        };
        if let Err(e) = request.respond(response) {
            tracing::warn!(error = %e, "Failed to answer return request");
        }
    }
}

/// Closed once the browser lands on the close page
pub struct ListenerWindow {
    closed: Arc<AtomicBool>,
}

impl PopupWindow for ListenerWindow {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
