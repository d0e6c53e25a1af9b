//! Browser capabilities for a terminal host
//!
//! Both flows hand the URL to the system browser. The popup flow's window
//! handle is backed by the local return listener.

use std::sync::Arc;

use url::Url;
use vaultlink_core::{
    BrowserContext, Location, Navigator, PopupWindow, WindowFeatures, WindowOpener,
};

use crate::return_listener::ReturnListener;

/// The web app page the terminal stands in for
pub struct AppLocation {
    origin: Url,
    pathname: String,
}

impl AppLocation {
    pub fn new(origin: Url, pathname: impl Into<String>) -> Self {
        Self {
            origin,
            pathname: pathname.into(),
        }
    }
}

impl Location for AppLocation {
    fn origin(&self) -> Url {
        self.origin.clone()
    }

    fn pathname(&self) -> String {
        self.pathname.clone()
    }
}

/// Opens URLs in the system browser, or prints them when disabled
pub struct SystemBrowser {
    open_browser: bool,
    listener: Option<Arc<ReturnListener>>,
}

impl SystemBrowser {
    pub fn new(open_browser: bool, listener: Option<Arc<ReturnListener>>) -> Self {
        Self {
            open_browser,
            listener,
        }
    }

    /// Returns false when the URL could not be handed to a browser
    fn show(&self, url: &Url) -> bool {
        if !self.open_browser {
            println!("Open this URL in your browser:\n  {}", url);
            return true;
        }
        match webbrowser::open(url.as_str()) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to open system browser");
                false
            }
        }
    }
}

impl Navigator for SystemBrowser {
    fn navigate(&self, url: &Url) {
        self.show(url);
    }
}

impl WindowOpener for SystemBrowser {
    fn open(
        &self,
        url: &Url,
        target: &str,
        features: &WindowFeatures,
    ) -> Option<Box<dyn PopupWindow>> {
        tracing::debug!(
            window_target = target,
            features = %features,
            "Opening popup in system browser"
        );
        let Some(listener) = &self.listener else {
            tracing::warn!("No return listener, cannot watch a popup");
            return None;
        };
        let window = listener.window();
        if !self.show(url) {
            return None;
        }
        Some(Box::new(window))
    }
}

pub fn terminal_context(location: AppLocation, browser: SystemBrowser) -> BrowserContext {
    let browser = Arc::new(browser);
    BrowserContext::new(Arc::new(location), browser.clone(), browser)
}
