//! Popup consent flow
//!
//! Opens the connect endpoint in a new window and watches it until the user
//! closes it (or the return page closes itself). Closure is the only
//! completion signal: the spawned window is a separate browsing context that
//! never reports back to the opener.
//!
//! State machine:
//! - `Idle` --trigger--> `Opening` (blocked popup falls back to `Idle`)
//! - `Opening` --window obtained--> `Polling`
//! - `Polling` --window closed--> `Done`, continuation fires once
//! - `Done` behaves like `Idle` for the next trigger

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use url::Url;

use super::connect_url::build_authorization_url;
use super::prompt::{ConsentView, PromptView};
use super::request::{ConsentProps, DEFAULT_POPUP_RETURN_TO};
use super::TriggerOutcome;
use crate::error::{ConsentError, Result};
use crate::platform::{BrowserContext, PopupWindow, WindowFeatures};
use crate::poll::{RepeatingTask, DEFAULT_POLL_INTERVAL};

/// Window target for the popup: always a new top-level context
pub const POPUP_TARGET: &str = "_blank";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupState {
    Idle,
    Opening,
    Polling,
    Done,
}

/// Tunables for the popup flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupOptions {
    pub features: WindowFeatures,
    pub poll_interval: Duration,
    /// Give up on a window that stays open this long. `None` polls forever.
    pub max_wait: Option<Duration>,
}

impl Default for PopupOptions {
    fn default() -> Self {
        Self {
            features: WindowFeatures::POPUP,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: None,
        }
    }
}

/// One open popup and the task watching it
struct PopupSession {
    window: Box<dyn PopupWindow>,
    poller: RepeatingTask,
}

struct PopupInner {
    state: PopupState,
    session: Option<PopupSession>,
}

/// Drives the popup flow for one consent prompt
///
/// The window handle is owned here and never handed out. Dropping the
/// controller unmounts it.
pub struct PopupFlowController {
    props: ConsentProps,
    browser: BrowserContext,
    options: PopupOptions,
    inner: Arc<Mutex<PopupInner>>,
}

impl PopupFlowController {
    pub fn new(props: ConsentProps, browser: BrowserContext) -> Self {
        Self::with_options(props, browser, PopupOptions::default())
    }

    pub fn with_options(props: ConsentProps, browser: BrowserContext, options: PopupOptions) -> Self {
        Self {
            props,
            browser,
            options,
            inner: Arc::new(Mutex::new(PopupInner {
                state: PopupState::Idle,
                session: None,
            })),
        }
    }

    pub fn state(&self) -> PopupState {
        self.inner.lock().state
    }

    pub fn props(&self) -> &ConsentProps {
        &self.props
    }

    /// Connect URL with popup defaults (`/auth/connect`, `/close`)
    pub fn authorization_url(&self) -> Result<Url> {
        let return_to = self
            .props
            .auth
            .return_to
            .as_deref()
            .unwrap_or(DEFAULT_POPUP_RETURN_TO);
        build_authorization_url(
            &self.browser.location.origin(),
            self.props.auth.connect_path(),
            return_to,
            &self.props.request,
        )
    }

    pub fn view(&self) -> ConsentView {
        match self.state() {
            PopupState::Opening | PopupState::Polling => ConsentView::Waiting,
            PopupState::Idle | PopupState::Done => {
                ConsentView::Prompt(PromptView::present(&self.props.widget))
            }
        }
    }

    /// Open the popup and start watching it.
    ///
    /// Outside a tokio runtime nothing is opened and `NoRuntime` is returned.
    /// A trigger while a popup is already open is ignored.
    pub fn trigger(&self) -> Result<TriggerOutcome> {
        let mut inner = self.inner.lock();
        if matches!(inner.state, PopupState::Opening | PopupState::Polling) {
            debug!(
                connection = %self.props.request.connection,
                "Popup already open, ignoring trigger"
            );
            return Ok(TriggerOutcome::AlreadyOpen);
        }
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(ConsentError::NoRuntime);
        }

        let url = self.authorization_url()?;
        inner.state = PopupState::Opening;
        debug!(url = %url, "Opening authorization popup");

        let Some(window) =
            self.browser
                .opener
                .open(&url, POPUP_TARGET, &self.options.features)
        else {
            error!(
                connection = %self.props.request.connection,
                "Popup blocked by the browser"
            );
            inner.state = PopupState::Idle;
            return Ok(TriggerOutcome::Blocked);
        };

        let poller = self.spawn_poller();
        inner.session = Some(PopupSession { window, poller });
        inner.state = PopupState::Polling;
        info!(
            connection = %self.props.request.connection,
            "Authorization popup opened"
        );

        Ok(TriggerOutcome::Opened(url))
    }

    /// Stop watching the popup. No continuation fires afterwards.
    pub fn unmount(&self) {
        let mut inner = self.inner.lock();
        if let Some(session) = inner.session.take() {
            session.poller.cancel();
            debug!(
                connection = %self.props.request.connection,
                "Popup controller unmounted while polling"
            );
        }
        inner.state = PopupState::Idle;
    }

    fn spawn_poller(&self) -> RepeatingTask {
        let inner = Arc::downgrade(&self.inner);
        let props = self.props.clone();
        let max_wait = self.options.max_wait;
        let started = Instant::now();

        RepeatingTask::spawn(self.options.poll_interval, move || {
            let Some(inner) = inner.upgrade() else {
                return ControlFlow::Break(());
            };
            match poll_window(&inner, started, max_wait, &props.request.connection) {
                PollOutcome::Waiting => ControlFlow::Continue(()),
                PollOutcome::Stopped => ControlFlow::Break(()),
                PollOutcome::Closed => {
                    deliver_completion(&inner, &props);
                    ControlFlow::Break(())
                }
            }
        })
    }
}

/// Result of one look at the popup window
#[derive(Debug, PartialEq, Eq)]
enum PollOutcome {
    Waiting,
    Stopped,
    Closed,
}

/// Check the window under the lock; a closed window moves the flow to `Done`
fn poll_window(
    inner: &Mutex<PopupInner>,
    started: Instant,
    max_wait: Option<Duration>,
    connection: &str,
) -> PollOutcome {
    let mut inner = inner.lock();
    let Some(session) = inner.session.as_ref() else {
        return PollOutcome::Stopped;
    };
    if session.poller.is_cancelled() {
        return PollOutcome::Stopped;
    }

    if !session.window.is_closed() {
        return match max_wait {
            Some(limit) if started.elapsed() >= limit => {
                session.poller.cancel();
                inner.session = None;
                inner.state = PopupState::Idle;
                warn!(
                    connection,
                    waited_secs = limit.as_secs(),
                    "Gave up waiting for authorization popup"
                );
                PollOutcome::Stopped
            }
            _ => PollOutcome::Waiting,
        };
    }

    session.poller.cancel();
    inner.session = None;
    inner.state = PopupState::Done;
    PollOutcome::Closed
}

/// Invoke the continuation for a closed popup.
///
/// Runs without the lock held so the continuation may re-enter the controller.
/// An `unmount` that landed after the close was seen suppresses it.
fn deliver_completion(inner: &Mutex<PopupInner>, props: &ConsentProps) {
    let connection = &props.request.connection;
    if inner.lock().state != PopupState::Done {
        debug!(connection = %connection, "Popup unmounted before completion was delivered");
        return;
    }

    info!(connection = %connection, "Authorization popup closed");
    match props.continuation() {
        Some(continuation) => continuation(),
        None => debug!("No continuation to invoke after popup closed"),
    }
}

impl Drop for PopupFlowController {
    fn drop(&mut self) {
        self.unmount();
    }
}
