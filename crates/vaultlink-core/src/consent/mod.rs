//! Connect-account consent flows
//!
//! - Prompt card shared by both flows
//! - Popup flow: open a window, poll for closure, run the continuation
//! - Redirect flow: navigate the current context away
//! - Mode selection, optionally by device class

pub mod connect_url;
pub mod device;
pub mod mode;
pub mod popup;
pub mod prompt;
pub mod redirect;
pub mod request;

use url::Url;

pub use connect_url::build_authorization_url;
pub use device::{classify_user_agent, DeviceClass, DeviceClassifier, UserAgentClassifier};
pub use mode::{ConsentFlow, FlowKind, FlowMode, ModeSelector};
pub use popup::{PopupFlowController, PopupOptions, PopupState};
pub use prompt::{ConnectWidget, ConsentView, PromptView};
pub use redirect::RedirectFlowController;
pub use request::{AuthRouting, AuthorizationRequest, ConsentProps, Continuation};

/// Result of the prompt's action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A popup was opened on this URL and is being watched
    Opened(Url),
    /// The opener returned no window; the prompt stays up for a retry
    Blocked,
    /// A popup from an earlier trigger is still open
    AlreadyOpen,
    /// The current context was sent to this URL
    Navigated(Url),
}
