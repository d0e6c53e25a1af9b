//! vaultlink core
//!
//! Bridges an agent's "authorization required" interrupt to a finished
//! connect-account flow and back to a resume signal.
//!
//! - `interrupt`: recognize token vault interrupts and mount a flow for them
//! - `consent`: prompt card, popup and redirect controllers, mode selection
//! - `platform`: browser capabilities injected by the host
//! - `poll`: cancellable repeating task used to watch popups
//! - `config`, `links`, `session`: configuration and web app helpers

pub mod config;
pub mod consent;
pub mod error;
pub mod interrupt;
pub mod links;
pub mod platform;
pub mod poll;
pub mod session;

pub use config::ConsentConfig;
pub use consent::{
    AuthRouting, AuthorizationRequest, ConnectWidget, ConsentFlow, ConsentProps, ConsentView,
    Continuation, DeviceClass, DeviceClassifier, FlowKind, FlowMode, ModeSelector,
    PopupFlowController, PopupOptions, PopupState, PromptView, RedirectFlowController,
    TriggerOutcome, UserAgentClassifier,
};
pub use error::{ConsentError, Result};
pub use interrupt::{is_authorization_interrupt, InterruptRouter, InterruptSignal, RoutedConsent};
pub use platform::{BrowserContext, Location, Navigator, PopupWindow, WindowFeatures, WindowOpener};
pub use session::{SessionProbe, UserProfile};
