//! Flow mode selection

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::device::{DeviceClass, DeviceClassifier};
use super::popup::{PopupFlowController, PopupOptions};
use super::prompt::ConsentView;
use super::redirect::RedirectFlowController;
use super::request::ConsentProps;
use super::TriggerOutcome;
use crate::error::Result;
use crate::platform::BrowserContext;

/// How the user is sent to the authorization page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowMode {
    Popup,
    Redirect,
    /// Popup on desktop, redirect on mobile
    #[default]
    Auto,
}

impl fmt::Display for FlowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowMode::Popup => write!(f, "popup"),
            FlowMode::Redirect => write!(f, "redirect"),
            FlowMode::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for FlowMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "popup" => Ok(FlowMode::Popup),
            "redirect" => Ok(FlowMode::Redirect),
            "auto" => Ok(FlowMode::Auto),
            other => Err(format!(
                "unknown flow mode '{other}' (expected popup, redirect or auto)"
            )),
        }
    }
}

/// Which controller is mounted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Popup,
    Redirect,
}

impl From<FlowKind> for FlowMode {
    fn from(kind: FlowKind) -> Self {
        match kind {
            FlowKind::Popup => FlowMode::Popup,
            FlowKind::Redirect => FlowMode::Redirect,
        }
    }
}

/// Exactly one mounted flow controller
pub enum ConsentFlow {
    Popup(PopupFlowController),
    Redirect(RedirectFlowController),
}

impl ConsentFlow {
    pub fn kind(&self) -> FlowKind {
        match self {
            ConsentFlow::Popup(_) => FlowKind::Popup,
            ConsentFlow::Redirect(_) => FlowKind::Redirect,
        }
    }

    pub fn view(&self) -> ConsentView {
        match self {
            ConsentFlow::Popup(popup) => popup.view(),
            ConsentFlow::Redirect(redirect) => redirect.view(),
        }
    }

    pub fn trigger(&self) -> Result<TriggerOutcome> {
        match self {
            ConsentFlow::Popup(popup) => popup.trigger(),
            ConsentFlow::Redirect(redirect) => redirect.trigger(),
        }
    }

    pub fn props(&self) -> &ConsentProps {
        match self {
            ConsentFlow::Popup(popup) => popup.props(),
            ConsentFlow::Redirect(redirect) => redirect.props(),
        }
    }
}

impl fmt::Debug for ConsentFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsentFlow")
            .field("kind", &self.kind())
            .field("props", self.props())
            .finish()
    }
}

/// Mounts the controller for a mode
///
/// `Auto` asks the classifier on every mount; the answer is never cached.
#[derive(Clone)]
pub struct ModeSelector {
    classifier: Arc<dyn DeviceClassifier>,
    popup_options: PopupOptions,
}

impl ModeSelector {
    pub fn new(classifier: Arc<dyn DeviceClassifier>) -> Self {
        Self {
            classifier,
            popup_options: PopupOptions::default(),
        }
    }

    pub fn with_popup_options(mut self, options: PopupOptions) -> Self {
        self.popup_options = options;
        self
    }

    pub fn resolve(&self, mode: FlowMode) -> FlowKind {
        match mode {
            FlowMode::Popup => FlowKind::Popup,
            FlowMode::Redirect => FlowKind::Redirect,
            FlowMode::Auto => match self.classifier.classify() {
                DeviceClass::Desktop => FlowKind::Popup,
                DeviceClass::Mobile => FlowKind::Redirect,
            },
        }
    }

    pub fn mount(&self, mode: FlowMode, props: ConsentProps, browser: BrowserContext) -> ConsentFlow {
        let kind = self.resolve(mode);
        debug!(mode = %mode, kind = ?kind, "Mounting consent flow");
        match kind {
            FlowKind::Popup => ConsentFlow::Popup(PopupFlowController::with_options(
                props,
                browser,
                self.popup_options,
            )),
            FlowKind::Redirect => ConsentFlow::Redirect(RedirectFlowController::new(props, browser)),
        }
    }
}

impl fmt::Debug for ModeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeSelector")
            .field("popup_options", &self.popup_options)
            .finish_non_exhaustive()
    }
}
