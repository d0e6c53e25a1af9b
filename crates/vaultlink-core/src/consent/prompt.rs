//! Prompt card shown before the user starts a flow

use std::fmt;

/// Label used when the caller does not supply one
pub const DEFAULT_ACTION_LABEL: &str = "Connect";

/// Caller-supplied presentation data for the connect card
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectWidget {
    pub icon: Option<String>,
    pub title: String,
    pub description: String,
    pub action_label: Option<String>,
}

impl ConnectWidget {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_action_label(mut self, label: impl Into<String>) -> Self {
        self.action_label = Some(label.into());
        self
    }
}

/// Rendered prompt; the action triggers the owning controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptView {
    pub icon: Option<String>,
    pub title: String,
    pub description: String,
    pub action_label: String,
}

impl PromptView {
    pub fn present(widget: &ConnectWidget) -> Self {
        Self {
            icon: widget.icon.clone(),
            title: widget.title.clone(),
            description: widget.description.clone(),
            action_label: widget
                .action_label
                .clone()
                .unwrap_or_else(|| DEFAULT_ACTION_LABEL.to_string()),
        }
    }
}

impl fmt::Display for PromptView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.icon {
            Some(icon) => writeln!(f, "{} {}", icon, self.title)?,
            None => writeln!(f, "{}", self.title)?,
        }
        for line in self.description.lines() {
            writeln!(f, "  {}", line)?;
        }
        write!(f, "[ {} ]", self.action_label)
    }
}

/// What a flow controller currently renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsentView {
    Prompt(PromptView),
    /// A popup is open and being watched
    Waiting,
}

impl fmt::Display for ConsentView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsentView::Prompt(prompt) => prompt.fmt(f),
            ConsentView::Waiting => write!(f, "Waiting for authorization to complete..."),
        }
    }
}
