//! Error types for the consent core

use thiserror::Error;

/// Errors raised while preparing or probing an authorization flow.
///
/// None of these are fatal to the host: a failed trigger leaves the prompt in
/// place so the user can retry.
#[derive(Error, Debug)]
pub enum ConsentError {
    #[error("invalid origin '{origin}': {source}")]
    InvalidOrigin {
        origin: String,
        #[source]
        source: url::ParseError,
    },

    #[error("connect path '{path}' cannot be resolved against the current origin: {source}")]
    InvalidConnectPath {
        path: String,
        #[source]
        source: url::ParseError,
    },

    #[error("endpoint '{path}' cannot be resolved against the origin: {source}")]
    InvalidEndpoint {
        path: String,
        #[source]
        source: url::ParseError,
    },

    #[error("popup trigger needs a running tokio runtime to watch the window")]
    NoRuntime,

    #[error("failed to parse config: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("session probe failed: {0}")]
    Session(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ConsentError>;
