//! Authorization request and flow props

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::prompt::ConnectWidget;

/// Zero-argument continuation (`on_finish` or the backend's `resume`)
pub type Continuation = Arc<dyn Fn() + Send + Sync>;

/// Default connect endpoint shared by both flows
pub const DEFAULT_CONNECT_PATH: &str = "/auth/connect";

/// Default return target for the popup flow; the page there closes itself
pub const DEFAULT_POPUP_RETURN_TO: &str = "/close";

/// What the backend needs the user to authorize
///
/// Immutable for the duration of one flow attempt.
#[derive(Clone)]
pub struct AuthorizationRequest {
    /// Identity provider connection to authorize against
    pub connection: String,
    /// Scopes to request, in order
    pub required_scopes: Vec<String>,
    /// Extra parameters forwarded to the provider's authorization request
    pub authorization_params: BTreeMap<String, String>,
    /// Backend-supplied continuation that re-enters the paused operation
    pub resume: Option<Continuation>,
}

impl AuthorizationRequest {
    pub fn new(connection: impl Into<String>) -> Self {
        Self {
            connection: connection.into(),
            required_scopes: Vec::new(),
            authorization_params: BTreeMap::new(),
            resume: None,
        }
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.authorization_params.insert(key.into(), value.into());
        self
    }

    pub fn with_resume(mut self, resume: Continuation) -> Self {
        self.resume = Some(resume);
        self
    }
}

impl fmt::Debug for AuthorizationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationRequest")
            .field("connection", &self.connection)
            .field("required_scopes", &self.required_scopes)
            .field("authorization_params", &self.authorization_params)
            .field("resume", &self.resume.is_some())
            .finish()
    }
}

/// Overrides for the destination and return target of the authorization hop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthRouting {
    pub connect_path: Option<String>,
    pub return_to: Option<String>,
}

impl AuthRouting {
    pub fn connect_path(&self) -> &str {
        self.connect_path.as_deref().unwrap_or(DEFAULT_CONNECT_PATH)
    }
}

/// Inputs shared by the popup and redirect controllers
#[derive(Clone)]
pub struct ConsentProps {
    pub request: AuthorizationRequest,
    pub auth: AuthRouting,
    /// Caller continuation; takes precedence over `request.resume`
    pub on_finish: Option<Continuation>,
    pub widget: ConnectWidget,
}

impl ConsentProps {
    pub fn new(request: AuthorizationRequest, widget: ConnectWidget) -> Self {
        Self {
            request,
            auth: AuthRouting::default(),
            on_finish: None,
            widget,
        }
    }

    pub fn with_auth(mut self, auth: AuthRouting) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_on_finish(mut self, on_finish: Continuation) -> Self {
        self.on_finish = Some(on_finish);
        self
    }

    /// The single continuation a completed flow invokes, if any
    pub fn continuation(&self) -> Option<Continuation> {
        self.on_finish
            .clone()
            .or_else(|| self.request.resume.clone())
    }
}

impl fmt::Debug for ConsentProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsentProps")
            .field("request", &self.request)
            .field("auth", &self.auth)
            .field("on_finish", &self.on_finish.is_some())
            .field("widget", &self.widget)
            .finish()
    }
}
