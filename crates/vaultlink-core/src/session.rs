//! Session probe against the web app's profile endpoint

use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ConsentError, Result};

pub const PROFILE_PATH: &str = "/api/user/profile";

/// Logged-in user as reported by the profile endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    #[serde(default)]
    user: Option<UserProfile>,
}

/// Asks the web app whether there is a logged-in session
#[derive(Debug, Clone)]
pub struct SessionProbe {
    client: reqwest::Client,
    origin: Url,
}

impl SessionProbe {
    pub fn new(origin: Url) -> Self {
        Self::with_client(reqwest::Client::new(), origin)
    }

    pub fn with_client(client: reqwest::Client, origin: Url) -> Self {
        Self { client, origin }
    }

    /// Current user, or `None` when there is no session.
    ///
    /// Transport failures are errors; a non-success status is "no session".
    pub async fn profile(&self) -> Result<Option<UserProfile>> {
        let url = self
            .origin
            .join(PROFILE_PATH)
            .map_err(|source| ConsentError::InvalidEndpoint {
                path: PROFILE_PATH.to_string(),
                source,
            })?;

        debug!(url = %url, "Probing session");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Profile endpoint reported no session");
            return Ok(None);
        }

        let body: ProfileResponse = response.json().await?;
        Ok(body.user)
    }
}
