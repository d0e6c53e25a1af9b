//! Connect endpoint URL construction

use url::Url;

use super::request::AuthorizationRequest;
use crate::error::{ConsentError, Result};

/// Build the connect URL for one authorization hop.
///
/// `connect_path` is resolved against `origin`. The query carries
/// `connection`, `returnTo`, every authorization param (a param named
/// `connection` or `returnTo` replaces that entry in place), then one
/// `scopes` entry per required scope in order. Any query already present on
/// `connect_path` is replaced.
pub fn build_authorization_url(
    origin: &Url,
    connect_path: &str,
    return_to: &str,
    request: &AuthorizationRequest,
) -> Result<Url> {
    let mut url = origin
        .join(connect_path)
        .map_err(|source| ConsentError::InvalidConnectPath {
            path: connect_path.to_string(),
            source,
        })?;

    let mut pairs: Vec<(&str, &str)> = vec![
        ("connection", request.connection.as_str()),
        ("returnTo", return_to),
    ];
    for (key, value) in &request.authorization_params {
        match pairs.iter_mut().find(|entry| entry.0 == key.as_str()) {
            Some(entry) => entry.1 = value.as_str(),
            None => pairs.push((key.as_str(), value.as_str())),
        }
    }

    url.set_query(None);
    {
        let mut query = url.query_pairs_mut();
        for (key, value) in pairs {
            query.append_pair(key, value);
        }
        for scope in &request.required_scopes {
            query.append_pair("scopes", scope);
        }
    }

    Ok(url)
}
