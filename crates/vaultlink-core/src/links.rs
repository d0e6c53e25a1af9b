//! Session link helpers for the web app's auth routes

use url::form_urlencoded;
use url::Url;

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const LOGOUT_PATH: &str = "/api/auth/logout";
pub const CONNECT_ACCOUNT_PATH: &str = "/api/auth/connect";

fn with_query(path: &str, pairs: &[(&str, &str)]) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    format!("{path}?{query}")
}

/// Login, returning to `location` afterwards
pub fn login_url(location: &Url) -> String {
    with_query(LOGIN_PATH, &[("returnTo", location.as_str())])
}

/// Login straight into the signup screen
pub fn signup_url() -> String {
    with_query(LOGIN_PATH, &[("screen_hint", "signup")])
}

pub fn logout_url(location: &Url) -> String {
    with_query(LOGOUT_PATH, &[("returnTo", location.as_str())])
}

/// Connect an account outside of an interrupt
pub fn connect_account_url(location: &Url) -> String {
    with_query(CONNECT_ACCOUNT_PATH, &[("returnTo", location.as_str())])
}
