//! `vaultlink url`: print the connect URL for a request

use anyhow::{bail, Result};
use clap::Args;
use url::Url;
use vaultlink_core::consent::build_authorization_url;
use vaultlink_core::consent::request::DEFAULT_POPUP_RETURN_TO;
use vaultlink_core::{AuthorizationRequest, ConsentConfig};

#[derive(Args, Debug)]
pub struct UrlArgs {
    /// Connection to authorize against (e.g. google-oauth2)
    pub connection: String,

    /// Scope to request; repeat for more, order is kept
    #[arg(short, long = "scope")]
    pub scopes: Vec<String>,

    /// Extra authorization parameter as key=value; repeatable
    #[arg(short, long = "param", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// Build the redirect-flow URL (returns to the page path)
    #[arg(long)]
    pub redirect: bool,

    /// Override the return target
    #[arg(long)]
    pub return_to: Option<String>,
}

pub fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}

pub fn build(args: &UrlArgs, config: &ConsentConfig, origin: &Url) -> Result<Url> {
    if args.connection.is_empty() {
        bail!("Connection must not be empty");
    }

    let mut request =
        AuthorizationRequest::new(args.connection.as_str()).with_scopes(args.scopes.iter().cloned());
    for (key, value) in &args.params {
        request = request.with_param(key.as_str(), value.as_str());
    }

    let routing = config.routing();
    let return_to = match (&args.return_to, &routing.return_to) {
        (Some(explicit), _) => explicit.clone(),
        (None, Some(configured)) => configured.clone(),
        (None, None) if args.redirect => config.page_path.clone(),
        (None, None) => DEFAULT_POPUP_RETURN_TO.to_string(),
    };

    Ok(build_authorization_url(
        origin,
        routing.connect_path(),
        &return_to,
        &request,
    )?)
}

pub fn execute(args: UrlArgs, config: &ConsentConfig, origin: &Url) -> Result<()> {
    let url = build(&args, config, origin)?;
    println!("{}", url);
    Ok(())
}
