//! Redirect consent flow
//!
//! Navigates the current browsing context to the connect endpoint. Completion
//! is only observed after the browser comes back to the return path, so there
//! is nothing to poll and no continuation to run here.

use tracing::info;
use url::Url;

use super::connect_url::build_authorization_url;
use super::prompt::{ConsentView, PromptView};
use super::request::ConsentProps;
use super::TriggerOutcome;
use crate::error::Result;
use crate::platform::BrowserContext;

pub struct RedirectFlowController {
    props: ConsentProps,
    browser: BrowserContext,
}

impl RedirectFlowController {
    pub fn new(props: ConsentProps, browser: BrowserContext) -> Self {
        Self { props, browser }
    }

    pub fn props(&self) -> &ConsentProps {
        &self.props
    }

    /// Connect URL returning to the current page unless overridden
    pub fn authorization_url(&self) -> Result<Url> {
        let return_to = match &self.props.auth.return_to {
            Some(return_to) => return_to.clone(),
            None => self.browser.location.pathname(),
        };
        build_authorization_url(
            &self.browser.location.origin(),
            self.props.auth.connect_path(),
            &return_to,
            &self.props.request,
        )
    }

    pub fn view(&self) -> ConsentView {
        ConsentView::Prompt(PromptView::present(&self.props.widget))
    }

    /// Navigate away to the connect endpoint.
    pub fn trigger(&self) -> Result<TriggerOutcome> {
        let url = self.authorization_url()?;
        info!(
            connection = %self.props.request.connection,
            url = %url,
            "Redirecting to authorization page"
        );
        self.browser.navigator.navigate(&url);
        Ok(TriggerOutcome::Navigated(url))
    }
}
