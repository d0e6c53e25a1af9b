//! Routes backend interrupts to a consent flow

use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::token_vault::TokenVaultInterrupt;
use crate::consent::mode::{ConsentFlow, FlowMode, ModeSelector};
use crate::consent::prompt::{ConnectWidget, ConsentView};
use crate::consent::request::{AuthRouting, ConsentProps, Continuation};
use crate::platform::BrowserContext;

/// Title of the card shown for every routed interrupt
pub const INTERRUPT_TITLE: &str = "Authorization Required.";

/// Action label of the card shown for every routed interrupt
pub const INTERRUPT_ACTION_LABEL: &str = "Authorize";

/// An interrupt as delivered by the agent runtime
///
/// `value` is opaque until recognized. `resume` is attached by the host and
/// never part of the wire payload.
#[derive(Clone, Default, Deserialize)]
pub struct InterruptSignal {
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub ns: Option<Vec<String>>,
    #[serde(skip)]
    pub resume: Option<Continuation>,
}

impl InterruptSignal {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            ns: None,
            resume: None,
        }
    }

    pub fn with_ns<I, S>(mut self, ns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ns = Some(ns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_resume(mut self, resume: Continuation) -> Self {
        self.resume = Some(resume);
        self
    }

    /// Render key: namespace segments joined with no separator
    pub fn key(&self) -> String {
        self.ns.as_deref().map(|ns| ns.concat()).unwrap_or_default()
    }
}

impl fmt::Debug for InterruptSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterruptSignal")
            .field("value", &self.value)
            .field("ns", &self.ns)
            .field("resume", &self.resume.is_some())
            .finish()
    }
}

/// A recognized interrupt with its mounted flow
#[derive(Debug)]
pub struct RoutedConsent {
    pub key: String,
    pub message: String,
    pub flow: ConsentFlow,
}

impl RoutedConsent {
    pub fn view(&self) -> ConsentView {
        self.flow.view()
    }
}

/// Turns interrupts into mounted consent flows
pub struct InterruptRouter {
    selector: ModeSelector,
    browser: BrowserContext,
    mode: FlowMode,
    on_finish: Continuation,
    auth: AuthRouting,
}

impl InterruptRouter {
    /// Routes through the popup flow by default.
    pub fn new(selector: ModeSelector, browser: BrowserContext, on_finish: Continuation) -> Self {
        Self {
            selector,
            browser,
            mode: FlowMode::Popup,
            on_finish,
            auth: AuthRouting::default(),
        }
    }

    pub fn with_mode(mut self, mode: FlowMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_auth(mut self, auth: AuthRouting) -> Self {
        self.auth = auth;
        self
    }

    /// Mount a flow for `signal`, or nothing when it is absent or is not an
    /// authorization interrupt.
    pub fn route(&self, signal: Option<&InterruptSignal>) -> Option<RoutedConsent> {
        let signal = signal?;
        let Some(interrupt) = TokenVaultInterrupt::from_value(&signal.value) else {
            debug!("Ignoring interrupt that is not an authorization request");
            return None;
        };

        let message = interrupt.message.clone();
        let mut request = interrupt.into_request();
        request.resume = signal.resume.clone();

        let widget = ConnectWidget::new(INTERRUPT_TITLE, message.clone())
            .with_action_label(INTERRUPT_ACTION_LABEL);
        let props = ConsentProps::new(request, widget)
            .with_auth(self.auth.clone())
            .with_on_finish(self.on_finish.clone());

        debug!(
            connection = %props.request.connection,
            scopes = ?props.request.required_scopes,
            "Routing authorization interrupt"
        );

        Some(RoutedConsent {
            key: signal.key(),
            message,
            flow: self.selector.mount(self.mode, props, self.browser.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::consent::device::DeviceClass;
    use crate::consent::mode::FlowKind;
    use crate::consent::TriggerOutcome;
    use crate::platform::testing::harness;

    fn payload() -> Value {
        json!({
            "name": "AUTH0_AI_INTERRUPT",
            "code": "TOKEN_VAULT_ERROR",
            "message": "Authorization required to access your calendar",
            "connection": "c",
            "requiredScopes": ["a", "b"],
            "authorizationParams": { "foo": "bar" }
        })
    }

    fn counter() -> (Arc<AtomicUsize>, Continuation) {
        let count = Arc::new(AtomicUsize::new(0));
        let hits = count.clone();
        (
            count,
            Arc::new(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    fn router(browser: BrowserContext, on_finish: Continuation) -> InterruptRouter {
        InterruptRouter::new(
            ModeSelector::new(Arc::new(DeviceClass::Desktop)),
            browser,
            on_finish,
        )
    }

    #[test]
    fn test_absent_signal_routes_nothing() {
        let h = harness();
        let (_, on_finish) = counter();
        assert!(router(h.browser.clone(), on_finish).route(None).is_none());
    }

    #[test]
    fn test_unrecognized_signals_route_nothing() {
        let h = harness();
        let (_, on_finish) = counter();
        let router = router(h.browser.clone(), on_finish);

        let signals = [
            InterruptSignal::default(),
            InterruptSignal::new(json!({ "question": "Approve the transfer?" })),
            InterruptSignal::new(json!("plain string")),
            InterruptSignal::new(json!({ "name": "AUTH0_AI_INTERRUPT", "code": "TOKEN_VAULT_ERROR" })),
        ];
        for signal in &signals {
            assert!(router.route(Some(signal)).is_none(), "{signal:?}");
        }
        assert_eq!(h.opener.call_count(), 0);
    }

    #[test]
    fn test_routes_with_interrupt_widget() {
        let h = harness();
        let (_, on_finish) = counter();
        let signal = InterruptSignal::new(payload()).with_ns(["agent:", "tools:1"]);

        let routed = router(h.browser.clone(), on_finish)
            .route(Some(&signal))
            .unwrap();

        assert_eq!(routed.key, "agent:tools:1");
        assert_eq!(routed.message, "Authorization required to access your calendar");
        assert_eq!(routed.flow.kind(), FlowKind::Popup);
        match routed.view() {
            ConsentView::Prompt(prompt) => {
                assert_eq!(prompt.title, "Authorization Required.");
                assert_eq!(prompt.description, routed.message);
                assert_eq!(prompt.action_label, "Authorize");
            }
            other => panic!("unexpected view: {other:?}"),
        }

        let request = &routed.flow.props().request;
        assert_eq!(request.connection, "c");
        assert_eq!(request.required_scopes, vec!["a", "b"]);
        assert_eq!(request.authorization_params["foo"], "bar");
    }

    #[test]
    fn test_mode_and_auth_overrides() {
        let h = harness();
        let (_, on_finish) = counter();
        let router = router(h.browser.clone(), on_finish)
            .with_mode(FlowMode::Redirect)
            .with_auth(AuthRouting {
                connect_path: Some("/connect".to_string()),
                return_to: None,
            });

        let routed = router
            .route(Some(&InterruptSignal::new(payload())))
            .unwrap();
        let TriggerOutcome::Navigated(url) = routed.flow.trigger().unwrap() else {
            panic!("redirect flow should navigate");
        };
        assert_eq!(url.path(), "/connect");
        assert!(url.query().unwrap().contains("returnTo=%2Fchat%2F42"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_finish_wins_over_resume() {
        let h = harness();
        let (finish_count, on_finish) = counter();
        let (resume_count, resume) = counter();
        let signal = InterruptSignal::new(payload()).with_resume(resume);

        let routed = router(h.browser.clone(), on_finish)
            .route(Some(&signal))
            .unwrap();
        assert!(routed.flow.props().request.resume.is_some());

        let outcome = routed.flow.trigger().unwrap();
        let TriggerOutcome::Opened(url) = outcome else {
            panic!("popup should open");
        };
        let query = url.query().unwrap();
        assert!(query.starts_with("connection=c&returnTo=%2Fclose&foo=bar"));
        assert!(query.ends_with("scopes=a&scopes=b"));

        h.opener.last_window().close();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(finish_count.load(Ordering::SeqCst), 1);
        assert_eq!(resume_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_signal_deserializes_from_runtime_json() {
        let raw = r#"{
            "value": {
                "name": "AUTH0_AI_INTERRUPT",
                "code": "TOKEN_VAULT_ERROR",
                "message": "m",
                "connection": "github",
                "requiredScopes": ["repo"]
            },
            "ns": ["tools:abc"],
            "when": "during",
            "resumable": true
        }"#;
        let signal: InterruptSignal = serde_json::from_str(raw).unwrap();
        assert_eq!(signal.key(), "tools:abc");
        assert!(signal.resume.is_none());
        assert!(crate::interrupt::is_authorization_interrupt(&signal.value));
    }
}
