//! `vaultlink handle`: route an interrupt and drive its consent flow

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader, Lines, Stdin};
use tokio::sync::Notify;
use url::Url;
use vaultlink_core::{
    ConsentConfig, ConsentFlow, DeviceClass, DeviceClassifier, FlowKind, FlowMode,
    InterruptRouter, InterruptSignal, ModeSelector, PopupOptions, PopupState, TriggerOutcome,
    UserAgentClassifier,
};

use crate::browser::{terminal_context, AppLocation, SystemBrowser};
use crate::return_listener::ReturnListener;

/// Popup wait when `popup_max_wait_secs` is not configured
pub const DEFAULT_POPUP_WAIT: Duration = Duration::from_secs(300);

pub const AFTER_HELP: &str = "\
Popup mode detects completion when the browser returns to a local page
(http://127.0.0.1:<port>/close). The web app must accept that absolute
returnTo. If it only allows relative paths, press Enter once you have
authorized, or the wait ends after popup_max_wait_secs (300 by default).

When the interrupt is read from stdin there is no keyboard left to
confirm with, so the flow starts right away.";

#[derive(Args, Debug)]
pub struct HandleArgs {
    /// Interrupt JSON file, or `-` for stdin
    #[arg(default_value = "-")]
    pub input: PathBuf,

    /// Flow mode (popup, redirect, auto); defaults to the config file
    #[arg(long)]
    pub mode: Option<FlowMode>,

    /// User agent to classify in auto mode
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Start the flow without waiting for Enter
    #[arg(short, long)]
    pub yes: bool,

    /// Print URLs instead of opening the system browser
    #[arg(long)]
    pub no_browser: bool,
}

type Keyboard = Lines<BufReader<Stdin>>;

/// Accepts a runtime interrupt (`{"value": ..., "ns": [...]}`) or a bare value
pub fn parse_signal(raw: &str) -> Result<InterruptSignal> {
    let json: Value = serde_json::from_str(raw).context("Interrupt is not valid JSON")?;
    if json.get("value").is_some() {
        Ok(serde_json::from_value(json).context("Malformed interrupt envelope")?)
    } else {
        Ok(InterruptSignal::new(json))
    }
}

fn reads_stdin(input: &Path) -> bool {
    input.as_os_str() == "-"
}

async fn read_input(input: &Path) -> Result<String> {
    if reads_stdin(input) {
        let mut raw = String::new();
        tokio::io::stdin()
            .read_to_string(&mut raw)
            .await
            .context("Failed to read interrupt from stdin")?;
        Ok(raw)
    } else {
        tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("Failed to read {}", input.display()))
    }
}

/// Stdin for Enter presses, unless `--yes` or the interrupt already drained it
fn keyboard(args: &HandleArgs) -> Option<Keyboard> {
    if args.yes {
        return None;
    }
    if reads_stdin(&args.input) {
        tracing::debug!("Interrupt came from stdin, starting without confirmation");
        return None;
    }
    Some(BufReader::new(tokio::io::stdin()).lines())
}

/// Next line from the keyboard; never resolves without one
async fn next_line(keyboard: &mut Option<Keyboard>) -> Result<Option<String>> {
    match keyboard {
        Some(lines) => Ok(lines.next_line().await?),
        None => std::future::pending().await,
    }
}

fn classifier(args: &HandleArgs, config: &ConsentConfig) -> Arc<dyn DeviceClassifier> {
    match args.user_agent.as_ref().or(config.user_agent.as_ref()) {
        Some(ua) => Arc::new(UserAgentClassifier::new(ua.as_str())),
        // A terminal session is a desktop
        None => Arc::new(DeviceClass::Desktop),
    }
}

/// Mode decision and the resources it needs
struct FlowSetup {
    selector: ModeSelector,
    kind: FlowKind,
    listener: Option<Arc<ReturnListener>>,
}

/// Configured popup options; a terminal never waits without a bound
fn popup_options(config: &ConsentConfig) -> PopupOptions {
    let mut options = config.popup_options();
    options.max_wait.get_or_insert(DEFAULT_POPUP_WAIT);
    options
}

impl FlowSetup {
    fn new(args: &HandleArgs, config: &ConsentConfig) -> Result<Self> {
        let selector = ModeSelector::new(classifier(args, config))
            .with_popup_options(popup_options(config));
        let kind = selector.resolve(args.mode.unwrap_or(config.mode));
        let listener = match kind {
            FlowKind::Popup => Some(Arc::new(ReturnListener::bind()?)),
            FlowKind::Redirect => None,
        };

        Ok(Self {
            selector,
            kind,
            listener,
        })
    }
}

pub async fn execute(args: HandleArgs, config: &ConsentConfig, origin: Url) -> Result<()> {
    let raw = read_input(&args.input).await?;
    let signal = parse_signal(&raw)?;
    let setup = FlowSetup::new(&args, config)?;
    run(&args, config, origin, &signal, setup, keyboard(&args)).await
}

async fn run(
    args: &HandleArgs,
    config: &ConsentConfig,
    origin: Url,
    signal: &InterruptSignal,
    setup: FlowSetup,
    mut keyboard: Option<Keyboard>,
) -> Result<()> {
    let FlowSetup {
        selector,
        kind,
        listener,
    } = setup;

    let mut routing = config.routing();
    if let Some(listener) = &listener {
        if routing.return_to.is_none() {
            routing.return_to = Some(listener.close_url().to_string());
        }
    }

    let browser = terminal_context(
        AppLocation::new(origin, config.page_path.as_str()),
        SystemBrowser::new(!args.no_browser, listener),
    );

    let finished = Arc::new(Notify::new());
    let on_finish = {
        let finished = finished.clone();
        Arc::new(move || finished.notify_one())
    };

    let router = InterruptRouter::new(selector, browser, on_finish)
        .with_mode(FlowMode::from(kind))
        .with_auth(routing);

    let Some(routed) = router.route(Some(signal)) else {
        println!("No authorization interrupt to handle.");
        return Ok(());
    };

    loop {
        println!("\n{}\n", routed.view());
        if keyboard.is_some() {
            println!("Press Enter to continue, Ctrl+C to cancel.");
            if next_line(&mut keyboard).await?.is_none() {
                bail!("Input closed before the flow was started");
            }
        }

        match routed.flow.trigger()? {
            TriggerOutcome::Opened(url) => {
                tracing::debug!(url = %url, "Popup opened");
                break;
            }
            TriggerOutcome::AlreadyOpen => break,
            TriggerOutcome::Navigated(_) => {
                println!("Continue in your browser; the page will return to the app when done.");
                return Ok(());
            }
            TriggerOutcome::Blocked => {
                println!("Could not open a browser window.");
                if keyboard.is_none() {
                    bail!("Popup could not be opened");
                }
            }
        }
    }

    println!("{}", routed.view());
    wait_for_popup(&routed.flow, &finished, &mut keyboard).await
}

async fn wait_for_popup(
    flow: &ConsentFlow,
    finished: &Notify,
    keyboard: &mut Option<Keyboard>,
) -> Result<()> {
    let ConsentFlow::Popup(popup) = flow else {
        return Ok(());
    };
    if keyboard.is_some() {
        println!("Press Enter once you have finished in the browser.");
    }

    let mut check = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = finished.notified() => {
                println!("Authorization complete.");
                return Ok(());
            }
            line = next_line(keyboard) => {
                popup.unmount();
                match line? {
                    Some(_) => {
                        println!("Marked as complete.");
                        return Ok(());
                    }
                    None => bail!("Input closed while waiting for authorization"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                popup.unmount();
                bail!("Cancelled");
            }
            _ = check.tick() => {
                // Idle while polling means the popup was given up on
                if popup.state() == PopupState::Idle {
                    bail!("Gave up waiting for the authorization window");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const INTERRUPT: &str = r#"{
        "name": "AUTH0_AI_INTERRUPT",
        "code": "TOKEN_VAULT_ERROR",
        "message": "Authorization required to access your calendar",
        "connection": "google-oauth2",
        "requiredScopes": ["openid"]
    }"#;

    #[test]
    fn test_parse_bare_value() {
        let signal = parse_signal(INTERRUPT).unwrap();
        assert!(signal.ns.is_none());
        assert!(vaultlink_core::is_authorization_interrupt(&signal.value));
    }

    #[test]
    fn test_parse_envelope() {
        let raw = format!(r#"{{"value": {}, "ns": ["tools:", "42"]}}"#, INTERRUPT);
        let signal = parse_signal(&raw).unwrap();
        assert_eq!(signal.key(), "tools:42");
        assert!(vaultlink_core::is_authorization_interrupt(&signal.value));
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(parse_signal("{not json").is_err());
    }

    #[test]
    fn test_classifier_prefers_flag() {
        let args = HandleArgs {
            input: PathBuf::from("-"),
            mode: None,
            user_agent: Some("Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X)".into()),
            yes: true,
            no_browser: true,
        };
        let config = ConsentConfig::default();
        assert_eq!(classifier(&args, &config).classify(), DeviceClass::Mobile);

        let args = HandleArgs {
            user_agent: None,
            ..args
        };
        assert_eq!(classifier(&args, &config).classify(), DeviceClass::Desktop);
    }

    #[tokio::test]
    async fn test_non_authorization_interrupt_is_noop() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"value": {{"question": "Proceed?"}}}}"#).unwrap();

        let args = HandleArgs {
            input: file.path().to_path_buf(),
            mode: Some(FlowMode::Redirect),
            user_agent: None,
            yes: true,
            no_browser: true,
        };
        let origin = Url::parse("http://localhost:5173").unwrap();
        execute(args, &ConsentConfig::default(), origin).await.unwrap();
    }

    #[tokio::test]
    async fn test_redirect_flow_completes_in_browser() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", INTERRUPT).unwrap();

        let args = HandleArgs {
            input: file.path().to_path_buf(),
            mode: Some(FlowMode::Redirect),
            user_agent: None,
            yes: true,
            no_browser: true,
        };
        let origin = Url::parse("http://localhost:5173").unwrap();
        execute(args, &ConsentConfig::default(), origin).await.unwrap();
    }

    fn origin() -> Url {
        Url::parse("http://localhost:5173").unwrap()
    }

    #[tokio::test]
    async fn test_keyboard_only_when_stdin_is_free() {
        let piped = HandleArgs {
            input: PathBuf::from("-"),
            mode: None,
            user_agent: None,
            yes: false,
            no_browser: true,
        };
        assert!(keyboard(&piped).is_none());

        let confirmed = HandleArgs {
            input: PathBuf::from("interrupt.json"),
            yes: true,
            ..piped
        };
        assert!(keyboard(&confirmed).is_none());

        let interactive = HandleArgs {
            yes: false,
            ..confirmed
        };
        assert!(keyboard(&interactive).is_some());
    }

    #[tokio::test]
    async fn test_piped_interrupt_starts_without_confirmation() {
        let args = HandleArgs {
            input: PathBuf::from("-"),
            mode: Some(FlowMode::Redirect),
            user_agent: None,
            yes: false,
            no_browser: true,
        };
        let config = ConsentConfig::default();
        let setup = FlowSetup::new(&args, &config).unwrap();
        let signal = parse_signal(INTERRUPT).unwrap();

        run(&args, &config, origin(), &signal, setup, keyboard(&args))
            .await
            .unwrap();
    }

    #[test]
    fn test_popup_wait_is_bounded() {
        let options = popup_options(&ConsentConfig::default());
        assert_eq!(options.max_wait, Some(DEFAULT_POPUP_WAIT));

        let config = ConsentConfig {
            popup_max_wait_secs: Some(30),
            ..Default::default()
        };
        assert_eq!(popup_options(&config).max_wait, Some(Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn test_popup_finishes_when_browser_reaches_close_page() {
        let args = HandleArgs {
            input: PathBuf::from("-"),
            mode: Some(FlowMode::Popup),
            user_agent: None,
            yes: true,
            no_browser: true,
        };
        let config = ConsentConfig {
            poll_interval_ms: 20,
            ..Default::default()
        };
        let setup = FlowSetup::new(&args, &config).unwrap();
        let close_url = setup.listener.as_ref().unwrap().close_url().clone();

        // Stands in for the browser landing on the return page
        let returning = tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let _ = reqwest::get(close_url.clone()).await;
            }
        });

        let signal = parse_signal(INTERRUPT).unwrap();
        let result = tokio::time::timeout(
            Duration::from_secs(10),
            run(&args, &config, origin(), &signal, setup, None),
        )
        .await;
        returning.abort();
        result.expect("popup flow did not finish").unwrap();
    }
}
