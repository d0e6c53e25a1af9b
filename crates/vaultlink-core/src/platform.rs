//! Browser capabilities injected at the boundary
//!
//! The flows never read ambient globals. The host supplies the current
//! location, a way to navigate the current context, and a way to open a new
//! top-level window.

use std::fmt;
use std::sync::Arc;

use url::Url;

/// Read access to the current browsing context's location
pub trait Location: Send + Sync {
    /// Origin the connect path is resolved against (scheme, host, port)
    fn origin(&self) -> Url;

    /// Path of the current page, used as the redirect flow's return target
    fn pathname(&self) -> String;
}

/// Full navigation of the current browsing context
pub trait Navigator: Send + Sync {
    /// Navigation is terminal for the current page; failures are the
    /// navigator's own concern.
    fn navigate(&self, url: &Url);
}

/// Opens a new top-level browsing context
pub trait WindowOpener: Send + Sync {
    /// Returns `None` when the window could not be opened (e.g. blocked).
    fn open(&self, url: &Url, target: &str, features: &WindowFeatures)
        -> Option<Box<dyn PopupWindow>>;
}

/// Handle to a window spawned by [`WindowOpener::open`]
///
/// Closure is the only thing observed; the window's URL and content are never
/// inspected.
pub trait PopupWindow: Send + Sync {
    fn is_closed(&self) -> bool;
}

/// Window features passed to the opener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowFeatures {
    pub width: u32,
    pub height: u32,
    pub status: bool,
    pub toolbar: bool,
    pub menubar: bool,
}

impl WindowFeatures {
    /// Fixed popup size used by the connect flow
    pub const POPUP: Self = Self {
        width: 800,
        height: 650,
        status: false,
        toolbar: false,
        menubar: false,
    };

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

impl Default for WindowFeatures {
    fn default() -> Self {
        Self::POPUP
    }
}

impl fmt::Display for WindowFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |on: bool| if on { "yes" } else { "no" };
        write!(
            f,
            "width={},height={},status={},toolbar={},menubar={}",
            self.width,
            self.height,
            flag(self.status),
            flag(self.toolbar),
            flag(self.menubar)
        )
    }
}

/// Everything a flow controller needs from the host environment
#[derive(Clone)]
pub struct BrowserContext {
    pub location: Arc<dyn Location>,
    pub navigator: Arc<dyn Navigator>,
    pub opener: Arc<dyn WindowOpener>,
}

impl BrowserContext {
    pub fn new(
        location: Arc<dyn Location>,
        navigator: Arc<dyn Navigator>,
        opener: Arc<dyn WindowOpener>,
    ) -> Self {
        Self {
            location,
            navigator,
            opener,
        }
    }
}

impl fmt::Debug for BrowserContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserContext")
            .field("origin", &self.location.origin().as_str())
            .field("pathname", &self.location.pathname())
            .finish_non_exhaustive()
    }
}

/// Test doubles for the browser capabilities
#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicBool, Ordering};

    use parking_lot::Mutex;

    use super::*;

    pub struct FakeLocation {
        pub origin: Url,
        pub pathname: String,
    }

    impl Location for FakeLocation {
        fn origin(&self) -> Url {
            self.origin.clone()
        }

        fn pathname(&self) -> String {
            self.pathname.clone()
        }
    }

    #[derive(Default)]
    pub struct RecordingNavigator {
        pub visited: Mutex<Vec<Url>>,
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, url: &Url) {
            self.visited.lock().push(url.clone());
        }
    }

    /// Window whose closed flag is flipped by the test
    #[derive(Clone, Default)]
    pub struct FakeWindow {
        closed: Arc<AtomicBool>,
    }

    impl FakeWindow {
        pub fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    impl PopupWindow for FakeWindow {
        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
    }

    /// Opener that records every call and optionally refuses to open
    pub struct FakeOpener {
        pub blocked: AtomicBool,
        pub calls: Mutex<Vec<(Url, String, WindowFeatures)>>,
        pub windows: Mutex<Vec<FakeWindow>>,
    }

    impl FakeOpener {
        pub fn new() -> Self {
            Self {
                blocked: AtomicBool::new(false),
                calls: Mutex::new(Vec::new()),
                windows: Mutex::new(Vec::new()),
            }
        }

        pub fn blocking() -> Self {
            let opener = Self::new();
            opener.blocked.store(true, Ordering::SeqCst);
            opener
        }

        pub fn last_window(&self) -> FakeWindow {
            self.windows.lock().last().cloned().expect("no window opened")
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    impl WindowOpener for FakeOpener {
        fn open(
            &self,
            url: &Url,
            target: &str,
            features: &WindowFeatures,
        ) -> Option<Box<dyn PopupWindow>> {
            self.calls
                .lock()
                .push((url.clone(), target.to_string(), *features));
            if self.blocked.load(Ordering::SeqCst) {
                return None;
            }
            let window = FakeWindow::default();
            self.windows.lock().push(window.clone());
            Some(Box::new(window))
        }
    }

    pub struct Harness {
        pub navigator: Arc<RecordingNavigator>,
        pub opener: Arc<FakeOpener>,
        pub browser: BrowserContext,
    }

    pub fn harness_with(opener: FakeOpener) -> Harness {
        let navigator = Arc::new(RecordingNavigator::default());
        let opener = Arc::new(opener);
        let location = Arc::new(FakeLocation {
            origin: Url::parse("https://app.example.com").expect("valid origin"),
            pathname: "/chat/42".to_string(),
        });
        let browser = BrowserContext::new(location, navigator.clone(), opener.clone());
        Harness {
            navigator,
            opener,
            browser,
        }
    }

    pub fn harness() -> Harness {
        harness_with(FakeOpener::new())
    }
}
