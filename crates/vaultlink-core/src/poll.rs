//! Cancellable repeating task
//!
//! Stands in for a completion event the opener never receives: a callback runs
//! on a fixed interval until it breaks or the token is cancelled.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Interval used when watching a popup for closure
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Handle to a spawned repeating task
///
/// Dropping the handle cancels the task.
pub struct RepeatingTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl RepeatingTask {
    /// Run `tick` every `period`, first after one full period.
    ///
    /// The task stops when `tick` returns `Break` or the token is cancelled.
    /// A cancelled token is observed before every tick, so nothing runs after
    /// `cancel` returns on the same thread.
    pub fn spawn<F>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = interval.tick() => {
                        if task_token.is_cancelled() {
                            break;
                        }
                        if tick().is_break() {
                            task_token.cancel();
                            break;
                        }
                    }
                }
            }
        });

        Self { token, handle }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RepeatingTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
