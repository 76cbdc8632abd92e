//! Lockout countdown. One timer per login form; starting a new countdown
//! cancels the previous one, and dropping the timer aborts its task so no
//! update lands after the owning view is gone.

use std::sync::Arc;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{Duration, Instant, interval_at},
};
use tracing::debug;

/// Wait applied when the server locks the account without saying for how long.
pub const DEFAULT_LOCKOUT_SECS: u64 = 60;
const TICK: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct LockoutTimer {
    remaining: Arc<watch::Sender<u64>>,
    task: Option<JoinHandle<()>>,
}

impl Default for LockoutTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl LockoutTimer {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(0);
        Self {
            remaining: Arc::new(sender),
            task: None,
        }
    }

    /// Starts a countdown of `seconds`, replacing any running one.
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, seconds: u64) {
        self.abort_task();
        self.remaining.send_replace(seconds);
        if seconds == 0 {
            return;
        }

        debug!(seconds, "lockout countdown started");
        let remaining = Arc::clone(&self.remaining);
        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + TICK, TICK);
            loop {
                ticker.tick().await;
                let mut left = 0;
                remaining.send_modify(|value| {
                    *value = value.saturating_sub(1);
                    left = *value;
                });
                if left == 0 {
                    debug!("lockout countdown finished");
                    break;
                }
            }
        }));
    }

    /// Stops the countdown and re-enables submission immediately.
    pub fn cancel(&mut self) {
        self.abort_task();
        self.remaining.send_replace(0);
    }

    #[must_use]
    pub fn remaining(&self) -> u64 {
        *self.remaining.borrow()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.remaining() > 0
    }

    /// Receiver notified on every tick.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.remaining.subscribe()
    }

    /// Resolves once the countdown reaches zero.
    pub async fn finished(&self) {
        let mut receiver = self.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here.
        let _ = receiver.wait_for(|left| *left == 0).await;
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for LockoutTimer {
    fn drop(&mut self) {
        self.abort_task();
    }
}
