//! Proactive Renewal Timer
//!
//! One-shot cancellable timer used to refresh the access token shortly
//! before it expires. At most one timer is pending at a time: arming the
//! timer cancels any previous one, so a refreshed session can never leave
//! two renewals racing.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

struct PendingTimer {
    id: u64,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// A one-shot cancellable timer.
///
/// # Example
///
/// ```no_run
/// use core_auth::RenewalTimer;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let timer = RenewalTimer::new();
///
/// timer
///     .schedule(Duration::from_secs(3540), || async {
///         // refresh the token
///     })
///     .await;
///
/// // Re-arming replaces the pending timer
/// timer.schedule(Duration::from_secs(60), || async {}).await;
/// timer.cancel().await;
/// # }
/// ```
#[derive(Default)]
pub struct RenewalTimer {
    pending: Arc<Mutex<Option<PendingTimer>>>,
    next_id: AtomicU64,
}

impl RenewalTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer to run `callback` after `delay`.
    ///
    /// Any previously armed timer is cancelled first. A zero delay fires
    /// on the next scheduler tick. Once the deadline passes, the timer
    /// disarms itself before invoking the callback, so a callback that
    /// re-arms never cancels its own task.
    pub async fn schedule<F, Fut>(&self, delay: Duration, callback: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let mut pending = self.pending.lock().await;

        if let Some(previous) = pending.take() {
            debug!("Replacing pending renewal timer");
            previous.cancel.cancel();
            previous.handle.abort();
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let task_pending = Arc::clone(&self.pending);

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    {
                        let mut pending = task_pending.lock().await;
                        if pending.as_ref().map(|t| t.id) == Some(id) {
                            *pending = None;
                        }
                    }
                    callback().await;
                }
                _ = task_cancel.cancelled() => {}
            }
        });

        *pending = Some(PendingTimer { id, cancel, handle });
    }

    /// Cancel the pending timer, if any. Idempotent.
    pub async fn cancel(&self) {
        let mut pending = self.pending.lock().await;
        if let Some(timer) = pending.take() {
            debug!("Cancelling pending renewal timer");
            timer.cancel.cancel();
            timer.handle.abort();
        }
    }

    /// Whether a timer is currently armed and has not yet fired.
    pub async fn is_armed(&self) -> bool {
        let pending = self.pending.lock().await;
        match pending.as_ref() {
            Some(timer) => !timer.handle.is_finished(),
            None => false,
        }
    }
}

impl std::fmt::Debug for RenewalTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenewalTimer").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let timer = RenewalTimer::new();

        let counter = fired.clone();
        timer
            .schedule(Duration::from_secs(60), move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_replaces_pending_timer() {
        let fired = Arc::new(AtomicUsize::new(0));
        let timer = RenewalTimer::new();

        let counter = fired.clone();
        timer
            .schedule(Duration::from_secs(10), move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        let counter = fired.clone();
        timer
            .schedule(Duration::from_secs(100), move || async move {
                counter.fetch_add(10, Ordering::SeqCst);
            })
            .await;

        // First timer was replaced; nothing fires at its deadline
        tokio::time::sleep(Duration::from_secs(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_fire() {
        let fired = Arc::new(AtomicUsize::new(0));
        let timer = RenewalTimer::new();

        let counter = fired.clone();
        timer
            .schedule(Duration::from_secs(10), move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        timer.cancel().await;
        assert!(!timer.is_armed().await);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_fires_immediately() {
        let fired = Arc::new(AtomicUsize::new(0));
        let timer = RenewalTimer::new();

        let counter = fired.clone();
        timer
            .schedule(Duration::ZERO, move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let timer = RenewalTimer::new();
        timer.cancel().await;
        timer.cancel().await;
        assert!(!timer.is_armed().await);
    }
}
