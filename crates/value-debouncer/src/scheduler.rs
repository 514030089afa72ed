//! Timer facility: `schedule(callback, delay) -> handle`, `cancel(handle)`.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{runtime::Handle, time::sleep};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::DebounceError;

/// Callback run when a timer fires.
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Cancellation handle for one scheduled callback.
///
/// Cloning shares the same timer. Cancelling is idempotent and a no-op once
/// the callback has fired.
#[derive(Debug, Clone, Default)]
pub struct TimerHandle {
    token: CancellationToken,
    fired: Arc<AtomicBool>,
}

impl TimerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Schedulers call this right before running the callback.
    pub fn mark_fired(&self) {
        self.fired.store(true, Ordering::Release);
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Neither fired nor cancelled yet.
    pub fn is_outstanding(&self) -> bool {
        !self.has_fired() && !self.is_cancelled()
    }

    /// Token tripped by [`TimerHandle::cancel`].
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Host timer facility used by debounced holders.
///
/// Implementations must never run `callback` synchronously inside
/// `schedule`: holders call `schedule` while holding their own state lock.
pub trait Scheduler: Send + Sync + 'static {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle;

    fn cancel(&self, handle: &TimerHandle) {
        handle.cancel();
    }
}

/// Scheduler spawning one Tokio task per timer.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    runtime: Handle,
}

impl TokioScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Scheduler bound to the runtime the caller is running on.
    pub fn try_current() -> Result<Self, DebounceError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| DebounceError::NoRuntime)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let handle = TimerHandle::new();
        let timer = handle.clone();

        self.runtime.spawn(async move {
            tokio::select! {
                biased;

                _ = timer.token().cancelled() => {
                    trace!("timer cancelled before firing");
                }

                _ = sleep(delay) => {
                    if timer.is_cancelled() {
                        return;
                    }
                    timer.mark_fired();
                    callback();
                }
            }
        });

        handle
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use tokio::time::Instant;

    use super::*;

    fn counting_callback(counter: &Arc<AtomicUsize>) -> TimerCallback {
        let counter = counter.clone();
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_try_current_without_runtime() {
        assert_eq!(
            TokioScheduler::try_current().unwrap_err(),
            DebounceError::NoRuntime
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let scheduler = TokioScheduler::try_current().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));
        let start = Instant::now();

        let handle = scheduler.schedule(Duration::from_millis(100), counting_callback(&fired));
        assert!(handle.is_outstanding());

        tokio::time::sleep_until(start + Duration::from_millis(99)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep_until(start + Duration::from_millis(101)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(handle.has_fired());
        assert!(!handle.is_outstanding());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let scheduler = TokioScheduler::try_current().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));

        let handle = scheduler.schedule(Duration::from_millis(50), counting_callback(&fired));
        scheduler.cancel(&handle);
        // second cancel is a no-op
        scheduler.cancel(&handle);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(handle.is_cancelled());
        assert!(!handle.has_fired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_is_not_synchronous() {
        let scheduler = TokioScheduler::try_current().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));

        scheduler.schedule(Duration::ZERO, counting_callback(&fired));
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
