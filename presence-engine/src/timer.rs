//! The cancelable deferred-action primitive behind auto-off timers.

use std::fmt;
use std::time::Duration;

use futures::future::BoxFuture;

/// Handle to one scheduled action.
///
/// Dropping the handle does not cancel the action; only an explicit
/// [`TimerHandle::cancel`] does. Cancellation is best-effort — an action
/// that is already running may still complete.
pub struct TimerHandle {
    cancel: Box<dyn Fn() + Send + Sync>,
}

impl TimerHandle {
    /// Wrap a cancellation thunk.
    pub fn new(cancel: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Box::new(cancel),
        }
    }

    /// Cancel the scheduled action if it has not fired yet.
    pub fn cancel(&self) {
        (self.cancel)();
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle").finish()
    }
}

/// Capability to run an action once after a delay.
///
/// The engine arms and cancels timers only through this trait, so the timer
/// facility (native tokio timers, a scheduled executor, a time wheel) can
/// change without touching engine logic.
pub trait Scheduler: Send + Sync {
    /// Run `action` once after `delay`, unless the handle is cancelled first.
    fn schedule(&self, delay: Duration, action: BoxFuture<'static, ()>) -> TimerHandle;
}

/// Scheduler backed by tokio's timer wheel: one task per armed timer.
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, action: BoxFuture<'static, ()>) -> TimerHandle {
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        });
        TimerHandle::new(move || task.abort())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn action_fires_after_the_delay() {
        let fired = Arc::new(AtomicU32::new(0));
        let observed = fired.clone();
        TokioScheduler.schedule(
            Duration::from_secs(5),
            Box::pin(async move {
                observed.fetch_add(1, Ordering::SeqCst);
            }),
        );
        // Let the timer task register its sleep before moving the clock.
        settle().await;

        tokio::time::advance(Duration::from_secs(4)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_the_action() {
        let fired = Arc::new(AtomicU32::new(0));
        let observed = fired.clone();
        let handle = TokioScheduler.schedule(
            Duration::from_secs(5),
            Box::pin(async move {
                observed.fetch_add(1, Ordering::SeqCst);
            }),
        );
        settle().await;

        handle.cancel();
        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
