//! Periodic timer: repeatedly invokes a caller-supplied async action on a
//! fixed interval, with graceful start/cancel.
//!
//! Mirrors `deluge.loopingcall.LoopingCall`: `start` is synchronous and
//! spawns a background task; `stop` cancels it and awaits its completion,
//! swallowing the cancellation itself.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

type Action = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// A cancellable recurring task bound to a callback.
///
/// At most one background task is ever in flight; `running()` reflects
/// exactly that — there is no intermediate observable state.
pub struct PeriodicTimer {
    action: Action,
    handle: Option<JoinHandle<()>>,
    cancel: Option<CancellationToken>,
}

impl PeriodicTimer {
    /// Build a timer bound to `action`. The action is cloned into the
    /// background task each time `start` is called.
    pub fn new<F, Fut>(action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            action: Arc::new(move || Box::pin(action())),
            handle: None,
            cancel: None,
        }
    }

    /// True while a background task is present.
    pub fn running(&self) -> bool {
        self.handle.is_some()
    }

    /// Begin periodic invocation every `interval`. If `fire_immediately` is
    /// set, the first invocation happens as soon as the task is scheduled,
    /// before any delay; otherwise the first invocation happens after one
    /// `interval`. Subsequent invocations are spaced by `interval` measured
    /// from the completion of scheduling the sleep, not from completion of
    /// the callback — long callbacks cause drift.
    pub fn start(&mut self, interval: Duration, fire_immediately: bool) -> Result<()> {
        if self.running() {
            return Err(Error::AlreadyRunning);
        }

        let action = self.action.clone();
        let token = CancellationToken::new();
        let child = token.clone();

        self.handle = Some(tokio::spawn(async move {
            if fire_immediately {
                (action)().await;
            }
            loop {
                tokio::select! {
                    _ = child.cancelled() => return,
                    _ = tokio::time::sleep(interval) => {}
                }
                (action)().await;
            }
        }));
        self.cancel = Some(token);
        Ok(())
    }

    /// Request cancellation and await the background task's termination.
    /// A cancellation delivered mid-callback waits for the callback to
    /// return before the task observes it, since the `select!` above only
    /// polls the cancellation branch between invocations.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Err(Error::NotRunning);
        };
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        if let Err(join_err) = handle.await {
            if join_err.is_panic() {
                return Err(Error::Hook(anyhow::Error::from(join_err)));
            }
            // Cancellation itself is swallowed, matching the reference
            // behavior of catching `asyncio.CancelledError` in `stop()`.
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn fires_immediately_when_requested() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let mut timer = PeriodicTimer::new(move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });
        timer.start(Duration::from_secs(60), true).unwrap();
        tokio::task::yield_now().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        timer.stop().await.unwrap();
    }

    #[tokio::test]
    async fn double_start_fails() {
        let mut timer = PeriodicTimer::new(|| async {});
        timer.start(Duration::from_secs(60), false).unwrap();
        assert!(matches!(
            timer.start(Duration::from_secs(60), false),
            Err(Error::AlreadyRunning)
        ));
        timer.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_without_start_fails() {
        let mut timer = PeriodicTimer::new(|| async {});
        assert!(matches!(timer.stop().await, Err(Error::NotRunning)));
    }

    #[tokio::test]
    async fn stop_is_graceful_during_sleep() {
        let mut timer = PeriodicTimer::new(|| async {});
        timer.start(Duration::from_secs(60), false).unwrap();
        timer.stop().await.unwrap();
        assert!(!timer.running());
    }
}
