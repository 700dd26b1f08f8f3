use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::{sync::Mutex, task::JoinHandle, time::{interval, MissedTickBehavior}};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::RemoteStore;
use crate::error::ClientError;
use crate::session::{ScoreSession, ViewMode};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// Something that is refreshed periodically while it reports itself active.
#[async_trait]
pub trait Refresh: Send + Sync + 'static {
    async fn is_active(&self) -> bool;
    async fn refresh(&self) -> Result<(), ClientError>;
}

/// Polls the entries of a shared session while it is in display mode.
pub struct DisplayRefresh<S> {
    session: Arc<Mutex<ScoreSession<S>>>,
}

impl<S> DisplayRefresh<S> {
    pub fn new(session: Arc<Mutex<ScoreSession<S>>>) -> Self {
        DisplayRefresh { session }
    }
}

#[async_trait]
impl<S> Refresh for DisplayRefresh<S> where S: RemoteStore + 'static {
    async fn is_active(&self) -> bool {
        self.session.lock().await.view_mode() == ViewMode::Display
    }

    async fn refresh(&self) -> Result<(), ClientError> {
        self.session.lock().await.refresh_entries().await
    }
}

/// Background task calling `Refresh::refresh` once per interval. Ticks
/// while the target is inactive are skipped, as are ticks missed because a
/// refresh ran long. Dropping the handle stops the task.
pub struct PeriodicRefresh {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicRefresh {
    pub fn spawn<T: Refresh>(target: T, period: Duration) -> PeriodicRefresh {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        info!("Starting periodic refresh (interval: {:?})", period);
        let handle = tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => {
                        debug!("Periodic refresh cancelled");
                        break;
                    }
                    _ = timer.tick() => {
                        if !target.is_active().await {
                            continue;
                        }
                        if let Err(e) = target.refresh().await {
                            warn!("Periodic refresh failed: {}", e);
                        }
                    }
                }
            }
        });

        PeriodicRefresh { cancel, handle: Some(handle) }
    }

    pub fn spawn_display<S>(session: Arc<Mutex<ScoreSession<S>>>) -> PeriodicRefresh
    where
        S: RemoteStore + 'static,
    {
        Self::spawn(DisplayRefresh::new(session), DEFAULT_REFRESH_INTERVAL)
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancels the task and waits for it to finish.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("Periodic refresh task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for PeriodicRefresh {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::*;

    #[derive(Clone, Default)]
    struct Counter {
        active: Arc<AtomicBool>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Refresh for Counter {
        async fn is_active(&self) -> bool {
            self.active.load(Ordering::SeqCst)
        }

        async fn refresh(&self) -> Result<(), ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_refresh_runs_only_while_active() {
        let counter = Counter::default();
        let refresh = PeriodicRefresh::spawn(counter.clone(), Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(counter.calls.load(Ordering::SeqCst), 0);

        counter.active.store(true, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(counter.calls.load(Ordering::SeqCst) >= 2);

        refresh.stop().await;
    }

    #[tokio::test]
    async fn test_stop_ends_refreshing() {
        let counter = Counter::default();
        counter.active.store(true, Ordering::SeqCst);
        let refresh = PeriodicRefresh::spawn(counter.clone(), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(30)).await;
        refresh.stop().await;

        let calls = counter.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test]
    async fn test_dropping_cancels() {
        let counter = Counter::default();
        let refresh = PeriodicRefresh::spawn(counter.clone(), Duration::from_millis(10));
        let token = refresh.cancellation_token();
        drop(refresh);
        assert!(token.is_cancelled());
    }
}
