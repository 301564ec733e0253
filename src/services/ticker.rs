use std::{future::Future, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    services::periodic::{AlreadyRunning, PeriodicTask},
    state::{handle::SessionHandle, session::TickOutcome},
};

/// Drives the session timer: one `advance_tick` per interval.
pub struct PhaseTicker {
    interval: Duration,
    task: Mutex<Option<PeriodicTask>>,
}

impl PhaseTicker {
    /// Ticker advancing the session once per `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            task: Mutex::new(None),
        }
    }

    /// Start ticking `handle`; `on_tick` receives every outcome except [`TickOutcome::Idle`].
    pub async fn start<F, Fut>(&self, handle: SessionHandle, on_tick: F) -> Result<(), AlreadyRunning>
    where
        F: Fn(TickOutcome) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.task.lock().await;
        if slot.as_ref().is_some_and(PeriodicTask::is_running) {
            return Err(AlreadyRunning);
        }

        info!(session = %handle.id(), interval = ?self.interval, "starting phase ticker");
        let on_tick = Arc::new(on_tick);
        *slot = Some(PeriodicTask::spawn("ticker", self.interval, move || {
            let handle = handle.clone();
            let on_tick = on_tick.clone();
            async move {
                match handle.advance_tick().await {
                    TickOutcome::Idle => {}
                    outcome => {
                        if let TickOutcome::Transitioned { phase, round } = outcome {
                            debug!(%phase, round, "phase timer elapsed");
                        }
                        (*on_tick)(outcome).await;
                    }
                }
            }
        }));
        Ok(())
    }

    /// Stop ticking. No-op when not running.
    pub async fn stop(&self) {
        let task = self.task.lock().await.take();
        if let Some(task) = task {
            task.stop().await;
            info!("phase ticker stopped");
        }
    }

    /// Whether a tick loop is active.
    pub async fn is_running(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .is_some_and(PeriodicTask::is_running)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use futures::future::ready;

    use super::*;
    use crate::{
        config::SessionConfig,
        state::{session::Session, state_machine::GamePhase},
    };

    fn one_minute_rounds() -> Session {
        Session::new(SessionConfig::new(4, 2, 1, 1).unwrap())
    }

    #[tokio::test]
    async fn idle_session_reports_nothing() {
        let handle = SessionHandle::new(one_minute_rounds());
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = seen.clone();
        let ticker = PhaseTicker::new(Duration::from_millis(5));

        ticker
            .start(handle.clone(), move |outcome| {
                sink.lock().unwrap().push(outcome);
                ready(())
            })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        ticker.stop().await;

        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(handle.read(Session::phase).await, GamePhase::Setup);
    }

    #[tokio::test]
    async fn counts_down_during_work() {
        let handle = SessionHandle::new(one_minute_rounds());
        handle.mutate(Session::start_round).await.unwrap();
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = seen.clone();
        let ticker = PhaseTicker::new(Duration::from_millis(5));

        ticker
            .start(handle.clone(), move |outcome| {
                sink.lock().unwrap().push(outcome);
                ready(())
            })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        ticker.stop().await;

        let seen = seen.lock().unwrap();
        assert!(!seen.is_empty());
        assert_eq!(seen[0], TickOutcome::Counting { remaining: 59 });
        assert!(handle.read(Session::timer).await < 60);
    }

    #[tokio::test]
    async fn rejects_second_start_and_stops_twice() {
        let handle = SessionHandle::new(one_minute_rounds());
        let ticker = PhaseTicker::new(Duration::from_secs(60));

        ticker.start(handle.clone(), |_| ready(())).await.unwrap();
        assert_eq!(
            ticker.start(handle.clone(), |_| ready(())).await,
            Err(AlreadyRunning)
        );
        assert!(ticker.is_running().await);

        ticker.stop().await;
        ticker.stop().await;
        assert!(!ticker.is_running().await);
    }
}
