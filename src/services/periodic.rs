use std::{future::Future, time::Duration};

use thiserror::Error;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, warn};

/// Returned when starting a recurring task that is already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("recurring task already running")]
pub struct AlreadyRunning;

/// Recurring job spawned on the tokio runtime.
///
/// The first run happens immediately. Stopping only takes effect between runs: a run that
/// has started always completes.
pub(crate) struct PeriodicTask {
    name: &'static str,
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    pub(crate) fn spawn<F, Fut>(name: &'static str, period: Duration, mut job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (stop, mut stop_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {}
                }
                if *stop_rx.borrow() {
                    break;
                }
                job().await;
            }

            debug!(task = name, "recurring task stopped");
        });

        Self { name, stop, handle }
    }

    /// Whether the loop is still alive.
    pub(crate) fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Signal the loop and wait for it to exit, letting an in-flight run finish.
    pub(crate) async fn stop(self) {
        let _ = self.stop.send(true);
        if let Err(err) = self.handle.await {
            warn!(task = self.name, error = %err, "recurring task ended abnormally");
        }
    }
}
