use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::snapshot_store::{SnapshotCell, SnapshotUpdate, SourceCell, WriteOutcome};
use crate::domain::ports::backend::FetchError;
use crate::domain::value_objects::SourceId;

struct SourceTask {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
    cell: Arc<dyn SourceCell>,
}

/// Runs one independent polling loop per source.
///
/// Each loop fetches immediately, then once per interval. A failed fetch is
/// recorded in the source's cell and retried on the next tick; it never stops
/// the loop or touches another source.
pub struct SourceScheduler {
    tasks: Mutex<HashMap<SourceId, SourceTask>>,
    retired: Mutex<Vec<JoinHandle<()>>>,
    fetch_timeout: Duration,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SourceScheduler {
    #[must_use]
    pub fn new(fetch_timeout: Duration) -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            retired: Mutex::new(Vec::new()),
            fetch_timeout,
        }
    }

    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    /// Start polling `cell`'s source every `every`, writing each settled fetch
    /// into `cell`. Must be called from within a tokio runtime.
    ///
    /// Returns `false`, with a warning, if that source is already running.
    pub fn start<T, F, Fut>(&self, cell: Arc<SnapshotCell<T>>, every: Duration, fetch: F) -> bool
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let source = cell.source();
        let mut tasks = lock(&self.tasks);
        if tasks.contains_key(&source) {
            tracing::warn!(source = %source, "polling loop already started");
            return false;
        }

        let epoch = cell.advance_epoch();
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(run_loop(
            Arc::clone(&cell),
            epoch,
            every,
            self.fetch_timeout,
            Arc::new(fetch),
            stop_rx,
        ));
        tracing::info!(source = %source, interval_ms = as_millis(every), "polling loop started");

        tasks.insert(
            source,
            SourceTask {
                stop: stop_tx,
                handle,
                cell,
            },
        );
        true
    }

    /// Stop the loop of `source`. After this returns no further write reaches
    /// the source's cell, even from a fetch that is still in flight.
    ///
    /// Returns `false` if the source was not running.
    pub fn stop(&self, source: SourceId) -> bool {
        let Some(task) = lock(&self.tasks).remove(&source) else {
            return false;
        };
        task.stop.send_replace(true);
        task.cell.advance_epoch();
        tracing::info!(source = %source, "polling loop stopped");

        let mut retired = lock(&self.retired);
        retired.retain(|h| !h.is_finished());
        retired.push(task.handle);
        true
    }

    #[must_use]
    pub fn is_running(&self, source: SourceId) -> bool {
        lock(&self.tasks).contains_key(&source)
    }

    /// Sources with a running loop, in declaration order.
    #[must_use]
    pub fn running(&self) -> Vec<SourceId> {
        let tasks = lock(&self.tasks);
        SourceId::ALL
            .into_iter()
            .filter(|id| tasks.contains_key(id))
            .collect()
    }

    /// Stop every loop and wait for their tasks to exit.
    pub async fn shutdown(&self) {
        for source in SourceId::ALL {
            self.stop(source);
        }
        let handles: Vec<JoinHandle<()>> = lock(&self.retired).drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    tracing::error!("polling task ended abnormally: {e}");
                }
            }
        }
    }
}

impl Drop for SourceScheduler {
    fn drop(&mut self) {
        let tasks = self.tasks.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (_, task) in tasks.drain() {
            task.stop.send_replace(true);
            task.cell.advance_epoch();
        }
    }
}

fn as_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

async fn run_loop<T, F, Fut>(
    cell: Arc<SnapshotCell<T>>,
    epoch: u64,
    every: Duration,
    fetch_timeout: Duration,
    fetch: Arc<F>,
    mut stop: watch::Receiver<bool>,
) where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
{
    let source = cell.source();
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = stop.changed() => break,
            _ = ticker.tick() => {}
        }

        let ticket = cell.ticket();

        // Silent refresh: only a source without data shows a loading state.
        let current = cell.get();
        if !current.has_data()
            && !current.loading
            && cell.set_if_current(epoch, ticket, SnapshotUpdate::Started) == WriteOutcome::Stopped
        {
            break;
        }

        let job = tokio::spawn({
            let fetch = Arc::clone(&fetch);
            async move { tokio::time::timeout(fetch_timeout, fetch()).await }
        });
        let abort = job.abort_handle();

        let outcome = tokio::select! {
            biased;
            _ = stop.changed() => {
                abort.abort();
                break;
            }
            joined = job => joined,
        };

        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(FetchError::Timeout {
                after_ms: as_millis(fetch_timeout),
            }),
            Err(e) => {
                tracing::error!(source = %source, "fetch task failed: {e}");
                Err(FetchError::Internal(e.to_string()))
            }
        };

        match &result {
            Ok(_) => tracing::debug!(source = %source, "fetch succeeded"),
            Err(e) if e.is_not_found() => tracing::debug!(source = %source, "no data yet"),
            Err(e) => tracing::warn!(source = %source, error = %e, "fetch failed"),
        }

        match cell.set_if_current(epoch, ticket, SnapshotUpdate::from_result(result)) {
            WriteOutcome::Applied => {}
            WriteOutcome::Superseded => {
                tracing::debug!(source = %source, "result superseded by a later fetch");
            }
            WriteOutcome::Stopped => break,
        }
    }

    tracing::debug!(source = %source, "polling loop exited");
}
