use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::alerts::AlertCoordinator;
use super::health::HealthAggregator;
use super::scheduler::SourceScheduler;
use super::snapshot_store::{SnapshotCell, SnapshotMeta, SnapshotStore, SnapshotUpdate};
use crate::application::config::{AppConfig, CameraConfig, PollingConfig};
use crate::domain::entities::{
    CountingConfigPatch, CountingConfigResponse, HistoryQuery, ReliabilityConfigPatch,
    ReliabilityConfigResponse,
};
use crate::domain::ports::backend::{CountingBackend, FetchError};
use crate::domain::rules::camera::{classify_all, CameraReading};
use crate::domain::rules::health::HealthSummary;
use crate::domain::rules::streams::{overview, StreamOverview};
use crate::domain::value_objects::SourceId;

type BackendCall<'a, T> = Pin<Box<dyn Future<Output = Result<T, FetchError>> + Send + 'a>>;

type Observers = Arc<Mutex<HashMap<SourceId, usize>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Composition root: owns the store, the scheduler and every derived service,
/// wired to one backend.
pub struct Dashboard {
    backend: Arc<dyn CountingBackend>,
    store: Arc<SnapshotStore>,
    scheduler: Arc<SourceScheduler>,
    health: Arc<HealthAggregator>,
    alerts: Arc<AlertCoordinator>,
    polling: PollingConfig,
    cameras: CameraConfig,
    history_query: Arc<Mutex<HistoryQuery>>,
    observers: Observers,
}

impl Dashboard {
    #[must_use]
    pub fn new(backend: Arc<dyn CountingBackend>, config: &AppConfig) -> Self {
        let store = Arc::new(SnapshotStore::new());
        let scheduler = Arc::new(SourceScheduler::new(config.backend.timeout()));
        let health = HealthAggregator::attach(Arc::clone(&store), config.cameras.expected_services);
        let alerts = Arc::new(AlertCoordinator::new(
            Arc::clone(&backend),
            &store,
            &config.alerts,
        ));

        Self {
            backend,
            store,
            scheduler,
            health,
            alerts,
            polling: config.polling.clone(),
            cameras: config.cameras.clone(),
            history_query: Arc::new(Mutex::new(HistoryQuery::default())),
            observers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    #[must_use]
    pub const fn scheduler(&self) -> &Arc<SourceScheduler> {
        &self.scheduler
    }

    #[must_use]
    pub const fn alerts(&self) -> &Arc<AlertCoordinator> {
        &self.alerts
    }

    #[must_use]
    pub const fn health_aggregator(&self) -> &Arc<HealthAggregator> {
        &self.health
    }

    fn poll_backend<T, F>(&self, cell: &Arc<SnapshotCell<T>>, call: F) -> bool
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&'a dyn CountingBackend) -> BackendCall<'a, T> + Send + Sync + 'static,
    {
        let backend = Arc::clone(&self.backend);
        let call = Arc::new(call);
        self.scheduler.start(
            Arc::clone(cell),
            self.polling.interval(cell.source()),
            move || {
                let backend = Arc::clone(&backend);
                let call = Arc::clone(&call);
                async move { call(backend.as_ref()).await }
            },
        )
    }

    /// Start the polling loop of `source`. Returns `false` if it was running.
    ///
    /// On-demand sources can be polled too; they use the on-demand cadence.
    pub fn activate(&self, source: SourceId) -> bool {
        let store = &self.store;
        match source {
            SourceId::Latest => self.poll_backend(store.latest(), |b| b.latest()),
            SourceId::ReliabilityStatus => {
                self.poll_backend(store.reliability_status(), |b| b.reliability_status())
            }
            SourceId::StreamHealth => self.poll_backend(store.stream_health(), |b| b.stream_health()),
            SourceId::AlgorithmHealth => {
                self.poll_backend(store.algorithm_health(), |b| b.algorithm_health())
            }
            SourceId::CountingConfig => {
                self.poll_backend(store.counting_config(), |b| b.counting_config())
            }
            SourceId::SystemStatus => self.poll_backend(store.system_status(), |b| b.system_status()),
            SourceId::CountingAlerts => {
                let alerts = Arc::clone(&self.alerts);
                self.scheduler.start(
                    Arc::clone(store.counting_alerts()),
                    self.polling.interval(source),
                    move || {
                        let alerts = Arc::clone(&alerts);
                        async move { alerts.fetch_counting().await }
                    },
                )
            }
            SourceId::StreamAlerts => {
                let alerts = Arc::clone(&self.alerts);
                self.scheduler.start(
                    Arc::clone(store.stream_alerts()),
                    self.polling.interval(source),
                    move || {
                        let alerts = Arc::clone(&alerts);
                        async move { alerts.fetch_stream().await }
                    },
                )
            }
            SourceId::ReliabilityConfig => {
                self.poll_backend(store.reliability_config(), |b| b.reliability_config())
            }
            SourceId::History => {
                let backend = Arc::clone(&self.backend);
                let query = Arc::clone(&self.history_query);
                self.scheduler.start(
                    Arc::clone(store.history()),
                    self.polling.interval(source),
                    move || {
                        let backend = Arc::clone(&backend);
                        let query = lock(&query).clone();
                        async move { backend.history(&query).await }
                    },
                )
            }
            SourceId::Stats => self.poll_backend(store.stats(), |b| b.stats()),
            SourceId::HealthCheck => self.poll_backend(store.health_check(), |b| b.health_check()),
            SourceId::StreamStats => self.poll_backend(store.stream_stats(), |b| b.stream_stats()),
        }
    }

    /// Start every live dashboard source that is not already running.
    pub fn start_all(&self) {
        for source in SourceId::POLLED {
            if !self.scheduler.is_running(source) {
                self.activate(source);
            }
        }
    }

    /// Stop every loop. No cell is written after this returns.
    pub fn stop_all(&self) {
        for source in SourceId::ALL {
            self.scheduler.stop(source);
        }
    }

    /// Stop every loop and wait for the tasks to exit.
    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
    }

    /// Register interest in `source`. The first observer starts its loop with
    /// an immediate fetch; dropping the last one stops it.
    #[must_use]
    pub fn observe(&self, source: SourceId) -> Observation {
        let mut observers = lock(&self.observers);
        let count = observers.entry(source).or_insert(0);
        *count += 1;
        if *count == 1 && !self.scheduler.is_running(source) {
            self.activate(source);
        }
        Observation {
            source,
            scheduler: Arc::clone(&self.scheduler),
            observers: Arc::clone(&self.observers),
        }
    }

    #[must_use]
    pub fn observer_count(&self, source: SourceId) -> usize {
        lock(&self.observers).get(&source).copied().unwrap_or(0)
    }

    /// Status of every camera in the latest frame. Empty until a frame arrives.
    #[must_use]
    pub fn camera_statuses(&self) -> Vec<CameraReading> {
        let latest = self.store.latest().get();
        let reliability = self.store.reliability_status().get();
        let cameras = reliability.data().and_then(|r| r.cameras());
        latest
            .data()
            .map(|frame| classify_all(frame, cameras))
            .unwrap_or_default()
    }

    /// Cameras reported by the latest frame, or the configured count before one arrives.
    #[must_use]
    pub fn camera_count(&self) -> usize {
        self.store
            .latest()
            .get()
            .data()
            .map_or(self.cameras.count, |frame| frame.camera_count())
    }

    #[must_use]
    pub fn health(&self) -> HealthSummary {
        self.health.current()
    }

    #[must_use]
    pub fn stream_overview(&self) -> Option<StreamOverview> {
        self.store
            .stream_health()
            .get()
            .data()
            .map(|health| overview(health))
    }

    #[must_use]
    pub fn meta(&self, source: SourceId) -> SnapshotMeta {
        self.store.meta(source)
    }

    /// Send `patch` to the backend. On success the response becomes the
    /// `countingConfig` snapshot; on failure the snapshot is untouched.
    ///
    /// # Errors
    ///
    /// Returns the backend's `FetchError`. Not retried.
    pub async fn update_counting_config(
        &self,
        patch: &CountingConfigPatch,
    ) -> Result<CountingConfigResponse, FetchError> {
        match self.backend.update_counting_config(patch).await {
            Ok(response) => {
                tracing::info!("counting config updated");
                self.store
                    .counting_config()
                    .set(SnapshotUpdate::succeeded(response.clone()));
                Ok(response)
            }
            Err(e) => {
                tracing::warn!(error = %e, "counting config update failed");
                Err(e)
            }
        }
    }

    /// Send `patch` to the backend. On success the response becomes the
    /// `reliabilityConfig` snapshot; on failure the snapshot is untouched.
    ///
    /// # Errors
    ///
    /// Returns the backend's `FetchError`. Not retried.
    pub async fn update_reliability_config(
        &self,
        patch: &ReliabilityConfigPatch,
    ) -> Result<ReliabilityConfigResponse, FetchError> {
        match self.backend.update_reliability_config(patch).await {
            Ok(response) => {
                tracing::info!(
                    camera_threshold = response.config.camera_threshold,
                    system_threshold = response.config.system_threshold,
                    "reliability thresholds updated"
                );
                self.store
                    .reliability_config()
                    .set(SnapshotUpdate::succeeded(response.clone()));
                Ok(response)
            }
            Err(e) => {
                tracing::warn!(error = %e, "reliability config update failed");
                Err(e)
            }
        }
    }

    /// Query used for the `history` source.
    #[must_use]
    pub fn history_query(&self) -> HistoryQuery {
        lock(&self.history_query).clone()
    }

    /// Replace the history query and fetch history with it once.
    ///
    /// # Errors
    ///
    /// Returns the backend's `FetchError`; it is also recorded in the snapshot.
    pub async fn load_history(&self, query: HistoryQuery) -> Result<(), FetchError> {
        *lock(&self.history_query) = query;
        self.load(SourceId::History).await
    }

    /// Fetch `source` once and store the result. A poll that started earlier
    /// cannot overwrite it.
    ///
    /// # Errors
    ///
    /// Returns the backend's `FetchError`; it is also recorded in the snapshot.
    pub async fn load(&self, source: SourceId) -> Result<(), FetchError> {
        let timeout = self.scheduler.fetch_timeout();
        let b = self.backend.as_ref();
        let store = &self.store;
        match source {
            SourceId::Latest => settle(store.latest(), timeout, b.latest()).await,
            SourceId::ReliabilityStatus => {
                settle(store.reliability_status(), timeout, b.reliability_status()).await
            }
            SourceId::StreamHealth => {
                settle(store.stream_health(), timeout, b.stream_health()).await
            }
            SourceId::AlgorithmHealth => {
                settle(store.algorithm_health(), timeout, b.algorithm_health()).await
            }
            SourceId::CountingConfig => {
                settle(store.counting_config(), timeout, b.counting_config()).await
            }
            SourceId::CountingAlerts => {
                settle(store.counting_alerts(), timeout, self.alerts.fetch_counting()).await
            }
            SourceId::StreamAlerts => {
                settle(store.stream_alerts(), timeout, self.alerts.fetch_stream()).await
            }
            SourceId::SystemStatus => {
                settle(store.system_status(), timeout, b.system_status()).await
            }
            SourceId::ReliabilityConfig => {
                settle(store.reliability_config(), timeout, b.reliability_config()).await
            }
            SourceId::History => {
                let query = self.history_query();
                settle(store.history(), timeout, b.history(&query)).await
            }
            SourceId::Stats => settle(store.stats(), timeout, b.stats()).await,
            SourceId::HealthCheck => settle(store.health_check(), timeout, b.health_check()).await,
            SourceId::StreamStats => settle(store.stream_stats(), timeout, b.stream_stats()).await,
        }
    }

    /// Failures are recorded in the source's snapshot.
    async fn load_quietly(&self, source: SourceId) {
        let _ = self.load(source).await;
    }

    /// Fetch every live dashboard source once, concurrently, and store the results.
    pub async fn refresh_once(&self) {
        tokio::join!(
            self.load_quietly(SourceId::Latest),
            self.load_quietly(SourceId::ReliabilityStatus),
            self.load_quietly(SourceId::StreamHealth),
            self.load_quietly(SourceId::AlgorithmHealth),
            self.load_quietly(SourceId::CountingConfig),
            self.load_quietly(SourceId::CountingAlerts),
            self.load_quietly(SourceId::StreamAlerts),
            self.load_quietly(SourceId::SystemStatus),
        );
    }
}

async fn settle<T, Fut>(
    cell: &Arc<SnapshotCell<T>>,
    timeout: Duration,
    fetch: Fut,
) -> Result<(), FetchError>
where
    T: Send + Sync + 'static,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let ticket = cell.ticket();
    let result = tokio::time::timeout(timeout, fetch)
        .await
        .unwrap_or_else(|_| {
            Err(FetchError::Timeout {
                after_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })
        });
    let outcome = match &result {
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::debug!(source = %cell.source(), error = %e, "one-shot fetch failed");
            Err(e.clone())
        }
    };
    cell.set_ordered(ticket, SnapshotUpdate::from_result(result));
    outcome
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.stop_all();
    }
}

/// Keeps one source polled while alive.
pub struct Observation {
    source: SourceId,
    scheduler: Arc<SourceScheduler>,
    observers: Observers,
}

impl Observation {
    #[must_use]
    pub const fn source(&self) -> SourceId {
        self.source
    }
}

impl Drop for Observation {
    fn drop(&mut self) {
        let mut observers = lock(&self.observers);
        let Some(count) = observers.get_mut(&self.source) else {
            return;
        };
        *count = count.saturating_sub(1);
        if *count == 0 {
            observers.remove(&self.source);
            self.scheduler.stop(self.source);
        }
    }
}

impl std::fmt::Debug for Observation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observation")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
