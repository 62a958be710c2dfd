use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::entities::{
    AcknowledgeResponse, AlgorithmHealth, CountingAlert, CountingAlerts, CountingConfigPatch,
    CountingConfigResponse, DeliveryStats, HealthCheck, HistoryData, HistoryQuery, LatestFrame,
    ReliabilityConfigPatch, ReliabilityConfigResponse, ReliabilityStatus, StreamAlertType,
    StreamAlerts, StreamHealth, StreamStats, SystemStatus,
};
use crate::domain::ports::backend::{CountingBackend, FetchError};

/// Backend operation, used to count calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Latest,
    ReliabilityStatus,
    StreamHealth,
    AlgorithmHealth,
    CountingConfig,
    UpdateCountingConfig,
    CountingAlerts,
    Acknowledge,
    StreamAlerts,
    SystemStatus,
    ReliabilityConfig,
    UpdateReliabilityConfig,
    History,
    Stats,
    HealthCheck,
    StreamStats,
}

type Scripted<T> = Mutex<Result<T, FetchError>>;

/// Scripted in-memory backend for tests and offline runs.
///
/// Every read endpoint answers `NotFound` until a payload is set. Counting
/// alerts are held as a mutable list so acknowledge behaves like the server.
/// Reads capture their answer when the call arrives; the configured delay
/// only postpones delivery.
pub struct InMemoryBackend {
    latest: Scripted<LatestFrame>,
    reliability: Scripted<ReliabilityStatus>,
    stream_health: Scripted<StreamHealth>,
    algorithm_health: Scripted<AlgorithmHealth>,
    counting_config: Scripted<CountingConfigResponse>,
    update_error: Mutex<Option<FetchError>>,
    alerts: Mutex<Vec<CountingAlert>>,
    alerts_error: Mutex<Option<FetchError>>,
    acknowledge_error: Mutex<Option<FetchError>>,
    last_acknowledged: Mutex<Option<Option<Vec<String>>>>,
    stream_alerts: Scripted<StreamAlerts>,
    system_status: Scripted<SystemStatus>,
    reliability_config: Scripted<ReliabilityConfigResponse>,
    history: Scripted<HistoryData>,
    last_history_query: Mutex<Option<HistoryQuery>>,
    stats: Scripted<DeliveryStats>,
    health_check: Scripted<HealthCheck>,
    stream_stats: Scripted<StreamStats>,
    delay: Mutex<Duration>,
    calls: Mutex<HashMap<Endpoint, usize>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            latest: Mutex::new(Err(FetchError::NotFound)),
            reliability: Mutex::new(Err(FetchError::NotFound)),
            stream_health: Mutex::new(Err(FetchError::NotFound)),
            algorithm_health: Mutex::new(Err(FetchError::NotFound)),
            counting_config: Mutex::new(Err(FetchError::NotFound)),
            update_error: Mutex::new(None),
            alerts: Mutex::new(Vec::new()),
            alerts_error: Mutex::new(None),
            acknowledge_error: Mutex::new(None),
            last_acknowledged: Mutex::new(None),
            stream_alerts: Mutex::new(Ok(StreamAlerts::default())),
            system_status: Mutex::new(Err(FetchError::NotFound)),
            reliability_config: Mutex::new(Err(FetchError::NotFound)),
            history: Mutex::new(Err(FetchError::NotFound)),
            last_history_query: Mutex::new(None),
            stats: Mutex::new(Err(FetchError::NotFound)),
            health_check: Mutex::new(Err(FetchError::NotFound)),
            stream_stats: Mutex::new(Err(FetchError::NotFound)),
            delay: Mutex::new(Duration::ZERO),
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_latest(&self, response: Result<LatestFrame, FetchError>) {
        *lock(&self.latest) = response;
    }

    pub fn set_reliability(&self, response: Result<ReliabilityStatus, FetchError>) {
        *lock(&self.reliability) = response;
    }

    pub fn set_stream_health(&self, response: Result<StreamHealth, FetchError>) {
        *lock(&self.stream_health) = response;
    }

    pub fn set_algorithm_health(&self, response: Result<AlgorithmHealth, FetchError>) {
        *lock(&self.algorithm_health) = response;
    }

    pub fn set_counting_config(&self, response: Result<CountingConfigResponse, FetchError>) {
        *lock(&self.counting_config) = response;
    }

    /// Make both config `PUT`s fail with `error` (or succeed again with `None`).
    pub fn set_update_error(&self, error: Option<FetchError>) {
        *lock(&self.update_error) = error;
    }

    pub fn set_alerts(&self, alerts: Vec<CountingAlert>) {
        *lock(&self.alerts) = alerts;
    }

    pub fn set_alerts_error(&self, error: Option<FetchError>) {
        *lock(&self.alerts_error) = error;
    }

    pub fn set_acknowledge_error(&self, error: Option<FetchError>) {
        *lock(&self.acknowledge_error) = error;
    }

    pub fn set_stream_alerts(&self, response: Result<StreamAlerts, FetchError>) {
        *lock(&self.stream_alerts) = response;
    }

    pub fn set_system_status(&self, response: Result<SystemStatus, FetchError>) {
        *lock(&self.system_status) = response;
    }

    pub fn set_reliability_config(&self, response: Result<ReliabilityConfigResponse, FetchError>) {
        *lock(&self.reliability_config) = response;
    }

    pub fn set_history(&self, response: Result<HistoryData, FetchError>) {
        *lock(&self.history) = response;
    }

    pub fn set_stats(&self, response: Result<DeliveryStats, FetchError>) {
        *lock(&self.stats) = response;
    }

    pub fn set_health_check(&self, response: Result<HealthCheck, FetchError>) {
        *lock(&self.health_check) = response;
    }

    pub fn set_stream_stats(&self, response: Result<StreamStats, FetchError>) {
        *lock(&self.stream_stats) = response;
    }

    /// Query of the last history call.
    #[must_use]
    pub fn last_history_query(&self) -> Option<HistoryQuery> {
        lock(&self.last_history_query).clone()
    }

    /// Delay applied to every call before it answers.
    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.delay) = delay;
    }

    #[must_use]
    pub fn calls(&self, endpoint: Endpoint) -> usize {
        lock(&self.calls).get(&endpoint).copied().unwrap_or(0)
    }

    /// Ids sent by the last successful acknowledge; `Some(None)` means "all".
    #[must_use]
    pub fn last_acknowledged(&self) -> Option<Option<Vec<String>>> {
        lock(&self.last_acknowledged).clone()
    }

    /// Count the call and return the delay in force when it arrived.
    fn arrive(&self, endpoint: Endpoint) -> Duration {
        *lock(&self.calls).entry(endpoint).or_insert(0) += 1;
        *lock(&self.delay)
    }

    async fn deliver<T>(delay: Duration, answer: T) -> T {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        answer
    }

    async fn enter(&self, endpoint: Endpoint) {
        Self::deliver(self.arrive(endpoint), ()).await;
    }

    async fn answer<T: Clone>(&self, endpoint: Endpoint, slot: &Scripted<T>) -> Result<T, FetchError> {
        let delay = self.arrive(endpoint);
        let answer = lock(slot).clone();
        Self::deliver(delay, answer).await
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_patch(response: &mut CountingConfigResponse, patch: &CountingConfigPatch) {
    let config = &mut response.config;
    if let Some(v) = patch.multiview_enabled {
        config.multiview_enabled = v;
    }
    if let Some(v) = patch.singleview_enabled {
        config.singleview_enabled = v;
    }
    if let Some(v) = &patch.multiview_url {
        config.multiview_url.clone_from(v);
    }
    if let Some(v) = &patch.singleview_url {
        config.singleview_url.clone_from(v);
    }
}

#[async_trait]
impl CountingBackend for InMemoryBackend {
    async fn latest(&self) -> Result<LatestFrame, FetchError> {
        self.answer(Endpoint::Latest, &self.latest).await
    }

    async fn reliability_status(&self) -> Result<ReliabilityStatus, FetchError> {
        self.answer(Endpoint::ReliabilityStatus, &self.reliability)
            .await
    }

    async fn stream_health(&self) -> Result<StreamHealth, FetchError> {
        self.answer(Endpoint::StreamHealth, &self.stream_health)
            .await
    }

    async fn algorithm_health(&self) -> Result<AlgorithmHealth, FetchError> {
        self.answer(Endpoint::AlgorithmHealth, &self.algorithm_health)
            .await
    }

    async fn counting_config(&self) -> Result<CountingConfigResponse, FetchError> {
        self.answer(Endpoint::CountingConfig, &self.counting_config)
            .await
    }

    async fn update_counting_config(
        &self,
        patch: &CountingConfigPatch,
    ) -> Result<CountingConfigResponse, FetchError> {
        self.enter(Endpoint::UpdateCountingConfig).await;
        if let Some(e) = lock(&self.update_error).clone() {
            return Err(e);
        }
        let mut current = lock(&self.counting_config);
        let mut next = current.clone().unwrap_or_default();
        apply_patch(&mut next, patch);
        next.message = Some("Configuration updated".to_string());
        *current = Ok(next.clone());
        Ok(next)
    }

    async fn counting_alerts(
        &self,
        limit: u32,
        unacknowledged_only: bool,
    ) -> Result<CountingAlerts, FetchError> {
        let delay = self.arrive(Endpoint::CountingAlerts);
        let answer = match lock(&self.alerts_error).clone() {
            Some(e) => Err(e),
            None => {
                let alerts: Vec<CountingAlert> = lock(&self.alerts)
                    .iter()
                    .filter(|a| !unacknowledged_only || !a.acknowledged)
                    .take(limit as usize)
                    .cloned()
                    .collect();
                Ok(CountingAlerts {
                    status: Some("success".to_string()),
                    timestamp: None,
                    count: u32::try_from(alerts.len()).ok(),
                    alerts,
                })
            }
        };
        Self::deliver(delay, answer).await
    }

    async fn acknowledge_alerts(
        &self,
        alert_ids: Option<&[String]>,
    ) -> Result<AcknowledgeResponse, FetchError> {
        self.enter(Endpoint::Acknowledge).await;
        if let Some(e) = lock(&self.acknowledge_error).clone() {
            return Err(e);
        }
        let mut acknowledged = 0_u64;
        for alert in lock(&self.alerts).iter_mut() {
            let targeted = alert_ids.map_or(true, |ids| ids.contains(&alert.id));
            if targeted && !alert.acknowledged {
                alert.acknowledged = true;
                acknowledged += 1;
            }
        }
        *lock(&self.last_acknowledged) = Some(alert_ids.map(<[String]>::to_vec));
        Ok(AcknowledgeResponse {
            status: Some("success".to_string()),
            message: Some(format!("Acknowledged {acknowledged} alerts")),
            acknowledged_count: acknowledged,
        })
    }

    async fn stream_alerts(
        &self,
        limit: u32,
        alert_type: Option<StreamAlertType>,
    ) -> Result<StreamAlerts, FetchError> {
        let mut response = self
            .answer(Endpoint::StreamAlerts, &self.stream_alerts)
            .await?;
        response
            .alerts
            .retain(|a| alert_type.map_or(true, |t| a.alert_type == t));
        response.alerts.truncate(limit as usize);
        response.count = u32::try_from(response.alerts.len()).ok();
        Ok(response)
    }

    async fn system_status(&self) -> Result<SystemStatus, FetchError> {
        self.answer(Endpoint::SystemStatus, &self.system_status)
            .await
    }

    async fn reliability_config(&self) -> Result<ReliabilityConfigResponse, FetchError> {
        self.answer(Endpoint::ReliabilityConfig, &self.reliability_config)
            .await
    }

    async fn update_reliability_config(
        &self,
        patch: &ReliabilityConfigPatch,
    ) -> Result<ReliabilityConfigResponse, FetchError> {
        self.enter(Endpoint::UpdateReliabilityConfig).await;
        if let Some(e) = lock(&self.update_error).clone() {
            return Err(e);
        }
        let mut current = lock(&self.reliability_config);
        let mut next = current.clone().unwrap_or_default();
        patch.apply_to(&mut next.config);
        next.message = Some("Configuration updated".to_string());
        *current = Ok(next.clone());
        Ok(next)
    }

    async fn history(&self, query: &HistoryQuery) -> Result<HistoryData, FetchError> {
        *lock(&self.last_history_query) = Some(query.clone());
        let mut history = self.answer(Endpoint::History, &self.history).await?;
        history.data.truncate(query.limit as usize);
        Ok(history)
    }

    async fn stats(&self) -> Result<DeliveryStats, FetchError> {
        self.answer(Endpoint::Stats, &self.stats).await
    }

    async fn health_check(&self) -> Result<HealthCheck, FetchError> {
        self.answer(Endpoint::HealthCheck, &self.health_check)
            .await
    }

    async fn stream_stats(&self) -> Result<StreamStats, FetchError> {
        self.answer(Endpoint::StreamStats, &self.stream_stats)
            .await
    }
}
