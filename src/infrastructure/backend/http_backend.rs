use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::application::config::BackendConfig;
use crate::domain::entities::{
    AcknowledgeRequest, AcknowledgeResponse, AlgorithmHealth, CountingAlerts, CountingConfigPatch,
    CountingConfigResponse, DeliveryStats, HealthCheck, HistoryData, HistoryQuery, LatestFrame,
    ReliabilityConfigPatch, ReliabilityConfigResponse, ReliabilityStatus, StreamAlertType,
    StreamAlerts, StreamHealth, StreamStats, SystemStatus,
};
use crate::domain::ports::backend::{CountingBackend, FetchError};

/// Longest error body kept in a `FetchError::Server` message.
const MAX_ERROR_BODY: usize = 200;

/// REST client for the counting backend.
///
/// Stream endpoints go to `stream_base_url`, everything else to `base_url`.
/// The client-wide timeout bounds every request.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    stream_base_url: String,
    timeout: Duration,
}

impl HttpBackend {
    /// Build a client from the `[backend]` config section.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Network` if the HTTP client cannot be initialized
    /// (e.g. TLS backend failure).
    pub fn new(config: &BackendConfig) -> Result<Self, FetchError> {
        let timeout = config.timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            stream_base_url: config.stream_url().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn stream_base_url(&self) -> &str {
        &self.stream_base_url
    }

    async fn get<T: DeserializeOwned>(&self, url: String) -> Result<T, FetchError> {
        self.get_with(url, &[]).await
    }

    async fn get_with<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        tracing::trace!(%url, ?query, "GET");
        let response = self.client.get(&url).query(query).send().await;
        self.finish(response).await
    }

    async fn send_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        url: String,
        body: &B,
    ) -> Result<T, FetchError> {
        tracing::trace!(%url, %method, "request");
        let response = self.client.request(method, &url).json(body).send().await;
        self.finish(response).await
    }

    async fn finish<T: DeserializeOwned>(
        &self,
        response: reqwest::Result<reqwest::Response>,
    ) -> Result<T, FetchError> {
        let response = response.map_err(|e| self.transport_error(&e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(&e))?;
        if let Some(error) = status_error(status, &body) {
            return Err(error);
        }
        decode(&body)
    }

    fn transport_error(&self, error: &reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                after_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            FetchError::Network(error.to_string())
        }
    }
}

/// Join a base URL and an absolute endpoint path.
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Map a non-success HTTP status to its error. `None` for 2xx.
#[must_use]
pub fn status_error(status: u16, body: &str) -> Option<FetchError> {
    match status {
        200..=299 => None,
        404 => Some(FetchError::NotFound),
        _ => {
            let mut message: String = body.trim().chars().take(MAX_ERROR_BODY).collect();
            if message.is_empty() {
                message = "empty response".to_string();
            }
            Some(FetchError::Server { status, message })
        }
    }
}

/// Decode a JSON body, reporting shape mismatches as validation errors.
///
/// # Errors
///
/// Returns `FetchError::Validation` if `body` does not match `T`.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T, FetchError> {
    serde_json::from_str(body).map_err(|e| FetchError::Validation(e.to_string()))
}

fn alerts_query(limit: u32, unacknowledged_only: bool) -> Vec<(&'static str, String)> {
    vec![
        ("limit", limit.to_string()),
        ("unacknowledged_only", unacknowledged_only.to_string()),
    ]
}

fn stream_alerts_query(
    limit: u32,
    alert_type: Option<StreamAlertType>,
) -> Vec<(&'static str, String)> {
    let mut query = vec![("limit", limit.to_string())];
    if let Some(t) = alert_type.filter(|t| *t != StreamAlertType::Other) {
        query.push(("type", t.as_str().to_string()));
    }
    query
}

fn history_query(query: &HistoryQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![("limit", query.limit.to_string())];
    if let Some(start) = &query.start_time {
        params.push(("start_time", start.clone()));
    }
    if let Some(end) = &query.end_time {
        params.push(("end_time", end.clone()));
    }
    params
}

#[async_trait]
impl CountingBackend for HttpBackend {
    async fn latest(&self) -> Result<LatestFrame, FetchError> {
        self.get(join_url(&self.base_url, "/latest")).await
    }

    async fn reliability_status(&self) -> Result<ReliabilityStatus, FetchError> {
        self.get(join_url(&self.base_url, "/reliability/status"))
            .await
    }

    async fn stream_health(&self) -> Result<StreamHealth, FetchError> {
        self.get(join_url(&self.stream_base_url, "/stream/health"))
            .await
    }

    async fn algorithm_health(&self) -> Result<AlgorithmHealth, FetchError> {
        self.get(join_url(&self.base_url, "/algorithm/health"))
            .await
    }

    async fn counting_config(&self) -> Result<CountingConfigResponse, FetchError> {
        self.get(join_url(&self.base_url, "/counting/config"))
            .await
    }

    async fn update_counting_config(
        &self,
        patch: &CountingConfigPatch,
    ) -> Result<CountingConfigResponse, FetchError> {
        self.send_json(
            reqwest::Method::PUT,
            join_url(&self.base_url, "/counting/config"),
            patch,
        )
        .await
    }

    async fn counting_alerts(
        &self,
        limit: u32,
        unacknowledged_only: bool,
    ) -> Result<CountingAlerts, FetchError> {
        self.get_with(
            join_url(&self.base_url, "/counting/alerts"),
            &alerts_query(limit, unacknowledged_only),
        )
        .await
    }

    async fn acknowledge_alerts(
        &self,
        alert_ids: Option<&[String]>,
    ) -> Result<AcknowledgeResponse, FetchError> {
        let body = AcknowledgeRequest {
            alert_ids: alert_ids.map(<[String]>::to_vec),
        };
        self.send_json(
            reqwest::Method::POST,
            join_url(&self.base_url, "/counting/alerts/acknowledge"),
            &body,
        )
        .await
    }

    async fn stream_alerts(
        &self,
        limit: u32,
        alert_type: Option<StreamAlertType>,
    ) -> Result<StreamAlerts, FetchError> {
        self.get_with(
            join_url(&self.stream_base_url, "/stream/alerts"),
            &stream_alerts_query(limit, alert_type),
        )
        .await
    }

    async fn system_status(&self) -> Result<SystemStatus, FetchError> {
        self.get(join_url(&self.base_url, "/status")).await
    }

    async fn reliability_config(&self) -> Result<ReliabilityConfigResponse, FetchError> {
        self.get(join_url(&self.base_url, "/reliability/config"))
            .await
    }

    async fn update_reliability_config(
        &self,
        patch: &ReliabilityConfigPatch,
    ) -> Result<ReliabilityConfigResponse, FetchError> {
        self.send_json(
            reqwest::Method::PUT,
            join_url(&self.base_url, "/reliability/config"),
            patch,
        )
        .await
    }

    async fn history(&self, query: &HistoryQuery) -> Result<HistoryData, FetchError> {
        self.get_with(join_url(&self.base_url, "/history"), &history_query(query))
            .await
    }

    async fn stats(&self) -> Result<DeliveryStats, FetchError> {
        self.get(join_url(&self.base_url, "/stats")).await
    }

    async fn health_check(&self) -> Result<HealthCheck, FetchError> {
        self.get(join_url(&self.base_url, "/health")).await
    }

    async fn stream_stats(&self) -> Result<StreamStats, FetchError> {
        self.get(join_url(&self.stream_base_url, "/stream/stats"))
            .await
    }
}
