use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::entities::{
    AcknowledgeResponse, AlgorithmHealth, CountingAlerts, CountingConfigPatch,
    CountingConfigResponse, DeliveryStats, HealthCheck, HistoryData, HistoryQuery, LatestFrame,
    ReliabilityConfigPatch, ReliabilityConfigResponse, ReliabilityStatus, StreamAlertType,
    StreamAlerts, StreamHealth, StreamStats, SystemStatus,
};

/// Failure of a single backend round-trip.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },
    /// HTTP 404: the backend has nothing to report yet.
    #[error("No data available")]
    NotFound,
    #[error("server returned HTTP {status}: {message}")]
    Server { status: u16, message: String },
    #[error("unexpected response shape: {0}")]
    Validation(String),
    /// The fetch task itself failed (panic or teardown), not the backend.
    #[error("fetch task failed: {0}")]
    Internal(String),
}

/// Coarse error taxonomy surfaced to renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NetworkError,
    NotFoundError,
    ServerError,
    ValidationError,
    InternalError,
}

impl FetchError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) | Self::Timeout { .. } => ErrorKind::NetworkError,
            Self::NotFound => ErrorKind::NotFoundError,
            Self::Server { .. } => ErrorKind::ServerError,
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::Internal(_) => ErrorKind::InternalError,
        }
    }

    /// Validation failures are reported to operators as server faults.
    #[must_use]
    pub const fn is_server_class(&self) -> bool {
        matches!(self, Self::Server { .. } | Self::Validation(_))
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NetworkError => write!(f, "NetworkError"),
            Self::NotFoundError => write!(f, "NotFoundError"),
            Self::ServerError => write!(f, "ServerError"),
            Self::ValidationError => write!(f, "ValidationError"),
            Self::InternalError => write!(f, "InternalError"),
        }
    }
}

/// REST boundary of the counting backend.
#[async_trait]
pub trait CountingBackend: Send + Sync {
    /// `GET /latest`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::NotFound` while the backend has no frame yet, or
    /// any other `FetchError` on transport, HTTP, or decoding failure.
    async fn latest(&self) -> Result<LatestFrame, FetchError>;

    /// `GET /reliability/status`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport, HTTP, or decoding failure.
    async fn reliability_status(&self) -> Result<ReliabilityStatus, FetchError>;

    /// `GET /stream/health`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport, HTTP, or decoding failure.
    async fn stream_health(&self) -> Result<StreamHealth, FetchError>;

    /// `GET /algorithm/health`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport, HTTP, or decoding failure.
    async fn algorithm_health(&self) -> Result<AlgorithmHealth, FetchError>;

    /// `GET /counting/config`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport, HTTP, or decoding failure.
    async fn counting_config(&self) -> Result<CountingConfigResponse, FetchError>;

    /// `PUT /counting/config` with only the fields set in `patch`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport, HTTP, or decoding failure.
    async fn update_counting_config(
        &self,
        patch: &CountingConfigPatch,
    ) -> Result<CountingConfigResponse, FetchError>;

    /// `GET /counting/alerts?limit&unacknowledged_only`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport, HTTP, or decoding failure.
    async fn counting_alerts(
        &self,
        limit: u32,
        unacknowledged_only: bool,
    ) -> Result<CountingAlerts, FetchError>;

    /// `POST /counting/alerts/acknowledge`. `None` acknowledges every
    /// unacknowledged alert.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport, HTTP, or decoding failure.
    async fn acknowledge_alerts(
        &self,
        alert_ids: Option<&[String]>,
    ) -> Result<AcknowledgeResponse, FetchError>;

    /// `GET /stream/alerts?limit&type`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport, HTTP, or decoding failure.
    async fn stream_alerts(
        &self,
        limit: u32,
        alert_type: Option<StreamAlertType>,
    ) -> Result<StreamAlerts, FetchError>;

    /// `GET /status`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport, HTTP, or decoding failure.
    async fn system_status(&self) -> Result<SystemStatus, FetchError>;

    /// `GET /reliability/config`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport, HTTP, or decoding failure.
    async fn reliability_config(&self) -> Result<ReliabilityConfigResponse, FetchError>;

    /// `PUT /reliability/config` with only the thresholds set in `patch`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport, HTTP, or decoding failure.
    async fn update_reliability_config(
        &self,
        patch: &ReliabilityConfigPatch,
    ) -> Result<ReliabilityConfigResponse, FetchError>;

    /// `GET /history?limit[&start_time&end_time]`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::NotFound` when no history is recorded, or any
    /// other `FetchError` on transport, HTTP, or decoding failure.
    async fn history(&self, query: &HistoryQuery) -> Result<HistoryData, FetchError>;

    /// `GET /stats`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport, HTTP, or decoding failure.
    async fn stats(&self) -> Result<DeliveryStats, FetchError>;

    /// `GET /health`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport, HTTP, or decoding failure.
    async fn health_check(&self) -> Result<HealthCheck, FetchError>;

    /// `GET /stream/stats`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport, HTTP, or decoding failure.
    async fn stream_stats(&self) -> Result<StreamStats, FetchError>;
}
