use serde::{Deserialize, Serialize};

/// Data-sender counters reported by `GET /status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderStats {
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub total_sent: u64,
    #[serde(default)]
    pub total_success: u64,
    #[serde(default)]
    pub total_failed: u64,
    #[serde(default)]
    pub last_update: Option<String>,
}

/// Payload of `GET /status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub stats: Option<SenderStats>,
    #[serde(default)]
    pub has_data: bool,
    #[serde(default)]
    pub history_count: u64,
}

/// Payload of `GET /stats`: delivery counters of the data sender.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryStats {
    #[serde(default)]
    pub total_sent: u64,
    #[serde(default)]
    pub total_success: u64,
    #[serde(default)]
    pub total_failed: u64,
    /// Percentage reported by the backend.
    #[serde(default)]
    pub success_rate: f64,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub last_update: Option<String>,
}

/// Payload of `GET /health`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HealthCheck {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        matches!(self.status.to_ascii_lowercase().as_str(), "healthy" | "ok")
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_delivery_stats() {
        let json = r#"{"total_sent": 10, "total_success": 9, "total_failed": 1, "success_rate": 90.0,
            "start_time": "2025-06-01T00:00:00", "last_update": "2025-06-01T08:00:00"}"#;
        let stats: DeliveryStats = serde_json::from_str(json).expect("parse");
        assert_eq!(stats.total_failed, 1);
        assert!((stats.success_rate - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn health_check_status() {
        let check: HealthCheck =
            serde_json::from_str(r#"{"status": "healthy", "timestamp": "t"}"#).expect("parse");
        assert!(check.is_healthy());
        let check: HealthCheck = serde_json::from_str(r#"{"status": "degraded"}"#).expect("parse");
        assert!(!check.is_healthy());
    }

    #[test]
    fn parses_status_payload() {
        let json = r#"{
            "status": "running",
            "timestamp": "2025-06-01T08:00:00",
            "stats": {"start_time": "2025-06-01T00:00:00", "total_sent": 120, "total_success": 118, "total_failed": 2},
            "has_data": true,
            "history_count": 50
        }"#;
        let status: SystemStatus = serde_json::from_str(json).expect("parse");
        assert!(status.has_data);
        assert_eq!(status.stats.expect("stats").total_failed, 2);
    }
}
