use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::service_status::ServiceStatus;

/// Request statistics for one algorithm service (multiview, singleview, umbrella...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmService {
    #[serde(default)]
    pub status: ServiceStatus,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub total_requests: u64,
    #[serde(default)]
    pub total_success: u64,
    #[serde(default)]
    pub total_errors: u64,
    #[serde(default)]
    pub success_rate: f64,
    #[serde(default)]
    pub consecutive_errors: u64,
    #[serde(default)]
    pub last_response_time_ms: Option<f64>,
    #[serde(default)]
    pub avg_response_time_ms: Option<f64>,
    #[serde(default)]
    pub last_success_time: Option<String>,
    #[serde(default)]
    pub last_error_time: Option<String>,
    #[serde(default)]
    pub last_error_message: Option<String>,
}

/// Payload of `GET /algorithm/health`.
///
/// `services` stays `None` when the block is absent so callers can tell
/// "no report" apart from "report with zero services".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmHealth {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub overall_status: ServiceStatus,
    #[serde(default)]
    pub services: Option<BTreeMap<String, AlgorithmService>>,
}
