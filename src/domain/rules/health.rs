use serde::Serialize;

use crate::domain::entities::{AlgorithmHealth, CountingConfigResponse, ReliabilityStatus};
use crate::domain::value_objects::service_status::ServiceStatus;

/// Dashboard-level health built from three independent sources.
///
/// `None` fields mean the owning source has not produced data; renderers show
/// them as `-`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthSummary {
    pub system_reliable: Option<bool>,
    pub unreliable_camera_count: Option<u32>,
    pub overall_algorithm_status: ServiceStatus,
    pub healthy_service_count: usize,
    pub total_service_count: usize,
    pub multiview_enabled: Option<bool>,
    pub singleview_enabled: Option<bool>,
}

impl HealthSummary {
    /// Summary with no source available.
    #[must_use]
    pub const fn empty(expected_services: usize) -> Self {
        Self {
            system_reliable: None,
            unreliable_camera_count: None,
            overall_algorithm_status: ServiceStatus::Unknown,
            healthy_service_count: 0,
            total_service_count: expected_services,
            multiview_enabled: None,
            singleview_enabled: None,
        }
    }

    /// `healthy/total`, e.g. `2/3`.
    #[must_use]
    pub fn services_label(&self) -> String {
        format!("{}/{}", self.healthy_service_count, self.total_service_count)
    }
}

/// Render an optional field the way the dashboard does.
#[must_use]
pub fn or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Combine whichever of the three snapshots are available.
///
/// Each field depends on exactly one source, so a missing source only blanks
/// its own fields.
#[must_use]
pub fn summarize(
    reliability: Option<&ReliabilityStatus>,
    algorithm: Option<&AlgorithmHealth>,
    counting: Option<&CountingConfigResponse>,
    expected_services: usize,
) -> HealthSummary {
    let mut summary = HealthSummary::empty(expected_services);

    if let Some(report) = reliability.and_then(|r| r.reliability.as_ref()) {
        summary.system_reliable = report.system_reliable;
        summary.unreliable_camera_count = report.unreliable_camera_count;
    }

    if let Some(health) = algorithm {
        summary.overall_algorithm_status = health.overall_status;
        if let Some(services) = &health.services {
            summary.healthy_service_count = services
                .values()
                .filter(|s| s.status == ServiceStatus::Healthy)
                .count();
            summary.total_service_count = services.len();
        }
    }

    if let Some(response) = counting {
        summary.multiview_enabled = Some(response.config.multiview_enabled);
        summary.singleview_enabled = Some(response.config.singleview_enabled);
    }

    summary
}
