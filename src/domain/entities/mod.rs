pub mod algorithm;
pub mod counting;
pub mod frame;
pub mod history;
pub mod reliability;
pub mod stream;
pub mod system;

pub use algorithm::{AlgorithmHealth, AlgorithmService};
pub use counting::{
    AcknowledgeRequest, AcknowledgeResponse, CountingAlert, CountingAlerts, CountingConfig,
    CountingConfigPatch, CountingConfigResponse,
};
pub use frame::LatestFrame;
pub use history::{CountRange, HistoryData, HistoryQuery, DEFAULT_HISTORY_LIMIT};
pub use reliability::{
    CameraReliability, ReliabilityConfig, ReliabilityConfigPatch, ReliabilityConfigResponse,
    ReliabilityReport, ReliabilityStatus,
};
pub use stream::{
    StreamAlert, StreamAlertType, StreamAlerts, StreamCounters, StreamHealth, StreamStats,
    StreamStatus, StreamSummary,
};
pub use system::{DeliveryStats, HealthCheck, SenderStats, SystemStatus};
