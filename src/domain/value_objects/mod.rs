pub mod camera_status;
pub mod service_status;
pub mod source_id;

pub use camera_status::CameraStatus;
pub use service_status::ServiceStatus;
pub use source_id::SourceId;
