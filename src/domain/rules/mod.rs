//! Pure derivations over snapshot payloads. No I/O, no hidden state.

pub mod camera;
pub mod health;
pub mod streams;

pub use camera::{
    classify, classify_all, collect_signals, CameraFilter, CameraId, CameraReading,
    CameraSignals, StatusTally,
};
pub use health::{summarize, HealthSummary};
pub use streams::{overview, StreamOverview};
