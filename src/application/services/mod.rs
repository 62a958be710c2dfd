pub mod alerts;
pub mod dashboard;
pub mod health;
pub mod scheduler;
pub mod snapshot_store;

pub use alerts::{AlertCoordinator, AlertFilter};
pub use dashboard::{Dashboard, Observation};
pub use health::HealthAggregator;
pub use scheduler::SourceScheduler;
pub use snapshot_store::{
    Snapshot, SnapshotCell, SnapshotMeta, SnapshotState, SnapshotStore, SnapshotUpdate,
    SourceCell, Subscription,
};
