//! Per-source snapshot cells.
//!
//! Each source owns one [`SnapshotCell`]. A cell holds the latest [`Snapshot`]
//! of that source and notifies subscribers once per write.
//!
//! Two fences order the writes. Polling loops carry an epoch; stopping a loop
//! advances the epoch, so a result that settles after the stop is discarded.
//! Every fetch also takes a [`Ticket`] before it starts, and a settled result
//! is dropped once a write from a later fetch has landed. A poll that was in
//! flight across an explicit refresh therefore cannot overwrite it.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::{
    AlgorithmHealth, CountingAlerts, CountingConfigResponse, DeliveryStats, HealthCheck,
    HistoryData, LatestFrame, ReliabilityConfigResponse, ReliabilityStatus, StreamAlerts,
    StreamHealth, StreamStats, SystemStatus,
};
use crate::domain::ports::backend::{ErrorKind, FetchError};
use crate::domain::value_objects::SourceId;

/// Payload state of a source.
#[derive(Debug)]
pub enum SnapshotState<T> {
    /// Nothing has settled yet.
    Pending,
    /// The last attempt failed and no attempt ever succeeded.
    Failed(FetchError),
    /// The last attempt succeeded.
    Fresh(Arc<T>),
    /// Last-known-good data kept across a failed attempt.
    Stale { data: Arc<T>, error: FetchError },
}

impl<T> Clone for SnapshotState<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Pending => Self::Pending,
            Self::Failed(e) => Self::Failed(e.clone()),
            Self::Fresh(d) => Self::Fresh(Arc::clone(d)),
            Self::Stale { data, error } => Self::Stale {
                data: Arc::clone(data),
                error: error.clone(),
            },
        }
    }
}

/// Latest known state of one source.
#[derive(Debug)]
pub struct Snapshot<T> {
    pub state: SnapshotState<T>,
    /// True only while the first successful load is outstanding.
    pub loading: bool,
    /// Time the most recent attempt settled, success or failure.
    pub last_fetched_at: Option<DateTime<Utc>>,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            loading: self.loading,
            last_fetched_at: self.last_fetched_at,
        }
    }
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self::pending()
    }
}

impl<T> Snapshot<T> {
    /// Initial state: no data, no error, loading.
    #[must_use]
    pub const fn pending() -> Self {
        Self {
            state: SnapshotState::Pending,
            loading: true,
            last_fetched_at: None,
        }
    }

    #[must_use]
    pub const fn data(&self) -> Option<&Arc<T>> {
        match &self.state {
            SnapshotState::Fresh(data) | SnapshotState::Stale { data, .. } => Some(data),
            SnapshotState::Pending | SnapshotState::Failed(_) => None,
        }
    }

    /// Error of the most recent attempt, if it failed.
    #[must_use]
    pub const fn error(&self) -> Option<&FetchError> {
        match &self.state {
            SnapshotState::Failed(error) | SnapshotState::Stale { error, .. } => Some(error),
            SnapshotState::Pending | SnapshotState::Fresh(_) => None,
        }
    }

    #[must_use]
    pub const fn has_data(&self) -> bool {
        self.data().is_some()
    }

    /// Data is shown from an earlier success while the latest attempt failed.
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        matches!(self.state, SnapshotState::Stale { .. })
    }

    /// Apply one update, producing the whole replacement snapshot.
    #[must_use]
    pub fn apply(&self, update: SnapshotUpdate<T>) -> Self {
        match update {
            SnapshotUpdate::Started => Self {
                state: self.state.clone(),
                loading: true,
                last_fetched_at: self.last_fetched_at,
            },
            SnapshotUpdate::Succeeded { data, at } => Self {
                state: SnapshotState::Fresh(Arc::new(data)),
                loading: false,
                last_fetched_at: Some(at),
            },
            SnapshotUpdate::Failed { error, at } => {
                let state = match self.data() {
                    Some(data) => SnapshotState::Stale {
                        data: Arc::clone(data),
                        error,
                    },
                    None => SnapshotState::Failed(error),
                };
                Self {
                    state,
                    loading: false,
                    last_fetched_at: Some(at),
                }
            }
        }
    }
}

/// A single write to a snapshot cell.
#[derive(Debug)]
pub enum SnapshotUpdate<T> {
    /// A first load is in progress.
    Started,
    Succeeded { data: T, at: DateTime<Utc> },
    Failed { error: FetchError, at: DateTime<Utc> },
}

impl<T> SnapshotUpdate<T> {
    /// Whether this update ends a fetch. `Started` does not.
    #[must_use]
    pub const fn settles(&self) -> bool {
        !matches!(self, Self::Started)
    }

    #[must_use]
    pub fn succeeded(data: T) -> Self {
        Self::Succeeded {
            data,
            at: Utc::now(),
        }
    }

    #[must_use]
    pub fn failed(error: FetchError) -> Self {
        Self::Failed {
            error,
            at: Utc::now(),
        }
    }

    #[must_use]
    pub fn from_result(result: Result<T, FetchError>) -> Self {
        match result {
            Ok(data) => Self::succeeded(data),
            Err(error) => Self::failed(error),
        }
    }
}

/// Type-erased view of a snapshot, for renderers that only need status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotMeta {
    pub source: SourceId,
    pub loading: bool,
    pub has_data: bool,
    pub stale: bool,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

impl<T> Snapshot<T> {
    #[must_use]
    pub fn meta(&self, source: SourceId) -> SnapshotMeta {
        SnapshotMeta {
            source,
            loading: self.loading,
            has_data: self.has_data(),
            stale: self.is_stale(),
            error: self.error().map(|e| {
                if e.is_not_found() {
                    source.not_found_message().to_string()
                } else {
                    e.to_string()
                }
            }),
            error_kind: self.error().map(FetchError::kind),
            last_fetched_at: self.last_fetched_at,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

type Callback<T> = Arc<dyn Fn(&Snapshot<T>) + Send + Sync>;

/// Place of a fetch in its cell's write order. Taken before the fetch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// What happened to a fenced write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    /// A result from a later fetch already landed.
    Superseded,
    /// The writer's epoch was invalidated by a stop.
    Stopped,
}

struct CellInner<T> {
    snapshot: Snapshot<T>,
    epoch: u64,
    issued: u64,
    settled: u64,
}

impl<T> CellInner<T> {
    fn issue(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    fn accept(&mut self, ticket: Ticket, update: SnapshotUpdate<T>) -> bool {
        if update.settles() {
            if ticket.0 <= self.settled {
                return false;
            }
            self.settled = ticket.0;
        }
        self.snapshot = self.snapshot.apply(update);
        true
    }
}

/// State cell of one source.
///
/// `writer` serializes the apply-and-notify sequence and epoch changes, so
/// subscribers see writes in the order they were applied and no notification
/// fires after `advance_epoch` returns. Subscribers must not write to the cell
/// that is notifying them.
pub struct SnapshotCell<T> {
    source: SourceId,
    writer: Mutex<()>,
    inner: Mutex<CellInner<T>>,
    subscribers: Mutex<BTreeMap<u64, Callback<T>>>,
    next_subscriber: AtomicU64,
}

impl<T: Send + Sync + 'static> SnapshotCell<T> {
    #[must_use]
    pub fn new(source: SourceId) -> Arc<Self> {
        Arc::new(Self {
            source,
            writer: Mutex::new(()),
            inner: Mutex::new(CellInner {
                snapshot: Snapshot::pending(),
                epoch: 0,
                issued: 0,
                settled: 0,
            }),
            subscribers: Mutex::new(BTreeMap::new()),
            next_subscriber: AtomicU64::new(0),
        })
    }

    #[must_use]
    pub const fn source(&self) -> SourceId {
        self.source
    }

    /// Consistent copy of the current snapshot. Never fails.
    #[must_use]
    pub fn get(&self) -> Snapshot<T> {
        lock(&self.inner).snapshot.clone()
    }

    /// Reserve a place in the write order for a fetch about to start.
    #[must_use]
    pub fn ticket(&self) -> Ticket {
        lock(&self.inner).issue()
    }

    /// Apply `update` as the newest write: every fetch already in flight is
    /// superseded by it.
    pub fn set(&self, update: SnapshotUpdate<T>) {
        let _writer = lock(&self.writer);
        let next = {
            let mut inner = lock(&self.inner);
            let ticket = inner.issue();
            inner.accept(ticket, update);
            inner.snapshot.clone()
        };
        self.notify(&next);
    }

    /// Apply the result of the fetch holding `ticket`, unless a later fetch
    /// already settled. Returns whether the write was applied.
    pub fn set_ordered(&self, ticket: Ticket, update: SnapshotUpdate<T>) -> bool {
        let _writer = lock(&self.writer);
        let next = {
            let mut inner = lock(&self.inner);
            if !inner.accept(ticket, update) {
                return false;
            }
            inner.snapshot.clone()
        };
        self.notify(&next);
        true
    }

    /// Apply `update` only if `epoch` is still the cell's current epoch and no
    /// later fetch has settled.
    pub fn set_if_current(
        &self,
        epoch: u64,
        ticket: Ticket,
        update: SnapshotUpdate<T>,
    ) -> WriteOutcome {
        let _writer = lock(&self.writer);
        let next = {
            let mut inner = lock(&self.inner);
            if inner.epoch != epoch {
                return WriteOutcome::Stopped;
            }
            if !inner.accept(ticket, update) {
                return WriteOutcome::Superseded;
            }
            inner.snapshot.clone()
        };
        self.notify(&next);
        WriteOutcome::Applied
    }

    /// Invalidate every outstanding epoch and return a fresh one.
    ///
    /// Waits for a write that is being applied to finish notifying.
    pub fn advance_epoch(&self) -> u64 {
        let _writer = lock(&self.writer);
        let mut inner = lock(&self.inner);
        inner.epoch += 1;
        inner.epoch
    }

    /// Register `callback`, called once per applied write with the new snapshot.
    ///
    /// Callbacks run on the writer's thread while the write is still in
    /// progress; they may read the cell.
    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(&Snapshot<T>) + Send + Sync + 'static,
    {
        let id = self.next_subscriber.fetch_add(1, Ordering::Relaxed);
        lock(&self.subscribers).insert(id, Arc::new(callback));

        let cell: Weak<Self> = Arc::downgrade(self);
        Subscription::new(move || {
            if let Some(cell) = cell.upgrade() {
                lock(&cell.subscribers).remove(&id);
            }
        })
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).len()
    }

    fn notify(&self, snapshot: &Snapshot<T>) {
        let callbacks: Vec<Callback<T>> = lock(&self.subscribers).values().cloned().collect();
        for callback in callbacks {
            callback(snapshot);
        }
    }
}

/// Object-safe side of a cell, used where the payload type does not matter.
pub trait SourceCell: Send + Sync {
    fn source(&self) -> SourceId;
    fn meta(&self) -> SnapshotMeta;
    fn advance_epoch(&self) -> u64;
    fn subscribe_meta(
        self: Arc<Self>,
        callback: Arc<dyn Fn(&SnapshotMeta) + Send + Sync>,
    ) -> Subscription;
}

impl<T: Send + Sync + 'static> SourceCell for SnapshotCell<T> {
    fn source(&self) -> SourceId {
        self.source
    }

    fn meta(&self) -> SnapshotMeta {
        lock(&self.inner).snapshot.meta(self.source)
    }

    fn advance_epoch(&self) -> u64 {
        Self::advance_epoch(self)
    }

    fn subscribe_meta(
        self: Arc<Self>,
        callback: Arc<dyn Fn(&SnapshotMeta) + Send + Sync>,
    ) -> Subscription {
        let source = self.source;
        self.subscribe(move |snapshot| callback(&snapshot.meta(source)))
    }
}

/// Handle returned by `subscribe`. Dropping it unsubscribes.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    fn new(detach: impl FnOnce() + Send + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// Stop receiving notifications. Calling it again is a no-op.
    pub fn unsubscribe(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.detach.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// One cell per [`SourceId`], constructed by the composition root.
pub struct SnapshotStore {
    latest: Arc<SnapshotCell<LatestFrame>>,
    reliability_status: Arc<SnapshotCell<ReliabilityStatus>>,
    stream_health: Arc<SnapshotCell<StreamHealth>>,
    algorithm_health: Arc<SnapshotCell<AlgorithmHealth>>,
    counting_config: Arc<SnapshotCell<CountingConfigResponse>>,
    counting_alerts: Arc<SnapshotCell<CountingAlerts>>,
    stream_alerts: Arc<SnapshotCell<StreamAlerts>>,
    system_status: Arc<SnapshotCell<SystemStatus>>,
    reliability_config: Arc<SnapshotCell<ReliabilityConfigResponse>>,
    history: Arc<SnapshotCell<HistoryData>>,
    stats: Arc<SnapshotCell<DeliveryStats>>,
    health_check: Arc<SnapshotCell<HealthCheck>>,
    stream_stats: Arc<SnapshotCell<StreamStats>>,
}

impl SnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            latest: SnapshotCell::new(SourceId::Latest),
            reliability_status: SnapshotCell::new(SourceId::ReliabilityStatus),
            stream_health: SnapshotCell::new(SourceId::StreamHealth),
            algorithm_health: SnapshotCell::new(SourceId::AlgorithmHealth),
            counting_config: SnapshotCell::new(SourceId::CountingConfig),
            counting_alerts: SnapshotCell::new(SourceId::CountingAlerts),
            stream_alerts: SnapshotCell::new(SourceId::StreamAlerts),
            system_status: SnapshotCell::new(SourceId::SystemStatus),
            reliability_config: SnapshotCell::new(SourceId::ReliabilityConfig),
            history: SnapshotCell::new(SourceId::History),
            stats: SnapshotCell::new(SourceId::Stats),
            health_check: SnapshotCell::new(SourceId::HealthCheck),
            stream_stats: SnapshotCell::new(SourceId::StreamStats),
        }
    }

    #[must_use]
    pub const fn latest(&self) -> &Arc<SnapshotCell<LatestFrame>> {
        &self.latest
    }

    #[must_use]
    pub const fn reliability_status(&self) -> &Arc<SnapshotCell<ReliabilityStatus>> {
        &self.reliability_status
    }

    #[must_use]
    pub const fn stream_health(&self) -> &Arc<SnapshotCell<StreamHealth>> {
        &self.stream_health
    }

    #[must_use]
    pub const fn algorithm_health(&self) -> &Arc<SnapshotCell<AlgorithmHealth>> {
        &self.algorithm_health
    }

    #[must_use]
    pub const fn counting_config(&self) -> &Arc<SnapshotCell<CountingConfigResponse>> {
        &self.counting_config
    }

    #[must_use]
    pub const fn counting_alerts(&self) -> &Arc<SnapshotCell<CountingAlerts>> {
        &self.counting_alerts
    }

    #[must_use]
    pub const fn stream_alerts(&self) -> &Arc<SnapshotCell<StreamAlerts>> {
        &self.stream_alerts
    }

    #[must_use]
    pub const fn system_status(&self) -> &Arc<SnapshotCell<SystemStatus>> {
        &self.system_status
    }

    #[must_use]
    pub const fn reliability_config(&self) -> &Arc<SnapshotCell<ReliabilityConfigResponse>> {
        &self.reliability_config
    }

    #[must_use]
    pub const fn history(&self) -> &Arc<SnapshotCell<HistoryData>> {
        &self.history
    }

    #[must_use]
    pub const fn stats(&self) -> &Arc<SnapshotCell<DeliveryStats>> {
        &self.stats
    }

    #[must_use]
    pub const fn health_check(&self) -> &Arc<SnapshotCell<HealthCheck>> {
        &self.health_check
    }

    #[must_use]
    pub const fn stream_stats(&self) -> &Arc<SnapshotCell<StreamStats>> {
        &self.stream_stats
    }

    /// Untyped handle on the cell of `source`.
    #[must_use]
    pub fn cell(&self, source: SourceId) -> Arc<dyn SourceCell> {
        match source {
            SourceId::Latest => self.latest.clone(),
            SourceId::ReliabilityStatus => self.reliability_status.clone(),
            SourceId::StreamHealth => self.stream_health.clone(),
            SourceId::AlgorithmHealth => self.algorithm_health.clone(),
            SourceId::CountingConfig => self.counting_config.clone(),
            SourceId::CountingAlerts => self.counting_alerts.clone(),
            SourceId::StreamAlerts => self.stream_alerts.clone(),
            SourceId::SystemStatus => self.system_status.clone(),
            SourceId::ReliabilityConfig => self.reliability_config.clone(),
            SourceId::History => self.history.clone(),
            SourceId::Stats => self.stats.clone(),
            SourceId::HealthCheck => self.health_check.clone(),
            SourceId::StreamStats => self.stream_stats.clone(),
        }
    }

    #[must_use]
    pub fn meta(&self, source: SourceId) -> SnapshotMeta {
        self.cell(source).meta()
    }

    /// Subscribe to status changes of `source` without naming its payload type.
    pub fn subscribe<F>(&self, source: SourceId, callback: F) -> Subscription
    where
        F: Fn(&SnapshotMeta) + Send + Sync + 'static,
    {
        self.cell(source).subscribe_meta(Arc::new(callback))
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
