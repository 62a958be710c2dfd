use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use super::snapshot_store::{SnapshotCell, SnapshotStore, Subscription};
use crate::domain::rules::health::{summarize, HealthSummary};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Keeps a [`HealthSummary`] current with the reliability, algorithm-health
/// and counting-config snapshots.
///
/// Every write to one of the three cells recomputes the summary from whatever
/// data each cell currently holds.
pub struct HealthAggregator {
    store: Arc<SnapshotStore>,
    expected_services: usize,
    summary: watch::Sender<HealthSummary>,
    recompute_guard: Mutex<()>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl HealthAggregator {
    #[must_use]
    pub fn attach(store: Arc<SnapshotStore>, expected_services: usize) -> Arc<Self> {
        let (summary, _) = watch::channel(HealthSummary::empty(expected_services));
        let aggregator = Arc::new(Self {
            store,
            expected_services,
            summary,
            recompute_guard: Mutex::new(()),
            subscriptions: Mutex::new(Vec::new()),
        });

        let subscriptions = vec![
            Self::follow(&aggregator, aggregator.store.reliability_status()),
            Self::follow(&aggregator, aggregator.store.algorithm_health()),
            Self::follow(&aggregator, aggregator.store.counting_config()),
        ];
        *lock(&aggregator.subscriptions) = subscriptions;
        aggregator.recompute();
        aggregator
    }

    fn follow<T: Send + Sync + 'static>(
        this: &Arc<Self>,
        cell: &Arc<SnapshotCell<T>>,
    ) -> Subscription {
        let weak = Arc::downgrade(this);
        cell.subscribe(move |_| {
            if let Some(aggregator) = weak.upgrade() {
                aggregator.recompute();
            }
        })
    }

    /// Rebuild the summary from the current snapshots.
    pub fn recompute(&self) -> HealthSummary {
        let _guard = lock(&self.recompute_guard);
        let reliability = self.store.reliability_status().get();
        let algorithm = self.store.algorithm_health().get();
        let counting = self.store.counting_config().get();

        let next = summarize(
            reliability.data().map(AsRef::as_ref),
            algorithm.data().map(AsRef::as_ref),
            counting.data().map(AsRef::as_ref),
            self.expected_services,
        );
        self.summary.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            tracing::debug!(services = %next.services_label(), "health summary changed");
            current.clone_from(&next);
            true
        });
        next
    }

    #[must_use]
    pub fn current(&self) -> HealthSummary {
        self.summary.borrow().clone()
    }

    /// Receiver notified whenever the summary changes.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<HealthSummary> {
        self.summary.subscribe()
    }

    /// Stop following the store. The last summary stays readable.
    pub fn detach(&self) {
        lock(&self.subscriptions).clear();
    }
}
