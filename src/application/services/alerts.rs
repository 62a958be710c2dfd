use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::application::config::AlertConfig;
use crate::application::services::snapshot_store::{SnapshotCell, SnapshotStore, SnapshotUpdate};
use crate::domain::entities::{CountingAlert, CountingAlerts, StreamAlert, StreamAlertType, StreamAlerts};
use crate::domain::ports::backend::{CountingBackend, FetchError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// View filter applied when fetching counting alerts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertFilter {
    pub unacknowledged_only: bool,
}

/// Counting alert list, its local selection, and the acknowledge action.
///
/// The alert list itself lives in the store's `countingAlerts` cell so polling
/// and explicit refreshes write to the same place, ordered by when each fetch
/// started. Stream alerts are read-only.
pub struct AlertCoordinator {
    backend: Arc<dyn CountingBackend>,
    counting: Arc<SnapshotCell<CountingAlerts>>,
    stream: Arc<SnapshotCell<StreamAlerts>>,
    limit: u32,
    filter: Mutex<AlertFilter>,
    stream_type: Mutex<Option<StreamAlertType>>,
    selection: Mutex<BTreeSet<String>>,
}

impl AlertCoordinator {
    #[must_use]
    pub fn new(backend: Arc<dyn CountingBackend>, store: &SnapshotStore, config: &AlertConfig) -> Self {
        Self {
            backend,
            counting: Arc::clone(store.counting_alerts()),
            stream: Arc::clone(store.stream_alerts()),
            limit: config.limit,
            filter: Mutex::new(AlertFilter {
                unacknowledged_only: config.unacknowledged_only,
            }),
            stream_type: Mutex::new(config.stream_alert_type),
            selection: Mutex::new(BTreeSet::new()),
        }
    }

    #[must_use]
    pub fn filter(&self) -> AlertFilter {
        *lock(&self.filter)
    }

    /// Fetch counting alerts with the current filter, without touching the cell.
    ///
    /// # Errors
    ///
    /// Returns the backend's `FetchError`.
    pub async fn fetch_counting(&self) -> Result<CountingAlerts, FetchError> {
        let filter = self.filter();
        self.backend
            .counting_alerts(self.limit, filter.unacknowledged_only)
            .await
    }

    /// Re-fetch counting alerts with `filter` and replace the held list.
    ///
    /// On failure the previous list stays in place and the error is recorded.
    /// A poll that started before this call can no longer overwrite its result.
    ///
    /// # Errors
    ///
    /// Returns the backend's `FetchError`.
    pub async fn refresh(&self, filter: AlertFilter) -> Result<usize, FetchError> {
        *lock(&self.filter) = filter;
        let ticket = self.counting.ticket();
        let result = self.fetch_counting().await;
        let count = result
            .as_ref()
            .map(|a| a.alerts.len())
            .map_err(FetchError::clone);
        if let Err(e) = &count {
            tracing::warn!(error = %e, "counting alert refresh failed");
        }
        if !self
            .counting
            .set_ordered(ticket, SnapshotUpdate::from_result(result))
        {
            tracing::debug!("counting alert refresh superseded by a later fetch");
        }
        count
    }

    /// Acknowledge `ids`, or every unacknowledged alert on the server when
    /// `None`. One round-trip; on success the selection is cleared and the
    /// list re-fetched, on failure nothing local changes.
    ///
    /// An empty id list is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the backend's `FetchError` when the acknowledge call fails. A
    /// failed refresh after a successful acknowledge is only logged.
    pub async fn acknowledge(&self, ids: Option<Vec<String>>) -> Result<u64, FetchError> {
        if ids.as_ref().is_some_and(Vec::is_empty) {
            return Ok(0);
        }

        let response = match self.backend.acknowledge_alerts(ids.as_deref()).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "acknowledge failed");
                return Err(e);
            }
        };
        tracing::info!(count = response.acknowledged_count, "alerts acknowledged");

        self.clear_selection();
        if let Err(e) = self.refresh(self.filter()).await {
            tracing::warn!(error = %e, "alert list not refreshed after acknowledge");
        }
        Ok(response.acknowledged_count)
    }

    /// Acknowledge the selected alerts.
    ///
    /// # Errors
    ///
    /// Same as [`AlertCoordinator::acknowledge`].
    pub async fn acknowledge_selected(&self) -> Result<u64, FetchError> {
        self.acknowledge(Some(self.selected())).await
    }

    pub fn select(&self, id: impl Into<String>) {
        lock(&self.selection).insert(id.into());
    }

    pub fn deselect(&self, id: &str) {
        lock(&self.selection).remove(id);
    }

    /// Flip `id` in the selection. Returns whether it is now selected.
    pub fn toggle(&self, id: &str) -> bool {
        let mut selection = lock(&self.selection);
        if selection.remove(id) {
            false
        } else {
            selection.insert(id.to_string());
            true
        }
    }

    pub fn set_selection<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *lock(&self.selection) = ids.into_iter().map(Into::into).collect();
    }

    pub fn clear_selection(&self) {
        lock(&self.selection).clear();
    }

    /// Selected ids in sorted order.
    #[must_use]
    pub fn selected(&self) -> Vec<String> {
        lock(&self.selection).iter().cloned().collect()
    }

    /// Currently held counting alerts (last-known-good on failure).
    #[must_use]
    pub fn alerts(&self) -> Vec<CountingAlert> {
        self.counting
            .get()
            .data()
            .map(|a| a.alerts.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn unacknowledged_count(&self) -> usize {
        self.counting
            .get()
            .data()
            .map_or(0, |a| a.alerts.iter().filter(|x| !x.acknowledged).count())
    }

    #[must_use]
    pub fn stream_type(&self) -> Option<StreamAlertType> {
        *lock(&self.stream_type)
    }

    /// Fetch stream alerts with the current type filter.
    ///
    /// # Errors
    ///
    /// Returns the backend's `FetchError`.
    pub async fn fetch_stream(&self) -> Result<StreamAlerts, FetchError> {
        let alert_type = self.stream_type();
        self.backend.stream_alerts(self.limit, alert_type).await
    }

    /// Re-fetch stream alerts with `alert_type` and replace the held list.
    ///
    /// # Errors
    ///
    /// Returns the backend's `FetchError`.
    pub async fn refresh_stream(
        &self,
        alert_type: Option<StreamAlertType>,
    ) -> Result<usize, FetchError> {
        *lock(&self.stream_type) = alert_type;
        let ticket = self.stream.ticket();
        let result = self.fetch_stream().await;
        let count = result
            .as_ref()
            .map(|a| a.alerts.len())
            .map_err(FetchError::clone);
        if let Err(e) = &count {
            tracing::warn!(error = %e, "stream alert refresh failed");
        }
        self.stream
            .set_ordered(ticket, SnapshotUpdate::from_result(result));
        count
    }

    #[must_use]
    pub fn stream_alerts(&self) -> Vec<StreamAlert> {
        self.stream
            .get()
            .data()
            .map(|a| a.alerts.clone())
            .unwrap_or_default()
    }
}
