//! In-process reading store.
//!
//! Holds readings in memory and answers queries the same way a document
//! store would. Useful for tests, demos and replaying recorded data. A failure
//! can be injected to exercise the degraded paths of callers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use aquawatch_types::Reading;

use crate::store::select_newest;
use crate::{AdapterError, ReadingStore};

/// A store backed by a shared in-memory vector.
///
/// Cloning a `MemoryStore` yields a handle to the same readings, so a test
/// can keep one handle for inserting while the pipeline queries another.
///
/// # Example
///
/// ```
/// use aquawatch_adapters::{MemoryStore, ReadingStore};
/// use aquawatch_types::Reading;
///
/// # tokio_test::block_on(async {
/// let store = MemoryStore::new();
/// store.insert(Reading::builder().id("a").ph(7.0).build());
///
/// let latest = store.latest(1).await.unwrap();
/// assert_eq!(latest[0].id, "a");
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    readings: Arc<RwLock<Vec<Reading>>>,
    failure: Arc<RwLock<Option<AdapterError>>>,
    queries: Arc<AtomicU64>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with readings.
    pub fn with_readings(readings: impl IntoIterator<Item = Reading>) -> Self {
        let store = Self::new();
        store.extend(readings);
        store
    }

    /// Add a reading.
    pub fn insert(&self, reading: Reading) {
        self.readings.write().push(reading);
    }

    /// Add several readings.
    pub fn extend(&self, readings: impl IntoIterator<Item = Reading>) {
        self.readings.write().extend(readings);
    }

    /// Remove every reading.
    pub fn clear(&self) {
        self.readings.write().clear();
    }

    /// Number of stored readings.
    pub fn len(&self) -> usize {
        self.readings.read().len()
    }

    /// Check if the store holds no readings.
    pub fn is_empty(&self) -> bool {
        self.readings.read().is_empty()
    }

    /// Make every subsequent query fail with `error` until cleared.
    pub fn fail_with(&self, error: AdapterError) {
        *self.failure.write() = Some(error);
    }

    /// Stop injecting failures.
    pub fn clear_failure(&self) {
        *self.failure.write() = None;
    }

    /// Number of queries answered (or failed) so far.
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    fn begin_query(&self) -> Result<(), AdapterError> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        match self.failure.read().as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn latest(&self, limit: usize) -> Result<Vec<Reading>, AdapterError> {
        self.begin_query()?;
        Ok(select_newest(&self.readings.read(), None, limit))
    }

    async fn created_after(
        &self,
        after: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Reading>, AdapterError> {
        self.begin_query()?;
        Ok(select_newest(&self.readings.read(), Some(after), limit))
    }

    fn description(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    #[tokio::test]
    async fn test_empty_store_returns_empty_list() {
        let store = MemoryStore::new();
        assert!(store.latest(1).await.unwrap().is_empty());
        assert!(store.created_after(at(0), 100).await.unwrap().is_empty());
        assert_eq!(store.query_count(), 2);
    }

    #[tokio::test]
    async fn test_latest_and_created_after() {
        let store = MemoryStore::with_readings((0..5).map(|i| {
            Reading::builder()
                .id(format!("r{}", i))
                .created_at(at(i * 10))
                .build()
        }));

        let latest = store.latest(1).await.unwrap();
        assert_eq!(latest[0].id, "r4");

        let recent = store.created_after(at(15), 100).await.unwrap();
        let ids: Vec<&str> = recent.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r4", "r3", "r2"]);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryStore::new();
        store.fail_with(AdapterError::Timeout);
        assert_eq!(store.latest(1).await, Err(AdapterError::Timeout));

        store.clear_failure();
        assert!(store.latest(1).await.is_ok());
    }

    #[tokio::test]
    async fn test_clones_share_readings() {
        let store = MemoryStore::new();
        let handle = store.clone();
        handle.insert(Reading::builder().id("shared").build());
        assert_eq!(store.len(), 1);
        handle.clear();
        assert!(store.is_empty());
    }
}
