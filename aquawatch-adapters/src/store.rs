//! The store abstraction shared by every adapter.

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use aquawatch_types::Reading;

use crate::AdapterError;

/// Read access to a collection of sensor readings.
///
/// Implementations only ever read; the store is populated by sensor
/// ingestion elsewhere. Both queries return readings ordered by creation time
/// descending (newest first). An empty store yields `Ok(vec![])`, never an
/// error.
#[async_trait]
pub trait ReadingStore: Send + Sync + Debug {
    /// The `limit` most recent readings, newest first.
    async fn latest(&self, limit: usize) -> Result<Vec<Reading>, AdapterError>;

    /// Readings created strictly after `after`, newest first, at most `limit`.
    async fn created_after(
        &self,
        after: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Reading>, AdapterError>;

    /// Returns a human-readable description of the store.
    ///
    /// Used for display in the dashboard status bar.
    fn description(&self) -> &str;
}

/// Order readings newest first and apply the query filters in memory.
///
/// Shared by stores that hold their readings locally rather than delegating
/// the query to a server.
pub fn select_newest(
    readings: &[Reading],
    after: Option<DateTime<Utc>>,
    limit: usize,
) -> Vec<Reading> {
    let mut selected: Vec<Reading> = readings
        .iter()
        .filter(|r| after.map_or(true, |after| r.created_at > after))
        .cloned()
        .collect();
    selected.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    selected.truncate(limit);
    selected
}
