//! Reading fetcher over a [`ReadingStore`].
//!
//! The fetcher is the error boundary of the pipeline: store failures are
//! logged here and never travel further as error values. Each query exists in
//! two forms:
//!
//! - `fetch_*` returns a [`Fetched`] so callers can tell "no data" from
//!   "fetch failed"
//! - `get_*` collapses that into `None` / an empty list / an empty chart
//!
//! [`FileStore`] is a store backed by a JSON file on disk.

mod file;

pub use file::FileStore;

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};

use aquawatch_adapters::ReadingStore;
use aquawatch_types::{ChartSeries, Parameter, Reading, Series, TimeRange};

/// Default cap on readings returned for a time range.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Outcome of a fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    /// The store returned data.
    Data(T),
    /// The store answered, but had nothing.
    Empty,
    /// The store could not be queried. Carries the error message.
    Failed(String),
}

impl<T> Fetched<T> {
    /// The data, if any.
    pub fn into_option(self) -> Option<T> {
        match self {
            Fetched::Data(v) => Some(v),
            Fetched::Empty | Fetched::Failed(_) => None,
        }
    }

    /// The failure message, if the fetch failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            Fetched::Failed(e) => Some(e.as_str()),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Fetched::Failed(_))
    }

    /// Map the data, keeping `Empty` and `Failed` as they are.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Fetched::Data(v) => Fetched::Data(f(v)),
            Fetched::Empty => Fetched::Empty,
            Fetched::Failed(e) => Fetched::Failed(e),
        }
    }
}

impl<T> Fetched<Vec<T>> {
    /// The list, empty unless the fetch returned data.
    pub fn into_vec(self) -> Vec<T> {
        self.into_option().unwrap_or_default()
    }
}

/// Queries the store on behalf of the dashboard.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use aquawatch::source::ReadingFetcher;
/// use aquawatch_adapters::MemoryStore;
/// use aquawatch_types::Reading;
///
/// # tokio_test::block_on(async {
/// let store = MemoryStore::with_readings([Reading::builder().id("a").build()]);
/// let fetcher = ReadingFetcher::new(Arc::new(store));
///
/// let latest = fetcher.get_latest().await;
/// assert_eq!(latest.map(|r| r.id), Some("a".to_string()));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct ReadingFetcher {
    store: Arc<dyn ReadingStore>,
    page_size: usize,
}

impl ReadingFetcher {
    /// Create a fetcher with the default page size.
    pub fn new(store: Arc<dyn ReadingStore>) -> Self {
        Self {
            store,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the cap on readings returned for a time range.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Description of the underlying store.
    pub fn description(&self) -> &str {
        self.store.description()
    }

    /// The most recent reading.
    pub async fn fetch_latest(&self) -> Fetched<Reading> {
        match self.store.latest(1).await {
            Ok(readings) => match readings.into_iter().next() {
                Some(reading) => Fetched::Data(reading),
                None => Fetched::Empty,
            },
            Err(e) => {
                tracing::warn!(error = %e, store = self.description(), "failed to fetch latest reading");
                Fetched::Failed(e.to_string())
            }
        }
    }

    /// Readings within `range` of now, newest first.
    pub async fn fetch_readings(&self, range: TimeRange) -> Fetched<Vec<Reading>> {
        self.fetch_readings_at(range, Utc::now()).await
    }

    /// Readings within `range` of `now`, newest first.
    pub async fn fetch_readings_at(
        &self,
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> Fetched<Vec<Reading>> {
        let after = range.start_from(now);
        match self.store.created_after(after, self.page_size).await {
            Ok(readings) if readings.is_empty() => Fetched::Empty,
            Ok(mut readings) => {
                // Stores are expected to sort, but the pipeline relies on it
                readings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                readings.truncate(self.page_size);
                Fetched::Data(readings)
            }
            Err(e) => {
                tracing::warn!(error = %e, %range, store = self.description(), "failed to fetch readings");
                Fetched::Failed(e.to_string())
            }
        }
    }

    /// Chart series for `range`, in chronological order.
    pub async fn fetch_chart_series(&self, range: TimeRange) -> Fetched<ChartSeries> {
        self.fetch_readings(range)
            .await
            .map(|readings| chart_series(&readings, range))
    }

    /// The most recent reading, `None` if the store is empty or unreachable.
    pub async fn get_latest(&self) -> Option<Reading> {
        self.fetch_latest().await.into_option()
    }

    /// Readings within `range`, empty if none or unreachable.
    pub async fn get_readings(&self, range: TimeRange) -> Vec<Reading> {
        self.fetch_readings(range).await.into_vec()
    }

    /// Chart series for `range`, empty if none or unreachable.
    pub async fn get_chart_series(&self, range: TimeRange) -> ChartSeries {
        self.fetch_chart_series(range).await.into_option().unwrap_or_default()
    }
}

/// Shape newest-first readings into chronological chart series.
///
/// Timestamps are rendered in local time: `%H:%M:%S` for ranges up to a day,
/// `%m-%d %H:%M` for longer ones.
pub fn chart_series(readings: &[Reading], range: TimeRange) -> ChartSeries {
    if readings.is_empty() {
        return ChartSeries::empty();
    }

    let chronological: Vec<&Reading> = readings.iter().rev().collect();
    let format = timestamp_format(range);

    let timestamps = chronological
        .iter()
        .map(|r| r.created_at.with_timezone(&Local).format(format).to_string())
        .collect();

    let series = Parameter::ALL
        .iter()
        .map(|&parameter| Series {
            label: parameter.series_label().to_string(),
            parameter,
            values: chronological.iter().map(|r| r.value(parameter)).collect(),
        })
        .collect();

    ChartSeries { timestamps, series }
}

fn timestamp_format(range: TimeRange) -> &'static str {
    match range {
        TimeRange::Hour | TimeRange::Day => "%H:%M:%S",
        TimeRange::Week | TimeRange::Month => "%m-%d %H:%M",
    }
}

/// The reading to compare `latest` against for trends.
///
/// This is the first entry of the newest-first `readings` strictly older than
/// `latest`, which stays correct if a reading lands between the two queries.
pub fn previous_reading<'a>(latest: &Reading, readings: &'a [Reading]) -> Option<&'a Reading> {
    readings.iter().find(|r| r.created_at < latest.created_at)
}
