//! Refresh loop: periodic and triggered re-fetching of the dashboard state.
//!
//! A single tokio task owns the derived [`DashboardState`] and publishes it
//! through a `watch` channel. Fetch cycles run as spawned tasks and report
//! back with the generation they were started under; only the result of the
//! most recently started cycle is applied.
//!
//! ```text
//!   RefreshHandle ──commands──▶ loop task ──spawn──▶ cycle (tokio::join! of 3 fetches)
//!        ▲                         │   ▲                     │
//!        │                         │   └──(generation, CycleResult)
//!        └──── watch::Receiver ◀───┘
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use aquawatch_types::{Alert, ChartSeries, MetricEvaluation, OverallStatus, Reading, TimeRange};

use crate::data::{evaluate, overall_status, synthesize, ThresholdPolicy};
use crate::source::{previous_reading, Fetched, ReadingFetcher};

/// Default time between timer-driven refreshes.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Shortest accepted refresh interval.
const MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Whether a fetch cycle is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Phase {
    #[default]
    Idle,
    Fetching,
}

/// What the dashboard can currently show.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum LoadState {
    /// No cycle has completed yet.
    #[default]
    Loading,
    /// Data from the most recent cycle.
    Ready,
    /// The store is reachable but holds no readings.
    NoData,
    /// The last cycle failed; showing data from an earlier one.
    Stale(String),
    /// Every cycle so far has failed; nothing to show.
    Failed(String),
}

/// Everything the dashboard renders, published after each cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardState {
    pub load: LoadState,
    pub phase: Phase,
    /// The selected time range.
    pub range: TimeRange,
    /// Generation of the cycle whose result this state holds (0 before any).
    pub generation: u64,
    pub latest: Option<Reading>,
    pub evaluations: Vec<MetricEvaluation>,
    pub alerts: Vec<Alert>,
    pub overall: OverallStatus,
    pub chart: ChartSeries,
    /// Readings in the range, newest first.
    pub readings: Vec<Reading>,
    /// When the last cycle finished, successful or not.
    pub updated_at: Option<DateTime<Utc>>,
    /// When the last successful cycle finished.
    pub last_success: Option<DateTime<Utc>>,
}

impl DashboardState {
    /// An empty state waiting for its first cycle.
    pub fn new(range: TimeRange) -> Self {
        Self {
            range,
            ..Self::default()
        }
    }

    /// Whether there are metrics to show.
    pub fn has_data(&self) -> bool {
        !self.evaluations.is_empty()
    }

    /// The current error, if the last cycle failed.
    pub fn error(&self) -> Option<&str> {
        match &self.load {
            LoadState::Stale(e) | LoadState::Failed(e) => Some(e.as_str()),
            _ => None,
        }
    }

    /// Apply a completed cycle.
    ///
    /// A failed cycle keeps the previously derived data and marks it stale,
    /// or marks the state failed if nothing has loaded yet.
    pub fn apply(&mut self, generation: u64, result: CycleResult, policy: &ThresholdPolicy) {
        self.generation = generation;
        self.updated_at = Some(result.finished_at);

        if let Some(error) = result.error() {
            self.load = if self.last_success.is_some() {
                LoadState::Stale(error)
            } else {
                LoadState::Failed(error)
            };
            return;
        }

        self.last_success = Some(result.finished_at);

        let Fetched::Data(latest) = result.latest else {
            self.latest = None;
            self.evaluations.clear();
            self.alerts.clear();
            self.overall = OverallStatus::Optimal;
            self.chart = ChartSeries::empty();
            self.readings.clear();
            self.load = LoadState::NoData;
            return;
        };

        let readings = result.readings.into_vec();
        let previous = previous_reading(&latest, &readings);
        let evaluations = evaluate(policy, &latest, previous);

        self.alerts = synthesize(&evaluations);
        self.overall = overall_status(&evaluations);
        self.evaluations = evaluations;
        self.chart = result.chart.into_option().unwrap_or_default();
        self.readings = readings;
        self.latest = Some(latest);
        self.load = LoadState::Ready;
    }
}

/// Raw results of one fetch cycle.
#[derive(Debug, Clone)]
pub struct CycleResult {
    pub latest: Fetched<Reading>,
    pub readings: Fetched<Vec<Reading>>,
    pub chart: Fetched<ChartSeries>,
    pub finished_at: DateTime<Utc>,
}

impl CycleResult {
    /// The first failure among the three fetches.
    pub fn error(&self) -> Option<String> {
        self.latest
            .error()
            .or_else(|| self.readings.error())
            .or_else(|| self.chart.error())
            .map(str::to_string)
    }
}

/// Run the three fetches of a cycle concurrently.
pub async fn run_cycle(fetcher: &ReadingFetcher, range: TimeRange) -> CycleResult {
    let (latest, readings, chart) = tokio::join!(
        fetcher.fetch_latest(),
        fetcher.fetch_readings(range),
        fetcher.fetch_chart_series(range),
    );

    CycleResult {
        latest,
        readings,
        chart,
        finished_at: Utc::now(),
    }
}

#[derive(Debug)]
enum Command {
    Refresh,
    SetRange(TimeRange),
    Shutdown,
}

/// Why a cycle was started.
#[derive(Debug, Clone, Copy)]
enum Trigger {
    Initial,
    Manual,
    RangeChange,
    Timer,
}

/// Configuration for the refresh loop.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use aquawatch::refresh::RefreshLoop;
/// use aquawatch::source::ReadingFetcher;
/// use aquawatch_adapters::MemoryStore;
///
/// # tokio_test::block_on(async {
/// let fetcher = ReadingFetcher::new(Arc::new(MemoryStore::new()));
/// let handle = RefreshLoop::new(fetcher)
///     .interval(Duration::from_secs(10))
///     .spawn();
///
/// let mut state = handle.subscribe();
/// state.changed().await.unwrap();
/// handle.shutdown().await;
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct RefreshLoop {
    fetcher: ReadingFetcher,
    policy: ThresholdPolicy,
    interval: Duration,
    range: TimeRange,
}

impl RefreshLoop {
    /// Create a loop with the default interval, range and thresholds.
    pub fn new(fetcher: ReadingFetcher) -> Self {
        Self {
            fetcher,
            policy: ThresholdPolicy::default(),
            interval: DEFAULT_INTERVAL,
            range: TimeRange::default(),
        }
    }

    /// Set the time between timer-driven refreshes.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_INTERVAL);
        self
    }

    /// Set the initial time range.
    pub fn range(mut self, range: TimeRange) -> Self {
        self.range = range;
        self
    }

    /// Set the threshold policy used for classification.
    pub fn policy(mut self, policy: ThresholdPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Start the loop on the current tokio runtime.
    ///
    /// The first cycle starts immediately.
    pub fn spawn(self) -> RefreshHandle {
        let (commands_tx, commands_rx) = mpsc::channel(16);
        let (results_tx, results_rx) = mpsc::channel(16);
        let (state_tx, state_rx) = watch::channel(DashboardState::new(self.range));

        let task = LoopTask {
            fetcher: self.fetcher,
            policy: self.policy,
            interval: self.interval,
            state: DashboardState::new(self.range),
            state_tx,
            commands: commands_rx,
            results_tx,
            results: results_rx,
            generation: 0,
            in_flight: None,
            cycle_running: false,
        };

        RefreshHandle {
            commands: commands_tx,
            state: state_rx,
            task: tokio::spawn(task.run()),
        }
    }
}

/// Control and observation handle for a running refresh loop.
///
/// Dropping the handle stops the loop.
#[derive(Debug)]
pub struct RefreshHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<DashboardState>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Start a cycle now and restart the timer.
    pub fn refresh(&self) {
        self.send(Command::Refresh);
    }

    /// Switch the time range, start a cycle now and restart the timer.
    pub fn set_range(&self, range: TimeRange) {
        self.send(Command::SetRange(range));
    }

    /// A new receiver for published states.
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.clone()
    }

    /// A copy of the most recently published state.
    pub fn current(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    /// Stop the loop and wait for it to exit.
    ///
    /// Results of cycles still in flight are never published.
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown).await;
        if let Err(e) = self.task.await {
            if e.is_panic() {
                tracing::error!("refresh loop panicked");
            }
        }
    }

    fn send(&self, command: Command) {
        if let Err(e) = self.commands.try_send(command) {
            tracing::warn!(error = %e, "refresh command dropped");
        }
    }
}

/// State owned by the loop task.
struct LoopTask {
    fetcher: ReadingFetcher,
    policy: ThresholdPolicy,
    interval: Duration,
    state: DashboardState,
    state_tx: watch::Sender<DashboardState>,
    commands: mpsc::Receiver<Command>,
    results_tx: mpsc::Sender<(u64, CycleResult)>,
    results: mpsc::Receiver<(u64, CycleResult)>,
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
    /// Whether the current generation's cycle has yet to report back.
    cycle_running: bool,
}

impl LoopTask {
    async fn run(mut self) {
        tracing::info!(
            store = self.fetcher.description(),
            range = %self.state.range,
            interval = ?self.interval,
            "refresh loop started"
        );

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.start_cycle(Trigger::Initial);

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Refresh) => {
                        self.start_cycle(Trigger::Manual);
                        ticker.reset();
                    }
                    Some(Command::SetRange(range)) => {
                        tracing::info!(%range, "time range changed");
                        self.state.range = range;
                        self.start_cycle(Trigger::RangeChange);
                        ticker.reset();
                    }
                    Some(Command::Shutdown) | None => break,
                },
                _ = ticker.tick() => {
                    // Manual and range-change cycles may replace a running one; the timer waits
                    if self.cycle_running {
                        tracing::debug!(generation = self.generation, "cycle still running, skipping tick");
                    } else {
                        self.start_cycle(Trigger::Timer);
                    }
                }
                Some((generation, result)) = self.results.recv() => {
                    self.complete(generation, result);
                }
                _ = self.state_tx.closed() => break,
            }
        }

        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
        tracing::info!("refresh loop stopped");
    }

    fn start_cycle(&mut self, trigger: Trigger) {
        self.generation += 1;
        let generation = self.generation;
        let range = self.state.range;
        let fetcher = self.fetcher.clone();
        let results = self.results_tx.clone();

        tracing::debug!(generation, %range, ?trigger, "starting refresh cycle");

        // A superseded cycle keeps running; its result is discarded on arrival
        self.in_flight = Some(tokio::spawn(async move {
            let result = run_cycle(&fetcher, range).await;
            let _ = results.send((generation, result)).await;
        }));

        self.cycle_running = true;
        self.state.phase = Phase::Fetching;
        self.publish();
    }

    fn complete(&mut self, generation: u64, result: CycleResult) {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "discarding stale cycle");
            return;
        }

        self.cycle_running = false;
        self.state.phase = Phase::Idle;
        self.state.apply(generation, result, &self.policy);

        match &self.state.load {
            LoadState::Ready => tracing::debug!(
                generation,
                overall = %self.state.overall,
                alerts = self.state.alerts.len(),
                readings = self.state.readings.len(),
                "refresh cycle complete"
            ),
            LoadState::NoData => tracing::debug!(generation, "refresh cycle found no readings"),
            LoadState::Stale(e) | LoadState::Failed(e) => {
                tracing::warn!(generation, error = %e, "refresh cycle failed")
            }
            LoadState::Loading => {}
        }

        self.publish();
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use aquawatch_adapters::{AdapterError, MemoryStore, ReadingStore};
    use aquawatch_types::{Parameter, Status};

    fn reading(id: &str, minutes_ago: i64, ph: f64) -> Reading {
        Reading::builder()
            .id(id)
            .created_at(Utc::now() - chrono::Duration::minutes(minutes_ago))
            .ph(ph)
            .temperature(22.0)
            .turbidity(0.5)
            .tds(300.0)
            .build()
    }

    fn fetcher(store: impl ReadingStore + 'static) -> ReadingFetcher {
        ReadingFetcher::new(Arc::new(store))
    }

    async fn wait_for(
        rx: &mut watch::Receiver<DashboardState>,
        pred: impl Fn(&DashboardState) -> bool,
    ) -> DashboardState {
        loop {
            {
                let state = rx.borrow_and_update();
                if pred(&state) {
                    return state.clone();
                }
            }
            rx.changed().await.unwrap();
        }
    }

    fn settled(generation: u64) -> impl Fn(&DashboardState) -> bool {
        move |s| s.generation == generation && s.phase == Phase::Idle
    }

    /// Delays range queries wider than two hours.
    #[derive(Debug, Clone)]
    struct SlowWideStore {
        inner: MemoryStore,
        delay: Duration,
    }

    #[async_trait]
    impl ReadingStore for SlowWideStore {
        async fn latest(&self, limit: usize) -> Result<Vec<Reading>, AdapterError> {
            self.inner.latest(limit).await
        }

        async fn created_after(
            &self,
            after: DateTime<Utc>,
            limit: usize,
        ) -> Result<Vec<Reading>, AdapterError> {
            if Utc::now() - after > chrono::Duration::hours(2) {
                time::sleep(self.delay).await;
            }
            self.inner.created_after(after, limit).await
        }

        fn description(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_cycle_publishes_evaluations() {
        let store = MemoryStore::with_readings([reading("prev", 5, 7.2), reading("latest", 1, 7.0)]);
        let handle = RefreshLoop::new(fetcher(store)).spawn();
        let mut rx = handle.subscribe();

        let state = wait_for(&mut rx, settled(1)).await;
        assert_eq!(state.load, LoadState::Ready);
        assert_eq!(state.evaluations.len(), 4);
        assert_eq!(state.latest.as_ref().map(|r| r.id.as_str()), Some("latest"));

        let ph = &state.evaluations[0];
        assert_eq!(ph.parameter, Parameter::Ph);
        assert_eq!(ph.status, Status::Good);
        assert!((ph.trend + 2.78).abs() < 0.01);

        assert!(state.alerts.is_empty());
        assert_eq!(state.overall, OverallStatus::Optimal);
        assert_eq!(state.chart.len(), 2);
        assert_eq!(state.readings.len(), 2);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_alerts_follow_evaluations() {
        let store = MemoryStore::with_readings([Reading::builder()
            .id("bad")
            .created_at(Utc::now())
            .ph(6.7)
            .temperature(22.0)
            .turbidity(6.0)
            .tds(300.0)
            .build()]);
        let handle = RefreshLoop::new(fetcher(store)).spawn();
        let mut rx = handle.subscribe();

        let state = wait_for(&mut rx, settled(1)).await;
        assert_eq!(state.alerts.len(), 2);
        assert_eq!(state.alerts[0].title, "Warning: PH");
        assert_eq!(state.alerts[1].title, "Critical: TURBIDITY");
        assert_eq!(state.overall, OverallStatus::Critical);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_store_is_no_data() {
        let handle = RefreshLoop::new(fetcher(MemoryStore::new())).spawn();
        let mut rx = handle.subscribe();

        let state = wait_for(&mut rx, settled(1)).await;
        assert_eq!(state.load, LoadState::NoData);
        assert!(state.evaluations.is_empty());
        assert!(state.alerts.is_empty());
        assert!(state.chart.is_empty());
        assert!(!state.has_data());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_every_interval() {
        let store = MemoryStore::with_readings([reading("a", 1, 7.0)]);
        let handle = RefreshLoop::new(fetcher(store.clone()))
            .interval(Duration::from_secs(30))
            .spawn();
        let mut rx = handle.subscribe();
        let start = Instant::now();

        wait_for(&mut rx, settled(1)).await;
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(store.query_count(), 3);

        wait_for(&mut rx, settled(2)).await;
        assert!(start.elapsed() >= Duration::from_secs(30));
        assert!(start.elapsed() < Duration::from_secs(31));
        assert_eq!(store.query_count(), 6);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh_resets_timer() {
        let store = MemoryStore::with_readings([reading("a", 1, 7.0)]);
        let handle = RefreshLoop::new(fetcher(store))
            .interval(Duration::from_secs(30))
            .spawn();
        let mut rx = handle.subscribe();

        wait_for(&mut rx, settled(1)).await;
        time::advance(Duration::from_secs(10)).await;

        let refreshed_at = Instant::now();
        handle.refresh();
        wait_for(&mut rx, settled(2)).await;
        assert!(refreshed_at.elapsed() < Duration::from_secs(1));

        wait_for(&mut rx, settled(3)).await;
        assert!(refreshed_at.elapsed() >= Duration::from_secs(30));
        assert!(refreshed_at.elapsed() < Duration::from_secs(31));

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_generation_is_discarded() {
        let store = SlowWideStore {
            inner: MemoryStore::with_readings([reading("recent", 10, 7.0), reading("old", 180, 7.1)]),
            delay: Duration::from_secs(10),
        };
        let handle = RefreshLoop::new(fetcher(store))
            .range(TimeRange::Day)
            .interval(Duration::from_secs(60))
            .spawn();
        let mut rx = handle.subscribe();

        // Supersede the slow 24h cycle with a fast 1h one
        handle.set_range(TimeRange::Hour);
        let state = wait_for(&mut rx, settled(2)).await;
        assert_eq!(state.range, TimeRange::Hour);
        assert_eq!(state.readings.len(), 1);

        // Let the superseded cycle finish
        time::sleep(Duration::from_secs(15)).await;
        let state = handle.current();
        assert_eq!(state.generation, 2);
        assert_eq!(state.readings.len(), 1);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_slower_than_interval_still_settles() {
        let store = SlowWideStore {
            inner: MemoryStore::with_readings([reading("recent", 10, 7.0), reading("old", 180, 7.1)]),
            delay: Duration::from_secs(8),
        };
        let handle = RefreshLoop::new(fetcher(store))
            .range(TimeRange::Week)
            .interval(Duration::from_secs(5))
            .spawn();
        let mut rx = handle.subscribe();
        let start = Instant::now();

        // The tick at 5s lands while the first cycle is running and must not replace it
        let state = wait_for(&mut rx, settled(1)).await;
        assert!(start.elapsed() >= Duration::from_secs(8));
        assert_eq!(state.load, LoadState::Ready);
        assert_eq!(state.readings.len(), 2);

        let state = wait_for(&mut rx, settled(2)).await;
        assert_eq!(state.load, LoadState::Ready);
        assert!(state.has_data());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_last_known_good() {
        let store = MemoryStore::with_readings([reading("a", 1, 9.0)]);
        let handle = RefreshLoop::new(fetcher(store.clone())).spawn();
        let mut rx = handle.subscribe();

        let good = wait_for(&mut rx, settled(1)).await;
        assert_eq!(good.load, LoadState::Ready);

        store.fail_with(AdapterError::Connection("refused".into()));
        handle.refresh();

        let stale = wait_for(&mut rx, settled(2)).await;
        assert!(matches!(stale.load, LoadState::Stale(_)));
        assert!(stale.error().is_some_and(|e| e.contains("refused")));
        assert_eq!(stale.evaluations, good.evaluations);
        assert_eq!(stale.alerts, good.alerts);
        assert_eq!(stale.last_success, good.last_success);

        store.clear_failure();
        handle.refresh();
        let recovered = wait_for(&mut rx, settled(3)).await;
        assert_eq!(recovered.load, LoadState::Ready);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_on_first_load() {
        let store = MemoryStore::new();
        store.fail_with(AdapterError::Timeout);
        let handle = RefreshLoop::new(fetcher(store)).spawn();
        let mut rx = handle.subscribe();

        let state = wait_for(&mut rx, settled(1)).await;
        assert_eq!(state.load, LoadState::Failed("Request timed out".into()));
        assert!(!state.has_data());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_drops_in_flight_results() {
        let store = SlowWideStore {
            inner: MemoryStore::with_readings([reading("a", 1, 7.0)]),
            delay: Duration::from_secs(10),
        };
        let handle = RefreshLoop::new(fetcher(store)).range(TimeRange::Week).spawn();
        let mut rx = handle.subscribe();

        wait_for(&mut rx, |s| s.phase == Phase::Fetching).await;
        handle.shutdown().await;

        time::sleep(Duration::from_secs(20)).await;
        let state = rx.borrow().clone();
        assert_eq!(state.load, LoadState::Loading);
        assert!(rx.has_changed().is_err());
    }

    #[test]
    fn test_apply_empty_after_data_clears_state() {
        let policy = ThresholdPolicy::default();
        let mut state = DashboardState::new(TimeRange::Day);
        let latest = reading("a", 1, 7.0);

        state.apply(
            1,
            CycleResult {
                latest: Fetched::Data(latest.clone()),
                readings: Fetched::Data(vec![latest]),
                chart: Fetched::Empty,
                finished_at: Utc::now(),
            },
            &policy,
        );
        assert!(state.has_data());

        state.apply(
            2,
            CycleResult {
                latest: Fetched::Empty,
                readings: Fetched::Empty,
                chart: Fetched::Empty,
                finished_at: Utc::now(),
            },
            &policy,
        );
        assert_eq!(state.load, LoadState::NoData);
        assert!(!state.has_data());
        assert!(state.latest.is_none());
    }
}
