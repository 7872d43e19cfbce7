//! Application state and navigation logic.

use std::cell::Cell;
use std::path::Path;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local, Utc};
use tokio::sync::watch;

use aquawatch_types::Reading;

use crate::data::{assess, count_issues, NotificationLog, ThresholdPolicy};
use crate::refresh::{DashboardState, LoadState, RefreshHandle, DEFAULT_INTERVAL};
use crate::ui::Theme;

/// How long a status message stays in the status bar.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Overall status, metric cards, alerts and sparklines.
    Dashboard,
    /// Readings in the selected range with quality assessment.
    History,
    /// Log of alert onsets.
    Notifications,
    /// The active threshold policy.
    Thresholds,
    About,
}

impl View {
    pub const ALL: [View; 5] = [
        View::Dashboard,
        View::History,
        View::Notifications,
        View::Thresholds,
        View::About,
    ];

    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::Dashboard => View::History,
            View::History => View::Notifications,
            View::Notifications => View::Thresholds,
            View::Thresholds => View::About,
            View::About => View::Dashboard,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        match self {
            View::Dashboard => View::About,
            View::History => View::Dashboard,
            View::Notifications => View::History,
            View::Thresholds => View::Notifications,
            View::About => View::Thresholds,
        }
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::History => "History",
            View::Notifications => "Notifications",
            View::Thresholds => "Thresholds",
            View::About => "About",
        }
    }

    /// Position in the tab bar.
    pub fn index(&self) -> usize {
        match self {
            View::Dashboard => 0,
            View::History => 1,
            View::Notifications => 2,
            View::Thresholds => 3,
            View::About => 4,
        }
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    // Refresh loop
    handle: RefreshHandle,
    state_rx: watch::Receiver<DashboardState>,
    pub state: DashboardState,
    seen_generation: u64,

    pub policy: ThresholdPolicy,
    pub notifications: NotificationLog,
    pub source_description: String,
    pub refresh_interval: Duration,

    // Navigation state
    pub selected_reading_index: usize,
    pub selected_notification_index: usize,
    /// First visible row of each table, as left by the last render.
    pub history_offset: Cell<usize>,
    pub notification_offset: Cell<usize>,

    // Search/filter (History view)
    pub filter_text: String,
    pub filter_active: bool,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App observing a running refresh loop.
    pub fn new(handle: RefreshHandle, policy: ThresholdPolicy) -> Self {
        let state_rx = handle.subscribe();
        let state = state_rx.borrow().clone();
        let mut app = Self {
            running: true,
            current_view: View::Dashboard,
            show_help: false,
            handle,
            state_rx,
            state: DashboardState::default(),
            seen_generation: 0,
            policy,
            notifications: NotificationLog::new(),
            source_description: String::new(),
            refresh_interval: DEFAULT_INTERVAL,
            selected_reading_index: 0,
            selected_notification_index: 0,
            history_offset: Cell::new(0),
            notification_offset: Cell::new(0),
            filter_text: String::new(),
            filter_active: false,
            theme: Theme::dark(),
            status_message: None,
        };
        app.accept(state);
        app
    }

    /// Set the data source description and refresh interval shown in About.
    pub fn with_source_info(mut self, description: impl Into<String>, interval: Duration) -> Self {
        self.source_description = description.into();
        self.refresh_interval = interval;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Stop observing and hand back the refresh loop handle.
    pub fn into_handle(self) -> RefreshHandle {
        self.handle
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, time)) if time.elapsed() < STATUS_MESSAGE_TTL => Some(msg),
            _ => None,
        }
    }

    /// Pick up the latest published state.
    ///
    /// Returns true if a new state was taken.
    pub fn sync(&mut self) -> bool {
        if !matches!(self.state_rx.has_changed(), Ok(true)) {
            return false;
        }
        let state = self.state_rx.borrow_and_update().clone();
        self.accept(state);
        true
    }

    fn accept(&mut self, state: DashboardState) {
        if state.generation != self.seen_generation {
            match state.load {
                LoadState::Ready => {
                    let now = state.updated_at.unwrap_or_else(Utc::now);
                    let added = self.notifications.record(&state.alerts, now);
                    if added > 0 {
                        tracing::info!(added, unread = self.notifications.unread_count(), "new alerts");
                    }
                }
                LoadState::NoData => {
                    self.notifications.record(&[], Utc::now());
                }
                // Failed cycles say nothing about which alerts are active
                LoadState::Loading | LoadState::Stale(_) | LoadState::Failed(_) => {}
            }
            self.seen_generation = state.generation;
        }
        self.state = state;
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let readings = self.filtered_readings().len();
        self.selected_reading_index = self.selected_reading_index.min(readings.saturating_sub(1));
        let notifications = self.notifications.len();
        self.selected_notification_index =
            self.selected_notification_index.min(notifications.saturating_sub(1));
    }

    /// Ask the loop for a cycle now.
    pub fn refresh(&mut self) {
        self.handle.refresh();
        self.set_status_message("Refreshing...".to_string());
    }

    /// Switch to the next time range.
    pub fn next_range(&mut self) {
        self.change_range(self.state.range.next());
    }

    /// Switch to the previous time range.
    pub fn prev_range(&mut self) {
        self.change_range(self.state.range.prev());
    }

    fn change_range(&mut self, range: aquawatch_types::TimeRange) {
        self.handle.set_range(range);
        self.state.range = range;
        self.selected_reading_index = 0;
        self.set_status_message(format!("Range: {}", range));
    }

    /// Switch to the next view.
    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.current_view = self.current_view.prev();
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection up by one item.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move selection down by n items.
    pub fn select_next_n(&mut self, n: usize) {
        match self.current_view {
            View::History => {
                let max = self.filtered_readings().len().saturating_sub(1);
                self.selected_reading_index = (self.selected_reading_index + n).min(max);
            }
            View::Notifications => {
                let max = self.notifications.len().saturating_sub(1);
                self.selected_notification_index = (self.selected_notification_index + n).min(max);
            }
            _ => {}
        }
    }

    /// Move selection up by n items.
    pub fn select_prev_n(&mut self, n: usize) {
        match self.current_view {
            View::History => {
                self.selected_reading_index = self.selected_reading_index.saturating_sub(n);
            }
            View::Notifications => {
                self.selected_notification_index =
                    self.selected_notification_index.saturating_sub(n);
            }
            _ => {}
        }
    }

    /// Jump to the first item in the list.
    pub fn select_first(&mut self) {
        match self.current_view {
            View::History => self.selected_reading_index = 0,
            View::Notifications => self.selected_notification_index = 0,
            _ => {}
        }
    }

    /// Select the item shown on a visible table row, counting from the first row below the header.
    ///
    /// Rows past the end of the list are ignored.
    pub fn select_visible_row(&mut self, row: usize) {
        match self.current_view {
            View::History => {
                let index = self.history_offset.get() + row;
                if index < self.filtered_readings().len() {
                    self.selected_reading_index = index;
                }
            }
            View::Notifications => {
                let index = self.notification_offset.get() + row;
                if index < self.notifications.len() {
                    self.selected_notification_index = index;
                }
            }
            _ => {}
        }
    }

    /// Jump to the last item in the list.
    pub fn select_last(&mut self) {
        match self.current_view {
            View::History => {
                self.selected_reading_index = self.filtered_readings().len().saturating_sub(1);
            }
            View::Notifications => {
                self.selected_notification_index = self.notifications.len().saturating_sub(1);
            }
            _ => {}
        }
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Enter filter input mode (starts capturing keystrokes for search).
    pub fn start_filter(&mut self) {
        self.current_view = View::History;
        self.filter_active = true;
    }

    /// Exit filter input mode without clearing the filter text.
    pub fn cancel_filter(&mut self) {
        self.filter_active = false;
    }

    /// Clear the filter text and exit filter mode.
    pub fn clear_filter(&mut self) {
        self.filter_text.clear();
        self.filter_active = false;
    }

    /// Append a character to the filter text.
    pub fn filter_push(&mut self, c: char) {
        self.filter_text.push(c);
        self.selected_reading_index = 0;
    }

    /// Remove the last character from the filter text.
    pub fn filter_pop(&mut self) {
        self.filter_text.pop();
    }

    /// Check if a reading matches the current filter.
    ///
    /// The filter is matched against the reading id, its local timestamp and
    /// its quality assessment.
    pub fn matches_filter(&self, reading: &Reading) -> bool {
        if self.filter_text.is_empty() {
            return true;
        }
        let search = self.filter_text.to_lowercase();
        reading.id.to_lowercase().contains(&search)
            || format_local(reading.created_at).contains(&search)
            || assess(reading).to_string().to_lowercase().contains(&search)
    }

    /// Readings in the current range that pass the filter, newest first.
    pub fn filtered_readings(&self) -> Vec<&Reading> {
        self.state.readings.iter().filter(|r| self.matches_filter(r)).collect()
    }

    /// The reading selected in the History view.
    pub fn selected_reading(&self) -> Option<&Reading> {
        self.filtered_readings().get(self.selected_reading_index).copied()
    }

    /// Mark the selected notification read.
    pub fn mark_selected_read(&mut self) {
        if let Some(id) = self.notifications.get(self.selected_notification_index).map(|n| n.id) {
            self.notifications.mark_read(id);
        }
    }

    pub fn mark_all_read(&mut self) {
        self.notifications.mark_all_read();
        self.set_status_message("All notifications marked as read".to_string());
    }

    /// Delete the selected notification.
    pub fn delete_selected(&mut self) {
        if let Some(id) = self.notifications.get(self.selected_notification_index).map(|n| n.id) {
            self.notifications.delete(id);
            self.clamp_selection();
        }
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export current state to a file.
    pub fn export_state(&self, path: &Path) -> anyhow::Result<()> {
        if !self.state.has_data() {
            anyhow::bail!("No data to export");
        }

        let mut export = export_document(&self.state, &self.source_description);
        if let serde_json::Value::Object(ref mut map) = export {
            let notifications: Vec<_> = self.notifications.entries().collect();
            map.insert("notifications".to_string(), serde_json::json!(notifications));
        }

        let json = serde_json::to_string_pretty(&export)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "exported dashboard state");
        Ok(())
    }
}

/// Format a timestamp in local time for tables.
pub fn format_local(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// JSON document describing a dashboard state.
pub fn export_document(state: &DashboardState, source: &str) -> serde_json::Value {
    let (warning, critical) = count_issues(&state.evaluations);
    let good = state.evaluations.len() - warning - critical;

    serde_json::json!({
        "source": source,
        "range": state.range.as_str(),
        "updated_at": state.updated_at,
        "load": state.load,
        "summary": {
            "overall": state.overall.to_string(),
            "good": good,
            "warning": warning,
            "critical": critical,
            "readings": state.readings.len(),
        },
        "latest": state.latest,
        "metrics": state.evaluations,
        "alerts": state.alerts,
        "chart": state.chart,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use aquawatch_adapters::MemoryStore;
    use aquawatch_types::{Parameter, Severity, TimeRange};

    use crate::refresh::RefreshLoop;
    use crate::source::ReadingFetcher;

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

    async fn ready_app(store: Arc<MemoryStore>) -> App {
        let handle = RefreshLoop::new(ReadingFetcher::new(store)).spawn();
        let mut rx = handle.subscribe();
        rx.wait_for(|s| s.load != LoadState::Loading && s.phase == crate::refresh::Phase::Idle)
            .await
            .unwrap();
        App::new(handle, ThresholdPolicy::default())
    }

    #[test]
    fn test_view_cycle() {
        let mut view = View::Dashboard;
        for _ in 0..View::ALL.len() {
            view = view.next();
        }
        assert_eq!(view, View::Dashboard);
        assert_eq!(View::Dashboard.prev(), View::About);
        for (i, v) in View::ALL.iter().enumerate() {
            assert_eq!(v.index(), i);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_alert_onsets_are_logged_once() {
        let store = Arc::new(MemoryStore::with_readings([
            reading("a", 10, 7.0),
            reading("b", 1, 9.5),
        ]));
        let mut app = ready_app(Arc::clone(&store)).await;

        assert_eq!(app.state.load, LoadState::Ready);
        assert_eq!(app.notifications.len(), 1);
        let first = app.notifications.get(0).unwrap();
        assert_eq!(first.parameter, Parameter::Ph);
        assert_eq!(first.severity, Severity::Critical);

        // Same alert on the next cycle is not logged again
        let mut rx = app.handle.subscribe();
        let generation = app.state.generation;
        app.refresh();
        rx.wait_for(|s| s.generation > generation && s.phase == crate::refresh::Phase::Idle)
            .await
            .unwrap();
        assert!(app.sync());
        assert_eq!(app.notifications.len(), 1);
        assert_eq!(app.notifications.unread_count(), 1);

        app.into_handle().shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_notification_actions() {
        let store = Arc::new(MemoryStore::with_readings([
            reading("a", 10, 7.0),
            Reading::builder()
                .id("b")
                .created_at(Utc::now())
                .ph(9.5)
                .temperature(22.0)
                .turbidity(12.0)
                .tds(300.0)
                .build(),
        ]));
        let mut app = ready_app(store).await;
        app.set_view(View::Notifications);
        assert_eq!(app.notifications.len(), 2);

        app.mark_selected_read();
        assert_eq!(app.notifications.unread_count(), 1);

        app.select_next();
        app.delete_selected();
        assert_eq!(app.notifications.len(), 1);
        assert_eq!(app.selected_notification_index, 0);

        app.mark_all_read();
        assert_eq!(app.notifications.unread_count(), 0);

        app.into_handle().shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_filter_and_selection() {
        let store = Arc::new(MemoryStore::with_readings([
            reading("safe-1", 30, 7.0),
            reading("safe-2", 20, 7.2),
            reading("bad", 10, 5.0),
        ]));
        let mut app = ready_app(store).await;
        app.set_view(View::History);
        assert_eq!(app.filtered_readings().len(), 3);

        app.select_last();
        assert_eq!(app.selected_reading().map(|r| r.id.as_str()), Some("safe-1"));

        app.start_filter();
        for c in "action".chars() {
            app.filter_push(c);
        }
        let ids: Vec<_> = app.filtered_readings().iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec!["bad"]);
        assert_eq!(app.selected_reading_index, 0);

        app.clear_filter();
        assert!(!app.filter_active);
        assert_eq!(app.filtered_readings().len(), 3);

        app.into_handle().shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_visible_row_accounts_for_scroll() {
        let store = Arc::new(MemoryStore::with_readings(
            (0..20).map(|i| reading(&format!("r{}", i), 60 - i, 7.0)),
        ));
        let mut app = ready_app(store).await;
        app.set_view(View::History);

        app.select_visible_row(2);
        assert_eq!(app.selected_reading_index, 2);

        // The table has scrolled down by five rows
        app.history_offset.set(5);
        app.select_visible_row(2);
        assert_eq!(app.selected_reading_index, 7);
        assert_eq!(app.selected_reading().map(|r| r.id.as_str()), Some("r12"));

        // Blank rows below the last item
        app.select_visible_row(15);
        assert_eq!(app.selected_reading_index, 7);

        app.into_handle().shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_range_change_is_applied() {
        let store = Arc::new(MemoryStore::with_readings([reading("a", 1, 7.0)]));
        let mut app = ready_app(store).await;
        assert_eq!(app.state.range, TimeRange::Day);

        app.next_range();
        assert_eq!(app.state.range, TimeRange::Week);
        assert_eq!(app.get_status_message(), Some("Range: 7d"));

        let mut rx = app.handle.subscribe();
        rx.wait_for(|s| s.range == TimeRange::Week && s.phase == crate::refresh::Phase::Idle)
            .await
            .unwrap();
        app.sync();
        assert_eq!(app.state.range, TimeRange::Week);

        app.into_handle().shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_export_requires_data() {
        let store = Arc::new(MemoryStore::new());
        let app = ready_app(store).await;
        assert_eq!(app.state.load, LoadState::NoData);

        let dir = tempfile::tempdir().unwrap();
        assert!(app.export_state(&dir.path().join("out.json")).is_err());

        app.into_handle().shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_export_writes_json() {
        let store = Arc::new(MemoryStore::with_readings([reading("a", 1, 7.0)]));
        let app = ready_app(store).await.with_source_info("memory", DEFAULT_INTERVAL);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        app.export_state(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["source"], "memory");
        assert_eq!(value["range"], "24h");
        assert_eq!(value["summary"]["overall"], "Optimal");
        assert_eq!(value["metrics"].as_array().unwrap().len(), 4);
        assert_eq!(value["summary"]["good"], 4);
        assert_eq!(value["summary"]["warning"], 0);
        assert_eq!(value["summary"]["critical"], 0);

        app.into_handle().shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_export_summary_counts_statuses() {
        let store = Arc::new(MemoryStore::with_readings([Reading::builder()
            .id("mixed")
            .created_at(Utc::now())
            .ph(6.7)
            .temperature(22.0)
            .turbidity(6.0)
            .tds(300.0)
            .build()]));
        let app = ready_app(store).await;

        let value = export_document(&app.state, "memory");
        assert_eq!(value["summary"]["overall"], "Critical");
        assert_eq!(value["summary"]["good"], 2);
        assert_eq!(value["summary"]["warning"], 1);
        assert_eq!(value["summary"]["critical"], 1);
        assert_eq!(value["summary"]["readings"], 1);

        app.into_handle().shutdown().await;
    }
}
