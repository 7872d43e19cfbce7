//! Notification log of alert onsets.
//!
//! Alerts are regenerated every cycle, so logging them verbatim would repeat
//! the same alert every 30 seconds. The log instead records an entry when a
//! `(parameter, severity)` pair appears that was absent in the previous cycle.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;

use aquawatch_types::{Alert, Parameter, Severity};

/// Maximum number of notifications kept.
const DEFAULT_CAPACITY: usize = 200;

/// One logged alert onset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub severity: Severity,
    pub parameter: Parameter,
    pub title: String,
    pub message: String,
    pub raised_at: DateTime<Utc>,
    pub read: bool,
}

/// Bounded, newest-first log of alert onsets with read state.
#[derive(Debug, Clone)]
pub struct NotificationLog {
    entries: VecDeque<Notification>,
    active: HashSet<(Parameter, Severity)>,
    capacity: usize,
    next_id: u64,
}

impl Default for NotificationLog {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationLog {
    /// Create an empty log with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty log keeping at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            active: HashSet::new(),
            capacity: capacity.max(1),
            next_id: 1,
        }
    }

    /// Record a cycle's alerts, logging those that were not active last cycle.
    ///
    /// Returns the number of new entries.
    pub fn record(&mut self, alerts: &[Alert], now: DateTime<Utc>) -> usize {
        let current: HashSet<(Parameter, Severity)> =
            alerts.iter().map(|a| (a.parameter, a.severity)).collect();

        let mut added = 0;
        for alert in alerts {
            if self.active.contains(&(alert.parameter, alert.severity)) {
                continue;
            }
            self.entries.push_front(Notification {
                id: self.next_id,
                severity: alert.severity,
                parameter: alert.parameter,
                title: alert.title.clone(),
                message: alert.message.clone(),
                raised_at: now,
                read: false,
            });
            self.next_id += 1;
            added += 1;
        }

        self.entries.truncate(self.capacity);
        self.active = current;
        added
    }

    /// Entries, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter()
    }

    /// Entry at a display position.
    pub fn get(&self, index: usize) -> Option<&Notification> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of unread entries.
    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|n| !n.read).count()
    }

    /// Mark one entry read. Returns false if no entry has that id.
    pub fn mark_read(&mut self, id: u64) -> bool {
        match self.entries.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = true;
                true
            }
            None => false,
        }
    }

    /// Mark every entry read.
    pub fn mark_all_read(&mut self) {
        for n in &mut self.entries {
            n.read = true;
        }
    }

    /// Delete one entry. Returns false if no entry has that id.
    pub fn delete(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|n| n.id != id);
        self.entries.len() != before
    }
}
