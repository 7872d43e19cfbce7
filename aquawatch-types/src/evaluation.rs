//! Derived per-cycle types: statuses, metric evaluations and alerts.

use core::fmt;

use crate::Parameter;

/// Classification of a single parameter value.
///
/// Ordered by severity so the worst of several statuses is their `max()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Status {
    #[default]
    Good,
    Warning,
    Critical,
}

impl Status {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            Status::Good => "OK",
            Status::Warning => "WARN",
            Status::Critical => "CRIT",
        }
    }

    /// Alert severity for this status, `None` when nothing needs attention.
    pub fn severity(&self) -> Option<Severity> {
        match self {
            Status::Good => None,
            Status::Warning => Some(Severity::Warning),
            Status::Critical => Some(Severity::Critical),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Good => "Good",
            Status::Warning => "Warning",
            Status::Critical => "Critical",
        })
    }
}

/// Aggregate status across every parameter of a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OverallStatus {
    #[default]
    Optimal,
    Warning,
    Critical,
}

impl From<Status> for OverallStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Good => OverallStatus::Optimal,
            Status::Warning => OverallStatus::Warning,
            Status::Critical => OverallStatus::Critical,
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OverallStatus::Optimal => "Optimal",
            OverallStatus::Warning => "Warning",
            OverallStatus::Critical => "Critical",
        })
    }
}

/// Severity of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Severity {
    Warning,
    Critical,
}

impl Severity {
    /// The status this severity was derived from.
    pub fn status(&self) -> Status {
        match self {
            Severity::Warning => Status::Warning,
            Severity::Critical => Status::Critical,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        })
    }
}

/// Evaluation of one parameter of the latest reading.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricEvaluation {
    pub parameter: Parameter,
    /// Latest measured value.
    pub value: f64,
    pub unit: String,
    pub status: Status,
    /// Signed percentage change against the previous reading, `0.0` without one.
    pub trend: f64,
}

/// A notice derived from a non-good evaluation.
///
/// Alerts have no identity: they are regenerated from scratch each cycle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Alert {
    pub severity: Severity,
    pub parameter: Parameter,
    pub title: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ordering() {
        assert!(Status::Critical > Status::Warning);
        assert!(Status::Warning > Status::Good);
        let worst = [Status::Good, Status::Critical, Status::Warning]
            .into_iter()
            .max()
            .unwrap();
        assert_eq!(worst, Status::Critical);
    }

    #[test]
    fn test_status_severity_roundtrip() {
        assert_eq!(Status::Good.severity(), None);
        for status in [Status::Warning, Status::Critical] {
            assert_eq!(status.severity().unwrap().status(), status);
        }
    }

    #[test]
    fn test_overall_from_status() {
        assert_eq!(OverallStatus::from(Status::Good), OverallStatus::Optimal);
        assert_eq!(OverallStatus::from(Status::Critical), OverallStatus::Critical);
        assert_eq!(OverallStatus::Optimal.to_string(), "Optimal");
    }
}
