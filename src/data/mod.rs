//! Evaluation pipeline for sensor readings.
//!
//! This module turns raw readings into statuses, trends and alerts, and
//! computes the window statistics shown by the history view.
//!
//! ## Submodules
//!
//! - [`classify`]: Threshold bands and status classification ([`ThresholdPolicy`])
//! - [`trend`]: Percentage change against the previous reading
//! - [`evaluate`]: One [`MetricEvaluation`] per parameter of the latest reading
//! - [`alerts`]: Alert synthesis and overall status
//! - [`quality`]: Safe / Monitor / Action Required assessment and recommendations
//! - [`history`]: Min/avg/max, status distribution and sparkline normalization
//! - [`notifications`]: Log of alert onsets with read state
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "30s", "500ms")
//!
//! ## Data Flow
//!
//! ```text
//! latest + previous Reading
//!        │
//!        ▼
//! evaluate() ──▶ classify() + trend()
//!        │
//!        ▼
//! Vec<MetricEvaluation> ──▶ synthesize() ──▶ Vec<Alert>
//!        │
//!        └──▶ overall_status()
//! ```
//!
//! [`MetricEvaluation`]: aquawatch_types::MetricEvaluation

pub mod alerts;
pub mod classify;
pub mod duration;
pub mod evaluate;
pub mod history;
pub mod notifications;
pub mod quality;
pub mod trend;

pub use alerts::{count_issues, format_value, overall_status, synthesize};
pub use classify::{classify, Band, InvalidBand, ThresholdPolicy};
pub use evaluate::evaluate;
pub use history::{sparkline, ParameterStats, StatusDistribution};
pub use notifications::{Notification, NotificationLog};
pub use quality::{assess, recommendations, Assessment, Grade};
pub use trend::trend;
