//! # aquawatch-types
//!
//! Core types for water-quality monitoring. This crate defines the shared
//! vocabulary used by the store adapters, the evaluation pipeline and the
//! dashboard: sensor [`Reading`]s, the tracked [`Parameter`]s, per-parameter
//! [`MetricEvaluation`]s, derived [`Alert`]s and the [`TimeRange`] selector.
//!
//! ## Design Goals
//!
//! - **No logic**: only types, constructors and small accessors live here
//! - **Optional serialization**: enable the `serde` feature for JSON I/O
//! - **Closed parameter set**: [`Parameter`] is an enum, so every match over
//!   parameters is exhaustive
//! - **Ergonomic builders**: fluent construction of readings for tests and demos
//!
//! ## Example
//!
//! ```rust
//! use aquawatch_types::{Parameter, Reading};
//!
//! let reading = Reading::builder()
//!     .id("r-1")
//!     .ph(7.1)
//!     .temperature(22.5)
//!     .turbidity(0.4)
//!     .tds(310.0)
//!     .build();
//!
//! assert_eq!(reading.value(Parameter::Ph), 7.1);
//! assert_eq!(Parameter::ALL.len(), 4);
//! ```

mod chart;
mod evaluation;
mod parameter;
mod range;
mod reading;

pub use chart::*;
pub use evaluation::*;
pub use parameter::*;
pub use range::*;
pub use reading::*;
