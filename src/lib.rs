//! # aquawatch
//!
//! A terminal dashboard and library for monitoring water-quality sensor
//! readings: pH, temperature, turbidity and total dissolved solids.
//!
//! Readings are pulled from a document store, classified against threshold
//! bands, compared to the previous reading, and turned into alerts. A refresh
//! loop keeps the derived state current and publishes it to the UI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          Application                             │
//! │  ┌─────────┐    ┌─────────┐    ┌──────────┐    ┌──────────────┐  │
//! │  │  store  │───▶│ source  │───▶│ refresh  │───▶│  app + ui    │  │
//! │  │(adapter)│    │(fetcher)│    │  (loop)  │    │ (ratatui)    │  │
//! │  └─────────┘    └─────────┘    └────┬─────┘    └──────────────┘  │
//! │                                     │                            │
//! │                                     ▼                            │
//! │                                ┌─────────┐                       │
//! │                                │  data   │ classify, trend,      │
//! │                                │         │ alerts, statistics    │
//! │                                └─────────┘                       │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: [`ReadingFetcher`] over any [`ReadingStore`], plus a
//!   JSON-file store ([`FileStore`])
//! - **[`data`]**: Threshold classification, trends, alert synthesis,
//!   quality assessment and window statistics
//! - **[`refresh`]**: The refresh loop and the published [`DashboardState`]
//! - **[`config`]**: Layered settings (defaults, TOML file, environment)
//! - **[`app`]**, **[`events`]**, **[`ui`]**: The terminal dashboard
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch an Appwrite collection configured in a settings file
//! aquawatch --config aquawatch.toml
//!
//! # Watch a JSON file of readings
//! aquawatch --file readings.json --range 7d
//!
//! # Fetch once and export the dashboard state
//! aquawatch --file readings.json --export state.json
//! ```
//!
//! ### As a library
//!
//! ```
//! use std::sync::Arc;
//! use aquawatch::{RefreshLoop, ReadingFetcher};
//! use aquawatch_adapters::MemoryStore;
//! use aquawatch_types::{OverallStatus, Reading};
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::with_readings([Reading::builder()
//!     .id("r1")
//!     .ph(7.4)
//!     .temperature(24.0)
//!     .turbidity(0.4)
//!     .tds(250.0)
//!     .build()]);
//!
//! let handle = RefreshLoop::new(ReadingFetcher::new(Arc::new(store))).spawn();
//! let mut states = handle.subscribe();
//! let state = states.wait_for(|s| s.has_data()).await.unwrap().clone();
//! assert_eq!(state.overall, OverallStatus::Optimal);
//!
//! handle.shutdown().await;
//! # });
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod events;
pub mod refresh;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use aquawatch_adapters::ReadingStore;
pub use app::App;
pub use config::{ResolvedSettings, Settings};
pub use data::{classify, evaluate, synthesize, trend, ThresholdPolicy};
pub use refresh::{DashboardState, LoadState, RefreshHandle, RefreshLoop};
pub use source::{FileStore, Fetched, ReadingFetcher};
