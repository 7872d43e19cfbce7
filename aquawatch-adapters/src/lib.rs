//! # aquawatch-adapters
//!
//! Read-only adapters for the document store that holds sensor readings.
//!
//! Every adapter implements [`ReadingStore`], the two queries the dashboard
//! needs from its backend:
//!
//! - the most recent N readings, newest first
//! - readings created after an instant, newest first, capped at a page size
//!
//! ## Supported Stores
//!
//! - **Appwrite** (`appwrite` feature) - Queries a collection through the
//!   Databases REST API
//! - **Memory** - An in-process store for tests, demos and replay
//!
//! ## Quick Start (Appwrite)
//!
//! ```rust,ignore
//! use aquawatch_adapters::appwrite::AppwriteStore;
//! use aquawatch_adapters::ReadingStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = AppwriteStore::builder()
//!         .endpoint("https://cloud.appwrite.io/v1")
//!         .project("my-project")
//!         .database("water")
//!         .collection("readings")
//!         .api_key("secret")
//!         .build()?;
//!
//!     let latest = store.latest(1).await?;
//!     println!("Latest reading: {:?}", latest.first());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod memory;
pub mod store;

#[cfg(feature = "appwrite")]
pub mod appwrite;

pub use error::AdapterError;
pub use memory::MemoryStore;
pub use store::ReadingStore;

// Re-export types for convenience
pub use aquawatch_types::{Reading, TimeRange};
