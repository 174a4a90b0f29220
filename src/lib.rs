//! # ifsc-dl
//!
//! Bounded-concurrency crawler library for the IFSC results API.
//!
//! The crawler walks the four-level resource tree the API exposes —
//! seasons, leagues, events, result categories — fetching each node's
//! children over HTTP and assembling everything into one in-memory document.
//! All remote calls at every depth share a single concurrency ceiling, and a
//! fetch failure anywhere below the root is contained to its own branch:
//! the output keeps every slot in listing order, with failed branches marked
//! as null, absent, or empty rather than dropped.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Bounded fan-out** - One global ceiling gates every remote call,
//!   however deep the recursion fans out
//! - **Partial failure as data** - A failed branch is missing data in the
//!   document, never an aborted crawl
//! - **Observable** - Queue lifecycle signals and periodic progress
//!   snapshots, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use ifsc_dl::{Config, IfscCrawler};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let crawler = IfscCrawler::new(Config::default())?;
//!     let tree = crawler.crawl_to_file("data.json").await?;
//!     println!("archived {} seasons", tree.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Resource fetcher for the remote results API
mod client;
/// Configuration types
pub mod config;
/// Top-level crawl driver
pub mod crawler;
/// Error types
pub mod error;
/// Event time intervals
pub mod interval;
/// Progress tracking
pub mod progress;
/// Bounded task queue
pub mod queue;
/// Hierarchical traversal engine
mod traversal;
/// Assembled tree types
pub mod types;

// Re-export commonly used types
pub use config::{Config, FailedLeaguePolicy};
pub use crawler::IfscCrawler;
pub use error::{Error, Result, ShapeError};
pub use interval::TimeInterval;
pub use progress::ProgressTracker;
pub use queue::{BoundedQueue, QueueSignal, QueueStats};
pub use types::{CategoryResult, Event, League, Season};
