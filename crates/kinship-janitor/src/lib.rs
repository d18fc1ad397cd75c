//! Kinship Janitor
//!
//! Maintenance for the inferred half of the relationship store.
//!
//! # Overview
//!
//! The Janitor is responsible for:
//! - **Stale-record repair**: confirming pending inferred rows and restoring
//!   the missing reverse of half-written pairs
//! - **Full re-inference**: deleting every inferred row of a network and
//!   replaying its manual relations through propagation, tracked as a job
//! - **Job tracking**: an in-memory [`JobStore`](kinship_domain::JobStore)
//!   with TTL eviction
//! - **Metrics collection**: counts per repair action
//!
//! Manual rows are never written here.
//!
//! # Usage
//!
//! ## Background Worker
//!
//! ```no_run
//! use kinship_janitor::{JanitorConfig, JanitorWorker};
//! use kinship_store::SqliteStore;
//! use std::sync::{Arc, Mutex};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(Mutex::new(SqliteStore::new("kinship.db")?));
//!     let mut worker = JanitorWorker::new(JanitorConfig::default());
//!     worker.run(store).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [janitor]
//! repair_interval_secs = 900
//! job_ttl_secs = 3600
//! dry_run = false
//! auto_promote = true
//! auto_backfill = true
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod janitor;
mod jobs;
mod metrics;
mod worker;

pub use config::JanitorConfig;
pub use error::JanitorError;
pub use janitor::{collect_network, Janitor, RepairReport};
pub use jobs::MemoryJobStore;
pub use metrics::{JanitorMetrics, RepairAction};
pub use worker::JanitorWorker;
