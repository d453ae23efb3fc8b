//! # plexdb Core
//!
//! The session layer of plexdb: the in-memory version cache, the
//! caller-facing create/supersede/query operations, and the local
//! transaction commit protocol.
//!
//! This crate provides:
//! - `Session`: orchestrator owning the cache, catalog, log and clock
//! - `Transaction`: unit of work with marker-last atomic commit
//! - `VersionCache`: type-and-version keyed record index
//! - `UploadQueue`: FIFO of committed transactions pending upload
//! - `Progress`: sync progress counters with change notification
//!
//! ## Key Invariants
//!
//! - A record becomes queryable only after insertion into the cache;
//!   all insertion paths (create, load, download) funnel through one
//!   routine under one lock
//! - At most one non-superseded version exists per `(ItemType,
//!   BranchID)` pair
//! - A transaction directory is visible iff its `committed` marker
//!   exists; the marker is written last

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod config;
mod error;
mod progress;
mod queue;
mod session;
mod transaction;

pub use cache::VersionCache;
pub use config::SessionConfig;
pub use error::{CoreError, CoreResult};
pub use progress::{Progress, ProgressEvent};
pub use queue::UploadQueue;
pub use session::Session;
pub use transaction::Transaction;
