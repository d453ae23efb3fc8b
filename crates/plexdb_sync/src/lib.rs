//! # plexdb Sync
//!
//! Bidirectional reconciliation between the local transaction log and a
//! remote blob store reachable only through coarse list/upload/download
//! operations.
//!
//! This crate provides:
//! - `RemoteStore`: the blob-store contract the engine consumes
//! - Transaction bundling (one tar archive per transaction, plus a
//!   distinctly named commit marker object uploaded last)
//! - `Downloader`: pulls remote transactions into the local log and
//!   performs first-run catch-up before local writes are permitted
//! - `Uploader`: drains the queue of locally committed transactions,
//!   skipping any already present remotely
//! - `SyncEngine`: runs both loops on background threads with injected
//!   cancellation
//!
//! ## Key Invariants
//!
//! - Marker-last on both sides: no partial state is ever treated as
//!   committed, locally or remotely
//! - Reconciliation is idempotent: transactions already present are
//!   never re-fetched or re-uploaded
//! - Loop errors are isolated: a failure aborts the current pass, is
//!   logged, and the loop retries after its sleep interval

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bundle;
mod config;
mod downloader;
mod engine;
mod error;
mod layout;
mod remote;
mod uploader;

pub use bundle::{pack_transaction, unpack_transaction};
pub use config::SyncConfig;
pub use downloader::Downloader;
pub use engine::SyncEngine;
pub use error::{SyncError, SyncResult};
pub use layout::RemoteLayout;
pub use remote::{MemoryRemote, RemoteStore};
pub use uploader::Uploader;
