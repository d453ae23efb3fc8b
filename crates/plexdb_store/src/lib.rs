//! # plexdb Store
//!
//! The durable local half of plexdb: an append-only log of transaction
//! directories plus a vault for opaque file payloads.
//!
//! ## Layout
//!
//! ```text
//! <root>/
//! ├─ 1433342405421000000/        # one directory per transaction,
//! │  ├─ <VersionID>.item.xml     # named by its commit timestamp
//! │  ├─ <VersionID>.file.xml
//! │  └─ committed                # zero-length marker, written last
//! └─ Vault/
//!    └─ <VersionID>.dat          # opaque payloads of File records
//! ```
//!
//! ## Commit protocol
//!
//! A transaction directory is durable and loadable iff its `committed`
//! marker exists. Record files are written first, the marker last; a
//! crash before the marker leaves a directory that every reader treats
//! as not-yet-committed.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod clock;
mod dir;
mod error;

pub use clock::CommitClock;
pub use dir::{StoreDir, COMMITTED_MARKER, RECORD_SUFFIXES, VAULT_DIR};
pub use error::{StoreError, StoreResult};
