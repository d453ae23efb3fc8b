//! The unit of work: staged records and the atomic commit protocol.

use crate::error::CoreResult;
use crate::session::Session;
use plexdb_model::{xml, Record};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A unit of work collecting the records touched by one change.
///
/// Commit writes every staged record into a fresh transaction directory
/// and creates the `committed` marker last. The marker is the atomicity
/// mechanism: a crash before it exists leaves no visible transaction,
/// and once it exists the transaction is permanently visible. Dropping
/// an uncommitted transaction simply discards the staging; the cache
/// may then hold records that never became durable, as in-process
/// visibility is deliberately ahead of durability.
pub struct Transaction<'s> {
    session: &'s Session,
    records: Vec<Arc<Record>>,
}

impl fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("staged", &self.records.len())
            .finish_non_exhaustive()
    }
}

impl<'s> Transaction<'s> {
    pub(crate) fn new(session: &'s Session) -> Self {
        Self {
            session,
            records: Vec::new(),
        }
    }

    /// Stages a record for durable write at commit.
    ///
    /// De-duplicated by identity: staging the same record twice (for
    /// instance created and then superseded in one transaction) writes
    /// it once.
    pub(crate) fn stage(&mut self, record: Arc<Record>) {
        if !self.records.iter().any(|r| Arc::ptr_eq(r, &record)) {
            self.records.push(record);
        }
    }

    /// Returns the number of staged records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing has been staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Commits the transaction to the local log.
    ///
    /// Assigns the commit timestamp, serializes every staged record
    /// into the transaction directory, writes the `committed` marker
    /// last, and enqueues the commit for upload. Returns the commit
    /// timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any write fails; the marker
    /// is then absent and the partial directory is invisible to loads.
    pub fn commit(self) -> CoreResult<i64> {
        let commit_time = self.session.clock().next();
        self.session.store().create_transaction_dir(commit_time)?;

        for record in &self.records {
            let bytes = xml::serialize(record)?;
            self.session
                .store()
                .write_record_file(commit_time, &record.file_name(), &bytes)?;
        }

        // Marker last: this is the commit point.
        self.session.store().write_marker(commit_time)?;

        // The staged records are already cached; re-reading our own
        // directory would only replace them with stale disk copies.
        self.session.mark_loaded(commit_time);
        self.session.upload_queue().push(commit_time);
        debug!(commit_time, records = self.records.len(), "committed transaction");
        Ok(commit_time)
    }
}
