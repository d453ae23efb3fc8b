//! Transaction bundles: one tar archive per transaction.
//!
//! The archive holds the transaction's record files at its root and the
//! vault payload of every File record under `Vault/`. Unpacking routes
//! entries back to their places and writes the local `committed` marker
//! last, so a crash mid-unpack leaves a directory every reader treats
//! as not-yet-committed.

use crate::error::{SyncError, SyncResult};
use plexdb_store::{StoreDir, VAULT_DIR};
use std::path::{Component, Path, PathBuf};
use tar::{Archive, Builder};
use tracing::warn;
use uuid::Uuid;

const FILE_RECORD_SUFFIX: &str = ".file.xml";

/// Bundles a local transaction into a single archive.
///
/// # Errors
///
/// Fails if the transaction directory or a record file cannot be read.
/// A File record whose vault payload is absent is bundled without it,
/// with a warning; the metadata alone is still replicated.
pub fn pack_transaction(store: &StoreDir, commit_time: i64) -> SyncResult<Vec<u8>> {
    let mut builder = Builder::new(Vec::new());

    for path in store.record_files(commit_time)? {
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
            continue;
        };
        builder.append_path_with_name(&path, &name)?;

        if let Some(version_id) = file_record_version(&name) {
            let vault_path = store.vault_path(version_id);
            if vault_path.is_file() {
                builder
                    .append_path_with_name(&vault_path, format!("{VAULT_DIR}/{version_id}.dat"))?;
            } else {
                warn!(commit_time, %version_id, "file record has no vault payload");
            }
        }
    }

    Ok(builder.into_inner()?)
}

/// Unpacks a downloaded transaction archive into the local log.
///
/// Record files land in the transaction directory, vault entries in the
/// vault; the local commit marker is written only after every entry is
/// in place.
pub fn unpack_transaction(store: &StoreDir, commit_time: i64, bytes: &[u8]) -> SyncResult<()> {
    let transaction_dir = store.create_transaction_dir(commit_time)?;
    let mut archive = Archive::new(bytes);

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();
        // Entries are addressed by file name only, so a hostile or
        // corrupt archive cannot write outside the store.
        let Some(name) = path.file_name().map(PathBuf::from) else {
            return Err(SyncError::bundle(format!(
                "archive entry has no file name: {}",
                path.display()
            )));
        };
        let destination = if is_vault_entry(&path) {
            store.vault_dir().join(name)
        } else {
            transaction_dir.join(name)
        };
        entry.unpack(&destination)?;
    }

    store.write_marker(commit_time)?;
    Ok(())
}

fn file_record_version(name: &str) -> Option<Uuid> {
    name.strip_suffix(FILE_RECORD_SUFFIX)
        .and_then(|stem| Uuid::parse_str(stem).ok())
}

fn is_vault_entry(path: &Path) -> bool {
    matches!(
        path.components().next(),
        Some(Component::Normal(first)) if first == VAULT_DIR
    )
}
