//! Transaction log directory management.

use crate::error::{StoreError, StoreResult};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Marker file whose presence makes a transaction directory durable.
pub const COMMITTED_MARKER: &str = "committed";

/// Directory for opaque file payloads, sibling to the transaction dirs.
pub const VAULT_DIR: &str = "Vault";

/// Record file suffixes, one per record kind.
pub const RECORD_SUFFIXES: [&str; 3] = [".item.xml", ".relationship.xml", ".file.xml"];

/// Manages the on-disk transaction log and vault.
///
/// Paths are derived, never cached: the directory contents change
/// underneath this handle as the caller thread commits and the
/// downloader unpacks remote transactions.
#[derive(Debug, Clone)]
pub struct StoreDir {
    root: PathBuf,
    vault: PathBuf,
}

impl StoreDir {
    /// Opens the store root, creating it and the vault if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if a path exists but is not a directory, or on
    /// I/O failure.
    pub fn open(root: &Path) -> StoreResult<Self> {
        let vault = root.join(VAULT_DIR);
        for path in [root, vault.as_path()] {
            if !path.exists() {
                fs::create_dir_all(path)?;
            } else if !path.is_dir() {
                return Err(StoreError::not_a_directory(path));
            }
        }
        Ok(Self {
            root: root.to_path_buf(),
            vault,
        })
    }

    /// Returns the store root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the vault directory.
    #[must_use]
    pub fn vault_dir(&self) -> &Path {
        &self.vault
    }

    /// Returns the directory of the transaction committed at `commit_time`.
    #[must_use]
    pub fn transaction_path(&self, commit_time: i64) -> PathBuf {
        self.root.join(commit_time.to_string())
    }

    /// Returns the commit marker path for a transaction.
    #[must_use]
    pub fn marker_path(&self, commit_time: i64) -> PathBuf {
        self.transaction_path(commit_time).join(COMMITTED_MARKER)
    }

    /// Returns true if the transaction's commit marker exists.
    #[must_use]
    pub fn is_committed(&self, commit_time: i64) -> bool {
        self.marker_path(commit_time).is_file()
    }

    /// Lists all transaction commit times, ascending, committed or not.
    ///
    /// Entries whose names do not parse as a commit timestamp are
    /// ignored (the vault directory among them).
    pub fn list_all(&self) -> StoreResult<Vec<i64>> {
        let mut times = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(time) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<i64>().ok())
            {
                times.push(time);
            }
        }
        times.sort_unstable();
        Ok(times)
    }

    /// Lists committed transaction commit times, ascending.
    ///
    /// Directories lacking the marker are partially written and skipped.
    pub fn list_committed(&self) -> StoreResult<Vec<i64>> {
        let mut times = self.list_all()?;
        times.retain(|time| self.is_committed(*time));
        Ok(times)
    }

    /// Creates a transaction directory. Idempotent.
    pub fn create_transaction_dir(&self, commit_time: i64) -> StoreResult<PathBuf> {
        let path = self.transaction_path(commit_time);
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Writes one record file into a transaction directory.
    pub fn write_record_file(
        &self,
        commit_time: i64,
        file_name: &str,
        bytes: &[u8],
    ) -> StoreResult<()> {
        let path = self.transaction_path(commit_time).join(file_name);
        let mut file = File::create(path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        Ok(())
    }

    /// Writes the commit marker, making the transaction durable.
    ///
    /// Must be called after every record file has been written.
    pub fn write_marker(&self, commit_time: i64) -> StoreResult<()> {
        let file = File::create(self.marker_path(commit_time))?;
        file.sync_all()?;
        Ok(())
    }

    /// Lists the record files of a transaction, sorted by file name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TransactionMissing`] if the directory does
    /// not exist.
    pub fn record_files(&self, commit_time: i64) -> StoreResult<Vec<PathBuf>> {
        let dir = self.transaction_path(commit_time);
        if !dir.is_dir() {
            return Err(StoreError::transaction_missing(commit_time));
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if RECORD_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Returns the vault path of a file payload.
    #[must_use]
    pub fn vault_path(&self, version_id: Uuid) -> PathBuf {
        self.vault.join(format!("{version_id}.dat"))
    }

    /// Opens a file payload for reading.
    pub fn vault_read(&self, version_id: Uuid) -> StoreResult<File> {
        Ok(File::open(self.vault_path(version_id))?)
    }

    /// Opens (creating or truncating) a file payload for writing.
    pub fn vault_write(&self, version_id: Uuid) -> StoreResult<File> {
        Ok(OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.vault_path(version_id))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn open_creates_root_and_vault() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("Database");
        let store = StoreDir::open(&root).unwrap();
        assert!(store.root().is_dir());
        assert!(store.vault_dir().is_dir());
    }

    #[test]
    fn listing_skips_uncommitted_and_non_numeric() {
        let tmp = tempfile::tempdir().unwrap();
        let store = StoreDir::open(tmp.path()).unwrap();

        store.create_transaction_dir(100).unwrap();
        store
            .write_record_file(100, "a.item.xml", b"<Item/>")
            .unwrap();
        store.write_marker(100).unwrap();

        // Partially written: records but no marker.
        store.create_transaction_dir(200).unwrap();
        store
            .write_record_file(200, "b.item.xml", b"<Item/>")
            .unwrap();

        assert_eq!(store.list_all().unwrap(), vec![100, 200]);
        assert_eq!(store.list_committed().unwrap(), vec![100]);
        assert!(store.is_committed(100));
        assert!(!store.is_committed(200));
    }

    #[test]
    fn record_files_filters_and_sorts() {
        let tmp = tempfile::tempdir().unwrap();
        let store = StoreDir::open(tmp.path()).unwrap();
        store.create_transaction_dir(1).unwrap();
        store.write_record_file(1, "b.item.xml", b"b").unwrap();
        store.write_record_file(1, "a.relationship.xml", b"a").unwrap();
        store.write_record_file(1, "c.file.xml", b"c").unwrap();
        store.write_marker(1).unwrap();

        let names: Vec<String> = store
            .record_files(1)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["a.relationship.xml", "b.item.xml", "c.file.xml"]
        );
    }

    #[test]
    fn record_files_for_missing_transaction_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let store = StoreDir::open(tmp.path()).unwrap();
        let err = store.record_files(42).unwrap_err();
        assert!(matches!(err, StoreError::TransactionMissing { .. }));
    }

    #[test]
    fn vault_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = StoreDir::open(tmp.path()).unwrap();
        let id = Uuid::new_v4();

        store.vault_write(id).unwrap().write_all(b"payload").unwrap();
        let mut buffer = String::new();
        store
            .vault_read(id)
            .unwrap()
            .read_to_string(&mut buffer)
            .unwrap();
        assert_eq!(buffer, "payload");
    }
}
