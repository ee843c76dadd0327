//! JSON collection store
//!
//! Each entity type persists as a single JSON array file on disk; the file is
//! the sole source of truth between requests. The store owns the file path
//! and a mutex that serializes every load-mutate-save cycle, so concurrent
//! mutations cannot clobber each other's rewrites.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::{fs, io};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;

/// A persisted record with a unique numeric identifier.
pub trait Record: Serialize + DeserializeOwned + Send {
    fn id(&self) -> u64;
}

/// Identifier for the next record inserted into `records`.
///
/// Highest live id plus one, so a fresh id can never collide with a
/// surviving record after deletions.
pub fn next_id<T: Record>(records: &[T]) -> u64 {
    records.iter().map(Record::id).max().unwrap_or(0) + 1
}

/// Errors surfaced by collection file access.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed collection file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize collection: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// File-backed repository for one record collection.
pub struct JsonStore<T> {
    path: PathBuf,
    lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Record> JsonStore<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full collection in file order.
    ///
    /// A missing file reads as an empty collection; the first save creates it.
    pub fn load(&self) -> Result<Vec<T>, StoreError> {
        read_collection(&self.path)
    }

    /// Run one load-mutate-save cycle under the collection lock.
    pub async fn update<R>(&self, apply: impl FnOnce(&mut Vec<T>) -> R) -> Result<R, StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = read_collection(&self.path)?;
        let result = apply(&mut records);
        write_collection(&self.path, &records)?;
        Ok(result)
    }

    /// Like [`update`](Self::update), but the closure may decline by
    /// returning `None` (e.g. unknown id); the file is rewritten only when
    /// it produces a value.
    pub async fn try_update<R>(
        &self,
        apply: impl FnOnce(&mut Vec<T>) -> Option<R>,
    ) -> Result<Option<R>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = read_collection(&self.path)?;
        let Some(result) = apply(&mut records) else {
            return Ok(None);
        };
        write_collection(&self.path, &records)?;
        Ok(Some(result))
    }
}

fn read_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    serde_json::from_slice(&bytes).map_err(|e| StoreError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Rewrite the collection file atomically.
///
/// Serializes with 4-space indentation, writes to a sibling temp file, then
/// renames over the target so a crash mid-write leaves the old contents.
fn write_collection<T: Serialize>(path: &Path, records: &[T]) -> Result<(), StoreError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records.serialize(&mut serializer)?;

    let tmp = tmp_path(path);
    fs::write(&tmp, &buf).map_err(|e| StoreError::Write {
        path: tmp.clone(),
        source: e,
    })?;

    fs::rename(&tmp, path).map_err(|e| StoreError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map_or_else(
        || std::ffi::OsString::from("collection"),
        std::ffi::OsStr::to_os_string,
    );
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
    struct TestRecord {
        id: u64,
        name: String,
    }

    impl Record for TestRecord {
        fn id(&self) -> u64 {
            self.id
        }
    }

    fn record(id: u64, name: &str) -> TestRecord {
        TestRecord {
            id,
            name: name.to_string(),
        }
    }

    fn store_in(dir: &TempDir) -> JsonStore<TestRecord> {
        JsonStore::new(dir.path().join("records.json"))
    }

    #[test]
    fn test_next_id() {
        let empty: Vec<TestRecord> = vec![];
        assert_eq!(next_id(&empty), 1);

        let sequential = vec![record(1, "a"), record(2, "b"), record(3, "c")];
        assert_eq!(next_id(&sequential), 4);

        // A gap from a deletion must not resurrect the deleted id
        let gapped = vec![record(1, "a"), record(3, "c")];
        assert_eq!(next_id(&gapped), 4);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);
        assert_eq!(store.load().expect("load"), vec![]);
        // Loading must not create the file
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_round_trip_preserves_order_and_fields() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);

        let written = store
            .update(|records| {
                records.push(record(1, "first"));
                records.push(record(2, "second"));
                records.push(record(3, "third"));
                records.clone()
            })
            .await
            .expect("update");

        assert_eq!(store.load().expect("load"), written);
    }

    #[tokio::test]
    async fn test_written_file_uses_four_space_indent() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);

        store
            .update(|records| records.push(record(1, "only")))
            .await
            .expect("update");

        let contents = fs::read_to_string(store.path()).expect("read back");
        assert!(contents.contains("\n    {"));
        assert!(contents.contains("\n        \"id\": 1"));
    }

    #[tokio::test]
    async fn test_try_update_none_leaves_file_untouched() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);

        store
            .update(|records| records.push(record(1, "kept")))
            .await
            .expect("seed");
        let before = fs::read(store.path()).expect("read");

        let outcome = store
            .try_update(|records| {
                records.clear();
                None::<()>
            })
            .await
            .expect("try_update");

        assert!(outcome.is_none());
        assert_eq!(fs::read(store.path()).expect("read"), before);
    }

    #[tokio::test]
    async fn test_try_update_none_does_not_create_file() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);

        let outcome = store.try_update(|_| None::<()>).await.expect("try_update");
        assert!(outcome.is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);
        fs::write(store.path(), b"{not json").expect("write");

        assert!(matches!(store.load(), Err(StoreError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_no_temp_file_left_behind() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);

        store
            .update(|records| records.push(record(1, "a")))
            .await
            .expect("update");

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .expect("read dir")
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
