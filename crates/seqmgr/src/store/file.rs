use std::{
    fs::{self, File, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::store::{SeqState, SeqStore, StoreError};

/// A [`SeqStore`] backed by a single JSON file.
///
/// Saves write a sibling `*.tmp` file, `fsync` it, and rename it over the
/// target, so a crash mid-save leaves either the old or the new state on disk,
/// never a torn one.
///
/// ```json
/// {"meta":{"start":1024,"end":17408},"super_range":{"start":268436480,"end":18446744073709551615}}
/// ```
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

impl SeqStore for FileStore {
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self), fields(path = %self.path.display())))]
    fn load(&self) -> Result<SeqState, StoreError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::NoData),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&raw).map_err(|e| StoreError::Corrupt {
            reason: e.to_string(),
        })
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self), fields(path = %self.path.display())))]
    fn save(&self, state: &SeqState) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec(state).map_err(|e| StoreError::Corrupt {
            reason: e.to_string(),
        })?;

        let tmp = self.tmp_path();
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp)?;
            file.write_all(&encoded)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;

        // Make the rename itself durable. Not every platform lets a directory
        // be opened for syncing.
        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Ok(dir) = File::open(dir) {
                let _ = dir.sync_all();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Range;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("seqmgr-{}-{name}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join("seq.json")
    }

    #[test]
    fn missing_file_is_no_data() {
        let path = scratch("missing");
        let _ = fs::remove_file(&path);
        assert_eq!(FileStore::new(&path).load(), Err(StoreError::NoData));
    }

    #[test]
    fn save_then_load() {
        let path = scratch("roundtrip");
        let store = FileStore::new(&path);
        let state = SeqState {
            meta: Range::new(0x400, 0x4400),
            super_range: Range::new(0x1000_0400, u64::MAX),
        };
        store.save(&state).unwrap();
        assert_eq!(FileStore::new(&path).load(), Ok(state));
        assert!(!store.tmp_path().exists());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn garbage_is_corrupt() {
        let path = scratch("garbage");
        fs::write(&path, b"not json").unwrap();
        assert!(matches!(
            FileStore::new(&path).load(),
            Err(StoreError::Corrupt { .. })
        ));
        fs::remove_file(&path).unwrap();
    }
}
