//! Directory-backed [`KeyValueStore`].
//!
//! Each key maps to one file in the store directory. Writes go to a
//! temporary sibling first, are synced, then renamed over the target, so a
//! crash mid-write leaves the previous value intact.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use seedbank_registry::{KeyValueStore, StoreError};

/// Extension given to stored values.
const VALUE_EXTENSION: &str = "json";

/// Extension of in-flight writes.
const TEMP_EXTENSION: &str = "tmp";

/// A [`KeyValueStore`] writing one file per key under a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open the store at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        tracing::debug!(root = %root.display(), "Opened file store");
        Ok(Self { root })
    }

    /// The store directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `key`.
    ///
    /// Keys are `/`-separated segments of ASCII letters, digits, `-` and
    /// `_`. Segments are joined with `.` to form a flat file name.
    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid_segment = |segment: &str| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        };
        if !key.split('/').all(valid_segment) {
            return Err(StoreError::InvalidKey(key.to_owned()));
        }
        let stem = key.replace('/', ".");
        Ok(self.root.join(format!("{stem}.{VALUE_EXTENSION}")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let temp = path.with_extension(TEMP_EXTENSION);
        {
            let mut file = fs::File::create(&temp)?;
            file.write_all(value)?;
            file.sync_all()?;
        }
        fs::rename(&temp, &path)?;
        tracing::trace!(path = %path.display(), bytes = value.len(), "Wrote store file");
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
