//! JSON file ledger store.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::{LedgerError, LedgerStore};

/// Stores the ledger as a pretty-printed JSON array of ids.
///
/// Writes go to a temp file in the same directory which is then renamed
/// over the target, so readers never see a half-written list.
#[derive(Debug, Clone)]
pub struct JsonFileLedgerStore {
    path: PathBuf,
}

impl JsonFileLedgerStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> LedgerError {
        LedgerError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl LedgerStore for JsonFileLedgerStore {
    fn name(&self) -> &str {
        "json"
    }

    fn load(&self) -> Result<Option<Vec<String>>, LedgerError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        if contents.trim().is_empty() {
            return Ok(Some(Vec::new()));
        }

        let ids: Vec<String> =
            serde_json::from_str(&contents).map_err(|e| LedgerError::Format(e.to_string()))?;
        Ok(Some(ids))
    }

    fn save(&self, ids: &[String]) -> Result<(), LedgerError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| self.io_error(e))?;

        let json =
            serde_json::to_vec_pretty(ids).map_err(|e| LedgerError::Format(e.to_string()))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(&json).map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        Ok(())
    }
}
