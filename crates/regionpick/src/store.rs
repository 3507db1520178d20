// Author: Dustin Pilgrim
// License: MIT
//
// The single "last selection" record, postcard-encoded on disk.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use eventline::debug;
use serde::{Deserialize, Serialize};

use regionpick_core::{HostError, Rect};
use regionpick_engine::LastSelectionStore;

use crate::paths::ensure_parent_dir;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LastSelection {
    /// Global desktop pixels.
    pub rect: Rect,
    /// Unix seconds.
    pub saved_at: u64,
}

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn read(&self) -> Result<Option<LastSelection>, HostError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(HostError::Store(format!("read {}: {e}", self.path.display()))),
        };

        let rec: LastSelection = postcard::from_bytes(&bytes)
            .map_err(|e| HostError::Store(format!("decode {}: {e}", self.path.display())))?;
        Ok(Some(rec))
    }
}

impl LastSelectionStore for FileStore {
    fn load(&self) -> Result<Option<Rect>, HostError> {
        Ok(self.read()?.map(|r| r.rect))
    }

    fn save(&self, rect: Rect) -> Result<(), HostError> {
        ensure_parent_dir(&self.path)
            .map_err(|e| HostError::Store(format!("create state dir: {e}")))?;

        let rec = LastSelection {
            rect,
            saved_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        };

        let bytes = postcard::to_allocvec(&rec)
            .map_err(|e| HostError::Store(format!("encode: {e}")))?;
        std::fs::write(&self.path, bytes)
            .map_err(|e| HostError::Store(format!("write {}: {e}", self.path.display())))?;

        debug!("last selection saved to {}", self.path.display());
        Ok(())
    }
}
