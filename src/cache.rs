//! Explicit cache for the materialized base table.
//!
//! Entries are keyed by a staleness stamp of the source file (mtime and
//! length); `invalidate` is the explicit refresh hook. The cache never
//! serves rows for a file that no longer exists.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use tracing::debug;

use crate::error::Result;
use crate::models::EnrichedSale;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SourceStamp {
    modified: Option<SystemTime>,
    len: u64,
}

fn stamp(path: &Path) -> Option<SourceStamp> {
    let meta = fs::metadata(path).ok()?;
    Some(SourceStamp {
        modified: meta.modified().ok(),
        len: meta.len(),
    })
}

struct CachedTable {
    stamp: SourceStamp,
    rows: Arc<Vec<EnrichedSale>>,
}

pub struct TableCache {
    path: PathBuf,
    slot: Mutex<Option<CachedTable>>,
}

impl TableCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            slot: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the cached rows, running `loader` when nothing is cached yet
    /// or the source file's stamp has changed.
    pub fn get_or_load<F>(&self, loader: F) -> Result<Arc<Vec<EnrichedSale>>>
    where
        F: FnOnce() -> Result<Vec<EnrichedSale>>,
    {
        let current = stamp(&self.path);
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());

        if let (Some(cached), Some(current)) = (slot.as_ref(), current) {
            if cached.stamp == current {
                debug!("Serving {} cached rows for {}", cached.rows.len(), self.path.display());
                return Ok(Arc::clone(&cached.rows));
            }
        }

        let rows = Arc::new(loader()?);
        // Stamp from before the load: a write racing the load shows up as a
        // stamp mismatch on the next read instead of being masked.
        if let Some(current) = current {
            *slot = Some(CachedTable {
                stamp: current,
                rows: Arc::clone(&rows),
            });
        }
        Ok(rows)
    }

    /// Drop the cached table; the next read reloads from the source.
    pub fn invalidate(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }
}
