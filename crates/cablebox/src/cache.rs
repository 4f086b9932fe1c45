//! Shared, once-built inventory snapshot with explicit reload

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use tracing::debug;

use crate::error::{LoadError, SheetError};
use crate::loader::Loader;
use cablebox_core::InventoryTable;

/// Identity of a source file: a different path, size or mtime means a new file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceIdentity {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl SourceIdentity {
    /// Stat a file
    pub fn of(path: &Path) -> std::io::Result<Self> {
        let meta = fs::metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

#[derive(Debug)]
struct Cached {
    identity: SourceIdentity,
    table: Arc<InventoryTable>,
}

/// Caches the loaded [`InventoryTable`] per source identity.
///
/// Readers get an `Arc` to a complete table or an error, never a partly
/// built one. A table is built at most once per identity, under the write
/// lock; failures are returned and not cached, so the next call retries.
#[derive(Debug)]
pub struct InventoryCache {
    loader: Loader,
    slot: RwLock<Option<Cached>>,
    loads: AtomicU64,
}

impl InventoryCache {
    pub fn new(loader: Loader) -> Self {
        Self {
            loader,
            slot: RwLock::new(None),
            loads: AtomicU64::new(0),
        }
    }

    /// Current table, loading it if the source is new or changed
    pub fn get(&self) -> Result<Arc<InventoryTable>, LoadError> {
        let identity = self.current_identity()?;

        if let Some(table) = self.cached_for(&identity) {
            return Ok(table);
        }

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have built it while we waited
        if let Some(cached) = slot.as_ref().filter(|c| c.identity == identity) {
            return Ok(Arc::clone(&cached.table));
        }

        let table = self.build(&identity.path)?;
        *slot = Some(Cached {
            identity,
            table: Arc::clone(&table),
        });
        Ok(table)
    }

    /// Rebuild from the current source, replacing any cached table.
    ///
    /// On failure the previous table stays cached.
    pub fn reload(&self) -> Result<Arc<InventoryTable>, LoadError> {
        let identity = self.current_identity()?;

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        let table = self.build(&identity.path)?;
        *slot = Some(Cached {
            identity,
            table: Arc::clone(&table),
        });
        Ok(table)
    }

    /// Drop the cached table; the next [`get`](Self::get) loads again
    pub fn invalidate(&self) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }

    /// The cached table, without checking the source
    pub fn cached(&self) -> Option<Arc<InventoryTable>> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().map(|c| Arc::clone(&c.table))
    }

    /// How many tables have been built so far
    pub fn load_count(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }

    fn cached_for(&self, identity: &SourceIdentity) -> Option<Arc<InventoryTable>> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .filter(|c| &c.identity == identity)
            .map(|c| Arc::clone(&c.table))
    }

    fn current_identity(&self) -> Result<SourceIdentity, LoadError> {
        let path = self.loader.discover_source()?;
        SourceIdentity::of(&path).map_err(|e| LoadError::Parse {
            path,
            source: SheetError::Io(e),
        })
    }

    fn build(&self, path: &Path) -> Result<Arc<InventoryTable>, LoadError> {
        debug!(source = %path.display(), "building inventory table");
        let table = self.loader.load_from(path)?;
        self.loads.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::new(table))
    }
}
