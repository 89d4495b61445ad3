//! JSON file persistence for the call-data cache.
//!
//! Writes go to a sibling temp file that is renamed over the target, so a crash
//! mid-write leaves the previous snapshot intact.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vault_telemetry::log_event;

use crate::application::{CallDataResolver, CachedCallData};
use crate::domain::EngineError;
use crate::ports::CallDataBackend;

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    entries: Vec<CachedCallData>,
}

/// Call-data cache file.
#[derive(Clone, Debug)]
pub struct JsonCacheStore {
    path: PathBuf,
}

impl JsonCacheStore {
    /// Store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read entries. A missing file is an empty cache.
    pub fn load(&self) -> Result<Vec<CachedCallData>, EngineError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(persistence_error(&self.path, e)),
        };
        let file: CacheFile =
            serde_json::from_slice(&bytes).map_err(|e| persistence_error(&self.path, e))?;
        if file.version != FORMAT_VERSION {
            log_event!(
                warn,
                "cache-store",
                "ignoring call-data cache with unknown format",
                path = %self.path.display(),
                version = file.version
            );
            return Ok(Vec::new());
        }
        Ok(file.entries)
    }

    /// Replace the file with `entries`.
    pub fn save(&self, entries: Vec<CachedCallData>) -> Result<(), EngineError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| persistence_error(parent, e))?;
        }
        let file = CacheFile {
            version: FORMAT_VERSION,
            entries,
        };
        let json = serde_json::to_vec(&file).map_err(|e| persistence_error(&self.path, e))?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|e| persistence_error(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| persistence_error(&self.path, e))
    }

    /// Load the file into `resolver`. Returns how many entries were accepted.
    pub fn restore<B: CallDataBackend>(&self, resolver: &CallDataResolver<B>) -> Result<usize, EngineError> {
        let entries = self.load()?;
        let offered = entries.len();
        let loaded = resolver.import(entries);
        log_event!(
            debug,
            "cache-store",
            "call-data cache restored",
            path = %self.path.display(),
            offered = offered,
            loaded = loaded
        );
        Ok(loaded)
    }

    /// Write `resolver`'s current contents.
    pub fn persist<B: CallDataBackend>(&self, resolver: &CallDataResolver<B>) -> Result<(), EngineError> {
        resolver.prune_expired();
        self.save(resolver.export())
    }
}

fn persistence_error(path: &Path, e: impl std::fmt::Display) -> EngineError {
    EngineError::CachePersistence(format!("{}: {}", path.display(), e))
}
