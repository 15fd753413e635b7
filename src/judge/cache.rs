use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use moka::sync::Cache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::error::JudgeError;

/// One JSONL line of a judge cache file.
#[derive(Debug, Serialize, Deserialize)]
struct CacheLine {
    key: String,
    entry: Value,
}

/// Content-addressed memo of judge verdicts.
///
/// Lookups are served from memory. With a backing file every new entry is
/// appended as one JSON line, written with a single `write_all` under a lock,
/// so concurrent writers can at worst produce a duplicate line. On open,
/// malformed lines are skipped and later lines win.
pub struct JudgeCache {
    index: Cache<String, Value>,
    file: Option<Mutex<File>>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for JudgeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JudgeCache")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Default for JudgeCache {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl JudgeCache {
    const DEFAULT_CAPACITY: u64 = 100_000;

    /// A cache that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            index: Cache::builder().max_capacity(Self::DEFAULT_CAPACITY).build(),
            file: None,
            path: None,
        }
    }

    /// Opens (or creates) a JSONL cache file and loads its entries.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, JudgeError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let index = Cache::builder().max_capacity(Self::DEFAULT_CAPACITY).build();
        let mut loaded = 0usize;
        let mut skipped = 0usize;

        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<CacheLine>(&line) {
                    Ok(CacheLine { key, entry }) => {
                        index.insert(key, entry);
                        loaded += 1;
                    }
                    Err(_) => skipped += 1,
                }
            }
        }

        if skipped > 0 {
            warn!(path = %path.display(), skipped, "Skipped malformed judge cache lines");
        }
        info!(path = %path.display(), loaded, "Opened judge cache");

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            index,
            file: Some(Mutex::new(file)),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn lookup(&self, key: &str) -> Option<Value> {
        let hit = self.index.get(key);
        if hit.is_some() {
            debug!(key, "Judge cache hit");
        }
        hit
    }

    /// Records `entry` under `key`, in memory and, if file-backed, on disk.
    pub fn append(&self, key: &str, entry: Value) -> Result<(), JudgeError> {
        self.index.insert(key.to_string(), entry.clone());

        if let Some(file) = &self.file {
            let mut line = serde_json::to_string(&CacheLine {
                key: key.to_string(),
                entry,
            })
            .map_err(|e| JudgeError::Cache {
                reason: e.to_string(),
            })?;
            line.push('\n');

            let mut file = file.lock();
            file.write_all(line.as_bytes())?;
            file.flush()?;
        }

        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_persistent(&self) -> bool {
        self.file.is_some()
    }
}
