//! @acp:module "Source Cache"
//! @acp:summary "Advisory parsed-file cache keyed by path, mtime and size"
//! @acp:domain analysis
//! @acp:layer service
//!
//! Purely a performance aid: a stale or missing entry only costs a
//! re-parse, never a different result.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::go::GoParser;
use super::model::SourceFile;
use crate::error::{AxonError, Result};

#[derive(Debug, Clone)]
struct CachedSource {
    modified: DateTime<Utc>,
    size: u64,
    file: SourceFile,
}

/// @acp:summary "In-memory cache of parsed Go files"
#[derive(Debug, Default)]
pub struct SourceCache {
    entries: HashMap<PathBuf, CachedSource>,
    hits: usize,
    misses: usize,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// @acp:summary "Return the parsed file, re-parsing when the stamp changed"
    pub fn load(&mut self, path: &Path, parser: &mut GoParser) -> Result<SourceFile> {
        let metadata = fs::metadata(path).map_err(|e| AxonError::io("stat", path, e))?;
        let size = metadata.len();
        let modified: Option<DateTime<Utc>> = metadata.modified().ok().map(Into::into);

        if let (Some(modified), Some(entry)) = (modified, self.entries.get(path)) {
            if entry.modified == modified && entry.size == size {
                self.hits += 1;
                tracing::debug!("Source cache hit: {}", path.display());
                return Ok(entry.file.clone());
            }
        }

        self.misses += 1;
        let file = parser.parse_file(path)?;
        match modified {
            Some(modified) => {
                self.entries.insert(
                    path.to_path_buf(),
                    CachedSource {
                        modified,
                        size,
                        file: file.clone(),
                    },
                );
            }
            // no usable stamp on this platform: never cache
            None => {
                self.entries.remove(path);
            }
        }
        Ok(file)
    }

    pub fn invalidate(&mut self, path: &Path) {
        self.entries.remove(path);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since creation
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }
}
