//! Collision resolution for derived paths

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::uid::{random_token, uid_from_relative};

/// Turns a path that is already taken into a fresh candidate
#[cfg_attr(test, mockall::automock)]
pub trait Disambiguator: Send + Sync {
    fn disambiguate(&self, path: &Path) -> PathBuf;
}

/// Inserts `_<random>` in front of the extension: `file.png` -> `file_x7Gq2mPa.png`
#[derive(Debug, Clone, Copy)]
pub struct RandomSuffix {
    length: usize,
}

impl RandomSuffix {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for RandomSuffix {
    fn default() -> Self {
        Self::new(8)
    }
}

impl Disambiguator for RandomSuffix {
    fn disambiguate(&self, path: &Path) -> PathBuf {
        let suffix = random_token(self.length);

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_name = match path.extension() {
            Some(ext) => format!("{}_{}.{}", stem, suffix, ext.to_string_lossy()),
            None => format!("{}_{}", stem, suffix),
        };

        path.with_file_name(file_name)
    }
}

/// Anything at all lives at `path`, including dangling symlinks
fn entry_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Find a free relative path under `root`, starting from `candidate`.
///
/// Keeps asking `disambiguator` for new names until one is unused. The check
/// and the later write are not atomic, so two writers racing for the same
/// candidate can still clash.
pub fn resolve(
    root: &Path,
    candidate: &str,
    disambiguator: &dyn Disambiguator,
) -> StoreResult<String> {
    let mut path = root.join(candidate);

    while entry_exists(&path) {
        let next = disambiguator.disambiguate(&path);
        debug!(taken = ?path, next = ?next, "Storage path taken, disambiguating");
        path = next;
    }

    let relative = path
        .strip_prefix(root)
        .map_err(|_| StoreError::OutsideRoot(path.clone()))?;
    Ok(uid_from_relative(relative))
}
