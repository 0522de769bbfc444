//! Sidecar metadata files
//!
//! Metadata for `<uid>` is kept in `<uid>.meta.yml`. Stores written by older
//! releases used a flat `<uid>.meta` file with one `key: value` pair per line;
//! those are still read but never written.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use attache_core::Meta;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::StoreResult;

const SIDECAR_SUFFIX: &str = ".meta.yml";
const LEGACY_SIDECAR_SUFFIX: &str = ".meta";
const DOCUMENT_START: &str = "---";

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

pub fn sidecar_path(file: &Path) -> PathBuf {
    with_suffix(file, SIDECAR_SUFFIX)
}

pub fn legacy_sidecar_path(file: &Path) -> PathBuf {
    with_suffix(file, LEGACY_SIDECAR_SUFFIX)
}

/// Read a file, mapping "not there" to `None`
fn read_optional(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Remove a file if present
pub(crate) fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

pub fn write_sidecar(file: &Path, meta: &Meta) -> StoreResult<()> {
    let yaml = serde_yaml::to_string(meta)?;
    let path = sidecar_path(file);
    fs::write(&path, format!("{}\n{}", DOCUMENT_START, yaml))?;
    debug!(path = ?path, keys = meta.len(), "Meta sidecar stored");
    Ok(())
}

/// Metadata stored next to `file`; empty when there is no sidecar
pub fn read_sidecar(file: &Path) -> StoreResult<Meta> {
    if let Some(text) = read_optional(&sidecar_path(file))? {
        return parse_yaml(&text);
    }
    if let Some(text) = read_optional(&legacy_sidecar_path(file))? {
        return Ok(parse_legacy(&text));
    }
    Ok(Meta::new())
}

/// Remove both sidecar forms, whichever exist
pub fn remove_sidecars(file: &Path) -> StoreResult<()> {
    for path in [sidecar_path(file), legacy_sidecar_path(file)] {
        if remove_if_exists(&path)? {
            debug!(path = ?path, "Meta sidecar deleted");
        }
    }
    Ok(())
}

fn parse_yaml(text: &str) -> StoreResult<Meta> {
    let body = text.trim();
    if body.is_empty() || body == DOCUMENT_START {
        return Ok(Meta::new());
    }
    Ok(serde_yaml::from_str(text)?)
}

/// Parse the flat `key: value` format.
///
/// Values are read as YAML scalars, so `5` comes back as a number and
/// `true` as a boolean; anything unparseable is kept as the raw string.
pub fn parse_legacy(text: &str) -> Meta {
    let mut meta = Meta::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line == DOCUMENT_START {
            continue;
        }

        let Some((key, raw)) = line.split_once(':') else {
            warn!(line, "Skipping malformed legacy meta line");
            continue;
        };

        let raw = raw.trim();
        let value = serde_yaml::from_str::<Value>(raw)
            .unwrap_or_else(|_| Value::String(raw.to_string()));
        meta.insert(key.trim().to_string(), value);
    }

    meta
}
