//! Public url paths for content served straight off the disk

use std::env;
use std::path::{Component, Path, PathBuf};

use crate::error::{StoreError, StoreResult};
use crate::uid::{join_under, uid_from_relative};

/// Resolve `.` and `..` components without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

pub(crate) fn absolutize(path: &Path) -> StoreResult<PathBuf> {
    if path.is_absolute() {
        Ok(normalize(path))
    } else {
        Ok(normalize(&env::current_dir()?.join(path)))
    }
}

/// Url path of `uid` stored under `root_path`, as seen by a web server
/// rooted at `server_root`.
///
/// The stored file must sit below `server_root` on a directory boundary;
/// `server_root` itself may be above, at or below `root_path`.
pub fn url_for(root_path: &Path, server_root: Option<&Path>, uid: &str) -> StoreResult<String> {
    let server_root = server_root.ok_or_else(|| {
        StoreError::UnableToFormUrl(
            "server_root must be configured to form urls for stored files".to_string(),
        )
    })?;

    let root = absolutize(root_path)?;
    let server_root = absolutize(server_root)?;
    let file = join_under(&root, uid);

    let unable = || {
        StoreError::UnableToFormUrl(format!(
            "couldn't form url for uid {:?} with root_path {:?} and server_root {:?}",
            uid, root, server_root
        ))
    };

    let relative = file.strip_prefix(&server_root).map_err(|_| unable())?;
    let path = uid_from_relative(relative);
    if path.is_empty() {
        return Err(unable());
    }

    Ok(format!("/{}", path))
}
