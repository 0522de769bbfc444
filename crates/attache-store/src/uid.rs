//! Uid helpers shared by every data store

use std::path::{Component, Path, PathBuf};

use crate::error::{StoreError, StoreResult};

/// Reject uids that climb out of their directory with a `../` segment.
///
/// Only the literal `../` is refused; `..` elsewhere (for example
/// `jelly_beans..good`) is a legal part of a file name. Symlinks and other
/// escapes are not inspected.
pub fn validate_uid(uid: &str) -> StoreResult<()> {
    if uid.contains("../") {
        return Err(StoreError::BadUid(uid.to_string()));
    }
    Ok(())
}

/// Path of `uid` below `root`.
///
/// Only plain name segments of the uid are used, so a leading `/` or a drive
/// prefix cannot move the result outside of `root`.
pub fn join_under(root: &Path, uid: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    for component in Path::new(uid).components() {
        if let Component::Normal(part) = component {
            path.push(part);
        }
    }
    path
}

/// Random string of ASCII letters and digits
pub(crate) fn random_token(length: usize) -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Render a relative path as a uid, always using `/` between segments
pub fn uid_from_relative(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_segment_is_rejected() {
        assert!(matches!(
            validate_uid("jelly_beans/../are/good"),
            Err(StoreError::BadUid(_))
        ));
        assert!(validate_uid("../etc/passwd").is_err());
    }

    #[test]
    fn test_double_dot_inside_name_is_allowed() {
        assert!(validate_uid("jelly_beans..good").is_ok());
        assert!(validate_uid("a/b..").is_ok());
    }

    #[test]
    fn test_uid_from_relative_uses_forward_slashes() {
        let path = Path::new("2011").join("02").join("picture.jpg");
        assert_eq!(uid_from_relative(&path), "2011/02/picture.jpg");
    }

    #[test]
    fn test_join_under_keeps_absolute_uids_below_root() {
        let root = Path::new("/store");
        assert_eq!(join_under(root, "a/b.png"), PathBuf::from("/store/a/b.png"));
        assert_eq!(join_under(root, "/etc/passwd"), PathBuf::from("/store/etc/passwd"));
        assert_eq!(join_under(root, "//a/./b"), PathBuf::from("/store/a/b"));
        assert_eq!(join_under(root, "jelly_beans..good"), PathBuf::from("/store/jelly_beans..good"));
    }
}
