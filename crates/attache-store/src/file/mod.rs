//! Filesystem data store
//!
//! Content lands under `root_path` at a date-derived path (or a caller-chosen
//! one), with its metadata in a YAML sidecar next to it. The returned uid is
//! the path relative to `root_path`.
//!
//! ```text
//! <root_path>/
//! └── 1984/05/04/
//!     ├── 14_28_01_0_beach.png
//!     └── 14_28_01_0_beach.png.meta.yml
//! ```
//!
//! Only one writer per uid is supported at a time: the existence check done
//! while resolving collisions and the following write are separate steps.

pub mod collision;
pub mod meta;
pub mod path;
pub mod url;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use attache_core::{Content, DatastoreConfig, Meta, NAME_KEY};
use bytes::Bytes;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::datastore::{DataStore, WriteOptions};
use crate::error::{StoreError, StoreResult};
use crate::uid::{join_under, uid_from_relative, validate_uid};

use self::collision::{Disambiguator, RandomSuffix};
use self::path::{Clock, PathDeriver};

/// Data store keeping content as plain files under a root directory
pub struct FileDataStore {
    root_path: PathBuf,
    server_root: Option<PathBuf>,
    store_meta: bool,
    deriver: PathDeriver,
    disambiguator: Box<dyn Disambiguator>,
}

impl FileDataStore {
    /// Create a store rooted at `root_path`, keeping meta sidecars
    pub fn new(root_path: impl AsRef<Path>) -> Self {
        Self {
            root_path: root_path.as_ref().to_path_buf(),
            server_root: None,
            store_meta: true,
            deriver: PathDeriver::default(),
            disambiguator: Box::new(RandomSuffix::default()),
        }
    }

    pub fn from_config(config: &DatastoreConfig) -> Self {
        let store = Self::new(&config.root_path).with_store_meta(config.store_meta);
        match &config.server_root {
            Some(server_root) => store.with_server_root(server_root),
            None => store,
        }
    }

    pub fn with_server_root(mut self, server_root: impl AsRef<Path>) -> Self {
        self.set_server_root(Some(server_root));
        self
    }

    pub fn with_store_meta(mut self, store_meta: bool) -> Self {
        self.store_meta = store_meta;
        self
    }

    /// Use `clock` for date-derived paths
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.deriver = PathDeriver::new(Arc::new(clock));
        self
    }

    /// Use `disambiguator` to rename colliding paths
    pub fn with_disambiguator(mut self, disambiguator: impl Disambiguator + 'static) -> Self {
        self.disambiguator = Box::new(disambiguator);
        self
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn set_root_path(&mut self, root_path: impl AsRef<Path>) {
        self.root_path = root_path.as_ref().to_path_buf();
    }

    pub fn server_root(&self) -> Option<&Path> {
        self.server_root.as_deref()
    }

    pub fn set_server_root<P: AsRef<Path>>(&mut self, server_root: Option<P>) {
        self.server_root = server_root.map(|p| p.as_ref().to_path_buf());
    }

    pub fn store_meta(&self) -> bool {
        self.store_meta
    }

    pub fn set_store_meta(&mut self, store_meta: bool) {
        self.store_meta = store_meta;
    }

    /// New candidate for an absolute path that is already taken
    pub fn disambiguate(&self, path: &Path) -> PathBuf {
        self.disambiguator.disambiguate(path)
    }

    /// Uid of an absolute path below `root_path`
    pub fn relative(&self, absolute: &Path) -> StoreResult<String> {
        absolute
            .strip_prefix(&self.root_path)
            .map(uid_from_relative)
            .map_err(|_| StoreError::OutsideRoot(absolute.to_path_buf()))
    }

    fn absolute(&self, uid: &str) -> PathBuf {
        join_under(&self.root_path, uid)
    }

    /// Remove empty directories from `dir` upwards, stopping below `root_path`
    fn prune_empty_dirs(&self, dir: Option<&Path>) -> StoreResult<()> {
        let mut current = dir.map(Path::to_path_buf);

        while let Some(dir) = current {
            if dir == self.root_path || !dir.starts_with(&self.root_path) {
                break;
            }

            match fs::read_dir(&dir) {
                Ok(mut entries) => {
                    if entries.next().is_some() {
                        break;
                    }
                    fs::remove_dir(&dir)?;
                    debug!(dir = ?dir, "Pruned empty directory");
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }

            current = dir.parent().map(Path::to_path_buf);
        }

        Ok(())
    }
}

impl DataStore for FileDataStore {
    #[instrument(skip(self, content), fields(store = "file", size = content.size()))]
    fn write(&self, content: &Content, options: &WriteOptions) -> StoreResult<String> {
        if let Some(path) = &options.path {
            validate_uid(path)?;
        }

        let candidate = self.deriver.derive(content.name(), options.path.as_deref());
        let uid = collision::resolve(&self.root_path, &candidate, self.disambiguator.as_ref())?;
        let path = self.absolute(&uid);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content.data())?;

        if self.store_meta && !content.meta.is_empty() {
            meta::write_sidecar(&path, &content.meta)?;
        }

        debug!(uid = %uid, path = ?path, "File stored");
        Ok(uid)
    }

    #[instrument(skip(self), fields(store = "file"))]
    fn read(&self, uid: &str) -> StoreResult<Option<(Bytes, Meta)>> {
        validate_uid(uid)?;
        let path = self.absolute(uid);

        if !path.is_file() {
            return Ok(None);
        }

        let data = match fs::read(&path) {
            Ok(data) => Bytes::from(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut meta = meta::read_sidecar(&path)?;
        if !meta.contains_key(NAME_KEY) {
            if let Some(name) = path.file_name() {
                meta.insert(
                    NAME_KEY.to_string(),
                    Value::String(name.to_string_lossy().into_owned()),
                );
            }
        }

        Ok(Some((data, meta)))
    }

    #[instrument(skip(self), fields(store = "file"))]
    fn destroy(&self, uid: &str) -> StoreResult<()> {
        validate_uid(uid)?;
        let path = self.absolute(uid);

        if meta::remove_if_exists(&path)? {
            debug!(path = ?path, "File deleted");
        }
        meta::remove_sidecars(&path)?;
        self.prune_empty_dirs(path.parent())
    }

    fn url_for(&self, uid: &str) -> StoreResult<String> {
        validate_uid(uid)?;
        url::url_for(&self.root_path, self.server_root.as_deref(), uid)
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl std::fmt::Debug for FileDataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDataStore")
            .field("root_path", &self.root_path)
            .field("server_root", &self.server_root)
            .field("store_meta", &self.store_meta)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::collision::MockDisambiguator;
    use super::path::FixedClock;
    use super::*;
    use crate::conformance::data_store_behaviour;
    use chrono::{NaiveDate, NaiveDateTime};
    use mockall::Sequence;
    use serde_json::json;
    use tempfile::TempDir;

    const PREFIX: &str = "1984/05/04/14_28_01_0_";

    fn may_the_fourth() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(1984, 5, 4)
            .and_then(|d| d.and_hms_opt(14, 28, 1))
            .unwrap()
    }

    fn setup() -> (TempDir, FileDataStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDataStore::new(dir.path().join("file_data_store_test"))
            .with_clock(FixedClock(may_the_fourth()));
        (dir, store)
    }

    fn content() -> Content {
        Content::new("goobydoo")
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    fn is_empty_dir(path: &Path) -> bool {
        path.is_dir() && fs::read_dir(path).unwrap().next().is_none()
    }

    fn expect_rename(mock: &mut MockDisambiguator, seq: &mut Sequence, from: PathBuf, to: PathBuf) {
        mock.expect_disambiguate()
            .withf(move |p: &Path| p == from.as_path())
            .times(1)
            .in_sequence(seq)
            .return_once(move |_| to);
    }

    #[test]
    fn test_behaves_like_a_data_store() {
        let (_dir, store) = setup();
        data_store_behaviour(&store);
    }

    #[test]
    fn test_write_uses_date_folder_and_default_filename() {
        let (_dir, store) = setup();
        let uid = store.write(&content(), &WriteOptions::default()).unwrap();

        assert_eq!(uid, format!("{}file", PREFIX));
        assert!(store.root_path().join(&uid).is_file());
    }

    #[test]
    fn test_write_uses_content_name() {
        let (_dir, store) = setup();
        let uid = store
            .write(&content().with_name("hello.you.png"), &WriteOptions::default())
            .unwrap();
        assert_eq!(uid, format!("{}hello.you.png", PREFIX));
    }

    #[test]
    fn test_write_strips_funny_characters() {
        let (_dir, store) = setup();
        let named = content().with_name("A Picture with many spaces in its name (at 20:00 pm).png");
        let uid = store.write(&named, &WriteOptions::default()).unwrap();

        assert_eq!(
            uid,
            format!("{}A_Picture_with_many_spaces_in_its_name_at_20_00_pm_.png", PREFIX)
        );
        assert!(store.root_path().join(uid).is_file());
    }

    #[test]
    fn test_write_stores_meta_as_yaml() {
        let (_dir, store) = setup();
        let mut item = content();
        item.meta.insert("wassup".into(), json!("doc"));

        let uid = store.write(&item, &WriteOptions::default()).unwrap();
        let sidecar = fs::read_to_string(store.root_path().join(format!("{}.meta.yml", uid))).unwrap();

        assert!(sidecar.starts_with("---\n"));
        assert!(sidecar.contains("wassup: doc"));
    }

    #[test]
    fn test_write_without_meta_has_no_sidecar() {
        let (_dir, store) = setup();
        let uid = store.write(&content(), &WriteOptions::default()).unwrap();
        assert!(!store.root_path().join(format!("{}.meta.yml", uid)).exists());
    }

    #[test]
    fn test_write_at_explicit_path() {
        let (_dir, store) = setup();
        let uid = store
            .write(&content(), &WriteOptions::with_path("hello/there/mate.png"))
            .unwrap();

        assert_eq!(uid, "hello/there/mate.png");
        assert!(store.root_path().join("hello/there/mate.png").is_file());
    }

    #[test]
    fn test_write_rejects_climbing_explicit_path() {
        let (_dir, store) = setup();
        let result = store.write(&content(), &WriteOptions::with_path("../outside.png"));
        assert!(matches!(result, Err(StoreError::BadUid(_))));
    }

    #[test]
    fn test_write_disambiguates_existing_file() {
        let (_dir, store) = setup();
        let root = store.root_path().to_path_buf();
        touch(&root.join(format!("{}file", PREFIX)));

        let mut seq = Sequence::new();
        let mut mock = MockDisambiguator::new();
        expect_rename(
            &mut mock,
            &mut seq,
            root.join(format!("{}file", PREFIX)),
            root.join(format!("{}file_2", PREFIX)),
        );
        let store = store.with_disambiguator(mock);

        let uid = store.write(&content(), &WriteOptions::default()).unwrap();
        assert_eq!(uid, format!("{}file_2", PREFIX));
        assert_eq!(fs::read(root.join(&uid)).unwrap(), b"goobydoo");
        assert_eq!(fs::read(root.join(format!("{}file", PREFIX))).unwrap(), b"");
    }

    #[test]
    fn test_write_disambiguates_name_with_extension() {
        let (_dir, store) = setup();
        let root = store.root_path().to_path_buf();
        touch(&root.join(format!("{}hello.png", PREFIX)));

        let mut seq = Sequence::new();
        let mut mock = MockDisambiguator::new();
        expect_rename(
            &mut mock,
            &mut seq,
            root.join(format!("{}hello.png", PREFIX)),
            root.join(format!("{}blah.png", PREFIX)),
        );
        let store = store.with_disambiguator(mock);

        let uid = store
            .write(&content().with_name("hello.png"), &WriteOptions::default())
            .unwrap();
        assert_eq!(uid, format!("{}blah.png", PREFIX));
    }

    #[test]
    fn test_write_keeps_trying_until_free() {
        let (_dir, store) = setup();
        let root = store.root_path().to_path_buf();
        let file = |suffix: &str| root.join(format!("{}file{}", PREFIX, suffix));
        touch(&file(""));
        touch(&file("_2"));

        let mut seq = Sequence::new();
        let mut mock = MockDisambiguator::new();
        expect_rename(&mut mock, &mut seq, file(""), file("_2"));
        expect_rename(&mut mock, &mut seq, file("_2"), file("_3"));
        let store = store.with_disambiguator(mock);

        let uid = store.write(&content(), &WriteOptions::default()).unwrap();
        assert_eq!(uid, format!("{}file_3", PREFIX));
        assert!(file("_3").is_file());
    }

    #[test]
    fn test_write_disambiguates_explicit_path() {
        let (_dir, store) = setup();
        let root = store.root_path().to_path_buf();
        touch(&root.join("hello/there/mate.png"));

        let mut seq = Sequence::new();
        let mut mock = MockDisambiguator::new();
        expect_rename(
            &mut mock,
            &mut seq,
            root.join("hello/there/mate.png"),
            root.join("hello/there/mate_2.png"),
        );
        let store = store.with_disambiguator(mock);

        let uid = store
            .write(&content(), &WriteOptions::with_path("hello/there/mate.png"))
            .unwrap();
        assert_eq!(uid, "hello/there/mate_2.png");
    }

    #[test]
    fn test_read_any_file_without_meta() {
        let (_dir, store) = setup();
        let path = store.root_path().join("jelly_beans/are/good");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "hey dog").unwrap();

        let mut item = Content::empty();
        let (data, meta) = store.read("jelly_beans/are/good").unwrap().unwrap();
        item.update(data, meta);

        assert_eq!(item.data().as_ref(), b"hey dog");
        let mut expected = Meta::new();
        expected.insert("name".into(), json!("good"));
        assert_eq!(item.meta, expected);
    }

    #[test]
    fn test_read_missing_is_none() {
        let (_dir, store) = setup();
        assert!(store.read("not/there").unwrap().is_none());
    }

    #[test]
    fn test_read_directory_is_none() {
        let (_dir, store) = setup();
        fs::create_dir_all(store.root_path().join("a/dir")).unwrap();
        assert!(store.read("a/dir").unwrap().is_none());
    }

    #[test]
    fn test_read_rejects_parent_segments() {
        let (_dir, store) = setup();
        assert!(matches!(
            store.read("jelly_beans/../are/good"),
            Err(StoreError::BadUid(_))
        ));
    }

    #[test]
    fn test_read_allows_double_dots_in_names() {
        let (_dir, store) = setup();
        store
            .write(&content(), &WriteOptions::with_path("jelly_beans..good"))
            .unwrap();

        let (data, _) = store.read("jelly_beans..good").unwrap().unwrap();
        assert_eq!(data.as_ref(), b"goobydoo");
    }

    #[test]
    fn test_destroy_prunes_empty_directories() {
        let (_dir, store) = setup();
        let uid = store.write(&content(), &WriteOptions::default()).unwrap();

        store.destroy(&uid).unwrap();
        assert!(is_empty_dir(store.root_path()));
    }

    #[test]
    fn test_destroy_keeps_root_for_flat_uid() {
        let (_dir, store) = setup();
        let uid = store
            .write(&content(), &WriteOptions::with_path("mate.png"))
            .unwrap();

        store.destroy(&uid).unwrap();
        assert!(is_empty_dir(store.root_path()));
    }

    #[test]
    fn test_destroy_stops_at_non_empty_directory() {
        let (_dir, store) = setup();
        store
            .write(&content(), &WriteOptions::with_path("a/keep.png"))
            .unwrap();
        let uid = store
            .write(&content(), &WriteOptions::with_path("a/b/c/gone.png"))
            .unwrap();

        store.destroy(&uid).unwrap();
        assert!(!store.root_path().join("a/b").exists());
        assert!(store.root_path().join("a/keep.png").is_file());
    }

    #[test]
    fn test_destroy_rejects_parent_segments() {
        let (_dir, store) = setup();
        assert!(matches!(
            store.destroy("jelly_beans/../are/good"),
            Err(StoreError::BadUid(_))
        ));
    }

    #[test]
    fn test_absolute_uid_stays_inside_root() {
        let (_dir, store) = setup();
        fs::create_dir_all(store.root_path()).unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        let outside = elsewhere.path().join("victim.txt");
        fs::write(&outside, "secret").unwrap();
        let uid = outside.to_string_lossy().into_owned();

        assert!(store.read(&uid).unwrap().is_none());
        store.destroy(&uid).unwrap();
        assert_eq!(fs::read(&outside).unwrap(), b"secret");
    }

    #[test]
    fn test_absolute_uid_reads_from_under_root() {
        let (_dir, store) = setup();
        store
            .write(&content(), &WriteOptions::with_path("etc/passwd"))
            .unwrap();

        let (data, _) = store.read("/etc/passwd").unwrap().unwrap();
        assert_eq!(data.as_ref(), b"goobydoo");
    }

    #[test]
    fn test_destroy_missing_uid_is_fine() {
        let (_dir, store) = setup();
        fs::create_dir_all(store.root_path()).unwrap();
        store.destroy("never/written").unwrap();
        assert!(store.root_path().is_dir());
    }

    #[test]
    fn test_root_path_accepts_paths() {
        let mut store = FileDataStore::new("/tmp");
        store.set_root_path(PathBuf::from("/some/thing"));
        assert_eq!(store.root_path(), Path::new("/some/thing"));
    }

    #[test]
    fn test_relative_strips_root() {
        for root in [
            "/path/to/file/",
            "/path/to/file name/",
            "/path/to/file name (Special backup directory)/",
        ] {
            let store = FileDataStore::new(root);
            let absolute = format!("{}2011/02/11/picture.jpg", root);
            assert_eq!(
                store.relative(Path::new(&absolute)).unwrap(),
                "2011/02/11/picture.jpg"
            );
        }
    }

    mod store_meta_off {
        use super::*;

        fn meta_content() -> Content {
            let mut item = content();
            item.meta.insert("bitrate".into(), json!("35"));
            item.meta.insert("name".into(), json!("danny.boy"));
            item
        }

        #[test]
        fn test_no_sidecar_is_written() {
            let (_dir, mut store) = setup();
            store.set_store_meta(false);

            let uid = store.write(&meta_content(), &WriteOptions::default()).unwrap();
            assert!(!store.root_path().join(format!("{}.meta", uid)).exists());
            assert!(!store.root_path().join(format!("{}.meta.yml", uid)).exists());
        }

        #[test]
        fn test_read_lacks_custom_meta() {
            let (_dir, mut store) = setup();
            store.set_store_meta(false);

            let uid = store.write(&meta_content(), &WriteOptions::default()).unwrap();
            let (_, meta) = store.read(&uid).unwrap().unwrap();

            assert!(meta.get("bitrate").is_none());
            assert_eq!(meta.get("name"), Some(&json!("14_28_01_0_danny.boy")));
        }

        #[test]
        fn test_destroy_still_removes_sidecar() {
            let (_dir, mut store) = setup();
            let uid = store.write(&meta_content(), &WriteOptions::default()).unwrap();
            assert!(store.root_path().join(format!("{}.meta.yml", uid)).exists());

            store.set_store_meta(false);
            store.destroy(&uid).unwrap();
            assert!(is_empty_dir(store.root_path()));
        }

        #[test]
        fn test_destroy_without_sidecar_when_meta_on() {
            let (_dir, mut store) = setup();
            store.set_store_meta(false);
            let uid = store.write(&meta_content(), &WriteOptions::default()).unwrap();

            store.set_store_meta(true);
            store.destroy(&uid).unwrap();
            assert!(is_empty_dir(store.root_path()));
        }
    }

    #[test]
    fn test_url_for_uses_server_root() {
        let mut store = FileDataStore::new("/var/tmp/eggs");
        assert!(matches!(
            store.url_for("some/path/to/file.png"),
            Err(StoreError::UnableToFormUrl(_))
        ));

        store.set_server_root(Some(PathBuf::from("/var/tmp")));
        assert_eq!(
            store.url_for("some/path/to/file.png").unwrap(),
            "/eggs/some/path/to/file.png"
        );
        assert!(matches!(
            store.url_for("some/../file.png"),
            Err(StoreError::BadUid(_))
        ));
    }

    #[test]
    fn test_from_config() {
        let config = DatastoreConfig {
            root_path: PathBuf::from("/var/tmp/eggs"),
            server_root: Some(PathBuf::from("/var/tmp/eggs/some/path")),
            store_meta: false,
        };
        let store = FileDataStore::from_config(&config);

        assert!(!store.store_meta());
        assert_eq!(store.url_for("some/path/to/file.png").unwrap(), "/to/file.png");
    }

    #[test]
    fn test_reads_legacy_meta() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("deprecated_stored_content");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("eggs.bonus"), "Barnicle").unwrap();
        fs::write(root.join("eggs.bonus.meta"), "some: meta\nnumber: 5\n").unwrap();

        let store = FileDataStore::new(&root);
        let (data, meta) = store.read("eggs.bonus").unwrap().unwrap();

        assert_eq!(data.as_ref(), b"Barnicle");
        let mut expected = Meta::new();
        expected.insert("name".into(), json!("eggs.bonus"));
        expected.insert("some".into(), json!("meta"));
        expected.insert("number".into(), json!(5));
        assert_eq!(meta, expected);
    }
}
