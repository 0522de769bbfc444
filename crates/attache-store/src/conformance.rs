//! Behaviour every data store must share, run from each backend's tests

use attache_core::{Content, NAME_KEY};
use serde_json::json;

use crate::datastore::{DataStore, WriteOptions};
use crate::error::StoreError;

pub(crate) fn data_store_behaviour<S: DataStore>(store: &S) {
    // write then read
    let mut content = Content::new("gollum");
    content.meta.insert("bitrate".into(), json!(35));
    let uid = store.write(&content, &WriteOptions::default()).unwrap();

    let (data, meta) = store.read(&uid).unwrap().expect("written content is readable");
    assert_eq!(data.as_ref(), b"gollum");
    assert_eq!(meta.get("bitrate"), Some(&json!(35)));

    // unnamed content still round-trips
    let plain = Content::new(vec![0u8, 159, 146, 150, 255]);
    let plain_uid = store.write(&plain, &WriteOptions::default()).unwrap();
    let (data, meta) = store.read(&plain_uid).unwrap().unwrap();
    assert_eq!(data.as_ref(), &[0u8, 159, 146, 150, 255][..]);
    let basename = plain_uid.rsplit('/').next().unwrap();
    assert_eq!(meta.get(NAME_KEY), Some(&json!(basename)));

    // destroy
    store.destroy(&uid).unwrap();
    assert!(store.read(&uid).unwrap().is_none());
    store.destroy(&uid).unwrap();

    // missing and malformed uids
    assert!(store.read("gooble/gubbub").unwrap().is_none());
    assert!(matches!(
        store.read("gooble/../gubbub"),
        Err(StoreError::BadUid(_))
    ));
    assert!(matches!(
        store.destroy("gooble/../gubbub"),
        Err(StoreError::BadUid(_))
    ));

    store.destroy(&plain_uid).unwrap();
}
