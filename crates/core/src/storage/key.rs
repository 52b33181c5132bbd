//! Object key scheme: `videos/{item_id}.{ext}`.

use std::collections::HashSet;

use super::{ObjectStore, StorageError};

/// Prefix every media object lives under.
pub const VIDEO_PREFIX: &str = "videos/";

/// Build the storage key for an item.
pub fn object_key(item_id: &str, ext: &str) -> String {
    format!("{VIDEO_PREFIX}{item_id}.{ext}")
}

/// Recover the item id from a storage key.
///
/// Only direct children of `videos/` with a non-empty stem and an
/// extension are accepted.
pub fn item_id_from_key(key: &str) -> Option<&str> {
    let name = key.strip_prefix(VIDEO_PREFIX)?;
    if name.contains('/') {
        return None;
    }
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(stem)
}

/// Ids of every item that has an object in storage.
pub async fn stored_item_ids(store: &dyn ObjectStore) -> Result<HashSet<String>, StorageError> {
    let keys = store.list_keys(VIDEO_PREFIX).await?;
    Ok(keys
        .iter()
        .filter_map(|key| item_id_from_key(key))
        .map(str::to_string)
        .collect())
}
