//! Durable object storage for transferred media.

mod key;
mod s3;
mod types;

pub use key::{item_id_from_key, object_key, stored_item_ids, VIDEO_PREFIX};
pub use s3::S3ObjectStore;
pub use types::{ObjectMetadata, ObjectStore, StorageError};
