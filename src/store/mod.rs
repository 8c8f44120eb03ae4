//! Store module - Object store boundary
//!
//! A synchronous `ObjectStore` trait with an S3 implementation and an
//! in-memory one that follows the same delimiter semantics.

mod memory;
mod s3;

pub use memory::MemoryStore;
pub use s3::S3Store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Delimiter used to group keys into virtual folders
pub const DELIMITER: &str = "/";

/// A stored object as returned by a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// Full object key
    pub key: String,
    /// Last modification time
    pub last_modified: DateTime<Utc>,
    /// Size in bytes
    pub size_bytes: u64,
}

/// A common prefix one level below the listed prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderEntry {
    /// Full prefix, including the trailing delimiter
    pub prefix: String,
}

impl FolderEntry {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

/// Result of one delimited listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub folders: Vec<FolderEntry>,
    pub files: Vec<ObjectEntry>,
}

impl Listing {
    /// Build a listing, dropping folder marker keys from the file set
    pub fn new(folders: Vec<FolderEntry>, files: Vec<ObjectEntry>, delimiter: &str) -> Self {
        let files = if delimiter.is_empty() {
            files
        } else {
            files
                .into_iter()
                .filter(|f| !f.key.ends_with(delimiter))
                .collect()
        };
        Self { folders, files }
    }
}

/// Operations the browser needs from an object store
pub trait ObjectStore {
    /// Names of all buckets visible to the credentials
    fn list_bucket_names(&self) -> Result<Vec<String>>;

    /// One non-recursive listing of `prefix`, grouped at `delimiter`
    fn list_entries(&self, bucket: &str, prefix: &str, delimiter: &str) -> Result<Listing>;

    /// Full body of a single object
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;
}

impl<T: ObjectStore + ?Sized> ObjectStore for Box<T> {
    fn list_bucket_names(&self) -> Result<Vec<String>> {
        (**self).list_bucket_names()
    }

    fn list_entries(&self, bucket: &str, prefix: &str, delimiter: &str) -> Result<Listing> {
        (**self).list_entries(bucket, prefix, delimiter)
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        (**self).get_object(bucket, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str) -> ObjectEntry {
        ObjectEntry {
            key: key.to_string(),
            last_modified: DateTime::<Utc>::default(),
            size_bytes: 0,
        }
    }

    #[test]
    fn test_listing_drops_folder_markers() {
        let listing = Listing::new(
            vec![FolderEntry::new("logs/app/")],
            vec![entry("logs/"), entry("logs/a.gz")],
            "/",
        );
        assert_eq!(listing.files.len(), 1);
        assert_eq!(listing.files[0].key, "logs/a.gz");
        assert_eq!(listing.folders.len(), 1);
    }

    #[test]
    fn test_listing_without_delimiter_keeps_all() {
        let listing = Listing::new(Vec::new(), vec![entry("logs/"), entry("a")], "");
        assert_eq!(listing.files.len(), 2);
    }
}
