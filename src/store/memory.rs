//! In-memory object store with S3 listing semantics

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{FolderEntry, Listing, ObjectEntry, ObjectStore};
use crate::error::{BrowseError, Result};

#[derive(Debug, Clone)]
struct StoredObject {
    body: Vec<u8>,
    last_modified: DateTime<Utc>,
}

type Buckets = BTreeMap<String, BTreeMap<String, StoredObject>>;

/// Shared in-memory store
///
/// Clones share the same contents, so a test can keep a handle and mutate
/// the store after handing a clone to the browser.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    buckets: Arc<RwLock<Buckets>>,
    offline: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty bucket
    pub fn create_bucket(&self, bucket: &str) {
        self.buckets.write().entry(bucket.to_string()).or_default();
    }

    /// Insert or replace an object, creating the bucket if needed
    pub fn put(&self, bucket: &str, key: &str, body: impl Into<Vec<u8>>, last_modified: DateTime<Utc>) {
        self.buckets
            .write()
            .entry(bucket.to_string())
            .or_default()
            .insert(
                key.to_string(),
                StoredObject {
                    body: body.into(),
                    last_modified,
                },
            );
    }

    /// Remove an object; returns whether it existed
    pub fn remove(&self, bucket: &str, key: &str) -> bool {
        self.buckets
            .write()
            .get_mut(bucket)
            .map(|objects| objects.remove(key).is_some())
            .unwrap_or(false)
    }

    /// Simulate network loss: every call fails with a connectivity error
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BrowseError::Connectivity("store is offline".to_string()));
        }
        Ok(())
    }
}

impl ObjectStore for MemoryStore {
    fn list_bucket_names(&self) -> Result<Vec<String>> {
        self.check_online()?;
        Ok(self.buckets.read().keys().cloned().collect())
    }

    fn list_entries(&self, bucket: &str, prefix: &str, delimiter: &str) -> Result<Listing> {
        self.check_online()?;
        let buckets = self.buckets.read();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| BrowseError::NotFound(bucket.to_string()))?;

        let mut folders: Vec<FolderEntry> = Vec::new();
        let mut files = Vec::new();

        for (key, object) in objects.range(prefix.to_string()..) {
            let Some(rest) = key.strip_prefix(prefix) else {
                break;
            };

            let folder_end = if delimiter.is_empty() {
                None
            } else {
                rest.find(delimiter).map(|idx| idx + delimiter.len())
            };

            match folder_end {
                Some(end) => {
                    let folder = format!("{}{}", prefix, &rest[..end]);
                    // Keys are sorted, so equal prefixes are adjacent
                    if folders.last().map(|f| f.prefix.as_str()) != Some(folder.as_str()) {
                        folders.push(FolderEntry::new(folder));
                    }
                }
                None => files.push(ObjectEntry {
                    key: key.clone(),
                    last_modified: object.last_modified,
                    size_bytes: object.body.len() as u64,
                }),
            }
        }

        Ok(Listing::new(folders, files, delimiter))
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.check_online()?;
        self.buckets
            .read()
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|object| object.body.clone())
            .ok_or_else(|| BrowseError::NotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        let ts = DateTime::<Utc>::default();
        store.put("logs", "app/2024/01/a.gz", b"a".to_vec(), ts);
        store.put("logs", "app/2024/02/b.gz", b"bb".to_vec(), ts);
        store.put("logs", "app/readme.txt", b"ccc".to_vec(), ts);
        store.put("logs", "app/", Vec::new(), ts);
        store.put("logs", "web/access.gz", b"d".to_vec(), ts);
        store
    }

    #[test]
    fn test_root_listing_groups_top_level() {
        let listing = store().list_entries("logs", "", "/").unwrap();
        let folders: Vec<&str> = listing.folders.iter().map(|f| f.prefix.as_str()).collect();
        assert_eq!(folders, vec!["app/", "web/"]);
        assert!(listing.files.is_empty());
    }

    #[test]
    fn test_nested_listing() {
        let listing = store().list_entries("logs", "app/", "/").unwrap();
        let folders: Vec<&str> = listing.folders.iter().map(|f| f.prefix.as_str()).collect();
        assert_eq!(folders, vec!["app/2024/"]);
        // Folder marker "app/" is excluded
        let keys: Vec<&str> = listing.files.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["app/readme.txt"]);
        assert_eq!(listing.files[0].size_bytes, 3);
    }

    #[test]
    fn test_partial_name_prefix() {
        let listing = store().list_entries("logs", "app/re", "/").unwrap();
        assert!(listing.folders.is_empty());
        assert_eq!(listing.files.len(), 1);
    }

    #[test]
    fn test_missing_bucket_and_key() {
        let s = store();
        assert!(matches!(
            s.list_entries("nope", "", "/"),
            Err(BrowseError::NotFound(_))
        ));
        assert!(matches!(
            s.get_object("logs", "missing.gz"),
            Err(BrowseError::NotFound(_))
        ));
    }

    #[test]
    fn test_offline_and_removal() {
        let s = store();
        let handle = s.clone();
        assert!(handle.remove("logs", "web/access.gz"));
        assert!(s.get_object("logs", "web/access.gz").is_err());

        handle.set_offline(true);
        assert!(matches!(
            s.list_bucket_names(),
            Err(BrowseError::Connectivity(_))
        ));
    }
}
