//! Navigation state for one browsing session
//!
//! Tracks the current prefix, the selected key and the decoded text of that
//! key. Transitions keep the three fields consistent: entering a folder
//! drops the selection, changing the selection drops the text.

use tracing::{info, warn};

use crate::archive;
use crate::error::{BrowseError, Result};
use crate::store::{ObjectStore, DELIMITER};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    current_prefix: String,
    selected_key: Option<String>,
    current_text: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_prefix(&self) -> &str {
        &self.current_prefix
    }

    pub fn selected_key(&self) -> Option<&str> {
        self.selected_key.as_deref()
    }

    pub fn current_text(&self) -> Option<&str> {
        self.current_text.as_deref()
    }

    /// Parent navigation is offered only below the bucket root
    pub fn can_go_up(&self) -> bool {
        !self.current_prefix.is_empty()
    }

    /// The selected key can be decoded
    pub fn can_decode(&self) -> bool {
        self.selected_key.as_deref().is_some_and(archive::is_archive)
    }

    pub fn enter_folder(&mut self, folder: &str) {
        self.current_prefix = folder.to_string();
        self.clear_selection();
    }

    /// Move one segment up; returns false at the bucket root
    pub fn go_to_parent(&mut self) -> bool {
        match parent_prefix(&self.current_prefix) {
            Some(parent) => {
                self.current_prefix = parent;
                self.clear_selection();
                true
            }
            None => false,
        }
    }

    /// Select `key`; the decoded text survives only if the key is unchanged
    pub fn select_entry(&mut self, key: &str) {
        if self.selected_key.as_deref() != Some(key) {
            self.current_text = None;
            self.selected_key = Some(key.to_string());
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected_key = None;
        self.current_text = None;
    }

    /// Back to the bucket root with nothing selected
    pub fn reset(&mut self) {
        self.current_prefix.clear();
        self.clear_selection();
    }

    /// Fetch and decode the selected archive into `current_text`
    ///
    /// Returns the decoded length in bytes. A vanished key clears the
    /// selection; a corrupt archive leaves the text unset.
    pub fn decode_current(&mut self, store: &dyn ObjectStore, bucket: &str) -> Result<usize> {
        let key = self
            .selected_key
            .clone()
            .ok_or(BrowseError::NothingSelected)?;
        if !archive::is_archive(&key) {
            return Err(BrowseError::NotArchive(key));
        }

        let bytes = match store.get_object(bucket, &key) {
            Ok(bytes) => bytes,
            Err(err) => {
                if matches!(err, BrowseError::NotFound(_)) {
                    warn!("Selected key vanished: {}", key);
                    self.clear_selection();
                }
                return Err(err);
            }
        };

        let text = archive::decode(&bytes)?;
        info!(
            "Decoded s3://{}/{} ({} -> {} bytes)",
            bucket,
            key,
            bytes.len(),
            text.len()
        );
        let len = text.len();
        self.current_text = Some(text);
        Ok(len)
    }
}

/// Folder prefix for user input: surrounding delimiters trimmed, one
/// trailing delimiter added. Empty input stays empty.
pub fn normalize_prefix(input: &str) -> String {
    let trimmed = input.trim_matches(|c| DELIMITER.contains(c));
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}{}", trimmed, DELIMITER)
    }
}

/// Prefix one segment above `prefix`, or `None` at the root
///
/// `"a/b/c/"` and `"a/b/c"` both yield `"a/b/"`; a single segment yields `""`.
pub fn parent_prefix(prefix: &str) -> Option<String> {
    if prefix.is_empty() {
        return None;
    }
    let trimmed = prefix.trim_matches(|c| DELIMITER.contains(c));

    let segments: Vec<&str> = trimmed.split(DELIMITER).collect();
    let parent = segments[..segments.len().saturating_sub(1)].join(DELIMITER);
    if parent.is_empty() {
        Some(String::new())
    } else {
        Some(format!("{}{}", parent, DELIMITER))
    }
}
