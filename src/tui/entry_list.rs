//! Entry list for the objects tab
//!
//! One level of a bucket as a flat list: an optional parent row, then
//! folders, then files, with cursor-based navigation.

use crate::filter::{FileRow, FilteredListing, FolderRow};

/// A row in the objects list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryRow {
    /// `..`, present below the bucket root
    Parent,
    Folder(FolderRow),
    File(FileRow),
}

impl EntryRow {
    pub fn name(&self) -> &str {
        match self {
            EntryRow::Parent => "..",
            EntryRow::Folder(folder) => &folder.display_name,
            EntryRow::File(file) => &file.display_name,
        }
    }

    pub fn file(&self) -> Option<&FileRow> {
        match self {
            EntryRow::File(file) => Some(file),
            _ => None,
        }
    }
}

/// Flat entry list with cursor-based navigation
#[derive(Debug, Default)]
pub struct EntryList {
    rows: Vec<EntryRow>,
    /// Current selection index (into `rows`)
    selected: usize,
}

impl EntryList {
    /// Create empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Build rows from a filtered listing, keeping store order
    pub fn from_listing(listing: &FilteredListing, has_parent: bool) -> Self {
        let mut rows = Vec::with_capacity(listing.folders.len() + listing.files.len() + 1);
        if has_parent {
            rows.push(EntryRow::Parent);
        }
        rows.extend(listing.folders.iter().cloned().map(EntryRow::Folder));
        rows.extend(listing.files.iter().cloned().map(EntryRow::File));

        Self { rows, selected: 0 }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn folder_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(r, EntryRow::Folder(_)))
            .count()
    }

    pub fn file_count(&self) -> usize {
        self.rows.iter().filter(|r| r.file().is_some()).count()
    }

    /// Get current selection index
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> Option<&EntryRow> {
        self.rows.get(self.selected)
    }

    /// Put the cursor on the file with `key`, if it is listed
    pub fn select_key(&mut self, key: &str) -> bool {
        match self
            .rows
            .iter()
            .position(|r| r.file().is_some_and(|f| f.key == key))
        {
            Some(idx) => {
                self.selected = idx;
                true
            }
            None => false,
        }
    }

    /// Get a window of rows around the selection for scrolling
    pub fn visible_window(&self, height: usize) -> (&[EntryRow], usize) {
        let total = self.rows.len();
        if total == 0 || height == 0 {
            return (&[], 0);
        }

        let half = height / 2;
        let start = if self.selected > half {
            (self.selected - half).min(total.saturating_sub(height))
        } else {
            0
        };
        let end = (start + height).min(total);

        (&self.rows[start..end], self.selected - start)
    }

    /// Move selection down
    pub fn select_next(&mut self) {
        if !self.rows.is_empty() && self.selected < self.rows.len() - 1 {
            self.selected += 1;
        }
    }

    /// Move selection up
    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Move down by `n` rows, stopping at the end
    pub fn page_down(&mut self, n: usize) {
        if !self.rows.is_empty() {
            self.selected = (self.selected + n).min(self.rows.len() - 1);
        }
    }

    /// Move up by `n` rows, stopping at the start
    pub fn page_up(&mut self, n: usize) {
        self.selected = self.selected.saturating_sub(n);
    }

    /// Jump to first
    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    /// Jump to last
    pub fn select_last(&mut self) {
        if !self.rows.is_empty() {
            self.selected = self.rows.len() - 1;
        }
    }
}
