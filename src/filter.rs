//! Listing & filter engine
//!
//! The name filter is pushed to the store as a listing prefix; the date and
//! time-of-day filters run locally against timestamps converted to the
//! fixed reference zone (UTC+9).

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, TimeDelta, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::{BrowseError, Result};
use crate::store::{ObjectStore, DELIMITER};

/// Offset of the reference zone in seconds
pub const REFERENCE_OFFSET_SECS: i32 = 9 * 3600;

/// Half-width of the time-of-day window, inclusive on both ends
pub const TIME_WINDOW_MINUTES: i64 = 10;

/// The fixed zone all timestamps are shown and filtered in
pub fn reference_zone() -> FixedOffset {
    FixedOffset::east_opt(REFERENCE_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Convert a stored timestamp into the reference zone
pub fn to_reference(ts: DateTime<Utc>) -> DateTime<FixedOffset> {
    ts.with_timezone(&reference_zone())
}

/// Active filters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Appended to the current prefix for the listing call
    pub name_prefix: String,
    /// Calendar date in the reference zone
    pub date: Option<NaiveDate>,
    /// Centre of the ±10 minute window, on the entry's own date
    pub time_of_day: Option<NaiveTime>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.name_prefix.is_empty() && self.date.is_none() && self.time_of_day.is_none()
    }

    /// Whether a reference-zone timestamp passes the date and time filters
    pub fn matches(&self, local: &DateTime<FixedOffset>) -> bool {
        let date = local.date_naive();

        if let Some(wanted) = self.date {
            if date != wanted {
                return false;
            }
        }

        if let Some(time) = self.time_of_day {
            let Some(target) = date
                .and_time(time)
                .and_local_timezone(reference_zone())
                .single()
            else {
                return false;
            };
            let window = TimeDelta::minutes(TIME_WINDOW_MINUTES);
            if *local < target - window || *local > target + window {
                return false;
            }
        }

        true
    }

    /// Short human summary for status lines
    pub fn describe(&self) -> String {
        if self.is_empty() {
            return "none".to_string();
        }
        let mut parts = Vec::new();
        if !self.name_prefix.is_empty() {
            parts.push(format!("name^={}", self.name_prefix));
        }
        if let Some(date) = self.date {
            parts.push(format!("date={}", date));
        }
        if let Some(time) = self.time_of_day {
            parts.push(format!("time={}±{}m", time.format("%H:%M"), TIME_WINDOW_MINUTES));
        }
        parts.join(" ")
    }
}

/// A folder row with its name relative to the current prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderRow {
    pub prefix: String,
    pub display_name: String,
}

/// A file row that passed all filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRow {
    pub key: String,
    pub display_name: String,
    pub size_bytes: u64,
    /// Last modified, in the reference zone
    pub modified: DateTime<FixedOffset>,
}

/// Filtered listing of one folder level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilteredListing {
    pub folders: Vec<FolderRow>,
    pub files: Vec<FileRow>,
    /// Files returned by the store before the date/time filters
    pub total_files: usize,
}

/// Folder name shown for `folder` under `current_prefix`
pub fn folder_display_name(folder: &str, current_prefix: &str) -> String {
    let relative = folder.strip_prefix(current_prefix).unwrap_or(folder);
    relative
        .strip_suffix(DELIMITER)
        .unwrap_or(relative)
        .to_string()
}

/// File name shown for `key` under `current_prefix`
pub fn file_display_name(key: &str, current_prefix: &str) -> String {
    key.strip_prefix(current_prefix).unwrap_or(key).to_string()
}

/// List `current_prefix` and apply `criteria`
///
/// Store order is preserved for both folders and files.
pub fn list_filtered(
    store: &dyn ObjectStore,
    bucket: &str,
    current_prefix: &str,
    criteria: &FilterCriteria,
) -> Result<FilteredListing> {
    let query = format!("{}{}", current_prefix, criteria.name_prefix);
    let listing = store.list_entries(bucket, &query, DELIMITER)?;

    let folders = listing
        .folders
        .iter()
        .map(|f| FolderRow {
            prefix: f.prefix.clone(),
            display_name: folder_display_name(&f.prefix, current_prefix),
        })
        .collect();

    let total_files = listing.files.len();
    let files: Vec<FileRow> = listing
        .files
        .into_iter()
        .filter_map(|entry| {
            let modified = to_reference(entry.last_modified);
            if !criteria.matches(&modified) {
                return None;
            }
            Some(FileRow {
                display_name: file_display_name(&entry.key, current_prefix),
                key: entry.key,
                size_bytes: entry.size_bytes,
                modified,
            })
        })
        .collect();

    debug!(
        "Filter [{}] kept {}/{} files under '{}'",
        criteria.describe(),
        files.len(),
        total_files,
        query
    );

    Ok(FilteredListing {
        folders,
        files,
        total_files,
    })
}

/// Parse a `YYYY-MM-DD` date; empty input clears the filter
pub fn parse_date(input: &str) -> Result<Option<NaiveDate>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| BrowseError::InvalidFilter {
            field: "date",
            input: input.to_string(),
            expected: "YYYY-MM-DD",
        })
}

/// Parse `HH:MM` or `HH:MM:SS`; empty input clears the filter
pub fn parse_time(input: &str) -> Result<Option<NaiveTime>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    NaiveTime::parse_from_str(input, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M:%S"))
        .map(Some)
        .map_err(|_| BrowseError::InvalidFilter {
            field: "time",
            input: input.to_string(),
            expected: "HH:MM",
        })
}
