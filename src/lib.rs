//! bucket-grep Library
//!
//! Browse S3 buckets one folder level at a time, filter objects by name
//! prefix and by modification date/time in UTC+9, decode `.gz` logs and
//! filter their lines with a regular expression.
//!
//! # Features
//!
//! - **Folder browsing**: delimiter listings with a parent row
//! - **Filters**: server-side name prefix, local date and ±10 minute window
//! - **Gzip decoding**: lossy UTF-8, corrupt archives reported, never fatal
//! - **Live regex search**: re-run on every keystroke
//!
//! # Example
//!
//! ```no_run
//! use bucket_grep::filter::{self, FilterCriteria};
//! use bucket_grep::store::S3Store;
//!
//! fn main() -> anyhow::Result<()> {
//!     let store = S3Store::connect("default", None)?;
//!     let criteria = FilterCriteria {
//!         date: filter::parse_date("2024-01-01")?,
//!         ..Default::default()
//!     };
//!     let listing = filter::list_filtered(&store, "my-logs", "app/", &criteria)?;
//!
//!     println!("{} files on 2024-01-01", listing.files.len());
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod nav;
pub mod search;
pub mod store;
pub mod tui;

// Re-export commonly used types
pub use config::Config;
pub use error::{BrowseError, Result};
pub use filter::{FileRow, FilterCriteria, FilteredListing, FolderRow};
pub use nav::Session;
pub use search::{LineMatches, Matcher};
pub use store::{FolderEntry, Listing, MemoryStore, ObjectEntry, ObjectStore, S3Store};
