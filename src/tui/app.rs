//! App state - Central state management for the TUI

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};

use super::entry_list::{EntryList, EntryRow};
use super::log_view::LogView;
use crate::config::{Config, TuiConfig};
use crate::error::{BrowseError, Result};
use crate::filter::{self, FilterCriteria, FilteredListing};
use crate::nav::{self, Session};
use crate::store::ObjectStore;

/// Resolves a profile name into a store
pub type Connector = Box<dyn Fn(&str) -> Result<Box<dyn ObjectStore>>>;

/// Current view/tab in the TUI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Buckets,
    Objects,
    Log,
}

impl Tab {
    pub fn all() -> &'static [Tab] {
        &[Tab::Buckets, Tab::Objects, Tab::Log]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Buckets => " Buckets ",
            Tab::Objects => " Objects ",
            Tab::Log => " Log ",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Tab::Buckets => 0,
            Tab::Objects => 1,
            Tab::Log => 2,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Tab::Buckets => Tab::Objects,
            Tab::Objects => Tab::Log,
            Tab::Log => Tab::Buckets,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Tab::Buckets => Tab::Log,
            Tab::Objects => Tab::Buckets,
            Tab::Log => Tab::Objects,
        }
    }
}

/// Text inputs the user can edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Profile,
    NamePrefix,
    Date,
    Time,
    Pattern,
}

impl InputField {
    pub fn label(&self) -> &'static str {
        match self {
            InputField::Profile => "Profile",
            InputField::NamePrefix => "Name prefix",
            InputField::Date => "Date (UTC+9, YYYY-MM-DD)",
            InputField::Time => "Time (UTC+9, HH:MM ±10m)",
            InputField::Pattern => "Regex",
        }
    }
}

/// Application state machine phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Navigating lists and the log
    Browse,
    /// Typing into an input field
    Input(InputField),
}

/// Startup selections, usually from CLI flags and config
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    pub profile: String,
    pub bucket: Option<String>,
    pub prefix: Option<String>,
}

/// Single-character bindings that can be overridden from config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMap {
    pub quit: char,
    pub decode: char,
    pub refresh: char,
    pub profile: char,
    pub help: char,
}

impl KeyMap {
    fn from_config(config: &Config) -> Self {
        Self {
            quit: config.key_char("quit", 'q'),
            decode: config.key_char("decode", 'd'),
            refresh: config.key_char("refresh", 'r'),
            profile: config.key_char("profile", 'p'),
            help: config.key_char("help", '?'),
        }
    }
}

/// Main application state
pub struct App {
    /// Current app phase
    pub state: AppState,
    /// Current tab
    pub tab: Tab,
    /// Should the app quit
    pub should_quit: bool,
    /// Show help overlay
    pub show_help: bool,
    /// Profile the store was (or will be) resolved from
    pub profile: String,
    /// Buckets visible to the profile
    pub buckets: Vec<String>,
    /// Cursor in the bucket list
    pub bucket_cursor: usize,
    /// Open bucket
    pub bucket: Option<String>,
    /// Prefix / selection / decoded text
    pub session: Session,
    /// Active listing filters
    pub criteria: FilterCriteria,
    /// Rows of the current folder level
    pub entries: EntryList,
    /// Files returned before the date/time filters
    pub listed_files: usize,
    /// Filtered view of the decoded text
    pub log: LogView,
    /// Edit buffer of the active input field
    pub input: String,
    /// Authentication failure; blocks browsing until the profile changes
    pub fatal_error: Option<String>,
    /// Status bar message
    pub status_message: String,
    /// Display settings
    pub tui_config: TuiConfig,
    connector: Connector,
    store: Option<Box<dyn ObjectStore>>,
    keys: KeyMap,
}

impl App {
    pub fn new(connector: Connector, options: AppOptions, config: &Config) -> Self {
        let mut session = Session::new();
        if let Some(prefix) = options.prefix.as_deref().map(nav::normalize_prefix) {
            if !prefix.is_empty() {
                session.enter_folder(&prefix);
            }
        }

        Self {
            state: AppState::Browse,
            tab: Tab::Buckets,
            should_quit: false,
            show_help: false,
            profile: options.profile,
            buckets: Vec::new(),
            bucket_cursor: 0,
            bucket: options.bucket,
            session,
            criteria: FilterCriteria::default(),
            entries: EntryList::new(),
            listed_files: 0,
            log: LogView::new(),
            input: String::new(),
            fatal_error: None,
            status_message: "Press '?' for help".to_string(),
            tui_config: config.tui.clone(),
            connector,
            store: None,
            keys: KeyMap::from_config(config),
        }
    }

    /// Active key bindings, for hints and help
    pub fn keys(&self) -> KeyMap {
        self.keys
    }

    pub fn is_connected(&self) -> bool {
        self.store.is_some()
    }

    /// Resolve the profile and list its buckets
    ///
    /// A bucket preselected at startup is opened directly, keeping the
    /// startup prefix.
    pub fn connect(&mut self) {
        self.store = None;
        self.buckets.clear();
        self.bucket_cursor = 0;
        self.entries = EntryList::new();

        let result = (self.connector)(&self.profile).and_then(|store| {
            let names = store.list_bucket_names()?;
            Ok((store, names))
        });

        let (store, names) = match result {
            Ok(ok) => ok,
            Err(err) => {
                self.handle_error(err);
                return;
            }
        };

        info!("Profile '{}' sees {} buckets", self.profile, names.len());
        self.store = Some(store);
        self.buckets = names;
        self.fatal_error = None;
        self.status_message = format!(
            "Profile '{}': {} buckets",
            self.profile,
            self.buckets.len()
        );

        if let Some(bucket) = self.bucket.clone() {
            match self.buckets.iter().position(|b| *b == bucket) {
                Some(idx) => {
                    self.bucket_cursor = idx;
                    self.tab = Tab::Objects;
                    self.refresh();
                }
                None => {
                    self.status_message = format!("Bucket '{}' not visible to this profile", bucket);
                    self.bucket = None;
                    self.session.reset();
                    self.log.clear();
                }
            }
        }
    }

    /// Open the bucket under the cursor at its root
    pub fn open_selected_bucket(&mut self) {
        let Some(name) = self.buckets.get(self.bucket_cursor).cloned() else {
            return;
        };
        if self.bucket.as_deref() != Some(name.as_str()) {
            self.bucket = Some(name);
            self.session.reset();
            self.log.clear();
        }
        self.tab = Tab::Objects;
        self.refresh();
    }

    /// Re-list the current folder level with the active filters
    pub fn refresh(&mut self) {
        let (Some(store), Some(bucket)) = (self.store.as_deref(), self.bucket.as_deref()) else {
            return;
        };

        let listing =
            match filter::list_filtered(store, bucket, self.session.current_prefix(), &self.criteria)
            {
                Ok(listing) => listing,
                Err(err) => {
                    // Rows of the previous level must not show under the new prefix
                    self.listed_files = 0;
                    self.entries =
                        EntryList::from_listing(&FilteredListing::default(), self.session.can_go_up());
                    self.session.clear_selection();
                    self.log.clear();
                    self.handle_error(err);
                    return;
                }
            };

        self.listed_files = listing.total_files;
        self.entries = EntryList::from_listing(&listing, self.session.can_go_up());

        // A selection filtered out of the listing is dropped
        let kept = match self.session.selected_key().map(str::to_owned) {
            Some(key) => self.entries.select_key(&key),
            None => false,
        };
        if !kept {
            self.session.clear_selection();
        }
        self.sync_selection();

        self.status_message = format!(
            "{} folders, {}/{} files (filter: {})",
            self.entries.folder_count(),
            self.entries.file_count(),
            self.listed_files,
            self.criteria.describe()
        );
    }

    /// Make the file under the cursor the session selection
    fn sync_selection(&mut self) {
        if let Some(key) = self.entries.selected().and_then(|r| r.file()).map(|f| f.key.clone()) {
            self.session.select_entry(&key);
        }
        if self.session.current_text().is_none() && self.log.is_loaded() {
            self.log.clear();
        }
    }

    pub fn enter_folder(&mut self, prefix: &str) {
        self.session.enter_folder(prefix);
        self.log.clear();
        self.refresh();
    }

    pub fn go_to_parent(&mut self) {
        if self.session.go_to_parent() {
            self.log.clear();
            self.refresh();
        } else {
            self.status_message = "Already at the bucket root".to_string();
        }
    }

    /// Fetch and decode the selected archive, then show the log tab
    pub fn decode_selected(&mut self) {
        let (Some(store), Some(bucket)) = (self.store.as_deref(), self.bucket.as_deref()) else {
            return;
        };

        match self.session.decode_current(store, bucket) {
            Ok(len) => {
                if let Some(text) = self.session.current_text() {
                    self.log.load(text);
                }
                self.tab = Tab::Log;
                self.status_message = format!(
                    "Decoded {} ({}, {} lines)",
                    self.session.selected_key().unwrap_or_default(),
                    humansize::format_size(len, humansize::BINARY),
                    self.log.total_lines()
                );
            }
            Err(err) => {
                self.log.clear();
                self.handle_error(err);
            }
        }
    }

    /// Render an error where the user will see it
    fn handle_error(&mut self, err: BrowseError) {
        warn!("{}", err);
        if err.is_fatal() {
            self.fatal_error = Some(err.to_string());
            self.store = None;
            self.buckets.clear();
            self.bucket = None;
            self.entries = EntryList::new();
            self.session.reset();
            self.log.clear();
            self.tab = Tab::Buckets;
            self.status_message = format!("Press '{}' to enter another profile", self.keys.profile);
        } else if err.is_retryable() {
            self.status_message = format!("Error: {} (press '{}' to retry)", err, self.keys.refresh);
        } else {
            self.status_message = format!("Error: {}", err);
        }
    }

    /// Global key handler
    pub fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if self.show_help {
            self.show_help = false;
            return;
        }

        match self.state {
            AppState::Input(field) => self.handle_input_key(field, key),
            AppState::Browse if self.fatal_error.is_some() => self.handle_fatal_key(key),
            AppState::Browse => self.handle_browse_key(key),
        }
    }

    /// Only profile entry, help and quit are offered after an auth failure
    fn handle_fatal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) if c == self.keys.quit => self.should_quit = true,
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char(c) if c == self.keys.profile => self.start_input(InputField::Profile),
            KeyCode::Enter => self.start_input(InputField::Profile),
            KeyCode::Char(c) if c == self.keys.help => self.show_help = true,
            _ => {}
        }
    }

    /// Key handler for main browse mode
    fn handle_browse_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) if c == self.keys.quit => {
                self.should_quit = true;
                return;
            }
            KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char(c) if c == self.keys.help => {
                self.show_help = true;
                return;
            }
            KeyCode::F(1) => {
                self.show_help = true;
                return;
            }
            KeyCode::Char(c) if c == self.keys.profile => {
                self.start_input(InputField::Profile);
                return;
            }
            KeyCode::Tab => {
                self.tab = self.tab.next();
                return;
            }
            KeyCode::BackTab => {
                self.tab = self.tab.prev();
                return;
            }
            KeyCode::Char('1') => {
                self.tab = Tab::Buckets;
                return;
            }
            KeyCode::Char('2') => {
                self.tab = Tab::Objects;
                return;
            }
            KeyCode::Char('3') => {
                self.tab = Tab::Log;
                return;
            }
            _ => {}
        }

        match self.tab {
            Tab::Buckets => self.handle_buckets_key(key),
            Tab::Objects => self.handle_objects_key(key),
            Tab::Log => self.handle_log_key(key),
        }
    }

    fn handle_buckets_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('k') | KeyCode::Up => {
                self.bucket_cursor = self.bucket_cursor.saturating_sub(1);
            }
            KeyCode::Char('j') | KeyCode::Down => {
                if self.bucket_cursor + 1 < self.buckets.len() {
                    self.bucket_cursor += 1;
                }
            }
            KeyCode::Char('g') | KeyCode::Home => self.bucket_cursor = 0,
            KeyCode::Char('G') | KeyCode::End => {
                self.bucket_cursor = self.buckets.len().saturating_sub(1);
            }
            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => self.open_selected_bucket(),
            KeyCode::Char(c) if c == self.keys.refresh => self.connect(),
            _ => {}
        }
    }

    fn handle_objects_key(&mut self, key: KeyEvent) {
        let page = self.tui_config.page_size.max(1);
        match key.code {
            // Navigation
            KeyCode::Char('k') | KeyCode::Up => self.entries.select_prev(),
            KeyCode::Char('j') | KeyCode::Down => self.entries.select_next(),
            KeyCode::Char('g') | KeyCode::Home => self.entries.select_first(),
            KeyCode::Char('G') | KeyCode::End => self.entries.select_last(),
            KeyCode::PageUp => self.entries.page_up(page),
            KeyCode::PageDown => self.entries.page_down(page),

            // Folder navigation / decode
            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => {
                self.activate_selected();
                return;
            }
            KeyCode::Backspace | KeyCode::Char('h') | KeyCode::Left => {
                self.go_to_parent();
                return;
            }
            KeyCode::Char(c) if c == self.keys.decode => {
                self.decode_or_explain();
                return;
            }
            KeyCode::Char(c) if c == self.keys.refresh => {
                self.refresh();
                return;
            }

            // Filters
            KeyCode::Char('/') => {
                self.start_input(InputField::NamePrefix);
                return;
            }
            KeyCode::Char('D') => {
                self.start_input(InputField::Date);
                return;
            }
            KeyCode::Char('T') => {
                self.start_input(InputField::Time);
                return;
            }
            KeyCode::Char('c') => {
                self.criteria = FilterCriteria::default();
                self.refresh();
                return;
            }
            _ => return,
        }
        self.sync_selection();
    }

    fn handle_log_key(&mut self, key: KeyEvent) {
        let page = self.tui_config.page_size.max(1);
        match key.code {
            KeyCode::Char('k') | KeyCode::Up => self.log.scroll_up(1),
            KeyCode::Char('j') | KeyCode::Down => self.log.scroll_down(1),
            KeyCode::PageUp => self.log.scroll_up(page),
            KeyCode::PageDown => self.log.scroll_down(page),
            KeyCode::Char('g') | KeyCode::Home => self.log.scroll_top(),
            KeyCode::Char('G') | KeyCode::End => self.log.scroll_bottom(),
            KeyCode::Char('h') | KeyCode::Left => self.log.scroll_left(8),
            KeyCode::Char('l') | KeyCode::Right => self.log.scroll_right(8),
            KeyCode::Char('0') => self.log.hscroll = 0,
            KeyCode::Char('/') => self.start_input(InputField::Pattern),
            KeyCode::Backspace => self.tab = Tab::Objects,
            _ => {}
        }
    }

    /// Enter on a row: parent, folder or file
    fn activate_selected(&mut self) {
        match self.entries.selected().cloned() {
            Some(EntryRow::Parent) => self.go_to_parent(),
            Some(EntryRow::Folder(folder)) => self.enter_folder(&folder.prefix),
            Some(EntryRow::File(_)) => self.decode_or_explain(),
            None => {}
        }
    }

    fn decode_or_explain(&mut self) {
        if self.session.can_decode() {
            self.decode_selected();
        } else {
            match self.session.selected_key() {
                Some(key) => {
                    self.status_message = BrowseError::NotArchive(key.to_string()).to_string();
                }
                None => self.status_message = BrowseError::NothingSelected.to_string(),
            }
        }
    }

    fn start_input(&mut self, field: InputField) {
        self.input = match field {
            InputField::Profile => self.profile.clone(),
            InputField::NamePrefix => self.criteria.name_prefix.clone(),
            InputField::Date => self
                .criteria
                .date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            InputField::Time => self
                .criteria
                .time_of_day
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_default(),
            InputField::Pattern => self.log.pattern.clone(),
        };
        self.state = AppState::Input(field);
        self.status_message = match field {
            InputField::Pattern => "Type to filter lines, Enter to confirm, Esc to clear".to_string(),
            _ => "Enter to apply, Esc to cancel, empty clears".to_string(),
        };
    }

    /// Handle keys while an input field is active
    fn handle_input_key(&mut self, field: InputField, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.state = AppState::Browse;
                self.commit_input(field);
            }
            KeyCode::Esc => {
                self.state = AppState::Browse;
                if field == InputField::Pattern {
                    self.input.clear();
                    self.apply_pattern();
                    self.status_message = "Pattern cleared".to_string();
                } else {
                    self.status_message = "Cancelled".to_string();
                }
            }
            KeyCode::Backspace => {
                self.input.pop();
                if field == InputField::Pattern {
                    self.apply_pattern();
                }
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                if field == InputField::Pattern {
                    self.apply_pattern();
                }
            }
            _ => {}
        }
    }

    /// Re-run the content search for the current edit buffer
    fn apply_pattern(&mut self) {
        let input = self.input.clone();
        self.log.set_pattern(&input, self.session.current_text());
    }

    fn commit_input(&mut self, field: InputField) {
        let value = self.input.trim().to_string();
        match field {
            InputField::Profile => {
                self.profile = value;
                self.bucket = None;
                self.session.reset();
                self.log.clear();
                self.tab = Tab::Buckets;
                self.connect();
            }
            InputField::NamePrefix => {
                // Leading/trailing spaces can be part of a key prefix
                self.criteria.name_prefix = self.input.clone();
                self.refresh();
            }
            InputField::Date => match filter::parse_date(&value) {
                Ok(date) => {
                    self.criteria.date = date;
                    self.refresh();
                }
                Err(err) => self.handle_error(err),
            },
            InputField::Time => match filter::parse_time(&value) {
                Ok(time) => {
                    self.criteria.time_of_day = time;
                    self.refresh();
                }
                Err(err) => self.handle_error(err),
            },
            InputField::Pattern => {
                self.apply_pattern();
                self.status_message = match &self.log.error {
                    Some(err) => format!("Error: {}", err),
                    None => format!("{} matching lines", self.log.match_count()),
                };
            }
        }
    }
}
