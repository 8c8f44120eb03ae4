//! Drive the TUI state machine with key events against an in-memory bucket

use std::io::Write;

use bucket_grep::tui::{App, AppOptions, AppState, Connector, InputField, Tab};
use bucket_grep::{BrowseError, Config, Listing, MemoryStore, ObjectStore};
use chrono::{TimeZone, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use flate2::{write::GzEncoder, Compression};

fn gz(text: &str) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(text.as_bytes()).unwrap();
    enc.finish().unwrap()
}

fn store() -> MemoryStore {
    let store = MemoryStore::new();
    // 01:00 UTC is 10:00 in UTC+9
    let jan1 = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();
    let jan2 = Utc.with_ymd_and_hms(2024, 1, 2, 1, 0, 0).unwrap();
    store.put("logs", "app/2024-01-01.log.gz", gz("ok\nError: x\n警告: y\ndone\n"), jan1);
    store.put("logs", "app/2024-01-02.log.gz", gz("quiet\n"), jan2);
    store.put("logs", "app/archive/old.log.gz", gz("old\n"), jan1);
    store.put("logs", "app/readme.txt", b"plain".to_vec(), jan1);
    store.put("logs", "web/access.log.gz", gz("GET /\n"), jan1);
    store
}

fn connector(store: &MemoryStore) -> Connector {
    let store = store.clone();
    Box::new(move |_profile: &str| Ok(Box::new(store.clone()) as Box<dyn ObjectStore>))
}

fn app_with(store: &MemoryStore, options: AppOptions) -> App {
    let mut app = App::new(connector(store), options, &Config::default());
    app.connect();
    app
}

fn press(app: &mut App, code: KeyCode) {
    app.on_key(KeyEvent::new(code, KeyModifiers::NONE));
}

fn type_str(app: &mut App, s: &str) {
    for c in s.chars() {
        press(app, KeyCode::Char(c));
    }
}

fn row_names(app: &App) -> Vec<String> {
    app.entries
        .visible_window(100)
        .0
        .iter()
        .map(|r| r.name().to_string())
        .collect()
}

/// Open "logs", enter "app/" and move the cursor onto the first file
fn open_first_log(app: &mut App) {
    press(app, KeyCode::Enter);
    press(app, KeyCode::Enter);
    press(app, KeyCode::Char('j'));
    press(app, KeyCode::Char('j'));
}

#[test]
fn test_browse_folders_and_parent() {
    let store = store();
    let mut app = app_with(&store, AppOptions::default());
    assert_eq!(app.buckets, vec!["logs"]);

    press(&mut app, KeyCode::Enter);
    assert_eq!(app.tab, Tab::Objects);
    assert_eq!(row_names(&app), vec!["app", "web"]);

    press(&mut app, KeyCode::Enter);
    assert_eq!(app.session.current_prefix(), "app/");
    assert_eq!(
        row_names(&app),
        vec!["..", "archive", "2024-01-01.log.gz", "2024-01-02.log.gz", "readme.txt"]
    );

    // Cursor on ".." selects nothing
    assert_eq!(app.session.selected_key(), None);

    press(&mut app, KeyCode::Char('j'));
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.session.current_prefix(), "app/archive/");

    press(&mut app, KeyCode::Backspace);
    assert_eq!(app.session.current_prefix(), "app/");
    press(&mut app, KeyCode::Char('h'));
    assert_eq!(app.session.current_prefix(), "");
    assert_eq!(row_names(&app), vec!["app", "web"]);

    press(&mut app, KeyCode::Backspace);
    assert!(app.status_message.contains("root"));
}

#[test]
fn test_decode_and_live_pattern() {
    let store = store();
    let mut app = app_with(&store, AppOptions::default());
    open_first_log(&mut app);
    assert_eq!(app.session.selected_key(), Some("app/2024-01-01.log.gz"));

    press(&mut app, KeyCode::Enter);
    assert_eq!(app.tab, Tab::Log);
    assert_eq!(app.log.total_lines(), 4);
    assert_eq!(app.log.match_count(), 4);

    press(&mut app, KeyCode::Char('/'));
    assert_eq!(app.state, AppState::Input(InputField::Pattern));
    type_str(&mut app, "Error");
    assert_eq!(app.log.match_count(), 1);
    type_str(&mut app, "|警告");
    assert_eq!(app.log.match_count(), 2);

    press(&mut app, KeyCode::Enter);
    assert_eq!(app.state, AppState::Browse);
    assert_eq!(app.log.pattern, "Error|警告");
    let text = app.session.current_text().unwrap();
    let lines: Vec<&str> = app.log.window(text, 10).into_iter().map(|(_, l)| l).collect();
    assert_eq!(lines, vec!["Error: x", "警告: y"]);

    // Esc while editing clears the pattern
    press(&mut app, KeyCode::Char('/'));
    press(&mut app, KeyCode::Esc);
    assert_eq!(app.log.pattern, "");
    assert_eq!(app.log.match_count(), 4);
}

#[test]
fn test_invalid_pattern_shows_error_and_no_lines() {
    let store = store();
    let mut app = app_with(&store, AppOptions::default());
    open_first_log(&mut app);
    press(&mut app, KeyCode::Char('d'));

    press(&mut app, KeyCode::Char('/'));
    type_str(&mut app, "(");
    assert!(app.log.error.is_some());
    assert_eq!(app.log.match_count(), 0);

    type_str(&mut app, "ok)");
    assert!(app.log.error.is_none());
    assert_eq!(app.log.match_count(), 1);
}

#[test]
fn test_pattern_applies_to_next_decoded_file() {
    let store = store();
    let mut app = app_with(&store, AppOptions::default());
    open_first_log(&mut app);
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Char('/'));
    type_str(&mut app, "quiet");
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.log.match_count(), 0);

    press(&mut app, KeyCode::Backspace);
    assert_eq!(app.tab, Tab::Objects);
    press(&mut app, KeyCode::Char('j'));
    assert_eq!(app.session.selected_key(), Some("app/2024-01-02.log.gz"));
    assert!(!app.log.is_loaded());

    press(&mut app, KeyCode::Enter);
    assert_eq!(app.log.match_count(), 1);
}

#[test]
fn test_non_archive_is_not_decoded() {
    let store = store();
    let mut app = app_with(&store, AppOptions::default());
    open_first_log(&mut app);
    press(&mut app, KeyCode::Char('G'));
    assert_eq!(app.session.selected_key(), Some("app/readme.txt"));

    press(&mut app, KeyCode::Enter);
    assert_eq!(app.tab, Tab::Objects);
    assert!(app.status_message.contains("not a .gz archive"));
    assert_eq!(app.session.current_text(), None);
}

#[test]
fn test_vanished_key_clears_selection() {
    let store = store();
    let mut app = app_with(&store, AppOptions::default());
    open_first_log(&mut app);

    assert!(store.remove("logs", "app/2024-01-01.log.gz"));
    press(&mut app, KeyCode::Char('d'));

    assert!(app.status_message.contains("not found"));
    assert_eq!(app.session.selected_key(), None);
    assert_eq!(app.session.current_prefix(), "app/");
    assert!(app.fatal_error.is_none());
}

#[test]
fn test_date_filter_drops_hidden_selection() {
    let store = store();
    let mut app = app_with(&store, AppOptions::default());
    open_first_log(&mut app);

    press(&mut app, KeyCode::Char('D'));
    type_str(&mut app, "2024-01-02");
    press(&mut app, KeyCode::Enter);

    assert_eq!(row_names(&app), vec!["..", "archive", "2024-01-02.log.gz"]);
    assert_eq!(app.listed_files, 3);
    assert_eq!(app.session.selected_key(), None);

    press(&mut app, KeyCode::Char('c'));
    assert_eq!(app.entries.file_count(), 3);
}

#[test]
fn test_time_filter_from_keys() {
    let store = store();
    let mut app = app_with(&store, AppOptions::default());
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Enter);

    press(&mut app, KeyCode::Char('T'));
    type_str(&mut app, "09:50");
    press(&mut app, KeyCode::Enter);
    // 10:00 is inside 09:50 ±10 minutes on both days
    assert_eq!(app.entries.file_count(), 3);

    press(&mut app, KeyCode::Char('T'));
    for _ in 0..5 {
        press(&mut app, KeyCode::Backspace);
    }
    type_str(&mut app, "09:49");
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.entries.file_count(), 0);
    assert_eq!(app.listed_files, 3);
}

#[test]
fn test_name_prefix_filter_from_keys() {
    let store = store();
    let mut app = app_with(&store, AppOptions::default());
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Enter);

    press(&mut app, KeyCode::Char('/'));
    assert_eq!(app.state, AppState::Input(InputField::NamePrefix));
    type_str(&mut app, "read");
    press(&mut app, KeyCode::Enter);
    assert_eq!(row_names(&app), vec!["..", "readme.txt"]);
}

#[test]
fn test_startup_bucket_and_prefix() {
    let store = store();
    let options = AppOptions {
        profile: "default".into(),
        bucket: Some("logs".into()),
        prefix: Some("app".into()),
    };
    let app = app_with(&store, options);
    assert_eq!(app.tab, Tab::Objects);
    assert_eq!(app.session.current_prefix(), "app/");
    assert_eq!(row_names(&app)[0], "..");
}

#[test]
fn test_offline_store_offers_retry() {
    let store = store();
    let mut app = app_with(&store, AppOptions::default());
    press(&mut app, KeyCode::Enter);

    store.set_offline(true);
    press(&mut app, KeyCode::Enter);
    assert!(app.status_message.contains("retry"));
    assert!(app.fatal_error.is_none());
    assert_eq!(app.session.current_prefix(), "app/");
    // Root rows are gone; only the way back up is offered
    assert_eq!(row_names(&app), vec![".."]);

    store.set_offline(false);
    press(&mut app, KeyCode::Char('r'));
    assert_eq!(app.entries.file_count(), 3);
}

#[test]
fn test_failed_listing_leaves_no_rows_from_previous_folder() {
    let store = store();
    let mut app = app_with(&store, AppOptions::default());
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Char('j'));
    assert_eq!(row_names(&app)[1], "archive");

    store.set_offline(true);
    press(&mut app, KeyCode::Enter);
    store.set_offline(false);

    assert_eq!(app.session.current_prefix(), "app/archive/");
    assert_eq!(row_names(&app), vec![".."]);
    assert_eq!(app.listed_files, 0);

    // Nothing from app/ can be selected or decoded
    press(&mut app, KeyCode::Char('j'));
    press(&mut app, KeyCode::Char('d'));
    assert_eq!(app.session.selected_key(), None);
    assert_eq!(app.session.current_text(), None);
    assert_eq!(app.tab, Tab::Objects);

    press(&mut app, KeyCode::Char('r'));
    assert_eq!(row_names(&app), vec!["..", "old.log.gz"]);
}

#[test]
fn test_failed_listing_keeps_parent_row_and_decoded_text_is_dropped() {
    let store = store();
    let mut app = app_with(&store, AppOptions::default());
    open_first_log(&mut app);
    press(&mut app, KeyCode::Enter);
    assert!(app.log.is_loaded());

    press(&mut app, KeyCode::Backspace);
    store.set_offline(true);
    press(&mut app, KeyCode::Char('r'));

    assert_eq!(row_names(&app), vec![".."]);
    assert_eq!(app.session.selected_key(), None);
    assert!(!app.log.is_loaded());
    assert!(app.status_message.contains("retry"));
}

/// Profile that sees two buckets but may list only one of them
struct PartlyDenied(MemoryStore);

impl ObjectStore for PartlyDenied {
    fn list_bucket_names(&self) -> bucket_grep::Result<Vec<String>> {
        Ok(vec!["logs".to_string(), "private".to_string()])
    }

    fn list_entries(&self, bucket: &str, prefix: &str, delimiter: &str) -> bucket_grep::Result<Listing> {
        if bucket == "private" {
            return Err(BrowseError::Denied(bucket.to_string()));
        }
        self.0.list_entries(bucket, prefix, delimiter)
    }

    fn get_object(&self, bucket: &str, key: &str) -> bucket_grep::Result<Vec<u8>> {
        self.0.get_object(bucket, key)
    }
}

#[test]
fn test_denied_bucket_is_an_inline_error() {
    let store = store();
    let connector: Connector = Box::new(move |_: &str| {
        Ok(Box::new(PartlyDenied(store.clone())) as Box<dyn ObjectStore>)
    });
    let mut app = App::new(connector, AppOptions::default(), &Config::default());
    app.connect();

    press(&mut app, KeyCode::Char('j'));
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.bucket.as_deref(), Some("private"));
    assert!(app.status_message.contains("access denied"));
    assert!(app.fatal_error.is_none());
    assert!(app.is_connected());
    assert!(app.entries.is_empty());

    press(&mut app, KeyCode::Char('1'));
    press(&mut app, KeyCode::Char('k'));
    press(&mut app, KeyCode::Enter);
    assert_eq!(row_names(&app), vec!["app", "web"]);
}

#[test]
fn test_auth_failure_blocks_until_profile_changes() {
    let store = store();
    let good = store.clone();
    let connector: Connector = Box::new(move |profile: &str| {
        if profile == "bad" {
            return Err(BrowseError::Auth {
                profile: profile.to_string(),
                message: "InvalidAccessKeyId".to_string(),
            });
        }
        Ok(Box::new(good.clone()) as Box<dyn ObjectStore>)
    });
    let options = AppOptions {
        profile: "bad".into(),
        ..Default::default()
    };
    let mut app = App::new(connector, options, &Config::default());
    app.connect();

    assert!(app.fatal_error.is_some());
    assert!(!app.is_connected());
    assert!(app.buckets.is_empty());

    // Browsing keys are ignored while the banner is up
    press(&mut app, KeyCode::Char('2'));
    assert_eq!(app.tab, Tab::Buckets);

    press(&mut app, KeyCode::Char('p'));
    assert_eq!(app.state, AppState::Input(InputField::Profile));
    assert_eq!(app.input, "bad");
    for _ in 0..3 {
        press(&mut app, KeyCode::Backspace);
    }
    type_str(&mut app, "ops");
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.profile, "ops");
    assert!(app.fatal_error.is_none());
    assert_eq!(app.buckets, vec!["logs"]);
}
