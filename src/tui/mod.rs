//! TUI Module - Terminal User Interface powered by ratatui
//!
//! Bucket selector, folder browser with name/date/time filters and a
//! regex-filtered log view, all driven by vim-style keybindings.

mod app;
pub mod entry_list;
pub mod log_view;
mod ui;

pub use app::{App, AppOptions, AppState, Connector, InputField, KeyMap, Tab};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::time::Duration;
use tracing::{error, info};

use crate::cli::TuiArgs;
use crate::config::Config;
use crate::store::{ObjectStore, S3Store};

/// Run the TUI application
///
/// `profile` and `region` are already resolved against the config.
pub fn run_tui(args: TuiArgs, profile: String, region: Option<String>, config: &Config) -> Result<()> {
    let connector: Connector = Box::new(move |profile: &str| {
        let store = S3Store::connect(profile, region.as_deref())?;
        Ok(Box::new(store) as Box<dyn ObjectStore>)
    });

    let options = AppOptions {
        profile,
        bucket: args.bucket.or_else(|| config.general.bucket.clone()),
        prefix: args.prefix,
    };
    let mut app = App::new(connector, options, config);

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    info!("TUI started with profile '{}'", app.profile);
    app.status_message = format!("Connecting with profile '{}'...", app.profile);
    terminal.draw(|frame| ui::draw(frame, &app))?;
    app.connect();

    // Run main loop
    let result = run_event_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        error!("TUI error: {:#}", e);
    }
    result
}

/// Main TUI event loop
fn run_event_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;

        // Poll for events with timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                // Windows reports releases too
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
