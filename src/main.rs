//! bucket-grep - browse S3 buckets and grep gzip logs
//!
//! Starts the terminal UI by default; subcommands cover the same listing,
//! decoding and searching for scripts.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bucket_grep::cli::{commands, Cli, Commands, TuiArgs};
use bucket_grep::config::Config;
use bucket_grep::store::S3Store;
use bucket_grep::tui;

// The S3 store drives its own runtime, so main stays synchronous
fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(cli.config.as_deref())?;

    let interactive = matches!(cli.command, None | Some(Commands::Tui(_)));
    init_logging(&cli, &config, interactive)?;

    let profile = cli
        .profile
        .clone()
        .unwrap_or_else(|| config.general.profile.clone());
    let region = cli.region.clone().or_else(|| config.general.region.clone());
    let format = cli.output.unwrap_or_default();

    let connect = || {
        S3Store::connect(&profile, region.as_deref())
            .with_context(|| format!("Failed to connect with profile '{}'", profile))
    };

    let mut out = io::stdout().lock();

    match cli.command {
        Some(Commands::Tui(args)) => {
            drop(out);
            return tui::run_tui(args, profile.clone(), region.clone(), &config);
        }
        None => {
            drop(out);
            return tui::run_tui(TuiArgs::default(), profile.clone(), region.clone(), &config);
        }
        Some(Commands::Buckets) => {
            let store = connect()?;
            commands::run_buckets(&store, format, &mut out)?;
        }
        Some(Commands::Ls(args)) => {
            let store = connect()?;
            commands::run_ls(&store, &args, format, &mut out)?;
        }
        Some(Commands::Grep(args)) => {
            let store = connect()?;
            commands::run_grep(&store, &args, format, &mut out)?;
        }
        Some(Commands::Config(command)) => {
            commands::run_config(&command, &config_path, &config, &mut out)?;
        }
    }

    out.flush().context("Failed to flush stdout")?;
    Ok(())
}

/// Initialize logging
///
/// The TUI owns the terminal, so it logs to a file in the cache dir;
/// subcommands log to stderr.
fn init_logging(cli: &Cli, config: &Config, interactive: bool) -> Result<()> {
    let level = if cli.verbose {
        "debug"
    } else {
        config.general.log_level.as_str()
    };
    let filter = EnvFilter::from_default_env().add_directive(
        format!("bucket_grep={}", level)
            .parse()
            .with_context(|| format!("Invalid log level '{}'", level))?,
    );

    if interactive {
        let writer: Box<dyn Write + Send> = match Config::log_path() {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .with_context(|| format!("Failed to open log file: {}", path.display()))?;
                Box::new(file)
            }
            None => Box::new(io::sink()),
        };
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .compact()
                    .with_writer(Mutex::new(writer)),
            )
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(false)
                    .compact()
                    .with_writer(io::stderr),
            )
            .with(filter)
            .init();
    }

    Ok(())
}
