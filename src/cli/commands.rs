//! Handlers for the non-interactive subcommands
//!
//! Each handler takes the store and a writer so it can run against
//! `MemoryStore` and a buffer in tests.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info};

use super::{ConfigCommand, GrepArgs, LsArgs, OutputFormat};
use crate::archive;
use crate::config::Config;
use crate::error::BrowseError;
use crate::filter::{self, FilterCriteria};
use crate::nav;
use crate::search;
use crate::store::ObjectStore;

/// Print bucket names, one per line
pub fn run_buckets<W: Write>(store: &dyn ObjectStore, format: OutputFormat, out: &mut W) -> Result<()> {
    let names = store.list_bucket_names()?;
    info!("Listed {} buckets", names.len());

    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&names)?)?,
        OutputFormat::Human => {
            for name in &names {
                writeln!(out, "{}", name)?;
            }
            if names.is_empty() {
                writeln!(out, "{} No buckets visible to this profile", "⚠".yellow())?;
            }
        }
    }
    Ok(())
}

/// Build filter criteria from `ls` flags
pub fn criteria_from_args(args: &LsArgs) -> Result<FilterCriteria> {
    Ok(FilterCriteria {
        name_prefix: args.name.clone(),
        date: args.date.as_deref().map(filter::parse_date).transpose()?.flatten(),
        time_of_day: args.time.as_deref().map(filter::parse_time).transpose()?.flatten(),
    })
}

/// Print the filtered folders and files of one level
pub fn run_ls<W: Write>(
    store: &dyn ObjectStore,
    args: &LsArgs,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    let prefix = nav::normalize_prefix(&args.prefix);
    let criteria = criteria_from_args(args)?;
    debug!("ls s3://{}/{} filter: {}", args.bucket, prefix, criteria.describe());

    let listing = filter::list_filtered(store, &args.bucket, &prefix, &criteria)?;

    if format == OutputFormat::Json {
        writeln!(out, "{}", serde_json::to_string_pretty(&listing)?)?;
        return Ok(());
    }

    writeln!(
        out,
        "{} {}",
        format!("s3://{}/{}", args.bucket, prefix).bright_cyan().bold(),
        format!("(filter: {})", criteria.describe()).dimmed()
    )?;

    for folder in &listing.folders {
        writeln!(
            out,
            "  {:>25}  {:>10}  {}",
            "",
            "DIR".blue(),
            format!("{}/", folder.display_name).blue()
        )?;
    }
    for file in &listing.files {
        let name = if archive::is_archive(&file.key) {
            file.display_name.normal()
        } else {
            file.display_name.dimmed()
        };
        writeln!(
            out,
            "  {:>25}  {:>10}  {}",
            file.modified.format("%Y-%m-%d %H:%M:%S %:z").to_string(),
            humansize::format_size(file.size_bytes, humansize::BINARY),
            name
        )?;
    }

    writeln!(
        out,
        "\n{} folders, {}/{} files",
        listing.folders.len(),
        listing.files.len(),
        listing.total_files
    )?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct GrepReport<'a> {
    bucket: &'a str,
    key: &'a str,
    pattern: &'a str,
    matched: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    lines: Option<Vec<&'a str>>,
}

/// Fetch, decode and filter one archive
///
/// Returns the number of matching lines.
pub fn run_grep<W: Write>(
    store: &dyn ObjectStore,
    args: &GrepArgs,
    format: OutputFormat,
    out: &mut W,
) -> Result<usize> {
    if !archive::is_archive(&args.key) {
        return Err(BrowseError::NotArchive(args.key.clone()).into());
    }
    // Compile before downloading so a bad pattern fails fast
    search::Matcher::new(&args.pattern)?;

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} [{elapsed_precise}]") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(80));
    pb.set_message(format!("Fetching s3://{}/{}", args.bucket, args.key));

    let fetched = store.get_object(&args.bucket, &args.key);
    pb.finish_and_clear();
    let bytes = fetched?;

    let text = archive::decode(&bytes)
        .with_context(|| format!("Failed to decode s3://{}/{}", args.bucket, args.key))?;
    let matches = search::filter_lines(&text, &args.pattern)?;
    info!(
        "grep s3://{}/{} '{}': {} matching lines",
        args.bucket,
        args.key,
        args.pattern,
        matches.count()
    );

    match format {
        OutputFormat::Json => {
            let report = GrepReport {
                bucket: &args.bucket,
                key: &args.key,
                pattern: &args.pattern,
                matched: matches.count(),
                lines: (!args.count).then(|| matches.lines.clone()),
            };
            writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        }
        OutputFormat::Human if args.count => writeln!(out, "{}", matches.count())?,
        OutputFormat::Human => {
            for line in &matches.lines {
                writeln!(out, "{}", line)?;
            }
        }
    }

    Ok(matches.count())
}

/// `config init|show|path`
pub fn run_config<W: Write>(
    command: &ConfigCommand,
    path: &Path,
    config: &Config,
    out: &mut W,
) -> Result<()> {
    match command {
        ConfigCommand::Init { force } => {
            if Config::init_at(path, *force)? {
                writeln!(out, "{} Wrote {}", "✓".bright_green(), path.display())?;
            } else {
                writeln!(
                    out,
                    "{} {} already exists (use --force to overwrite)",
                    "⚠".yellow(),
                    path.display()
                )?;
            }
        }
        ConfigCommand::Show => {
            let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
            write!(out, "{}", content)?;
        }
        ConfigCommand::Path => writeln!(out, "{}", path.display())?,
    }
    Ok(())
}
