//! CLI module - Command line interface definitions and handlers

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// bucket-grep - browse and grep gzip logs stored in S3
///
/// Walks a bucket folder by folder, filters objects by name prefix and by
/// date/time in UTC+9, decodes `.gz` objects and filters their lines with a
/// regular expression.
#[derive(Parser, Debug)]
#[command(name = "bucket-grep")]
#[command(version)]
#[command(about = "Browse S3 buckets and grep gzip logs", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// AWS profile name (empty for the default credential chain)
    #[arg(long, short, global = true)]
    pub profile: Option<String>,

    /// AWS region override
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Config file path (default: platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Output format for machine parsing
    #[arg(long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive terminal UI (default)
    Tui(TuiArgs),

    /// List the buckets visible to the profile
    Buckets,

    /// List one folder level of a bucket with filters
    Ls(LsArgs),

    /// Decode a .gz object and print the lines matching a pattern
    Grep(GrepArgs),

    /// Manage the config file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Clone, Default, Parser)]
pub struct TuiArgs {
    /// Bucket to open at startup
    #[arg(long, short)]
    pub bucket: Option<String>,

    /// Folder prefix to open at startup
    #[arg(long)]
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, Parser)]
pub struct LsArgs {
    /// Bucket name
    #[arg(required = true)]
    pub bucket: String,

    /// Folder prefix, e.g. logs/app/
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// File name prefix inside the folder
    #[arg(long, short, default_value = "")]
    pub name: String,

    /// Modification date in UTC+9 (YYYY-MM-DD)
    #[arg(long, short)]
    pub date: Option<String>,

    /// Modification time in UTC+9 (HH:MM), matched within ±10 minutes
    #[arg(long, short)]
    pub time: Option<String>,
}

#[derive(Debug, Clone, Parser)]
pub struct GrepArgs {
    /// Bucket name
    #[arg(required = true)]
    pub bucket: String,

    /// Object key ending in .gz
    #[arg(required = true)]
    pub key: String,

    /// Regular expression; omitted or empty prints every line
    #[arg(default_value = "")]
    pub pattern: String,

    /// Print only the number of matching lines
    #[arg(long, short)]
    pub count: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Write a commented sample config file
    Init {
        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },

    /// Print the effective configuration
    Show,

    /// Print the config file path
    Path,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable (default)
    #[default]
    Human,
    /// JSON output
    Json,
}
