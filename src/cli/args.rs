//! CLI argument parsing using clap.
//!
//! Contains the Cli struct and the Commands enum.

use clap::{
    Args, Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Download folder relay
#[derive(Parser, Debug)]
#[command(
    name = "filerelay",
    version = env!("CARGO_PKG_VERSION"),
    about = "Upload new files from a watched folder, once each",
    long_about = "Watch a folder for new files named like ABC__name.ext and POST each \
                  finished file to an HTTP endpoint exactly once. Files already present \
                  at startup are skipped.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = "Examples:\n  filerelay\n  filerelay watch --dir ~/Downloads\n  filerelay watch --url http://localhost:8080/upload --timeout 10\n  filerelay init\n  filerelay config"
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Defaults to `watch` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch the folder and upload new files
    #[command(about = "Watch the folder and upload new matching files until Ctrl+C")]
    Watch(WatchArgs),

    /// Initialize configuration
    #[command(about = "Create .filerelay/settings.toml with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings")]
    Config,
}

/// Overrides accepted by `watch`.
#[derive(Args, Debug, Default, Clone)]
pub struct WatchArgs {
    /// Folder to watch (overrides config)
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Upload endpoint (overrides config)
    #[arg(short, long, value_name = "URL")]
    pub url: Option<String>,

    /// Per-upload timeout in seconds (overrides config)
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<u64>,
}
