//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
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

/// Keeps a search index in sync with page manifests
#[derive(Parser)]
#[command(
    name = "page-indexer",
    version = env!("CARGO_PKG_VERSION"),
    about = "Keep a search index in sync with page manifests",
    long_about = "Watch page manifests and push new or modified pages to an \
                  Elasticsearch-compatible index.\n\n\
                  Without a subcommand, registers MANIFEST (if given) and watches \
                  every registered manifest until interrupted.",
    next_line_help = true,
    args_conflicts_with_subcommands = true,
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Manifest to register before watching
    #[arg(value_name = "MANIFEST")]
    pub manifest: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Watch registered manifests and push changes until interrupted
    Watch {
        /// Manifest to register before watching
        #[arg(value_name = "MANIFEST")]
        manifest: Option<PathBuf>,
    },

    /// Register a manifest without watching
    Add {
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,
    },

    /// Unregister a manifest (its sync state is kept)
    Remove {
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,
    },

    /// List registered manifests
    List,

    /// Synchronize a registered manifest once
    Sync {
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,
    },

    /// Display active settings
    Config {
        /// Write the active settings to the settings file
        #[arg(long)]
        save: bool,
    },
}

impl Cli {
    /// Resolve the command, treating a bare invocation as `watch`.
    pub fn into_command(self) -> Commands {
        match self.command {
            Some(command) => command,
            None => Commands::Watch {
                manifest: self.manifest,
            },
        }
    }
}
