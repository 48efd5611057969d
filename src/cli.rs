//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Polysite multilingual static site generator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Output directory path (relative to project root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Content directory path (relative to project root)
    #[arg(short, long)]
    pub content: Option<PathBuf>,

    /// Assets directory path (relative to project root)
    #[arg(short, long)]
    pub assets: Option<PathBuf>,

    /// Config file name (default: polysite.toml)
    #[arg(short = 'C', long, default_value = "polysite.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Deletes the output directory if there is one and regenerates the site
    Build {
        /// Environment name for feature-toggle overrides (e.g. "dev").
        /// Falls back to the POLYSITE_ENV environment variable.
        #[arg(short, long)]
        env: Option<String>,

        /// Override the site URL without touching content data.
        ///
        /// Useful for CI/CD deployments where the production URL differs
        /// from the one committed in `site.json`.
        ///
        /// Example:
        ///   polysite build --site-url "https://staging.example.org"
        #[arg(long = "site-url")]
        site_url: Option<String>,
    },
}

#[allow(unused)]
impl Cli {
    pub const fn is_build(&self) -> bool {
        matches!(self.command, Commands::Build { .. })
    }
}
