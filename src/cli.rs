use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// mpack-wizard - installation wizard core for cluster mpacks
#[derive(Parser)]
#[command(name = "mpack-wizard")]
#[command(about = "Expand hosts, build repository matrices and download mpacks for a cluster install")]
#[command(version)]
pub struct Cli {
    /// Log at debug level (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Expand a host specification such as "node[01-03].example.com"
    ExpandHosts {
        /// Host names or patterns, whitespace separated
        #[arg(required = true)]
        spec: Vec<String>,
    },
    /// Validate a wizard configuration file
    ValidateConfig {
        /// Path to configuration file to validate
        config: PathBuf,
    },
    /// Print the repository matrix for the persisted selection as JSON
    Repos {
        /// Registry response JSON
        #[arg(long)]
        registry: PathBuf,
        /// Repository catalog JSON
        #[arg(long)]
        catalog: PathBuf,
        /// Persisted wizard content
        #[arg(long)]
        content: PathBuf,
    },
    /// Download the persisted mpack selection through the server
    Download {
        /// Wizard configuration file
        #[arg(short, long)]
        config: PathBuf,
        /// Persisted wizard content
        #[arg(long)]
        content: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
