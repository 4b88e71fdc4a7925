//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "suitetrim",
    version,
    author = "neur0map",
    about = "Find redundant test cases in test-management exports",
    long_about = "Suitetrim reads exported test cases, groups similar ones by content and metadata, \
                  and recommends which to keep, consolidate, or consider removing. \
                  Recommendations are advisory; nothing is modified."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/suitetrim/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a test case export for redundancy
    Analyze {
        /// JSON export (array of test cases or {"test_cases": [...]})
        input: PathBuf,

        /// Write the report to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Report format (overrides output.format)
        #[arg(short, long, value_parser = ["json", "table"])]
        format: Option<String>,

        /// Fixed number of clusters (overrides the size heuristic)
        #[arg(short = 'k', long)]
        clusters: Option<usize>,

        /// Similarity threshold, exclusive (overrides redundancy.similarity_threshold)
        #[arg(long)]
        threshold: Option<f32>,

        /// Omit the redundant pair listing
        #[arg(long)]
        no_pairs: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
