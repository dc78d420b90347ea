//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Generate postgres init.sql and .env from service config.yaml and .env files
#[derive(Parser, Debug)]
#[command(name = "pgsetup")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory containing the service directories (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate init.sql and .env (default)
    Generate {
        /// Print the generated files instead of writing them
        #[arg(long)]
        dry_run: bool,
        /// Output directory (overrides settings); relative paths resolve against the scan root
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        output_dir: Option<PathBuf>,
    },

    /// List discovered services
    List,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,

    /// Create config template
    Init {
        /// Create global config instead of <root>/.pgsetup.toml
        #[arg(short, long)]
        global: bool,
    },
}
