//! Command-line interface definitions for `airbrake-tools`.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::config::Config;

/// Power tools for Airbrake
#[derive(Parser, Debug)]
#[command(
    name = "airbrake-tools",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("AIRBRAKE_TOOLS_GIT_SHA"), ")"),
    about,
    long_about = None
)]
#[command(
    after_help = "EXAMPLES:\n    airbrake-tools hot --pages 3\n    airbrake-tools summary 2155478612893718829 --graph day.png\n    airbrake-tools --project web -e staging new\n    airbrake-tools open 2155478612893718829"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Airbrake API key (default: AIRBRAKE_TOKEN or config file)
    #[arg(long, global = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Account subdomain used for browser links
    #[arg(long, global = true, value_name = "NAME")]
    pub subdomain: Option<String>,

    /// Project name or id
    #[arg(long, short = 'P', global = true, value_name = "PROJECT")]
    pub project: Option<String>,

    /// Only show errors from this environment, "all" for every environment (default: production)
    #[arg(long, short = 'e', global = true, value_name = "ENV")]
    pub environment: Option<String>,

    /// Output as JSON
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Show debug logging
    #[arg(long, short = 'd', global = true)]
    pub debug: bool,

    /// Generate shell completions
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<Shell>,

    /// Print a default configuration file and exit
    #[arg(long)]
    pub print_config: bool,
}

/// Report to generate
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the hottest errors by estimated hourly rate
    Hot {
        /// Number of error pages to scan
        #[arg(long, short = 'p', default_value = "1", value_name = "N")]
        pages: u32,
    },
    /// List errors that appeared most recently
    New {
        /// Number of error pages to scan
        #[arg(long, short = 'p', default_value = "1", value_name = "N")]
        pages: u32,
    },
    /// List every error, page by page (for grepping)
    List,
    /// Analyze occurrences and backtrace origins of one error
    Summary {
        /// Error (group) id
        error_id: String,

        /// How many leading frames to compare (default: first project frame + margin)
        #[arg(long, short = 'c', value_name = "N")]
        compare_depth: Option<usize>,

        /// Write a PNG trend image of the last day
        #[arg(long, value_name = "PATH")]
        graph: Option<PathBuf>,

        /// Annotate project frames with git blame
        #[arg(long)]
        blame: bool,

        /// Repository root for --blame (default: current directory)
        #[arg(long, value_name = "PATH", requires = "blame")]
        repo: Option<PathBuf>,
    },
    /// Open an error (or one of its notices) in the browser
    Open {
        /// Error (group) id
        error_id: String,

        /// Notice id
        notice_id: Option<String>,
    },
}

impl Command {
    /// Name used to look up the command handler
    pub fn name(&self) -> &'static str {
        match self {
            Command::Hot { .. } => "hot",
            Command::New { .. } => "new",
            Command::List => "list",
            Command::Summary { .. } => "summary",
            Command::Open { .. } => "open",
        }
    }
}

impl Cli {
    /// Let command-line flags override file and environment settings
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(token) = &self.token {
            config.token = Some(token.clone());
        }
        if let Some(subdomain) = &self.subdomain {
            config.subdomain = Some(subdomain.clone());
        }
        if let Some(project) = &self.project {
            config.project = Some(project.clone());
        }
        if let Some(environment) = &self.environment {
            config.environment = environment.clone();
        }
    }
}
