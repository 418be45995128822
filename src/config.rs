//! Configuration system for `airbrake-tools`.

use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use tracing::warn;

use crate::backtrace::{
    ProjectFrameMatcher, DEFAULT_COMPARE_MARGIN, DEFAULT_LIBRARY_FRAME_PATTERNS,
    DEFAULT_PROJECT_FRAME_PATTERNS,
};
use crate::source::airbrake::DEFAULT_API_URL;

/// Root configuration structure
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Airbrake API key
    pub token: Option<String>,
    /// Account subdomain, used to build browser links
    pub subdomain: Option<String>,
    /// Project name or id
    pub project: Option<String>,
    /// Environment filter for error listings ("all" disables filtering)
    pub environment: String,
    /// API base URL
    pub api_url: String,
    /// Parallel notice fetches in hot/new
    pub concurrency: usize,
    /// Notice pages fetched by summary
    pub summary_pages: u32,
    /// Frames compared past the first project frame
    pub compare_margin: usize,
    /// HTTP request timeout
    pub timeout_secs: u64,
    /// Regex patterns for frames that belong to the application
    pub project_frame_patterns: Vec<String>,
    /// Regex patterns that exclude frames from the application
    pub library_frame_patterns: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            subdomain: None,
            project: None,
            environment: "production".to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            concurrency: 10,
            summary_pages: 5,
            compare_margin: DEFAULT_COMPARE_MARGIN,
            timeout_secs: 30,
            project_frame_patterns: DEFAULT_PROJECT_FRAME_PATTERNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            library_frame_patterns: DEFAULT_LIBRARY_FRAME_PATTERNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Config {
    /// Load config from file, returning default config if file doesn't exist
    pub fn load() -> Self {
        Self::load_from_path(Self::config_path())
    }

    /// Load config from a specific path
    pub fn load_from_path(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(_) => return Self::default(),
        };

        toml::from_str(&contents).unwrap_or_else(|err| {
            warn!(path = %path.display(), %err, "ignoring invalid config file");
            Self::default()
        })
    }

    /// Get the config file path (~/.config/airbrake-tools/config.toml)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("airbrake-tools").join("config.toml"))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(token) = get("AIRBRAKE_TOKEN") {
            self.token = Some(token);
        }
        if let Some(subdomain) = get("AIRBRAKE_SUBDOMAIN") {
            self.subdomain = Some(subdomain);
        }
        if let Some(project) = get("AIRBRAKE_PROJECT") {
            self.project = Some(project);
        }
        if let Some(environment) = get("AIRBRAKE_ENVIRONMENT") {
            self.environment = environment;
        }
    }

    /// Environment filter, `None` when every environment is wanted
    pub fn environment_filter(&self) -> Option<&str> {
        match self.environment.as_str() {
            "" | "all" => None,
            env => Some(env),
        }
    }

    /// Build the frame classifier from the configured patterns
    pub fn frame_matcher(&self) -> Result<ProjectFrameMatcher, regex::Error> {
        ProjectFrameMatcher::new(
            self.project_frame_patterns.as_slice(),
            self.library_frame_patterns.as_slice(),
        )
    }
}

/// Generate default config as TOML string
pub fn generate_default_config() -> String {
    r#"# airbrake-tools configuration
# Place this file at ~/.config/airbrake-tools/config.toml

# Airbrake API key (Settings -> API key)
# token = "..."

# Account subdomain, used by `open` to build links
# subdomain = "mycompany"

# Project name or id (needed when the token sees several projects)
# project = "web"

# Only show errors from this environment ("all" disables the filter)
environment = "production"

# Parallel notice fetches for hot/new
concurrency = 10

# Notice pages analyzed by summary
summary_pages = 5

# Frames compared past the first project frame when clustering backtraces
compare_margin = 3

# HTTP request timeout in seconds
timeout_secs = 30

# Regex patterns marking frames as application code
project_frame_patterns = ["^/PROJECT_ROOT/", "^\\[PROJECT_ROOT\\]"]

# Regex patterns excluding frames below the project root (vendored code)
library_frame_patterns = ["/vendor/", "/node_modules/"]

# Environment variable overrides:
# AIRBRAKE_TOKEN, AIRBRAKE_SUBDOMAIN, AIRBRAKE_PROJECT, AIRBRAKE_ENVIRONMENT
"#
    .to_string()
}

/// Print the default config to stdout
pub fn print_default_config() {
    print!("{}", generate_default_config());
}
