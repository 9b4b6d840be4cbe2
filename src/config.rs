//! Configuration file handling.
//!
//! This module handles loading `.aatp.toml` files and merging them with
//! environment variables and CLI arguments. The access token is only ever
//! taken from the environment or the command line.

use crate::analysis::OrderingPolicy;
use crate::cli::{Args, Command};
use crate::github::ClientConfig;
use crate::report::ReportFormat;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".aatp.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// GitHub connection settings.
    #[serde(default)]
    pub github: GitHubConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Triage settings.
    #[serde(default)]
    pub triage: TriageConfig,
}

/// GitHub connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// GraphQL endpoint.
    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,

    /// Login whose activity is collected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Results requested per page (GitHub caps this at 100).
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            graphql_url: default_graphql_url(),
            user: None,
            per_page: default_per_page(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_graphql_url() -> String {
    "https://api.github.com/graphql".to_string()
}

fn default_per_page() -> u32 {
    100
}

fn default_timeout() -> u64 {
    30
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Directory reports are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Report format.
    #[serde(default)]
    pub format: ReportFormat,

    /// Record ordering; follows the format when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordering: Option<OrderingPolicy>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            format: ReportFormat::default(),
            ordering: None,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl ReportConfig {
    /// Ordering in effect for this report.
    pub fn effective_ordering(&self) -> OrderingPolicy {
        self.ordering
            .unwrap_or_else(|| self.format.default_ordering())
    }
}

/// Project triage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriageConfig {
    /// Number of the user-owned project items are added to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_number: Option<u64>,
}

/// Parse a project number given as text (CLI flag or environment).
pub fn parse_project_number(value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .with_context(|| format!("Project number must be an integer, got {:?}", value))
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments and environment.
    ///
    /// Explicit values take precedence over config file settings.
    pub fn merge_with_args(&mut self, args: &Args) -> Result<()> {
        if let Some(ref user) = args.user {
            self.github.user = Some(user.clone());
        }

        match args.command {
            Some(Command::Report(ref report)) => {
                if let Some(format) = report.format {
                    self.report.format = format;
                    // A format picked on the command line brings its own ordering
                    // unless one is given too.
                    self.report.ordering = None;
                }
                if let Some(ordering) = report.ordering {
                    self.report.ordering = Some(ordering);
                }
                if let Some(ref dir) = report.output_dir {
                    self.report.output_dir = dir.clone();
                }
            }
            Some(Command::Triage(ref triage)) => {
                if let Some(ref number) = triage.project_number {
                    self.triage.project_number = Some(parse_project_number(number)?);
                }
            }
            None => {}
        }

        Ok(())
    }

    /// The configured user, required by both flows.
    pub fn user(&self) -> Result<&str> {
        match self.github.user.as_deref().map(str::trim) {
            Some(user) if !user.is_empty() => Ok(user),
            _ => bail!("No GitHub user configured: set AATP_USER, pass --user or set github.user"),
        }
    }

    /// The project number, required by triage.
    pub fn project_number(&self) -> Result<u64> {
        self.triage.project_number.context(
            "No project number configured: set AATP_PROJECT_NUMBER, pass --project-number \
             or set triage.project_number",
        )
    }

    /// Client settings for this configuration and token.
    pub fn client_config(&self, token: &str) -> Result<ClientConfig> {
        if !(1..=100).contains(&self.github.per_page) {
            bail!("github.per_page must be between 1 and 100");
        }
        if self.github.timeout_seconds == 0 {
            bail!("github.timeout_seconds must be at least 1");
        }

        Ok(ClientConfig {
            api_url: self.github.api_url.clone(),
            graphql_url: self.github.graphql_url.clone(),
            token: token.to_string(),
            per_page: self.github.per_page,
            timeout_seconds: self.github.timeout_seconds,
        })
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
