//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::OrderingPolicy;
use crate::report::ReportFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// aatp - weekly GitHub activity reports and project triage
///
/// Collects the issues and pull requests you were involved in this week
/// into a report, and files new activity into a GitHub project.
///
/// Examples:
///   aatp report
///   aatp report --format table --output-dir ~/notes/pages
///   aatp report --year 2022 --week 5 --print
///   aatp triage --project-number 3 --dry-run
///   aatp --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// GitHub access token
    #[arg(long, env = "AATP_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// GitHub login whose activity is collected
    #[arg(short, long, env = "AATP_USER", global = true)]
    pub user: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .aatp.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .aatp.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Write this week's activity report
    Report(ReportArgs),
    /// Add new issues and pull requests involving you to a project
    Triage(TriageArgs),
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ReportArgs {
    /// Report format
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<ReportFormat>,

    /// Record ordering (defaults to chronological for outline, unsorted for table)
    #[arg(long, value_name = "ORDER")]
    pub ordering: Option<OrderingPolicy>,

    /// ISO week-numbering year (defaults to the current one)
    #[arg(long, requires = "week")]
    pub year: Option<i32>,

    /// ISO week number (defaults to the current one)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=53))]
    pub week: Option<u32>,

    /// Directory the report is written to
    #[arg(long, env = "AATP_PATH", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Also print the report to stdout
    #[arg(long)]
    pub print: bool,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct TriageArgs {
    /// Number of the user-owned GitHub project to add items to
    #[arg(long, env = "AATP_PROJECT_NUMBER", value_name = "NUMBER")]
    pub project_number: Option<String>,

    /// Log matching items without adding them to the project
    #[arg(long)]
    pub dry_run: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.command.is_none() {
            return Err("A command is required: report or triage".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref token) = self.token {
            if token.trim().is_empty() {
                return Err("Token must not be empty".to_string());
            }
        }

        if let Some(Command::Report(ref report)) = self.command {
            if let Some(ref dir) = report.output_dir {
                if dir.exists() && !dir.is_dir() {
                    return Err(format!(
                        "Output path is not a directory: {}",
                        dir.display()
                    ));
                }
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            token: Some("ghp_test".to_string()),
            user: Some("alice".to_string()),
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
            command: Some(Command::Report(ReportArgs::default())),
        }
    }

    #[test]
    fn test_validation_ok() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_requires_command() {
        let mut args = make_args();
        args.command = None;
        assert!(args.validate().is_err());

        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_empty_token() {
        let mut args = make_args();
        args.token = Some("  ".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_output_dir_is_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut args = make_args();
        args.command = Some(Command::Report(ReportArgs {
            output_dir: Some(file.path().to_path_buf()),
            ..ReportArgs::default()
        }));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_parse_report_subcommand() {
        let args = Args::try_parse_from([
            "aatp", "report", "--format", "table", "--year", "2022", "--week", "5", "-v",
        ])
        .unwrap();
        assert!(args.verbose);
        match args.command {
            Some(Command::Report(report)) => {
                assert_eq!(report.format, Some(ReportFormat::Table));
                assert_eq!(report.year, Some(2022));
                assert_eq!(report.week, Some(5));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_year_requires_week() {
        assert!(Args::try_parse_from(["aatp", "report", "--year", "2022"]).is_err());
        assert!(Args::try_parse_from(["aatp", "report", "--week", "54"]).is_err());
    }

    #[test]
    fn test_parse_triage_subcommand() {
        let args =
            Args::try_parse_from(["aatp", "triage", "--project-number", "3", "--dry-run"]).unwrap();
        match args.command {
            Some(Command::Triage(triage)) => {
                assert_eq!(triage.project_number.as_deref(), Some("3"));
                assert!(triage.dry_run);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
