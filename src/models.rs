//! Data models for activity reports and triage.
//!
//! This module contains the core data structures shared by the report
//! and triage flows: normalized activity records, the reporting window,
//! repository groups and the triage outcome types.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current state of an issue or pull request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    Open,
    Closed,
    /// Any state the platform reports that we don't model explicitly.
    #[serde(untagged)]
    Other(String),
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Open => write!(f, "open"),
            State::Closed => write!(f, "closed"),
            State::Other(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for State {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "open" => State::Open,
            "closed" => State::Closed,
            other => State::Other(other.to_string()),
        }
    }
}

/// A normalized issue or pull request collected for the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Canonical HTML URL; unique within a run after deduplication.
    pub url: String,
    /// Repository display name (`owner/name`).
    pub repository: String,
    /// Issue or pull request title.
    pub title: String,
    /// Current state.
    pub state: State,
    /// Last-updated timestamp.
    pub updated_at: DateTime<Utc>,
    /// Login of the author.
    pub author: String,
}

/// One ISO calendar week used as query filter and report metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// ISO week-numbering year.
    pub year: i32,
    /// ISO week number (1-53).
    pub week: u32,
    /// First day of the window (inclusive).
    pub start: NaiveDate,
    /// Last day of the window (inclusive).
    pub end: NaiveDate,
}

impl TimeWindow {
    /// Build the window for an ISO (year, week) pair: Monday through Sunday.
    ///
    /// Returns `None` when the week does not exist in that year.
    pub fn iso_week(year: i32, week: u32) -> Option<Self> {
        let start = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)?;
        Some(Self {
            year,
            week,
            start,
            end: start + Duration::days(6),
        })
    }

    /// Window for the ISO week containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        let start = date - Duration::days(date.weekday().num_days_from_monday() as i64);
        Self {
            year: iso.year(),
            week: iso.week(),
            start,
            end: start + Duration::days(6),
        }
    }

    /// A window with explicit bounds. Year and week are taken from `start`.
    #[cfg(test)]
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        let iso = start.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
            start,
            end,
        }
    }

    /// Whether `instant` falls on a day inside the window (UTC calendar day).
    pub fn covers(&self, instant: DateTime<Utc>) -> bool {
        let day = instant.date_naive();
        self.start <= day && day <= self.end
    }

    /// Lower bound used in search qualifiers (`YYYY-MM-DD`).
    pub fn since(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    /// Human-readable range, e.g. `2022-01-31 - 2022-02-06`.
    pub fn date_range(&self) -> String {
        format!(
            "{} - {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }

    /// Start of the window as a UTC instant.
    pub fn start_instant(&self) -> DateTime<Utc> {
        self.start.and_time(chrono::NaiveTime::default()).and_utc()
    }
}

/// Records grouped by repository name.
///
/// Iteration order is the order groups were inserted, unless the report
/// ordering sorts the keys.
pub type RepositoryGroup = IndexMap<String, Vec<ActivityRecord>>;

/// Kind of a received event, as far as triage cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    IssueOpened,
    IssueAssigned,
    PullRequestOpened,
    /// Any event triage never acts on.
    Ignored,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::IssueOpened => write!(f, "issue opened"),
            EventKind::IssueAssigned => write!(f, "issue assigned"),
            EventKind::PullRequestOpened => write!(f, "pull request opened"),
            EventKind::Ignored => write!(f, "ignored"),
        }
    }
}

/// A project mutation that failed for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageWarning {
    /// URL that could not be filed.
    pub url: String,
    /// Error reported by the platform.
    pub message: String,
}

/// Outcome of a triage run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageSummary {
    /// Number of events inspected.
    pub events_seen: usize,
    /// Number of events that matched the involvement predicate.
    pub matched: usize,
    /// URLs successfully added to the project (or that would be, on dry runs).
    pub filed: Vec<String>,
    /// Failed mutations; never fatal.
    pub warnings: Vec<TriageWarning>,
}

impl TriageSummary {
    /// Returns true if every attempted mutation succeeded.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
