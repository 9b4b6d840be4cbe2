//! Weekly report rendering.
//!
//! Rendering is a pure function of the time window and the grouped
//! records: no I/O, and identical input always yields identical text.
//! Only [`write_report`] touches the file system.

use crate::analysis::OrderingPolicy;
use crate::models::{ActivityRecord, RepositoryGroup, TimeWindow};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Output shape of the weekly report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Outline with page properties, one entry per repository (default)
    #[default]
    Outline,
    /// Front-matter and a markdown table, one row per record
    Table,
    /// JSON document
    Json,
}

impl ReportFormat {
    /// Ordering used when none is configured.
    pub fn default_ordering(&self) -> OrderingPolicy {
        match self {
            ReportFormat::Outline | ReportFormat::Json => OrderingPolicy::Chronological,
            ReportFormat::Table => OrderingPolicy::Unsorted,
        }
    }

    /// File extension of the written report.
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Outline | ReportFormat::Table => "md",
            ReportFormat::Json => "json",
        }
    }
}

/// Render the report in the requested format.
pub fn render(
    format: ReportFormat,
    window: &TimeWindow,
    grouped: &RepositoryGroup,
) -> Result<String> {
    match format {
        ReportFormat::Outline => Ok(render_outline(window, grouped)),
        ReportFormat::Table => Ok(render_table(window, grouped)),
        ReportFormat::Json => render_json(window, grouped),
    }
}

/// Render the outline form:
///
/// ```text
/// title:: Iteration/2022-5
/// type:: [[Iteration]]
/// date:: 2022-01-31 - 2022-02-06
///
/// - [[owner/repo]]
///   - [[2022-02-01]] open [Fix X](https://github.com/owner/repo/issues/1)
/// ```
pub fn render_outline(window: &TimeWindow, grouped: &RepositoryGroup) -> String {
    let mut output = String::new();

    output.push_str(&format!("title:: Iteration/{}-{}\n", window.year, window.week));
    output.push_str("type:: [[Iteration]]\n");
    output.push_str(&format!("date:: {}\n", window.date_range()));
    output.push('\n');

    for (repo, records) in grouped {
        output.push_str(&format!("- [[{}]]\n", repo));
        for record in records {
            output.push_str(&outline_entry(record));
        }
    }

    output
}

fn outline_entry(record: &ActivityRecord) -> String {
    format!(
        "  - [[{}]] {} [{}]({})\n",
        record.updated_at.format("%Y-%m-%d"),
        record.state,
        link_text(&record.title),
        record.url
    )
}

/// Render the table form: a front-matter block with the date range and
/// one table row per record. An empty report has no table at all.
pub fn render_table(window: &TimeWindow, grouped: &RepositoryGroup) -> String {
    let mut output = String::new();

    output.push_str("---\n");
    output.push_str(&format!("date: {}\n", window.date_range()));
    output.push_str("---\n\n");

    if grouped.values().all(Vec::is_empty) {
        return output;
    }

    output.push_str("| Project | Title | Updated | Author |\n");
    output.push_str("| --- | --- | --- | --- |\n");

    for (repo, records) in grouped {
        for record in records {
            output.push_str(&format!(
                "| {} | [{}]({}) | {} | {} |\n",
                repo,
                escape_cell(&link_text(&record.title)),
                record.url,
                record.updated_at.format("%Y-%m-%d"),
                record.author
            ));
        }
    }

    output
}

/// Pipes would end the cell early.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Brackets would end the link text early.
fn link_text(title: &str) -> String {
    title.replace('[', "\\[").replace(']', "\\]")
}

#[derive(Serialize)]
struct JsonReport<'a> {
    window: &'a TimeWindow,
    repositories: Vec<JsonRepository<'a>>,
}

#[derive(Serialize)]
struct JsonRepository<'a> {
    name: &'a str,
    records: &'a [ActivityRecord],
}

/// Render the JSON form, keeping the report ordering.
pub fn render_json(window: &TimeWindow, grouped: &RepositoryGroup) -> Result<String> {
    let report = JsonReport {
        window,
        repositories: grouped
            .iter()
            .map(|(name, records)| JsonRepository { name, records })
            .collect(),
    };
    serde_json::to_string_pretty(&report).map_err(Into::into)
}

/// File name for the week's report, e.g. `Iteration___2022-5.md`.
pub fn report_file_name(window: &TimeWindow, format: ReportFormat) -> String {
    format!(
        "Iteration___{}-{}.{}",
        window.year,
        window.week,
        format.extension()
    )
}

/// Write the report into `dir`, replacing any report for the same week.
pub fn write_report(
    dir: &Path,
    window: &TimeWindow,
    format: ReportFormat,
    content: &str,
) -> Result<PathBuf> {
    let path = dir.join(report_file_name(window, format));

    let mut file = std::fs::File::create(&path)
        .with_context(|| format!("Failed to create report file {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    Ok(path)
}
