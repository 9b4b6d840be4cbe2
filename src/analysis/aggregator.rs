//! Record aggregation: deduplication, grouping and ordering.
//!
//! These are the pure stages between collection and rendering. None of
//! them perform I/O.

use crate::github::IssueItem;
use crate::models::{ActivityRecord, RepositoryGroup, State};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How records are ordered in the rendered report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OrderingPolicy {
    /// Repositories alphabetically, records oldest update first
    #[default]
    Chronological,
    /// Repositories and records in collection order
    Unsorted,
}

/// Repository display name (`owner/name`) for a search result.
///
/// Prefers the embedded repository reference; otherwise strips the
/// `<api_url>/repos/` prefix from the repository API URL.
pub fn repository_name(item: &IssueItem, api_url: &str) -> String {
    if let Some(name) = item.embedded_repository() {
        return name;
    }

    let prefix = format!("{}/repos/", api_url.trim_end_matches('/'));
    match item.repository_url.strip_prefix(&prefix) {
        Some(name) => name.to_string(),
        None => {
            // Unknown host layout: fall back to the last two path segments.
            let segments: Vec<&str> = item
                .repository_url
                .trim_end_matches('/')
                .rsplitn(3, '/')
                .take(2)
                .collect();
            match segments.as_slice() {
                [name, owner] => format!("{}/{}", owner, name),
                _ => item.repository_url.clone(),
            }
        }
    }
}

/// Normalize a search result into an [`ActivityRecord`].
pub fn to_record(item: &IssueItem, api_url: &str) -> ActivityRecord {
    ActivityRecord {
        url: item.html_url.clone(),
        repository: repository_name(item, api_url),
        title: item.title.clone(),
        state: State::from(item.state.as_str()),
        updated_at: item.updated_at,
        author: item.author().to_string(),
    }
}

/// Drop records whose URL was already seen, keeping first occurrences in order.
pub fn dedupe(records: impl IntoIterator<Item = ActivityRecord>) -> Vec<ActivityRecord> {
    let mut seen: HashSet<String> = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.url.clone()))
        .collect()
}

/// Partition records by repository, in order of first appearance.
pub fn group_by_repository(records: Vec<ActivityRecord>) -> RepositoryGroup {
    let mut grouped = RepositoryGroup::new();

    for record in records {
        grouped
            .entry(record.repository.clone())
            .or_default()
            .push(record);
    }

    grouped
}

/// Apply an ordering policy in place.
///
/// Both sorts are stable, so records with equal timestamps keep their
/// collection order.
pub fn apply_ordering(grouped: &mut RepositoryGroup, policy: OrderingPolicy) {
    match policy {
        OrderingPolicy::Chronological => {
            grouped.sort_keys();
            for records in grouped.values_mut() {
                records.sort_by_key(|r| r.updated_at);
            }
        }
        OrderingPolicy::Unsorted => {}
    }
}

/// Dedupe, group and order in one step.
pub fn aggregate(
    records: impl IntoIterator<Item = ActivityRecord>,
    policy: OrderingPolicy,
) -> RepositoryGroup {
    let mut grouped = group_by_repository(dedupe(records));
    apply_ordering(&mut grouped, policy);
    grouped
}

/// Total number of records across all groups.
pub fn record_count(grouped: &RepositoryGroup) -> usize {
    grouped.values().map(Vec::len).sum()
}
