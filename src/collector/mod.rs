//! Paginated collection from the platform.
//!
//! Every listing is followed page by page until the platform reports no
//! next page. Any error aborts collection; callers treat it as fatal.

use crate::analysis::{dedupe, to_record};
use crate::github::{Event, IssueItem, Platform};
use crate::models::{ActivityRecord, TimeWindow};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, info};

/// Search qualifiers queried for the report, in order.
///
/// The search API treats every pull request as an issue, so the second
/// query overlaps the first; deduplication resolves that.
pub const ACTIVITY_KINDS: [&str; 2] = ["is:issue", "is:pull-request"];

/// Build the search query for one kind of activity.
pub fn activity_query(kind: &str, user: &str, window: &TimeWindow) -> String {
    format!("{} involves:{} updated:>={}", kind, user, window.since())
}

/// A spinner for the collection phase, hidden when `show` is false.
pub fn spinner(show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Follow every page of a search query.
pub async fn search_all<P: Platform>(
    platform: &P,
    query: &str,
    progress: &ProgressBar,
) -> Result<Vec<IssueItem>> {
    let mut items = Vec::new();
    let mut page = 1;

    loop {
        progress.set_message(format!("Searching {:?} (page {})", query, page));
        let result = platform
            .search_issues(query, page)
            .await
            .with_context(|| format!("Search {:?} failed on page {}", query, page))?;

        if result.items.is_empty() {
            break;
        }
        debug!("Query {:?} page {}: {} items", query, page, result.items.len());
        items.extend(result.items);

        match result.next_page {
            Some(next) => page = next,
            None => break,
        }
    }

    Ok(items)
}

/// Collect the user's issues and pull requests updated within the window.
///
/// Search only bounds the start of the window, so records updated after
/// its last day are dropped here. Results of the overlapping queries are
/// deduplicated by URL, in order of first appearance.
pub async fn collect_activity<P: Platform>(
    platform: &P,
    user: &str,
    window: &TimeWindow,
    progress: &ProgressBar,
) -> Result<Vec<ActivityRecord>> {
    let mut records = Vec::new();

    for kind in ACTIVITY_KINDS {
        let query = activity_query(kind, user, window);
        let items = search_all(platform, &query, progress).await?;
        info!("{} results for {:?}", items.len(), query);
        let before = items.len();
        let in_window: Vec<&IssueItem> = items
            .iter()
            .filter(|item| window.covers(item.updated_at))
            .collect();
        if in_window.len() < before {
            debug!(
                "Dropped {} results for {:?} updated after {}",
                before - in_window.len(),
                query,
                window.end
            );
        }
        records.extend(in_window.into_iter().map(|item| to_record(item, platform.api_url())));
    }

    let collected = records.len();
    let records = dedupe(records);
    debug!(
        "Deduplicated {} collected records to {}",
        collected,
        records.len()
    );

    Ok(records)
}

/// Collect events received by the user since `since`, newest first.
///
/// Paging stops early once a page reaches events older than `since`.
pub async fn collect_events<P: Platform>(
    platform: &P,
    user: &str,
    since: DateTime<Utc>,
    progress: &ProgressBar,
) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    let mut page = 1;

    loop {
        progress.set_message(format!("Listing events for {} (page {})", user, page));
        let result = platform
            .received_events(user, page)
            .await
            .with_context(|| format!("Listing events for {} failed on page {}", user, page))?;

        if result.items.is_empty() {
            break;
        }

        let reached_older = result.items.iter().any(|e| e.created_at < since);
        events.extend(result.items.into_iter().filter(|e| e.created_at >= since));

        if reached_older {
            break;
        }
        match result.next_page {
            Some(next) => page = next,
            None => break,
        }
    }

    info!("{} events since {}", events.len(), since.format("%Y-%m-%d"));
    Ok(events)
}
