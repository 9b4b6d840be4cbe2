//! Project-board triage.
//!
//! Received events are classified, filtered by whether they involve the
//! configured user, and the matching issue or pull request URLs are added
//! to a project as draft items. A failed mutation is recorded as a warning
//! and never stops the run.

pub mod filter;

pub use filter::{classify, involves_user, subject};

use crate::github::{Event, Platform};
use crate::models::{EventKind, TriageSummary, TriageWarning};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Files matching events into one project.
pub struct ProjectMutator<'a, P: Platform> {
    platform: &'a P,
    project_id: String,
    dry_run: bool,
}

impl<'a, P: Platform> ProjectMutator<'a, P> {
    /// Create a mutator for an already-resolved project node id.
    pub fn new(platform: &'a P, project_id: impl Into<String>, dry_run: bool) -> Self {
        Self {
            platform,
            project_id: project_id.into(),
            dry_run,
        }
    }

    /// Classify, filter and file every event.
    ///
    /// A URL is filed at most once per run, even when several events refer
    /// to it (opened and then assigned within the same week).
    pub async fn run(&self, events: &[Event], user: &str) -> TriageSummary {
        let mut summary = TriageSummary {
            events_seen: events.len(),
            ..TriageSummary::default()
        };
        let mut handled: HashSet<&str> = HashSet::new();

        for event in events {
            let kind = classify(event);
            if kind == EventKind::Ignored {
                continue;
            }
            if !involves_user(event, user) {
                debug!(
                    "Event {} ({}) in {} does not involve {}",
                    event.id,
                    kind,
                    event.repo.as_ref().map(|r| r.name.as_str()).unwrap_or("?"),
                    user
                );
                continue;
            }
            let Some(subject) = subject(event) else {
                continue;
            };

            summary.matched += 1;
            if !handled.insert(subject.html_url.as_str()) {
                debug!("{} already handled in this run", subject.html_url);
                continue;
            }

            if self.dry_run {
                info!("Would add {} {:?} ({})", subject.html_url, subject.title, kind);
                summary.filed.push(subject.html_url.clone());
                continue;
            }

            match self
                .platform
                .add_draft_item(&self.project_id, &subject.html_url)
                .await
            {
                Ok(item_id) => {
                    info!(
                        "Added {} {:?} ({}) as {}",
                        subject.html_url, subject.title, kind, item_id
                    );
                    summary.filed.push(subject.html_url.clone());
                }
                Err(e) => {
                    warn!("Failed to add {} to project: {}", subject.html_url, e);
                    summary.warnings.push(TriageWarning {
                        url: subject.html_url.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::testing::FakePlatform;
    use crate::github::types::{EventPayload, EventSubject, User};
    use chrono::{TimeZone, Utc};

    fn user(login: &str) -> Option<User> {
        Some(User {
            login: login.to_string(),
        })
    }

    fn issue_event(id: &str, action: &str, url: &str, author: &str) -> Event {
        Event {
            id: id.to_string(),
            kind: "IssuesEvent".to_string(),
            created_at: Utc.with_ymd_and_hms(2022, 2, 1, 9, 0, 0).unwrap(),
            repo: None,
            payload: EventPayload {
                action: Some(action.to_string()),
                issue: Some(EventSubject {
                    html_url: url.to_string(),
                    title: "Crash".to_string(),
                    user: user(author),
                    assignee: None,
                    assignees: vec![],
                }),
                pull_request: None,
                assignee: None,
            },
        }
    }

    #[test]
    fn test_authored_issue_is_filed_once() {
        let platform = FakePlatform::default().with_project("PVT_1");
        let mutator = ProjectMutator::new(&platform, "PVT_1", false);
        let events = vec![issue_event("1", "opened", "https://github.com/a/b/issues/1", "alice")];

        let summary = tokio_test::block_on(mutator.run(&events, "alice"));

        assert_eq!(
            *platform.mutations.lock().unwrap(),
            vec![(
                "PVT_1".to_string(),
                "https://github.com/a/b/issues/1".to_string()
            )]
        );
        assert_eq!(summary.filed, vec!["https://github.com/a/b/issues/1"]);
        assert_eq!(summary.matched, 1);
        assert!(summary.is_clean());
    }

    #[test]
    fn test_uninvolved_user_triggers_no_mutation() {
        let platform = FakePlatform::default();
        let mutator = ProjectMutator::new(&platform, "PVT_1", false);
        let events = vec![issue_event("1", "opened", "https://github.com/a/b/issues/1", "bob")];

        let summary = tokio_test::block_on(mutator.run(&events, "alice"));

        assert!(platform.mutations.lock().unwrap().is_empty());
        assert_eq!(summary.events_seen, 1);
        assert_eq!(summary.matched, 0);
        assert!(summary.filed.is_empty());
    }

    #[test]
    fn test_failed_mutation_is_a_warning() {
        let mut platform = FakePlatform::default();
        platform
            .failing_titles
            .insert("https://github.com/a/b/issues/1".to_string());
        let mutator = ProjectMutator::new(&platform, "PVT_1", false);
        let events = vec![
            issue_event("1", "opened", "https://github.com/a/b/issues/1", "alice"),
            issue_event("2", "opened", "https://github.com/a/b/issues/2", "alice"),
        ];

        let summary = tokio_test::block_on(mutator.run(&events, "alice"));

        assert_eq!(summary.warnings.len(), 1);
        assert_eq!(summary.warnings[0].url, "https://github.com/a/b/issues/1");
        assert!(summary.warnings[0].message.contains("cannot add"));
        assert_eq!(summary.filed, vec!["https://github.com/a/b/issues/2"]);
    }

    #[test]
    fn test_same_url_filed_once_per_run() {
        let platform = FakePlatform::default();
        let mutator = ProjectMutator::new(&platform, "PVT_1", false);
        let url = "https://github.com/a/b/issues/1";
        let events = vec![
            issue_event("2", "assigned", url, "alice"),
            issue_event("1", "opened", url, "alice"),
        ];

        let summary = tokio_test::block_on(mutator.run(&events, "alice"));

        assert_eq!(platform.mutation_titles(), vec![url.to_string()]);
        assert_eq!(summary.matched, 2);
        assert_eq!(summary.filed.len(), 1);
    }

    #[test]
    fn test_dry_run_never_mutates() {
        let platform = FakePlatform::default();
        let mutator = ProjectMutator::new(&platform, "PVT_1", true);
        let events = vec![issue_event("1", "opened", "https://github.com/a/b/issues/1", "alice")];

        let summary = tokio_test::block_on(mutator.run(&events, "alice"));

        assert!(platform.mutations.lock().unwrap().is_empty());
        assert_eq!(summary.filed.len(), 1);
    }

    #[test]
    fn test_ignored_events_are_skipped() {
        let platform = FakePlatform::default();
        let mutator = ProjectMutator::new(&platform, "PVT_1", false);
        let events = vec![issue_event("1", "closed", "https://github.com/a/b/issues/1", "alice")];

        let summary = tokio_test::block_on(mutator.run(&events, "alice"));

        assert!(platform.mutations.lock().unwrap().is_empty());
        assert_eq!(summary.matched, 0);
    }
}
