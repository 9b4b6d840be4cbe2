//! Event classification and the involvement predicate.

use crate::github::types::User;
use crate::github::{Event, EventSubject};
use crate::models::EventKind;

/// Classify an event by type and action.
pub fn classify(event: &Event) -> EventKind {
    let action = event.payload.action.as_deref().unwrap_or("");
    match (event.kind.as_str(), action) {
        ("IssuesEvent", "opened") if event.payload.issue.is_some() => EventKind::IssueOpened,
        ("IssuesEvent", "assigned") if event.payload.issue.is_some() => EventKind::IssueAssigned,
        ("PullRequestEvent", "opened") if event.payload.pull_request.is_some() => {
            EventKind::PullRequestOpened
        }
        _ => EventKind::Ignored,
    }
}

/// The issue or pull request an event refers to.
pub fn subject(event: &Event) -> Option<&EventSubject> {
    match classify(event) {
        EventKind::IssueOpened | EventKind::IssueAssigned => event.payload.issue.as_ref(),
        EventKind::PullRequestOpened => event.payload.pull_request.as_ref(),
        EventKind::Ignored => None,
    }
}

fn is_user(account: Option<&User>, login: &str) -> bool {
    account.is_some_and(|account| account.login.eq_ignore_ascii_case(login))
}

/// Whether `login` authored the subject or is assigned to it, directly or
/// through the assignee list. For `assigned` actions the newly assigned
/// account counts too.
pub fn involves_user(event: &Event, login: &str) -> bool {
    let Some(subject) = subject(event) else {
        return false;
    };

    is_user(subject.user.as_ref(), login)
        || is_user(subject.assignee.as_ref(), login)
        || subject.assignees.iter().any(|a| is_user(Some(a), login))
        || is_user(event.payload.assignee.as_ref(), login)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::types::EventPayload;
    use chrono::Utc;

    fn account(login: &str) -> User {
        User {
            login: login.to_string(),
        }
    }

    fn subject_by(author: &str) -> EventSubject {
        EventSubject {
            html_url: "https://github.com/a/b/issues/9".to_string(),
            title: "Something".to_string(),
            user: Some(account(author)),
            assignee: None,
            assignees: vec![],
        }
    }

    fn event(kind: &str, action: &str, payload: EventPayload) -> Event {
        Event {
            id: "1".to_string(),
            kind: kind.to_string(),
            created_at: Utc::now(),
            repo: None,
            payload: EventPayload {
                action: Some(action.to_string()),
                ..payload
            },
        }
    }

    fn issue_payload(subject: EventSubject) -> EventPayload {
        EventPayload {
            issue: Some(subject),
            ..EventPayload::default()
        }
    }

    #[test]
    fn test_classify() {
        let issue = issue_payload(subject_by("x"));
        assert_eq!(
            classify(&event("IssuesEvent", "opened", issue.clone())),
            EventKind::IssueOpened
        );
        assert_eq!(
            classify(&event("IssuesEvent", "assigned", issue.clone())),
            EventKind::IssueAssigned
        );
        assert_eq!(
            classify(&event("IssuesEvent", "closed", issue.clone())),
            EventKind::Ignored
        );
        assert_eq!(
            classify(&event("IssueCommentEvent", "created", issue)),
            EventKind::Ignored
        );

        let pull = EventPayload {
            pull_request: Some(subject_by("x")),
            ..EventPayload::default()
        };
        assert_eq!(
            classify(&event("PullRequestEvent", "opened", pull)),
            EventKind::PullRequestOpened
        );
    }

    #[test]
    fn test_classify_requires_subject() {
        let bare = event("IssuesEvent", "opened", EventPayload::default());
        assert_eq!(classify(&bare), EventKind::Ignored);
        assert!(subject(&bare).is_none());
    }

    #[test]
    fn test_author_matches_case_insensitively() {
        let e = event("IssuesEvent", "opened", issue_payload(subject_by("Alice")));
        assert!(involves_user(&e, "alice"));
        assert!(!involves_user(&e, "bob"));
    }

    #[test]
    fn test_direct_assignee_matches() {
        let mut s = subject_by("bob");
        s.assignee = Some(account("alice"));
        let e = event("IssuesEvent", "opened", issue_payload(s));
        assert!(involves_user(&e, "alice"));
    }

    #[test]
    fn test_assignee_list_matches() {
        let mut s = subject_by("bob");
        s.assignees = vec![account("carol"), account("alice")];
        let e = event("IssuesEvent", "assigned", issue_payload(s));
        assert!(involves_user(&e, "alice"));
    }

    #[test]
    fn test_assigned_action_target_matches() {
        let payload = EventPayload {
            assignee: Some(account("alice")),
            ..issue_payload(subject_by("bob"))
        };
        let e = event("IssuesEvent", "assigned", payload);
        assert!(involves_user(&e, "alice"));
    }

    #[test]
    fn test_pull_request_author_matches() {
        let payload = EventPayload {
            pull_request: Some(subject_by("alice")),
            ..EventPayload::default()
        };
        let e = event("PullRequestEvent", "opened", payload);
        assert!(involves_user(&e, "alice"));
        assert_eq!(
            subject(&e).map(|s| s.html_url.as_str()),
            Some("https://github.com/a/b/issues/9")
        );
    }

    #[test]
    fn test_ignored_event_never_involves() {
        let e = event("IssuesEvent", "closed", issue_payload(subject_by("alice")));
        assert!(!involves_user(&e, "alice"));
    }
}
