//! Wire types for the GitHub REST and GraphQL responses we consume.
//!
//! Only the fields the report and triage flows read are modelled;
//! everything else in the payloads is ignored by serde.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A GitHub account reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
}

/// Repository reference embedded in some issue payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub owner: Option<User>,
}

/// One item of `GET /search/issues`. Pull requests are issues too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueItem {
    pub html_url: String,
    pub title: String,
    pub state: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub user: Option<User>,
    pub repository_url: String,
    #[serde(default)]
    pub repository: Option<RepositoryRef>,
}

impl IssueItem {
    /// `owner/name` from the embedded repository, when the payload carries one.
    pub fn embedded_repository(&self) -> Option<String> {
        let repo = self.repository.as_ref()?;
        if let Some(ref full_name) = repo.full_name {
            return Some(full_name.clone());
        }
        repo.owner
            .as_ref()
            .map(|owner| format!("{}/{}", owner.login, repo.name))
    }

    /// Author login, empty if the account was deleted.
    pub fn author(&self) -> &str {
        self.user.as_ref().map(|u| u.login.as_str()).unwrap_or("")
    }
}

/// Body of a search response.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    #[serde(default)]
    pub items: Vec<IssueItem>,
}

/// Issue or pull request carried in an event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSubject {
    pub html_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub assignee: Option<User>,
    #[serde(default)]
    pub assignees: Vec<User>,
}

/// Payload of an issue or pull request event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub issue: Option<EventSubject>,
    #[serde(default)]
    pub pull_request: Option<EventSubject>,
    /// The account assigned by an `assigned` action.
    #[serde(default)]
    pub assignee: Option<User>,
}

/// Repository of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRepo {
    pub name: String,
}

/// One entry of `GET /users/{user}/received_events`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub repo: Option<EventRepo>,
    #[serde(default)]
    pub payload: EventPayload,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Page number to request next; `None` on the last page.
    pub next_page: Option<u32>,
}

/// Envelope of every GraphQL response.
#[derive(Debug, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQLErrorMessage>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLErrorMessage {
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectLookup {
    pub user: Option<ProjectOwner>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOwner {
    pub project_v2: Option<ProjectNode>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectNode {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDraftIssue {
    pub add_project_v2_draft_issue: Option<DraftIssuePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftIssuePayload {
    pub project_item: Option<ProjectNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_response() {
        let body = r#"{
            "total_count": 1,
            "incomplete_results": false,
            "items": [{
                "html_url": "https://github.com/a/b/pull/7",
                "title": "Fix X",
                "state": "open",
                "updated_at": "2022-02-01T10:00:00Z",
                "user": {"login": "alice", "id": 1},
                "repository_url": "https://api.github.com/repos/a/b",
                "pull_request": {"url": "https://api.github.com/repos/a/b/pulls/7"}
            }]
        }"#;

        let response: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.total_count, 1);
        let item = &response.items[0];
        assert_eq!(item.author(), "alice");
        assert!(item.repository.is_none());
        assert_eq!(item.embedded_repository(), None);
    }

    #[test]
    fn test_embedded_repository_name() {
        let mut item = IssueItem {
            html_url: "https://github.com/a/b/issues/1".to_string(),
            title: "t".to_string(),
            state: "open".to_string(),
            updated_at: Utc::now(),
            user: None,
            repository_url: "https://api.github.com/repos/a/b".to_string(),
            repository: Some(RepositoryRef {
                name: "b".to_string(),
                full_name: None,
                owner: Some(User {
                    login: "a".to_string(),
                }),
            }),
        };
        assert_eq!(item.embedded_repository().as_deref(), Some("a/b"));
        assert_eq!(item.author(), "");

        item.repository.as_mut().unwrap().full_name = Some("c/d".to_string());
        assert_eq!(item.embedded_repository().as_deref(), Some("c/d"));
    }

    #[test]
    fn test_parse_issues_event() {
        let body = r#"{
            "id": "123",
            "type": "IssuesEvent",
            "created_at": "2022-02-02T08:00:00Z",
            "repo": {"id": 9, "name": "a/b"},
            "payload": {
                "action": "assigned",
                "assignee": {"login": "bob"},
                "issue": {
                    "html_url": "https://github.com/a/b/issues/3",
                    "title": "Crash",
                    "user": {"login": "alice"},
                    "assignees": [{"login": "bob"}]
                }
            }
        }"#;

        let event: Event = serde_json::from_str(body).unwrap();
        assert_eq!(event.kind, "IssuesEvent");
        assert_eq!(event.payload.action.as_deref(), Some("assigned"));
        let issue = event.payload.issue.unwrap();
        assert!(issue.assignee.is_none());
        assert_eq!(issue.assignees.len(), 1);
    }

    #[test]
    fn test_event_without_payload_fields() {
        let body = r#"{"id": "1", "type": "WatchEvent", "created_at": "2022-02-02T08:00:00Z", "payload": {"action": "started"}}"#;
        let event: Event = serde_json::from_str(body).unwrap();
        assert!(event.payload.issue.is_none());
        assert!(event.payload.pull_request.is_none());
        assert!(event.repo.is_none());
    }

    #[test]
    fn test_graphql_errors_envelope() {
        let body = r#"{"data": null, "errors": [{"message": "Could not resolve to a User"}]}"#;
        let response: GraphQLResponse<ProjectLookup> = serde_json::from_str(body).unwrap();
        assert!(response.data.is_none());
        assert_eq!(response.errors[0].message, "Could not resolve to a User");
    }
}
