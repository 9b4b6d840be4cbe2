//! HTTP client for the GitHub REST and GraphQL APIs.
//!
//! The client is built once per run from resolved settings and passed by
//! reference into the collector and the project mutator.

use crate::github::types::{
    AddDraftIssue, Event, GraphQLResponse, IssueItem, Page, ProjectLookup, SearchResponse,
};
use crate::github::{GitHubError, Platform};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK};
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

const API_VERSION: &str = "2022-11-28";

/// Connection settings for [`GitHubClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub graphql_url: String,
    pub token: String,
    pub per_page: u32,
    pub timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            graphql_url: "https://api.github.com/graphql".to_string(),
            token: String::new(),
            per_page: 100,
            timeout_seconds: 30,
        }
    }
}

/// GitHub API client.
pub struct GitHubClient {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl GitHubClient {
    /// Create a client with bearer authentication and GitHub's default headers.
    pub fn new(config: ClientConfig) -> Result<Self, GitHubError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| GitHubError::InvalidToken)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(format!("aatp/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|source| GitHubError::Request {
                url: config.api_url.clone(),
                source,
            })?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    /// Send a request and turn transport failures and non-2xx statuses into errors.
    async fn send(&self, url: &str, request: RequestBuilder) -> Result<Response, GitHubError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GitHubError::Timeout {
                    url: url.to_string(),
                    seconds: self.config.timeout_seconds,
                }
            } else if e.is_connect() {
                GitHubError::Connect {
                    url: url.to_string(),
                }
            } else {
                GitHubError::Request {
                    url: url.to_string(),
                    source: e,
                }
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GitHubError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(url: &str, response: Response) -> Result<T, GitHubError> {
        response.json().await.map_err(|source| GitHubError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// Run a GraphQL operation and unwrap its `data`.
    async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, GitHubError> {
        let url = self.config.graphql_url.as_str();
        let request = self
            .http_client
            .post(url)
            .json(&json!({ "query": query, "variables": variables }));

        let response = self.send(url, request).await?;
        let body: GraphQLResponse<T> = Self::decode(url, response).await?;

        if !body.errors.is_empty() {
            let messages: Vec<String> = body.errors.into_iter().map(|e| e.message).collect();
            return Err(GitHubError::GraphQL(messages.join("; ")));
        }

        body.data
            .ok_or_else(|| GitHubError::GraphQL("response carried no data".to_string()))
    }
}

impl Platform for GitHubClient {
    fn api_url(&self) -> &str {
        &self.config.api_url
    }

    async fn search_issues(&self, query: &str, page: u32) -> Result<Page<IssueItem>, GitHubError> {
        let url = self.endpoint("/search/issues");
        let per_page = self.config.per_page.to_string();
        let page_str = page.to_string();
        let request = self.http_client.get(&url).query(&[
            ("q", query),
            ("sort", "updated"),
            ("order", "desc"),
            ("per_page", per_page.as_str()),
            ("page", page_str.as_str()),
        ]);

        debug!("GET {} q={:?} page={}", url, query, page);
        let response = self.send(&url, request).await?;
        let next_page = next_page(response.headers().get(LINK));
        let body: SearchResponse = Self::decode(&url, response).await?;

        if body.incomplete_results {
            warn!("Search for {:?} returned incomplete results", query);
        }
        debug!(
            "Page {} carried {} of {} results",
            page,
            body.items.len(),
            body.total_count
        );

        Ok(Page {
            items: body.items,
            next_page,
        })
    }

    async fn received_events(&self, user: &str, page: u32) -> Result<Page<Event>, GitHubError> {
        let url = self.endpoint(&format!("/users/{}/received_events", user));
        let per_page = self.config.per_page.to_string();
        let page_str = page.to_string();
        let request = self
            .http_client
            .get(&url)
            .query(&[("per_page", per_page.as_str()), ("page", page_str.as_str())]);

        debug!("GET {} page={}", url, page);
        let response = self.send(&url, request).await?;
        let next_page = next_page(response.headers().get(LINK));
        let items: Vec<Event> = Self::decode(&url, response).await?;

        Ok(Page { items, next_page })
    }

    async fn project_id(&self, login: &str, number: u64) -> Result<String, GitHubError> {
        let lookup: ProjectLookup = self
            .graphql(
                PROJECT_ID_QUERY,
                json!({ "login": login, "number": number }),
            )
            .await?;

        lookup
            .user
            .and_then(|owner| owner.project_v2)
            .map(|project| project.id)
            .ok_or_else(|| GitHubError::ProjectNotFound {
                login: login.to_string(),
                number,
            })
    }

    async fn add_draft_item(&self, project_id: &str, title: &str) -> Result<String, GitHubError> {
        let added: AddDraftIssue = self
            .graphql(
                ADD_DRAFT_MUTATION,
                json!({ "project": project_id, "title": title }),
            )
            .await?;

        added
            .add_project_v2_draft_issue
            .and_then(|payload| payload.project_item)
            .map(|item| item.id)
            .ok_or_else(|| GitHubError::GraphQL("mutation returned no project item".to_string()))
    }
}

/// Extract the `page` parameter of the `rel="next"` entry of a `Link` header.
pub fn next_page(link: Option<&HeaderValue>) -> Option<u32> {
    let link = link?.to_str().ok()?;

    link.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|param| param.trim() == "rel=\"next\"");
        if !is_next {
            return None;
        }

        let target = target.strip_prefix('<')?.strip_suffix('>')?;
        let url = Url::parse(target).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse().ok())
    })
}

const PROJECT_ID_QUERY: &str = r#"query($login: String!, $number: Int!) {
  user(login: $login) {
    projectV2(number: $number) {
      id
    }
  }
}"#;

const ADD_DRAFT_MUTATION: &str = r#"mutation($project: ID!, $title: String!) {
  addProjectV2DraftIssue(input: {projectId: $project, title: $title}) {
    projectItem {
      id
    }
  }
}"#;
