//! GitHub platform access.
//!
//! The report and triage flows talk to GitHub through the [`Platform`]
//! trait; [`GitHubClient`] implements it over REST and GraphQL.

pub mod client;
pub mod types;

pub use client::{ClientConfig, GitHubClient};
pub use types::{Event, EventSubject, IssueItem, Page};

/// Errors from the GitHub transport.
#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    #[error("Token contains characters that are not valid in an HTTP header")]
    InvalidToken,
    #[error("Request to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },
    #[error("Cannot connect to {url}")]
    Connect { url: String },
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("GitHub API error {status} for {url}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("GraphQL error: {0}")]
    GraphQL(String),
    #[error("Project #{number} not found for user {login}")]
    ProjectNotFound { login: String, number: u64 },
}

/// Read and write operations the flows need from the platform.
///
/// Listing calls return one page at a time; callers drive pagination.
#[allow(async_fn_in_trait)]
pub trait Platform {
    /// Base URL of the REST API, used to derive repository names.
    fn api_url(&self) -> &str;

    /// One page of `GET /search/issues` for `query`, sorted by update time.
    async fn search_issues(&self, query: &str, page: u32) -> Result<Page<IssueItem>, GitHubError>;

    /// One page of events received by `user`, newest first.
    async fn received_events(&self, user: &str, page: u32) -> Result<Page<Event>, GitHubError>;

    /// Node id of the user-owned project with the given number.
    async fn project_id(&self, login: &str, number: u64) -> Result<String, GitHubError>;

    /// Add a draft item titled `title` to the project; returns the item id.
    async fn add_draft_item(&self, project_id: &str, title: &str) -> Result<String, GitHubError>;
}
