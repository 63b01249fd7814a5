// src/github/client.rs
// =============================================================================
// HTTP client for the public GitHub REST API.
//
// Endpoints used:
//   GET /search/users?q=..&per_page=..     user search
//   GET /users/{login}                     profile
//   GET /users/{login}/repos?per_page&page  one page of repositories
//   GET /repos/{owner}/{repo}              repository metadata
//   GET /repos/{owner}/{repo}/readme       README (base64 content)
//
// All requests are plain GETs with the GitHub JSON media type. When a token
// is configured it is sent as a bearer token; otherwise we run against the
// anonymous rate limit.
//
// The rest of the app talks to GitHub through the `GithubApi` trait so the
// browse session can be tested with an in-memory fake.
// =============================================================================

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::error::{GithubError, Result};
use super::models::{Readme, Repository, SearchResponse, User};
use super::pager::{self, RepoPageSource};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Everything the application needs from GitHub.
///
/// `RepoPageSource` is a supertrait so `all_repos` can reuse the pager.
#[async_trait]
pub trait GithubApi: RepoPageSource {
    /// Searches users. An empty (or whitespace) query yields no results
    /// without touching the network.
    async fn search_users(&self, query: &str, limit: u32) -> Result<Vec<User>>;

    async fn get_user(&self, login: &str) -> Result<User>;

    async fn get_repo(&self, owner: &str, repo: &str) -> Result<Repository>;

    async fn get_readme(&self, owner: &str, repo: &str) -> Result<Readme>;

    /// Every repository of `login`, fetched page by page.
    async fn all_repos(&self, login: &str, per_page: u32) -> Result<Vec<Repository>> {
        pager::fetch_all_repos(self, login, per_page).await
    }
}

/// reqwest-backed implementation of `GithubApi`.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    base: Url,
}

impl GithubClient {
    /// Builds a client with the GitHub headers preconfigured.
    ///
    /// `token` is sent as `Authorization: Bearer <token>` when present.
    pub fn new(api_base: &str, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("github-explorer"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .map_err(|_| GithubError::InvalidToken)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(GithubError::from_transport)?;

        // endpoint() appends segments, so the base must not end in '/'
        let base = Url::parse(api_base.trim_end_matches('/'))?;

        Ok(GithubClient { http, base })
    }

    /// Builds `base/<segments...>`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            // the root path "/" shows up as one empty segment
            path.pop_if_empty();
            path.extend(segments);
        }
        url
    }

    /// Sends a GET and decodes the JSON body, mapping error statuses.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(%url, "GET");
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(GithubError::from_transport)?;

        let response = check_status(url.as_str(), response).await?;

        response.json::<T>().await.map_err(|e| GithubError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

// Turns a non-success response into the matching GithubError
async fn check_status(url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let rate_limited = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim() == "0")
        .unwrap_or(false);

    if status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && rate_limited)
    {
        return Err(GithubError::RateLimited);
    }

    if status == StatusCode::NOT_FOUND {
        return Err(GithubError::NotFound(url.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    Err(GithubError::Status {
        status,
        message: api_message(&body),
    })
}

// GitHub error bodies look like {"message": "...", "documentation_url": "..."}
fn api_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl RepoPageSource for GithubClient {
    async fn fetch_repo_page(&self, username: &str, page: u32, per_page: u32) -> Result<Vec<Repository>> {
        let mut url = self.endpoint(&["users", username, "repos"]);
        url.query_pairs_mut()
            .append_pair("per_page", &per_page.to_string())
            .append_pair("page", &page.to_string());
        self.get_json(url).await
    }
}

#[async_trait]
impl GithubApi for GithubClient {
    async fn search_users(&self, query: &str, limit: u32) -> Result<Vec<User>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut url = self.endpoint(&["search", "users"]);
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("per_page", &limit.to_string());

        let search: SearchResponse = self.get_json(url).await?;
        Ok(search.items)
    }

    async fn get_user(&self, login: &str) -> Result<User> {
        self.get_json(self.endpoint(&["users", login])).await
    }

    async fn get_repo(&self, owner: &str, repo: &str) -> Result<Repository> {
        self.get_json(self.endpoint(&["repos", owner, repo])).await
    }

    async fn get_readme(&self, owner: &str, repo: &str) -> Result<Readme> {
        self.get_json(self.endpoint(&["repos", owner, repo, "readme"])).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GithubClient {
        GithubClient::new(DEFAULT_API_BASE, None, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let url = client().endpoint(&["repos", "alice", "alice-repo-1", "readme"]);
        assert_eq!(url.as_str(), "https://api.github.com/repos/alice/alice-repo-1/readme");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let url = client().endpoint(&["users", "a b/c"]);
        assert_eq!(url.as_str(), "https://api.github.com/users/a%20b%2Fc");
    }

    #[test]
    fn test_endpoint_with_base_path() {
        let client = GithubClient::new("https://ghe.example/api/v3/", None, Duration::from_secs(5)).unwrap();
        let url = client.endpoint(&["users", "alice"]);
        assert_eq!(url.as_str(), "https://ghe.example/api/v3/users/alice");
    }

    #[test]
    fn test_api_message() {
        assert_eq!(api_message(r#"{"message":"Bad credentials"}"#), "Bad credentials");
        assert_eq!(api_message("oops\n"), "oops");
    }

    #[test]
    fn test_invalid_token_rejected() {
        let result = GithubClient::new(DEFAULT_API_BASE, Some("bad\ntoken"), Duration::from_secs(5));
        assert!(matches!(result, Err(GithubError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_empty_query_skips_request() {
        // Points at an unroutable base: any request would fail
        let client = GithubClient::new("http://127.0.0.1:9", None, Duration::from_millis(50)).unwrap();
        let users = client.search_users("   ", 5).await.unwrap();
        assert!(users.is_empty());
    }
}
