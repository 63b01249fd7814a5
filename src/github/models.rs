// src/github/models.rs
// =============================================================================
// Data types returned by the GitHub REST API.
//
// Only the fields we actually display are declared; serde ignores the rest.
// Fields that GitHub may send as null (or omit) are Option<T>, so a missing
// bio or language never breaks deserialization.
// =============================================================================

use serde::{Deserialize, Serialize};

/// A user as returned by `/users/{login}` and inside search results.
///
/// Search results only carry the summary fields (login, id, avatar, url),
/// so everything else defaults to None / 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    pub id: u64,
    pub avatar_url: String,
    pub html_url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub followers: Option<u64>,
    #[serde(default)]
    pub following: Option<u64>,
    #[serde(default)]
    pub public_repos: Option<u64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub blog: Option<String>,
    #[serde(default)]
    pub twitter_username: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    /// The name to show in headings: real name when set, login otherwise.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.login)
    }
}

/// Response envelope of `/search/users`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<User>,
}

/// The owner block embedded in every repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
    pub html_url: String,
    pub avatar_url: String,
}

/// A repository from `/users/{login}/repos` or `/repos/{owner}/{repo}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub html_url: String,
    pub owner: Owner,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub watchers_count: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub pushed_at: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub clone_url: String,
    #[serde(default)]
    pub ssh_url: String,
    #[serde(default = "default_branch")]
    pub default_branch: String,
    #[serde(default)]
    pub private: bool,
}

fn default_branch() -> String {
    "main".to_string()
}

/// Response of `/repos/{owner}/{repo}/readme`.
///
/// `content` is base64 with a newline every 60 characters; see
/// `readme::decode_content`.
#[derive(Debug, Clone, Deserialize)]
pub struct Readme {
    pub content: String,
    #[serde(default)]
    pub encoding: Option<String>,
}
