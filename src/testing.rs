// src/testing.rs
// =============================================================================
// In-memory GitHub used by the unit tests (compiled only for `cargo test`).
//
// Users and repositories are registered up front; every call is counted so
// tests can assert what was (and was not) fetched.
// =============================================================================

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::github::{test_repo, GithubApi, GithubError, Readme, RepoPageSource, Repository, User};

#[derive(Default)]
pub struct FakeGithub {
    users: Vec<User>,
    repos: HashMap<String, Vec<Repository>>,
    readmes: HashMap<String, String>,
    pub fail_repos: bool,
    pub searches: AtomicUsize,
    pub profile_calls: AtomicUsize,
    pub page_calls: AtomicUsize,
}

pub fn user(login: &str) -> User {
    User {
        login: login.to_string(),
        id: login.len() as u64,
        avatar_url: format!("https://avatars.example/{login}"),
        html_url: format!("https://github.com/{login}"),
        name: None,
        bio: None,
        followers: None,
        following: None,
        public_repos: None,
        location: None,
        email: None,
        blog: None,
        twitter_username: None,
        created_at: None,
    }
}

impl FakeGithub {
    pub fn with_user(mut self, login: &str, repos: &[(&str, Option<&str>)]) -> Self {
        self.users.push(user(login));
        self.repos.insert(
            login.to_string(),
            repos.iter().map(|(name, lang)| test_repo(login, name, *lang)).collect(),
        );
        self
    }

    pub fn with_readme(mut self, owner: &str, repo: &str, markdown: &str) -> Self {
        self.readmes.insert(format!("{owner}/{repo}"), STANDARD.encode(markdown));
        self
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepoPageSource for FakeGithub {
    async fn fetch_repo_page(&self, username: &str, page: u32, per_page: u32) -> Result<Vec<Repository>, GithubError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_repos {
            return Err(GithubError::Network("connection refused".into()));
        }
        let repos = self
            .repos
            .get(username)
            .ok_or_else(|| GithubError::NotFound(username.to_string()))?;
        Ok(repos
            .iter()
            .skip(((page - 1) * per_page) as usize)
            .take(per_page as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl GithubApi for FakeGithub {
    async fn search_users(&self, query: &str, limit: u32) -> Result<Vec<User>, GithubError> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.searches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .users
            .iter()
            .filter(|u| u.login.contains(&query))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn get_user(&self, login: &str) -> Result<User, GithubError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.users
            .iter()
            .find(|u| u.login == login)
            .map(|u| User { bio: Some(format!("{login} writes code")), followers: Some(1200), ..u.clone() })
            .ok_or_else(|| GithubError::NotFound(login.to_string()))
    }

    async fn get_repo(&self, owner: &str, repo: &str) -> Result<Repository, GithubError> {
        self.repos
            .get(owner)
            .and_then(|repos| repos.iter().find(|r| r.name == repo))
            .cloned()
            .ok_or_else(|| GithubError::NotFound(format!("{owner}/{repo}")))
    }

    async fn get_readme(&self, owner: &str, repo: &str) -> Result<Readme, GithubError> {
        self.readmes
            .get(&format!("{owner}/{repo}"))
            .map(|content| Readme {
                content: content.clone(),
                encoding: Some("base64".into()),
            })
            .ok_or_else(|| GithubError::NotFound(format!("{owner}/{repo}/readme")))
    }
}
