// src/browse/session.rs
// =============================================================================
// The search-and-browse state behind the home page.
//
// Flow:
// 1. `search(query)` asks GitHub for a handful of users (the configured
//    limit) and remembers the hits in order.
// 2. Every hit is an expandable panel. The first time a panel opens, the
//    user's profile and full repository list are fetched; both requests are
//    independent, so they run together.
// 3. Results are cached by key: search hits by query, panels by login.
//    Collapsing and reopening a panel, or repeating a search, does not hit
//    the network again. Only `refetch` / `refresh_search` do.
// 4. A failed request is stored as an inline error on the panel (or returned
//    from `search`); the user retries explicitly.
// =============================================================================

use std::collections::HashMap;
use tracing::{debug, info};

use super::filter::{languages, RepoFilter};
use crate::github::{GithubApi, GithubError, Repository, User};

/// Where a lazily fetched value stands.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    NotLoaded,
    Loaded(T),
    /// The request failed; holds the message shown inline
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadState::Loaded(_))
    }

    fn from_result(result: Result<T, GithubError>) -> Self {
        match result {
            Ok(value) => LoadState::Loaded(value),
            Err(e) => LoadState::Failed(e.to_string()),
        }
    }
}

/// One expandable search hit.
#[derive(Debug, Clone)]
pub struct UserPanel {
    /// The summary from the search result
    pub user: User,
    pub open: bool,
    pub profile: LoadState<User>,
    pub repos: LoadState<Vec<Repository>>,
    pub filter: RepoFilter,
}

impl UserPanel {
    fn new(user: User) -> Self {
        UserPanel {
            user,
            open: false,
            profile: LoadState::NotLoaded,
            repos: LoadState::NotLoaded,
            filter: RepoFilter::default(),
        }
    }

    fn needs_fetch(&self) -> bool {
        matches!(self.profile, LoadState::NotLoaded) || matches!(self.repos, LoadState::NotLoaded)
    }

    /// Repositories passing the panel's filter, once they are loaded.
    pub fn visible_repos(&self) -> Option<Vec<&Repository>> {
        self.repos.loaded().map(|repos| self.filter.apply(repos))
    }

    /// Languages offered by the panel's language selector.
    pub fn languages(&self) -> Vec<&str> {
        self.repos.loaded().map(|repos| languages(repos)).unwrap_or_default()
    }
}

pub struct BrowseSession<A: GithubApi> {
    api: A,
    search_limit: u32,
    per_page: u32,
    query: String,
    hits: Vec<String>,
    searches: HashMap<String, Vec<User>>,
    panels: HashMap<String, UserPanel>,
}

impl<A: GithubApi> BrowseSession<A> {
    pub fn new(api: A, search_limit: u32, per_page: u32) -> Self {
        BrowseSession {
            api,
            search_limit,
            per_page,
            query: String::new(),
            hits: Vec::new(),
            searches: HashMap::new(),
            panels: HashMap::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Runs a user search, answering from the cache when this query was
    /// already searched.
    ///
    /// A blank query clears the results without a request.
    pub async fn search(&mut self, query: &str) -> Result<Vec<&UserPanel>, GithubError> {
        let query = query.trim().to_string();
        if query.is_empty() {
            self.query.clear();
            self.hits.clear();
            return Ok(Vec::new());
        }

        if !self.searches.contains_key(&query) {
            self.fetch_search(&query).await?;
        } else {
            debug!(query = %query, "search served from cache");
        }

        self.show_search(&query);
        Ok(self.results())
    }

    /// Repeats the current search against GitHub.
    pub async fn refresh_search(&mut self) -> Result<Vec<&UserPanel>, GithubError> {
        let query = self.query.clone();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.fetch_search(&query).await?;
        self.show_search(&query);
        Ok(self.results())
    }

    async fn fetch_search(&mut self, query: &str) -> Result<(), GithubError> {
        let users = self.api.search_users(query, self.search_limit).await?;
        info!(query, hits = users.len(), "user search");
        self.searches.insert(query.to_string(), users);
        Ok(())
    }

    fn show_search(&mut self, query: &str) {
        let users = self.searches.get(query).cloned().unwrap_or_default();
        self.query = query.to_string();
        self.hits = users.iter().map(|u| u.login.clone()).collect();
        for user in users {
            self.panels
                .entry(user.login.clone())
                .or_insert_with(|| UserPanel::new(user));
        }
    }

    /// Panels of the current search, in result order.
    pub fn results(&self) -> Vec<&UserPanel> {
        self.hits.iter().filter_map(|login| self.panels.get(login)).collect()
    }

    /// Resolves a login or a 1-based result number to a login.
    pub fn resolve(&self, key: &str) -> Option<String> {
        if let Ok(number) = key.parse::<usize>() {
            return number.checked_sub(1).and_then(|i| self.hits.get(i)).cloned();
        }
        self.panels
            .keys()
            .find(|login| login.eq_ignore_ascii_case(key))
            .cloned()
    }

    /// Opens a collapsed panel or collapses an open one. Opening fetches the
    /// profile and repositories the first time only.
    pub async fn toggle(&mut self, login: &str) -> Option<&UserPanel> {
        let open = self.panels.get(login)?.open;
        if open {
            self.panels.get_mut(login)?.open = false;
            return self.panels.get(login);
        }
        self.open(login).await
    }

    pub async fn open(&mut self, login: &str) -> Option<&UserPanel> {
        let panel = self.panels.get_mut(login)?;
        panel.open = true;
        if panel.needs_fetch() {
            self.fetch_panel(login).await;
        }
        self.panels.get(login)
    }

    /// Fetches profile and repositories again, whatever is cached.
    pub async fn refetch(&mut self, login: &str) -> Option<&UserPanel> {
        if !self.panels.contains_key(login) {
            return None;
        }
        self.fetch_panel(login).await;
        self.panels.get(login)
    }

    async fn fetch_panel(&mut self, login: &str) {
        debug!(login, "loading profile and repositories");
        let (profile, repos) = futures::join!(
            self.api.get_user(login),
            self.api.all_repos(login, self.per_page)
        );

        if let Some(panel) = self.panels.get_mut(login) {
            panel.profile = LoadState::from_result(profile);
            panel.repos = LoadState::from_result(repos);
        }
    }

    pub fn set_name_filter(&mut self, login: &str, name: &str) -> Option<&UserPanel> {
        let panel = self.panels.get_mut(login)?;
        panel.filter.name = name.to_string();
        Some(&*panel)
    }

    pub fn set_language_filter(&mut self, login: &str, language: Option<&str>) -> Option<&UserPanel> {
        let panel = self.panels.get_mut(login)?;
        panel.filter.set_language(language);
        Some(&*panel)
    }
}
