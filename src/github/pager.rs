// src/github/pager.rs
// =============================================================================
// Fetches a user's complete repository list, one page at a time.
//
// GitHub returns at most `per_page` (max 100) repositories per request. We
// walk pages 1, 2, 3, ... and stop as soon as a page comes back empty or
// shorter than requested. A user with exactly 200 repos at per_page=100
// therefore costs three requests: 100, 100, and an empty third page.
//
// The loop is strictly sequential: each page is awaited before the next one
// is requested, and the first failing page fails the whole fetch. There is
// no retry here; the caller shows the error and lets the user retry.
//
// The page request itself lives behind the `RepoPageSource` trait so the
// loop can be tested without a network.
// =============================================================================

use async_trait::async_trait;
use tracing::debug;

use super::error::Result;
use super::models::Repository;

/// Page size used when the caller does not pick one (GitHub's maximum).
pub const DEFAULT_PER_PAGE: u32 = 100;

/// Anything that can return one page of a user's repositories.
#[async_trait]
pub trait RepoPageSource: Send + Sync {
    /// Returns page `page` (1-based) with at most `per_page` items.
    async fn fetch_repo_page(&self, username: &str, page: u32, per_page: u32)
        -> Result<Vec<Repository>>;
}

/// Fetches every repository of `username` by walking pages in order.
///
/// Returns the concatenation of all pages in the order GitHub returned them.
pub async fn fetch_all_repos<S>(source: &S, username: &str, per_page: u32) -> Result<Vec<Repository>>
where
    S: RepoPageSource + ?Sized,
{
    // per_page = 0 would make every page "short" after zero items
    let per_page = per_page.max(1);
    let mut page = 1;
    let mut all = Vec::new();

    loop {
        let items = source.fetch_repo_page(username, page, per_page).await?;
        let count = items.len();
        debug!(username, page, count, "fetched repository page");

        if count == 0 {
            break;
        }
        all.extend(items);

        if count < per_page as usize {
            break;
        }
        page += 1;
    }

    Ok(all)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::github::error::GithubError;
    use crate::github::models::Owner;
    use std::sync::Mutex;

    pub(crate) fn repo(owner: &str, name: &str, language: Option<&str>) -> Repository {
        Repository {
            id: name.len() as u64,
            name: name.to_string(),
            full_name: format!("{owner}/{name}"),
            html_url: format!("https://github.com/{owner}/{name}"),
            owner: Owner {
                login: owner.to_string(),
                html_url: format!("https://github.com/{owner}"),
                avatar_url: format!("https://avatars.example/{owner}"),
            },
            description: None,
            language: language.map(str::to_string),
            stargazers_count: 0,
            forks_count: 0,
            watchers_count: 0,
            created_at: None,
            updated_at: None,
            pushed_at: None,
            homepage: None,
            topics: Vec::new(),
            clone_url: format!("https://github.com/{owner}/{name}.git"),
            ssh_url: format!("git@github.com:{owner}/{name}.git"),
            default_branch: "main".to_string(),
            private: false,
        }
    }

    /// Serves `total` numbered repos and records every requested page.
    struct FakeSource {
        total: usize,
        fail_on_page: Option<u32>,
        requests: Mutex<Vec<u32>>,
    }

    impl FakeSource {
        fn new(total: usize) -> Self {
            FakeSource { total, fail_on_page: None, requests: Mutex::new(Vec::new()) }
        }

        fn requested_pages(&self) -> Vec<u32> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RepoPageSource for FakeSource {
        async fn fetch_repo_page(&self, username: &str, page: u32, per_page: u32) -> Result<Vec<Repository>> {
            self.requests.lock().unwrap().push(page);
            if self.fail_on_page == Some(page) {
                return Err(GithubError::Network("connection reset".to_string()));
            }
            let start = ((page - 1) * per_page) as usize;
            let end = (start + per_page as usize).min(self.total);
            Ok((start..end.max(start))
                .map(|i| repo(username, &format!("repo-{i}"), None))
                .collect())
        }
    }

    #[tokio::test]
    async fn test_short_last_page_stops() {
        let source = FakeSource::new(25);
        let repos = fetch_all_repos(&source, "alice", 10).await.unwrap();

        assert_eq!(repos.len(), 25);
        let names: Vec<_> = repos.iter().map(|r| r.name.clone()).collect();
        let expected: Vec<_> = (0..25).map(|i| format!("repo-{i}")).collect();
        assert_eq!(names, expected);
        assert_eq!(source.requested_pages(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_exact_multiple_issues_one_extra_request() {
        let source = FakeSource::new(20);
        let repos = fetch_all_repos(&source, "alice", 10).await.unwrap();

        assert_eq!(repos.len(), 20);
        assert_eq!(source.requested_pages(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_no_repos() {
        let source = FakeSource::new(0);
        let repos = fetch_all_repos(&source, "nobody", 100).await.unwrap();

        assert!(repos.is_empty());
        assert_eq!(source.requested_pages(), vec![1]);
    }

    #[tokio::test]
    async fn test_failed_page_fails_everything() {
        let mut source = FakeSource::new(30);
        source.fail_on_page = Some(2);
        let result = fetch_all_repos(&source, "alice", 10).await;

        assert!(matches!(result, Err(GithubError::Network(_))));
        // nothing after the failing page is requested
        assert_eq!(source.requested_pages(), vec![1, 2]);
    }
}
