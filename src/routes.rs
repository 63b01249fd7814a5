// src/routes.rs
// =============================================================================
// The application has two pages, addressed the same way the web version of
// this tool addresses them:
//
//   /                        home: search users
//   /repo/:username/:repo    repository detail with README
//
// `open <route>` accepts either form, and also a plain GitHub repository URL
// ("https://github.com/owner/repo"), which maps onto the detail page.
// =============================================================================

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Repo { username: String, repo: String },
    NotFound(String),
}

impl Route {
    pub fn parse(input: &str) -> Route {
        let input = input.trim();

        if input.contains("github.com") {
            return match parse_github_url(input) {
                Some((username, repo)) => Route::Repo { username, repo },
                None => Route::NotFound(input.to_string()),
            };
        }

        // ignore query string / fragment, the app never reads them
        let path = input.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Home,
            ["repo", username, repo] => Route::Repo {
                username: username.to_string(),
                repo: repo.to_string(),
            },
            _ => Route::NotFound(input.to_string()),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => write!(f, "/"),
            Route::Repo { username, repo } => write!(f, "/repo/{username}/{repo}"),
            Route::NotFound(path) => write!(f, "{path}"),
        }
    }
}

// Parses a GitHub URL to extract owner and repository name
//
// Supported formats:
//   - https://github.com/owner/repo
//   - https://github.com/owner/repo.git
//   - github.com/owner/repo/tree/main (extra segments are ignored)
fn parse_github_url(url: &str) -> Option<(String, String)> {
    let path = url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.")
        .strip_prefix("github.com/")?;

    let mut parts = path.split('/').filter(|s| !s.is_empty());
    let owner = parts.next()?;
    let repo = parts.next()?;
    let repo = repo.trim_end_matches(".git");

    if repo.is_empty() {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}
