// src/browse/filter.rs
// =============================================================================
// Client-side repository filtering for an expanded user panel.
//
// Two optional criteria, both must hold:
// - name: case-insensitive substring of the repository name
// - language: exact match on the repository's primary language
//
// An empty name or an empty/None language means "no constraint".
// =============================================================================

use crate::github::Repository;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoFilter {
    pub name: String,
    pub language: Option<String>,
}

impl RepoFilter {
    pub fn new(name: &str, language: Option<&str>) -> Self {
        let mut filter = RepoFilter { name: name.to_string(), language: None };
        filter.set_language(language);
        filter
    }

    /// Selects a language; an empty string clears the selection.
    pub fn set_language(&mut self, language: Option<&str>) {
        self.language = language.filter(|l| !l.is_empty()).map(str::to_string);
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.language.is_none()
    }

    pub fn matches(&self, repo: &Repository) -> bool {
        let name_ok = repo.name.to_lowercase().contains(&self.name.to_lowercase());
        let language_ok = match &self.language {
            Some(language) => repo.language.as_deref() == Some(language.as_str()),
            None => true,
        };
        name_ok && language_ok
    }

    pub fn apply<'a>(&self, repos: &'a [Repository]) -> Vec<&'a Repository> {
        repos.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Distinct languages of `repos` in first-seen order, for the selector.
pub fn languages(repos: &[Repository]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for language in repos.iter().filter_map(|r| r.language.as_deref()) {
        if !language.is_empty() && !seen.contains(&language) {
            seen.push(language);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::test_repo;

    fn sample() -> Vec<Repository> {
        vec![
            test_repo("alice", "alice-repo-1", Some("Rust")),
            test_repo("alice", "Dotfiles", None),
            test_repo("alice", "web-App", Some("TypeScript")),
            test_repo("alice", "cli-tool", Some("Rust")),
        ]
    }

    fn names<'a>(repos: &[&'a Repository]) -> Vec<&'a str> {
        repos.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_empty_filter_returns_everything() {
        let repos = sample();
        assert_eq!(RepoFilter::default().apply(&repos).len(), 4);
        assert_eq!(RepoFilter::new("", Some("")).apply(&repos).len(), 4);
    }

    #[test]
    fn test_name_is_case_insensitive_substring() {
        let repos = sample();
        assert_eq!(names(&RepoFilter::new("APP", None).apply(&repos)), vec!["web-App"]);
        assert_eq!(names(&RepoFilter::new("dot", None).apply(&repos)), vec!["Dotfiles"]);
    }

    #[test]
    fn test_language_is_exact() {
        let repos = sample();
        assert_eq!(
            names(&RepoFilter::new("", Some("Rust")).apply(&repos)),
            vec!["alice-repo-1", "cli-tool"]
        );
        assert!(RepoFilter::new("", Some("rust")).apply(&repos).is_empty());
    }

    #[test]
    fn test_absent_language_gives_empty_list() {
        let repos = sample();
        assert!(RepoFilter::new("", Some("Haskell")).apply(&repos).is_empty());
    }

    #[test]
    fn test_both_criteria() {
        let repos = sample();
        assert_eq!(names(&RepoFilter::new("cli", Some("Rust")).apply(&repos)), vec!["cli-tool"]);
        assert!(RepoFilter::new("web", Some("Rust")).apply(&repos).is_empty());
    }

    #[test]
    fn test_languages_first_seen_order() {
        assert_eq!(languages(&sample()), vec!["Rust", "TypeScript"]);
    }
}
