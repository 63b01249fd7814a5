// src/browse/detail.rs
// =============================================================================
// Repository detail page: metadata + README.
//
// The metadata and the README are separate requests and load together. A
// failing metadata request is the page's error (the user can retry); a
// missing or broken README just means the page has no README section.
// =============================================================================

use serde::Serialize;
use tracing::debug;

use crate::github::readme::{decode_content, markdown_to_speech_text};
use crate::github::{GithubApi, GithubError, Repository};

const GITHUB_WEB: &str = "https://github.com/";

/// The three ways the "Code" menu offers to clone a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CloneKind {
    Https,
    Ssh,
    #[value(name = "gh")]
    GithubCli,
}

impl CloneKind {
    pub const ALL: [CloneKind; 3] = [CloneKind::Https, CloneKind::Ssh, CloneKind::GithubCli];

    pub fn label(&self) -> &'static str {
        match self {
            CloneKind::Https => "HTTPS",
            CloneKind::Ssh => "SSH",
            CloneKind::GithubCli => "GitHub CLI",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloneOption {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct RepoDetail {
    pub repo: Repository,
    /// Decoded README markdown, when the repository has one
    pub readme: Option<String>,
}

impl RepoDetail {
    pub async fn load<A>(api: &A, owner: &str, name: &str) -> Result<Self, GithubError>
    where
        A: GithubApi + ?Sized,
    {
        let (repo, readme) = futures::join!(api.get_repo(owner, name), api.get_readme(owner, name));
        let repo = repo?;

        let readme = match readme {
            Ok(readme) => match decode_content(&readme) {
                Ok(markdown) => Some(markdown),
                Err(e) => {
                    debug!("README of {owner}/{name} not decodable: {e}");
                    None
                }
            },
            Err(e) => {
                debug!("no README for {owner}/{name}: {e}");
                None
            }
        };

        Ok(RepoDetail { repo, readme })
    }

    pub fn visibility(&self) -> &'static str {
        if self.repo.private {
            "Private"
        } else {
            "Public"
        }
    }

    fn web_url(&self, suffix: &str) -> String {
        format!("{GITHUB_WEB}{}/{}/{suffix}", self.repo.owner.login, self.repo.name)
    }

    pub fn watchers_url(&self) -> String {
        self.web_url("watchers")
    }

    pub fn forks_url(&self) -> String {
        self.web_url("forks")
    }

    pub fn stargazers_url(&self) -> String {
        self.web_url("stargazers")
    }

    pub fn download_zip_url(&self) -> String {
        self.web_url(&format!("archive/refs/heads/{}.zip", self.repo.default_branch))
    }

    pub fn clone_value(&self, kind: CloneKind) -> String {
        match kind {
            CloneKind::Https => self.repo.clone_url.clone(),
            CloneKind::Ssh => self.repo.ssh_url.clone(),
            CloneKind::GithubCli => format!("gh repo clone {}", self.repo.full_name),
        }
    }

    pub fn clone_options(&self) -> Vec<CloneOption> {
        CloneKind::ALL
            .iter()
            .map(|kind| CloneOption { label: kind.label(), value: self.clone_value(*kind) })
            .collect()
    }

    /// README as plain text for narration; None without a README or when
    /// the README has nothing readable.
    pub fn speech_text(&self) -> Option<String> {
        self.readme
            .as_deref()
            .map(markdown_to_speech_text)
            .filter(|text| !text.is_empty())
    }
}

pub fn topic_url(topic: &str) -> String {
    format!("{GITHUB_WEB}topics/{topic}")
}
