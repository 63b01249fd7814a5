// src/github/mod.rs
// =============================================================================
// This module talks to the GitHub REST API.
//
// Submodules:
// - client: reqwest client + the `GithubApi` trait the app depends on
// - pager: walks the paginated repository list of a user
// - models: serde types for users, repositories and READMEs
// - readme: base64 decoding and README → plain text for narration
// - error: typed errors so "not found" and "network down" stay distinct
// =============================================================================

mod client;
mod error;
mod models;
mod pager;
pub mod readme;

pub use client::{GithubApi, GithubClient, DEFAULT_API_BASE};
pub use error::GithubError;
pub use models::{Repository, User};
pub use pager::DEFAULT_PER_PAGE;

#[cfg(test)]
pub(crate) use models::Readme;
#[cfg(test)]
pub(crate) use pager::{tests::repo as test_repo, RepoPageSource};
