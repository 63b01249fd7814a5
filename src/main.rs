// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging and load the config file
// 3. Dispatch to the appropriate subcommand handler
// 4. Exit with proper code (0 = success, 1 = nothing found, 2 = error)
//
// Rust concepts used:
// - async/await: GitHub requests and the speech device are asynchronous
// - Result<T, E>: For error handling (T = success type, E = error type)
// - match: Pattern matching to handle different subcommands
// - generics: handlers take any `GithubApi`, not only the real client
// =============================================================================

// Module declarations - tells Rust about our other source files
mod browse;        // src/browse/ - search session, filters, repo detail
mod capabilities;  // src/capabilities.rs - optional host features
mod cli;           // src/cli.rs - command-line parsing
mod clipboard;     // src/clipboard.rs - copying clone commands
mod config;        // src/config.rs - YAML config + build-time app info
mod format;        // src/format.rs - numbers and dates for display
mod github;        // src/github/ - GitHub REST API client
mod narrate;       // src/narrate.rs - interactive README narration
mod prompt;        // src/prompt.rs - interactive browse prompt
mod routes;        // src/routes.rs - "/" and "/repo/:username/:repo"
mod speech;        // src/speech/ - speech device and narration state machine
mod view;          // src/view.rs - terminal output

#[cfg(test)]
mod testing;       // in-memory GithubApi for tests

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use browse::{BrowseSession, CloneKind, RepoDetail, RepoFilter};
use cli::{Cli, Commands};
use config::AppConfig;
use github::{GithubApi, GithubClient};
use narrate::NarrateOptions;
use routes::Route;
use speech::{DeviceEvent, EspeakDevice, NarrationController, Prosody};

// How long `voices` waits for the synthesizer to list its voices
const VOICE_LIST_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // If an unexpected error occurred, print it and exit with code 2
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = success
//   Ok(1) = the user / repository / search result does not exist
//   Err   = unexpected error (exit code 2)
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    // Logs go to stderr so `--json` output stays clean. RUST_LOG wins over --verbose.
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load(cli.config.as_deref());
    debug!(app = %config.app.name, api = %config.github.api_base, "starting");

    let client = GithubClient::new(
        &config.github.api_base,
        config.github.token.as_deref(),
        config.github.timeout(),
    )
    .context("failed to set up the GitHub client")?;

    match cli.command {
        Commands::Search { query, limit, json } => {
            let limit = limit.unwrap_or(config.github.search_limit);
            handle_search(client, &config, &query, limit, json).await
        }
        Commands::User { login, filter, language, json } => {
            let filter = RepoFilter::new(&filter, language.as_deref());
            handle_user(&client, &config, &login, &filter, json).await
        }
        Commands::Repo { username, repo, copy, no_readme, json } => {
            handle_repo(&client, &username, &repo, copy, !no_readme, json).await
        }
        Commands::Narrate { username, repo, voice, rate, pitch, volume } => {
            let options = NarrateOptions { voice, rate, pitch, volume };
            handle_narrate(&client, &config, &username, &repo, options).await
        }
        Commands::Voices => handle_voices(&config).await,
        Commands::Browse { query, voice_input } => {
            let session = BrowseSession::new(client, config.github.search_limit, config.github.per_page);
            prompt::run(session, query, voice_input).await?;
            Ok(0)
        }
        Commands::Open { route } => match Route::parse(&route) {
            Route::Home => {
                let session = BrowseSession::new(client, config.github.search_limit, config.github.per_page);
                prompt::run(session, None, false).await?;
                Ok(0)
            }
            Route::Repo { username, repo } => handle_repo(&client, &username, &repo, None, true, false).await,
            Route::NotFound(path) => {
                eprintln!("⚠️  Nothing lives at '{path}'. Try \"/\" or \"/repo/<username>/<repo>\"");
                Ok(1)
            }
        },
    }
}

// Handles the 'search' subcommand
async fn handle_search<A: GithubApi>(
    api: A,
    config: &AppConfig,
    query: &str,
    limit: u32,
    json: bool,
) -> Result<i32> {
    let mut session = BrowseSession::new(api, limit, config.github.per_page);
    let panels = session
        .search(query)
        .await
        .with_context(|| format!("searching users for \"{}\"", query.trim()))?;

    if json {
        let users: Vec<_> = panels.iter().map(|p| &p.user).collect();
        view::print_json(&users)?;
    } else if panels.is_empty() {
        println!("No users found for \"{}\"", query.trim());
    } else {
        view::print_user_list(query.trim(), &panels);
    }

    Ok(if panels.is_empty() { 1 } else { 0 })
}

// Handles the 'user' subcommand: one expanded panel without the search
async fn handle_user<A: GithubApi>(
    api: &A,
    config: &AppConfig,
    login: &str,
    filter: &RepoFilter,
    json: bool,
) -> Result<i32> {
    let (profile, repos) = futures::join!(
        api.get_user(login),
        api.all_repos(login, config.github.per_page)
    );

    let profile = match profile {
        Ok(profile) => profile,
        Err(e) if e.is_not_found() => {
            eprintln!("User '{login}' not found");
            return Ok(1);
        }
        Err(e) => return Err(e.into()),
    };
    let repos = repos.with_context(|| format!("listing repositories of {login}"))?;
    let visible = filter.apply(&repos);

    if json {
        view::print_json(&view::UserReport { profile: &profile, repositories: visible.clone() })?;
    } else {
        view::print_profile(&profile);
        println!();
        let languages = browse::languages(&repos);
        if !languages.is_empty() {
            println!("Languages: {}", languages.join(", "));
        }
        view::print_repo_list(&visible);
    }

    // an empty list is a "nothing found" state, like an empty search
    Ok(if visible.is_empty() { 1 } else { 0 })
}

// Handles the 'repo' subcommand (and `open /repo/...`)
async fn handle_repo<A: GithubApi>(
    api: &A,
    username: &str,
    repo: &str,
    copy: Option<CloneKind>,
    show_readme: bool,
    json: bool,
) -> Result<i32> {
    let detail = match RepoDetail::load(api, username, repo).await {
        Ok(detail) => detail,
        Err(e) if e.is_not_found() => {
            eprintln!("Repository {username}/{repo} not found");
            return Ok(1);
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        view::print_json(&view::RepoReport::new(&detail))?;
    } else {
        view::print_repo_detail(&detail, show_readme);
    }

    if let Some(kind) = copy {
        let value = detail.clone_value(kind);
        if clipboard::copy(&value) {
            eprintln!("📋 Copied {} clone command", kind.label());
        } else {
            eprintln!("⚠️  Clipboard unavailable, copy it yourself: {value}");
        }
    }

    Ok(0)
}

// Handles the 'narrate' subcommand
async fn handle_narrate<A: GithubApi>(
    api: &A,
    config: &AppConfig,
    username: &str,
    repo: &str,
    options: NarrateOptions,
) -> Result<i32> {
    let detail = match RepoDetail::load(api, username, repo).await {
        Ok(detail) => detail,
        Err(e) if e.is_not_found() => {
            eprintln!("Repository {username}/{repo} not found");
            return Ok(1);
        }
        Err(e) => return Err(e.into()),
    };

    let Some(text) = detail.speech_text() else {
        println!("{username}/{repo} has no README to read");
        return Ok(1);
    };

    println!("🔊 {username}/{repo} README");
    narrate::run(&config.speech, text, options).await?;
    Ok(0)
}

// Handles the 'voices' subcommand
async fn handle_voices(config: &AppConfig) -> Result<i32> {
    if let Some(notice) = capabilities::check_synthesis(&config.speech.binary) {
        eprintln!("⚠️  {notice}");
        return Ok(1);
    }

    let (events_tx, mut events) = mpsc::unbounded_channel();
    let mut device = EspeakDevice::new(
        config.speech.binary.as_str(),
        config.speech.default_language.as_str(),
        events_tx,
    );
    let mut narrator = NarrationController::new(&mut device, String::new(), Prosody::default());

    // the voice list arrives asynchronously, wait for it
    let waited = tokio::time::timeout(VOICE_LIST_TIMEOUT, async {
        while let Some(event) = events.recv().await {
            let refreshed = matches!(event, DeviceEvent::VoicesChanged);
            narrator.handle_event(event);
            if refreshed {
                break;
            }
        }
    })
    .await;
    if waited.is_err() {
        debug!("voice list did not arrive in time");
    }

    view::print_voice_groups(narrator.voices(), narrator.selected_index());
    Ok(if narrator.voices().is_empty() { 1 } else { 0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeGithub;

    fn api() -> FakeGithub {
        FakeGithub::default()
            .with_user("alice", &[("alice-repo-1", Some("Rust")), ("site", Some("HTML"))])
            .with_user("alicia", &[])
    }

    #[tokio::test]
    async fn test_user_with_repositories_exits_zero() {
        let config = AppConfig::default();
        let filter = RepoFilter::default();
        assert_eq!(handle_user(&api(), &config, "alice", &filter, false).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_user_without_repositories_is_not_found() {
        let config = AppConfig::default();
        let filter = RepoFilter::default();
        assert_eq!(handle_user(&api(), &config, "alicia", &filter, true).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_filter_matching_nothing_is_not_found() {
        let config = AppConfig::default();
        let filter = RepoFilter::new("", Some("Go"));
        assert_eq!(handle_user(&api(), &config, "alice", &filter, false).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_search_without_hits_is_not_found() {
        let config = AppConfig::default();
        assert_eq!(handle_search(api(), &config, "zed", 5, false).await.unwrap(), 1);
        assert_eq!(handle_search(api(), &config, "ali", 5, false).await.unwrap(), 0);
    }
}
