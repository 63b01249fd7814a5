// src/view.rs
// =============================================================================
// Terminal rendering of users, repositories and the repo detail page.
//
// Every function here only prints; fetching happens in `browse`. JSON output
// goes through serde_json so `--json` can be piped into other tools.
// =============================================================================

use anyhow::Result;
use serde::Serialize;

use crate::browse::{topic_url, CloneOption, LoadState, RepoDetail, UserPanel};
use crate::format::{blog_url, group_number, long_date, num_short};
use crate::github::{Repository, User};
use crate::speech::{group_voices, option_label, Voice};

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Search hits, numbered so the browse prompt can refer to them.
pub fn print_user_list(query: &str, panels: &[&UserPanel]) {
    println!("Showing users for \"{query}\"");
    for (i, panel) in panels.iter().enumerate() {
        let marker = if panel.open { "▾" } else { "▸" };
        println!("  {marker} {:>2}. {}", i + 1, panel.user.login);
    }
}

pub fn print_profile(user: &User) {
    println!("{} (@{})", user.display_name(), user.login);
    println!("   {}", user.html_url);

    if let Some(bio) = user.bio.as_deref().filter(|b| !b.is_empty()) {
        println!("   {bio}");
    }
    if let Some(followers) = user.followers {
        println!(
            "   👥 {} followers ~ {} following",
            num_short(followers),
            num_short(user.following.unwrap_or(0))
        );
    }
    if let Some(location) = user.location.as_deref().filter(|l| !l.is_empty()) {
        println!("   📍 {location}");
    }
    if let Some(email) = user.email.as_deref().filter(|e| !e.is_empty()) {
        println!("   ✉️  {email}");
    }
    if let Some(blog) = user.blog.as_deref().filter(|b| !b.is_empty()) {
        println!("   🔗 {}", blog_url(blog));
    }
    if let Some(twitter) = user.twitter_username.as_deref().filter(|t| !t.is_empty()) {
        println!("   https://twitter.com/{twitter}");
    }
}

/// An expanded panel: profile on top, filtered repositories below.
pub fn print_panel(panel: &UserPanel) {
    println!();
    match &panel.profile {
        LoadState::Loaded(user) => print_profile(user),
        LoadState::Failed(message) => {
            print_profile(&panel.user);
            println!("   Error: {message}");
        }
        LoadState::NotLoaded => print_profile(&panel.user),
    }
    println!();

    match &panel.repos {
        LoadState::Loaded(_) => {
            let languages = panel.languages();
            if !languages.is_empty() {
                println!("Languages: {}", languages.join(", "));
            }
            if !panel.filter.is_empty() {
                println!(
                    "Filter: name contains \"{}\", language {}",
                    panel.filter.name,
                    panel.filter.language.as_deref().unwrap_or("any")
                );
            }
            print_repo_list(&panel.visible_repos().unwrap_or_default());
        }
        LoadState::Failed(message) => println!("Error: {message}"),
        LoadState::NotLoaded => println!("Loading repositories..."),
    }
}

pub fn print_repo_list(repos: &[&Repository]) {
    if repos.is_empty() {
        println!("No repositories found.");
        return;
    }

    for repo in repos {
        let stars = if repo.stargazers_count > 0 {
            format!("⭐ {}", num_short(repo.stargazers_count))
        } else {
            String::new()
        };
        println!("{:<50} {:>10}", repo.name, stars);
        println!(
            "    {}",
            repo.description.as_deref().unwrap_or("No description provided")
        );
        println!("    /repo/{}/{}", repo.owner.login, repo.name);
    }
    println!();
    println!("📋 {} repositories", repos.len());
}

pub fn print_repo_detail(detail: &RepoDetail, show_readme: bool) {
    let repo = &detail.repo;
    println!("{} / {}  [{}]", repo.owner.login, repo.name, detail.visibility());
    println!("{}", repo.html_url);

    let dates = [
        ("Created at", &repo.created_at),
        ("Updated at", &repo.updated_at),
        ("Pushed at", &repo.pushed_at),
    ];
    let dates: Vec<String> = dates
        .iter()
        .filter_map(|(label, date)| date.as_deref().map(|d| format!("{label}: {}", long_date(d))))
        .collect();
    if !dates.is_empty() {
        println!("{}", dates.join("  |  "));
    }
    println!();

    let counters = [
        ("👁️  Watch", repo.watchers_count, detail.watchers_url()),
        ("🍴 Fork", repo.forks_count, detail.forks_url()),
        ("⭐ Starred", repo.stargazers_count, detail.stargazers_url()),
    ];
    for (label, count, url) in counters {
        println!("{label:<12} {:>8}  ({} total)  {url}", num_short(count), group_number(count));
    }
    println!();

    println!("Clone");
    for option in detail.clone_options() {
        println!("  {:<11} {}", option.label, option.value);
    }
    println!("  Download ZIP {}", detail.download_zip_url());
    println!("{}", "=".repeat(80));

    if let Some(description) = repo.description.as_deref().filter(|d| !d.is_empty()) {
        println!("{description}");
    }
    if let Some(homepage) = repo.homepage.as_deref().filter(|h| !h.is_empty()) {
        println!("🔗 {homepage}");
    }
    if !repo.topics.is_empty() {
        let topics: Vec<String> = repo
            .topics
            .iter()
            .map(|t| format!("{t} ({})", topic_url(t)))
            .collect();
        println!("Topics: {}", topics.join(", "));
    }

    if show_readme {
        println!();
        match &detail.readme {
            Some(markdown) => println!("{markdown}"),
            None => println!("(no README)"),
        }
    }
}

/// Voices grouped by language, numbered by their index in `voices`.
pub fn print_voice_groups(voices: &[Voice], selected: Option<usize>) {
    if voices.is_empty() {
        println!("No voices loaded yet, the synthesizer default will be used.");
        return;
    }
    for group in group_voices(voices) {
        println!("{}", group.lang);
        for (index, voice) in group.voices {
            let marker = if Some(index) == selected { "*" } else { " " };
            println!("  {marker} {index:>3}  {}", option_label(voice));
        }
    }
}

#[derive(Serialize)]
pub struct UserReport<'a> {
    pub profile: &'a User,
    pub repositories: Vec<&'a Repository>,
}

#[derive(Serialize)]
pub struct RepoReport<'a> {
    pub repository: &'a Repository,
    pub clone: Vec<CloneOption>,
    pub download_zip: String,
    pub readme: Option<&'a str>,
}

impl<'a> RepoReport<'a> {
    pub fn new(detail: &'a RepoDetail) -> Self {
        RepoReport {
            repository: &detail.repo,
            clone: detail.clone_options(),
            download_zip: detail.download_zip_url(),
            readme: detail.readme.as_deref(),
        }
    }
}
