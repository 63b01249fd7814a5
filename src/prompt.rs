// src/prompt.rs
// =============================================================================
// The home page as an interactive prompt.
//
// A search shows numbered users; `open 2` (or `open alice`) expands a panel
// with the profile and repositories, `open` again collapses it. Panels keep
// their own name / language filter. `repo <owner> <name>` jumps to the detail
// page, `retry` repeats the last command that failed.
// =============================================================================

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::browse::{BrowseSession, RepoDetail};
use crate::capabilities;
use crate::github::GithubApi;
use crate::routes::Route;
use crate::view;

#[derive(Debug, Clone, PartialEq)]
enum PromptCommand {
    Search(String),
    Refresh,
    List,
    Open(String),
    Refetch(String),
    Filter { key: String, name: String },
    Language { key: String, language: Option<String> },
    Repo { username: String, repo: String },
    Dictate,
    Retry,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<PromptCommand, String> {
    let line = line.trim();
    let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let mut words = rest.split_whitespace();

    let key = |usage: &str| -> Result<String, String> {
        rest.split_whitespace()
            .next()
            .map(str::to_string)
            .ok_or_else(|| format!("usage: {usage}"))
    };
    // everything after the panel key
    let tail = || {
        rest.split_once(char::is_whitespace)
            .map(|(_, tail)| tail.trim().to_string())
            .unwrap_or_default()
    };

    match command.to_lowercase().as_str() {
        "search" | "s" | "/" => Ok(PromptCommand::Search(rest.to_string())),
        "refresh" => Ok(PromptCommand::Refresh),
        "list" | "ls" | "" => Ok(PromptCommand::List),
        "open" | "o" => key("open <number|login>").map(PromptCommand::Open),
        "refetch" => key("refetch <number|login>").map(PromptCommand::Refetch),
        "filter" | "f" => Ok(PromptCommand::Filter {
            key: key("filter <number|login> [text]")?,
            name: tail(),
        }),
        "lang" | "language" => Ok(PromptCommand::Language {
            key: key("lang <number|login> [language]")?,
            language: Some(tail()).filter(|l| !l.is_empty()),
        }),
        "repo" | "r" => {
            let first = words.next();
            let second = words.next();
            match (first, second) {
                (Some(username), Some(repo)) => Ok(PromptCommand::Repo {
                    username: username.to_string(),
                    repo: repo.to_string(),
                }),
                (Some(route), None) => match Route::parse(route) {
                    Route::Repo { username, repo } => Ok(PromptCommand::Repo { username, repo }),
                    _ => Err(format!("no repository route matches '{route}'")),
                },
                _ => Err("usage: repo <owner> <name>".to_string()),
            }
        }
        "dictate" | "mic" => Ok(PromptCommand::Dictate),
        "retry" => Ok(PromptCommand::Retry),
        "h" | "help" | "?" => Ok(PromptCommand::Help),
        "q" | "quit" | "exit" => Ok(PromptCommand::Quit),
        other => Err(format!("unknown command '{other}', type 'help'")),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  search <query>          find users");
    println!("  refresh                 repeat the search against GitHub");
    println!("  list                    show the current results");
    println!("  open <n|login>          expand or collapse a user");
    println!("  refetch <n|login>       reload a user's profile and repositories");
    println!("  filter <n|login> [txt]  filter repositories by name");
    println!("  lang <n|login> [lang]   filter repositories by language");
    println!("  repo <owner> <name>     show a repository");
    println!("  retry                   repeat the last failed command");
    println!("  q                       quit");
}

enum Outcome {
    Done,
    Failed,
    Quit,
}

async fn execute<A: GithubApi>(session: &mut BrowseSession<A>, command: PromptCommand) -> Outcome {
    match command {
        PromptCommand::Search(query) => {
            if query.trim().is_empty() {
                println!("Type a query after 'search'");
                return Outcome::Done;
            }
            println!("Searching...");
            match session.search(&query).await {
                Ok(panels) if panels.is_empty() => println!("No users found for \"{}\"", query.trim()),
                Ok(panels) => view::print_user_list(query.trim(), &panels),
                Err(e) => {
                    println!("Error: {e} (type 'retry' to try again)");
                    return Outcome::Failed;
                }
            }
        }
        PromptCommand::Refresh => {
            if let Err(e) = session.refresh_search().await {
                println!("Error: {e} (type 'retry' to try again)");
                return Outcome::Failed;
            }
            view::print_user_list(session.query(), &session.results());
        }
        PromptCommand::List => {
            if session.query().is_empty() {
                println!("No search yet, type 'search <query>'");
            } else {
                view::print_user_list(session.query(), &session.results());
            }
        }
        PromptCommand::Open(key) => {
            let Some(login) = session.resolve(&key) else {
                println!("No user '{key}' in the results");
                return Outcome::Done;
            };
            match session.toggle(&login).await {
                Some(panel) if panel.open => {
                    view::print_panel(panel);
                    // retrying `open` would collapse the panel, point at refetch instead
                    if !panel.profile.is_loaded() || !panel.repos.is_loaded() {
                        println!("(type 'refetch {key}' to try again)");
                    }
                }
                Some(panel) => println!("▸ {} collapsed", panel.user.login),
                None => println!("No user '{key}' in the results"),
            }
        }
        PromptCommand::Refetch(key) => {
            let Some(login) = session.resolve(&key) else {
                println!("No user '{key}' in the results");
                return Outcome::Done;
            };
            if let Some(panel) = session.refetch(&login).await {
                view::print_panel(panel);
                if !panel.profile.is_loaded() || !panel.repos.is_loaded() {
                    return Outcome::Failed;
                }
            }
        }
        PromptCommand::Filter { key, name } => match session.resolve(&key) {
            Some(login) => {
                if let Some(panel) = session.set_name_filter(&login, &name) {
                    view::print_panel(panel);
                }
            }
            None => println!("No user '{key}' in the results"),
        },
        PromptCommand::Language { key, language } => match session.resolve(&key) {
            Some(login) => {
                if let Some(panel) = session.set_language_filter(&login, language.as_deref()) {
                    view::print_panel(panel);
                }
            }
            None => println!("No user '{key}' in the results"),
        },
        PromptCommand::Repo { username, repo } => {
            println!("Loading {username}/{repo}...");
            match RepoDetail::load(session.api(), &username, &repo).await {
                Ok(detail) => view::print_repo_detail(&detail, true),
                Err(e) if e.is_not_found() => println!("Repository {username}/{repo} not found"),
                Err(e) => {
                    println!("Error: {e} (type 'retry' to try again)");
                    return Outcome::Failed;
                }
            }
        }
        PromptCommand::Dictate => {
            if let Some(notice) = capabilities::check_recognition() {
                println!("⚠️  {notice}");
            }
        }
        PromptCommand::Help => print_help(),
        // handled by the loop
        PromptCommand::Retry => {}
        PromptCommand::Quit => return Outcome::Quit,
    }
    Outcome::Done
}

/// Runs the prompt until `quit` or end of input.
pub async fn run<A: GithubApi>(mut session: BrowseSession<A>, initial_query: Option<String>, voice_input: bool) -> Result<()> {
    if voice_input {
        if let Some(notice) = capabilities::check_recognition() {
            println!("⚠️  {notice}");
        }
    }

    print_help();
    let mut last_failed: Option<PromptCommand> = None;

    if let Some(query) = initial_query {
        let command = PromptCommand::Search(query);
        if let Outcome::Failed = execute(&mut session, command.clone()).await {
            last_failed = Some(command);
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::Write::flush(&mut std::io::stdout())?;

        let Some(line) = lines.next_line().await? else { break };
        let command = match parse_command(&line) {
            Ok(PromptCommand::Retry) => match last_failed.take() {
                Some(command) => command,
                None => {
                    println!("Nothing to retry");
                    continue;
                }
            },
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        match execute(&mut session, command.clone()).await {
            Outcome::Quit => break,
            Outcome::Failed => last_failed = Some(command),
            Outcome::Done => last_failed = None,
        }
    }

    Ok(())
}
