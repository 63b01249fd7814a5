// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// The subcommands mirror what the web version of this tool lets you do:
//   search   -> the search box on the home page
//   user     -> expanding one user's panel (profile + filtered repositories)
//   repo     -> the /repo/:username/:repo page
//   narrate  -> the speech bar at the bottom of the repo page
//   voices   -> the voice picker
//   browse   -> the whole home page as an interactive prompt
//   open     -> follow a route ("/" or "/repo/alice/alice-repo-1")
// =============================================================================

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::browse::CloneKind;

#[derive(Parser, Debug)]
#[command(
    name = "github-explorer",
    version,
    about = "Search GitHub users, browse their repositories and listen to READMEs",
    long_about = "github-explorer searches GitHub users, lists and filters their repositories, \
                  shows repository details with clone commands, and reads README files aloud."
)]
pub struct Cli {
    /// Path to a YAML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search GitHub users
    ///
    /// Example: github-explorer search ali
    Search {
        /// Free-text query (login, name, ...)
        query: String,

        /// Maximum number of users to show (defaults to the config value)
        #[arg(long)]
        limit: Option<u32>,

        /// Output results in JSON format instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show a user's profile and repositories
    ///
    /// Example: github-explorer user alice --language Rust
    User {
        login: String,

        /// Keep repositories whose name contains this (case-insensitive)
        #[arg(long, default_value = "")]
        filter: String,

        /// Keep repositories written in exactly this language
        #[arg(long)]
        language: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Show a repository with its README
    ///
    /// Example: github-explorer repo alice alice-repo-1 --copy ssh
    Repo {
        username: String,
        repo: String,

        /// Copy a clone command to the clipboard
        #[arg(long, value_enum)]
        copy: Option<CloneKind>,

        /// Skip printing the README
        #[arg(long)]
        no_readme: bool,

        #[arg(long)]
        json: bool,
    },

    /// Read a repository's README aloud (interactive)
    ///
    /// Example: github-explorer narrate alice alice-repo-1 --rate 1.2
    Narrate {
        username: String,
        repo: String,

        /// Voice number as listed by `voices`
        #[arg(long)]
        voice: Option<usize>,

        /// Speech rate, 0.5 to 2.0
        #[arg(long)]
        rate: Option<f32>,

        /// Speech pitch, 0.5 to 2.0
        #[arg(long)]
        pitch: Option<f32>,

        /// Speech volume, 0.0 to 1.0
        #[arg(long)]
        volume: Option<f32>,
    },

    /// List the voices available for narration
    Voices,

    /// Interactive search and browse prompt
    Browse {
        /// Start with this search
        query: Option<String>,

        /// Dictate queries instead of typing them
        #[arg(long)]
        voice_input: bool,
    },

    /// Open a route: "/" or "/repo/<username>/<repo>" (a github.com URL works too)
    Open { route: String },
}
