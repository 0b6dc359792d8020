// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

mod args;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub use args::{LimitArgs, ListFilterArgs};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "stint")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "An offline-first activity session tracker")]
#[command(
    long_about = "An offline-first activity session tracker.\n\n\
    Time focused sessions with pause and resume, keep them safe across crashes, \
    and sync them to a remote store whenever the network allows."
)]
pub struct Cli {
    /// Log at info level (RUST_LOG overrides)
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "path")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the state directory and device identity
    Init {
        /// Remote sync base URL
        #[arg(long, value_parser = non_empty_string)]
        remote: Option<String>,

        /// Default activity mode for new sessions (flow, pomodoro)
        #[arg(long)]
        mode: Option<String>,
    },

    #[command(flatten)]
    Engine(EngineCommand),
}

/// Commands that run against an initialized state directory.
#[derive(Subcommand)]
pub enum EngineCommand {
    /// Start a new session
    Start {
        /// Activity mode (flow, pomodoro); defaults to the configured mode
        #[arg(long, short)]
        mode: Option<String>,
    },

    /// Pause the running session
    Pause,

    /// Resume the paused session
    Resume,

    /// Stop the open session
    Stop,

    /// Log an event marker on the open session
    Mark,

    /// Show the open session
    Status {
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// List sessions, newest first
    List {
        #[command(flatten)]
        filter: ListFilterArgs,

        #[command(flatten)]
        limits: LimitArgs,

        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Show a session with its pauses and annotations
    Show {
        /// Session ID (a unique prefix is enough)
        id: String,

        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Delete a stopped session and its annotations
    Delete {
        /// Session ID (a unique prefix is enough)
        id: String,
    },

    /// Attach a label to a session
    #[command(after_help = "\
Examples:
  stint annotate deep-work              Label the open session
  stint annotate 0192 review -n \"PR\"    Label a past session with a note")]
    Annotate {
        /// Label, optionally preceded by a session ID
        #[arg(required = true, num_args = 1..=2, value_name = "[ID] LABEL")]
        args: Vec<String>,

        /// Free-text note
        #[arg(long, short)]
        note: Option<String>,
    },

    /// Associate this device with a user and adopt ownerless records
    Login {
        /// User ID (defaults to STINT_USER)
        #[arg(value_parser = non_empty_string)]
        user_id: Option<String>,
    },

    /// Push pending records and pull from the remote now
    Sync {
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Show pending sync operations
    Queue {
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Show records that diverged from the remote
    Conflicts {
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Follow the open session, syncing in the background (Ctrl-C to exit)
    Watch,
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
