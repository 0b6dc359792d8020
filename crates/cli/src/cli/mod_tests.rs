// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use yare::parameterized;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(args)
}

#[test]
fn start_accepts_mode() {
    let cli = parse(&["stint", "start", "--mode", "pomodoro"]).unwrap();
    assert!(matches!(
        cli.command,
        Command::Engine(EngineCommand::Start { mode: Some(ref m) }) if m == "pomodoro"
    ));

    let cli = parse(&["stint", "start"]).unwrap();
    assert!(matches!(
        cli.command,
        Command::Engine(EngineCommand::Start { mode: None })
    ));
}

#[parameterized(
    pause = { "pause" },
    resume = { "resume" },
    stop = { "stop" },
    mark = { "mark" },
    watch = { "watch" },
)]
fn bare_commands_parse(name: &str) {
    assert!(parse(&["stint", name]).is_ok());
}

#[test]
fn list_filters_and_limit() {
    let cli = parse(&["stint", "list", "--open", "--pending", "-n", "5", "-o", "json"]).unwrap();
    let Command::Engine(EngineCommand::List {
        filter,
        limits,
        output,
    }) = cli.command
    else {
        unreachable!("parsed as list")
    };
    assert!(filter.open);
    assert!(filter.pending);
    assert!(!filter.conflict);
    assert_eq!(limits.limit, Some(5));
    assert_eq!(output, OutputFormat::Json);
}

#[test]
fn list_rejects_pending_with_conflict() {
    assert!(parse(&["stint", "list", "--pending", "--conflict"]).is_err());
}

#[test]
fn limit_conflicts_with_no_limit() {
    assert!(parse(&["stint", "list", "-n", "3", "--no-limit"]).is_err());
}

#[test]
fn annotate_takes_optional_id() {
    let cli = parse(&["stint", "annotate", "focus"]).unwrap();
    assert!(matches!(
        cli.command,
        Command::Engine(EngineCommand::Annotate { ref args, note: None }) if args == &["focus"]
    ));

    let cli = parse(&["stint", "annotate", "0192", "review", "--note", "PR 12"]).unwrap();
    assert!(matches!(
        cli.command,
        Command::Engine(EngineCommand::Annotate { ref args, note: Some(ref n) }) if args == &["0192", "review"] && n == "PR 12"
    ));
}

#[test]
fn annotate_rejects_extra_arguments() {
    assert!(parse(&["stint", "annotate", "a", "b", "c"]).is_err());
    assert!(parse(&["stint", "annotate"]).is_err());
}

#[test]
fn login_rejects_blank_user() {
    assert!(parse(&["stint", "login", "  "]).is_err());
    assert!(parse(&["stint", "login"]).is_ok());
}

#[test]
fn global_flags_work_after_subcommand() {
    let cli = parse(&["stint", "status", "--verbose", "--log-file", "/tmp/x.log"]).unwrap();
    assert!(cli.verbose);
    assert_eq!(cli.log_file.as_deref(), Some(std::path::Path::new("/tmp/x.log")));
}

#[test]
fn unknown_output_format_is_rejected() {
    assert!(parse(&["stint", "status", "-o", "yaml"]).is_err());
}
