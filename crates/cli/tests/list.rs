// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;
use common::*;

fn finished_session(temp: &TempDir) -> String {
    let id = start_session(temp);
    stint(temp.path()).arg("stop").assert().success();
    id
}

#[test]
fn list_shows_newest_first() {
    let temp = init_temp();
    let first = finished_session(&temp);
    let second = finished_session(&temp);

    let out = stdout(&temp, &["list"]);
    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains(&second));
    assert!(lines[1].contains(&first));
    assert!(lines[0].contains("(pending)"));
}

#[test]
fn list_open_and_limit() {
    let temp = init_temp();
    finished_session(&temp);
    let open = start_session(&temp);

    let out = stdout(&temp, &["list", "--open"]);
    assert_eq!(out.lines().count(), 1);
    assert!(out.contains(&open));

    let out = stdout(&temp, &["list", "-n", "1", "-o", "json"]);
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 1);
}

#[test]
fn list_empty() {
    let temp = init_temp();
    stint(temp.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No sessions"));
}

#[test]
fn show_annotate_and_delete() {
    let temp = init_temp();
    let id = finished_session(&temp);

    stint(temp.path())
        .args(["annotate", &id, "review", "--note", "looked at PR"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Annotated"));

    stint(temp.path())
        .args(["show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("[stopped]"))
        .stdout(predicate::str::contains("review"))
        .stdout(predicate::str::contains("looked at PR"));

    stint(temp.path())
        .args(["delete", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted"));
    stint(temp.path())
        .args(["show", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("session not found"));

    stint(temp.path())
        .arg("queue")
        .assert()
        .success()
        .stdout(predicate::str::contains("delete session"));
}

#[test]
fn annotate_without_session_fails() {
    let temp = init_temp();
    stint(temp.path())
        .args(["annotate", "focus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no active session"));
}

#[test]
fn open_session_cannot_be_deleted() {
    let temp = init_temp();
    let id = start_session(&temp);
    stint(temp.path())
        .args(["delete", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot delete while running"));
}
