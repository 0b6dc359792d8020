// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

use super::*;

#[test]
fn new_ids_are_valid_and_unique() {
    let a = new_id();
    let b = new_id();
    assert!(is_valid_id(&a));
    assert!(is_valid_id(&b));
    assert_ne!(a, b);
}

#[test]
fn ids_sort_by_creation() {
    let first = new_id();
    std::thread::sleep(std::time::Duration::from_millis(2));
    let second = new_id();
    assert!(first < second);
}

#[test]
fn garbage_is_not_an_id() {
    assert!(!is_valid_id("not-a-uuid"));
    assert!(!is_valid_id(""));
}

#[test]
fn resolve_prefix_prefers_exact_match() {
    let ids = ["abc", "abcd"];
    assert_eq!(resolve_prefix("abc", ids), Some("abc".to_string()));
}

#[test]
fn resolve_prefix_requires_unique_match() {
    let ids = ["0190aa", "0190ab", "0291cc"];
    assert_eq!(resolve_prefix("0291", ids), Some("0291cc".to_string()));
    assert_eq!(resolve_prefix("0190", ids), None);
    assert_eq!(resolve_prefix("ff", ids), None);
}
