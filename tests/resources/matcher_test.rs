/*!
 * Matcher Tests
 * Glob translation and per-domain matching
 */

use deadline_guard::resources::backends::{InMemoryProcesses, InMemoryWindows};
use deadline_guard::resources::{
    diff, glob_to_regex, match_processes, match_windows, GlobPattern, Matcher, Snapshot,
};
use deadline_guard::{Handle, MatchRule};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn set(raw: &[u64]) -> BTreeSet<Handle> {
    raw.iter().copied().map(Handle).collect()
}

#[test]
fn test_diff_keeps_only_new_handles() {
    assert_eq!(diff(&set(&[1, 2]), &set(&[1, 2, 3])), set(&[3]));
    assert_eq!(diff(&set(&[1, 2, 3]), &set(&[2])), set(&[]));
}

#[test]
fn test_glob_translation() {
    assert_eq!(glob_to_regex("Test*"), "Test.*");
    assert_eq!(glob_to_regex("a?c"), "a.c");
    assert_eq!(glob_to_regex("v1.2 (beta)"), r"v1\.2 \(beta\)");
}

#[test]
fn test_glob_is_case_insensitive_and_unanchored() {
    let p = GlobPattern::compile("test*").unwrap();
    assert!(p.is_match("TestWindow"));
    assert!(p.is_match("My TEST window"));
    assert!(!p.is_match("Tset"));
    assert_eq!(p.as_str(), "test*");
}

#[test]
fn test_regex_metacharacters_are_literal() {
    let p = GlobPattern::compile("[draft]").unwrap();
    assert!(p.is_match("Report [draft]"));
    assert!(!p.is_match("d"));
}

#[test]
fn test_empty_pattern_list_is_skip() {
    let m = Matcher::compile(&MatchRule::Patterns(vec![])).unwrap();
    assert!(!m.is_enabled());
    assert!(!m.matches(["anything"]));
}

#[test]
fn test_skip_never_enumerates() {
    let windows = InMemoryWindows::new();
    windows.open(1u64, "TestWindow");

    assert!(match_windows(&windows, &Matcher::Skip).is_empty());
    assert_eq!(windows.enumerations(), 0);
}

#[test]
fn test_match_windows_by_title() {
    let windows = InMemoryWindows::new();
    windows.open(1u64, "TestWindow");
    windows.open(2u64, "Terminal");
    windows.open(3u64, "Another Test");

    let m = Matcher::compile(&MatchRule::patterns(["Test*"])).unwrap();
    assert_eq!(match_windows(&windows, &m), set(&[1, 3]));
    assert_eq!(match_windows(&windows, &Matcher::All), set(&[1, 2, 3]));
}

#[test]
fn test_enumeration_failure_yields_nothing() {
    let windows = InMemoryWindows::new();
    windows.open(1u64, "TestWindow");
    windows.fail_enumeration(true);

    assert!(match_windows(&windows, &Matcher::All).is_empty());
}

#[test]
fn test_match_processes_by_name_or_cmdline() {
    let processes = InMemoryProcesses::new();
    processes.spawn(10u64, "python3", &["python3", "render.py"]);
    processes.spawn(11u64, "python3", &["python3", "serve.py"]);
    processes.spawn(12u64, "renderd", &["renderd"]);

    let m = Matcher::compile(&MatchRule::patterns(["*render*"])).unwrap();
    assert_eq!(match_processes(&processes, &m), set(&[10, 12]));
}

#[test]
fn test_snapshot_of_both_domains() {
    let windows = InMemoryWindows::new();
    windows.open(4u64, "a");
    let processes = InMemoryProcesses::new();
    processes.spawn(5u64, "b", &["b"]);

    let w = Snapshot::windows(&windows).unwrap();
    let p = Snapshot::processes(&processes).unwrap();
    assert!(w.contains(Handle(4)));
    assert!(p.contains(Handle(5)));
    assert_eq!(w.len() + p.len(), 2);
}

proptest! {
    #[test]
    fn prop_literal_text_matches_itself(text in "[ -~]{1,40}") {
        let escaped: String = text.chars().filter(|c| *c != '*' && *c != '?').collect();
        prop_assume!(!escaped.is_empty());
        let p = GlobPattern::compile(&escaped).unwrap();
        prop_assert!(p.is_match(&escaped));
    }

    #[test]
    fn prop_star_suffix_matches_any_extension(prefix in "[a-z]{1,10}", tail in "[ -~]{0,20}") {
        let p = GlobPattern::compile(&format!("{}*", prefix)).unwrap();
        let label = format!("{}{}", prefix, tail);
        prop_assert!(p.is_match(&label));
    }

    #[test]
    fn prop_diff_is_disjoint_from_pre(pre in proptest::collection::btree_set(0u64..50, 0..20),
                                     post in proptest::collection::btree_set(0u64..50, 0..20)) {
        let pre: BTreeSet<Handle> = pre.into_iter().map(Handle).collect();
        let post: BTreeSet<Handle> = post.into_iter().map(Handle).collect();
        let new = diff(&pre, &post);
        prop_assert!(new.is_subset(&post));
        prop_assert!(new.is_disjoint(&pre));
    }
}
