/*!
 * Teardown Tests
 * Windows and processes left behind by work that missed its deadline
 */

use deadline_guard::resources::backends::{InMemoryProcesses, InMemoryWindows, ProcessCall};
use deadline_guard::{DeadlineGuard, GuardConfig, Handle, MatchRule};
use pretty_assertions::assert_eq;
use std::thread::sleep;
use std::time::Duration;

const EXIT_TIMEOUT: Duration = Duration::from_secs(3);

fn guard(config: GuardConfig, windows: &InMemoryWindows, processes: &InMemoryProcesses) -> DeadlineGuard {
    DeadlineGuard::new(config.with_poll_interval(Duration::from_millis(10)))
        .with_window_system(windows.clone())
        .with_process_table(processes.clone())
}

#[test]
fn test_new_matching_window_closed_exactly_once() {
    let windows = InMemoryWindows::new();
    let processes = InMemoryProcesses::new();
    let g = guard(
        GuardConfig::detached("300ms").with_windows(MatchRule::patterns(["Test*"])),
        &windows,
        &processes,
    );

    let opener = windows.clone();
    let value = g
        .run(move || {
            opener.open(7u64, "TestWindow");
            sleep(Duration::from_secs(3));
            Ok::<_, String>(())
        })
        .unwrap();

    assert_eq!(value, None);
    assert_eq!(windows.close_calls(), vec![Handle(7)]);
    assert!(!windows.is_open(7u64));
}

#[test]
fn test_pre_existing_window_survives_new_only() {
    let windows = InMemoryWindows::new();
    windows.open(1u64, "TestOld");
    let processes = InMemoryProcesses::new();

    let g = guard(
        GuardConfig::detached("200ms").with_windows(MatchRule::patterns(["Test*"])),
        &windows,
        &processes,
    );

    let opener = windows.clone();
    let run = g
        .run_with_report(move || {
            opener.open(2u64, "TestNew");
            sleep(Duration::from_secs(2));
            Ok::<_, String>(())
        })
        .unwrap();

    assert!(run.report.expired());
    assert!(windows.is_open(1u64));
    assert!(!windows.is_open(2u64));
    assert_eq!(windows.close_calls(), vec![Handle(2)]);

    let teardown = run.report.teardown.unwrap();
    assert_eq!(teardown.targets.windows.into_iter().collect::<Vec<_>>(), vec![Handle(2)]);
    assert_eq!(teardown.windows.closed, 1);
}

#[test]
fn test_without_new_only_every_match_is_closed() {
    let windows = InMemoryWindows::new();
    windows.open(1u64, "TestOld");
    windows.open(3u64, "Editor");
    let processes = InMemoryProcesses::new();

    let g = guard(
        GuardConfig::detached("100ms")
            .with_windows(MatchRule::patterns(["test*"]))
            .with_new_only(false),
        &windows,
        &processes,
    );

    let opener = windows.clone();
    g.run(move || {
        opener.open(2u64, "TESTNEW");
        sleep(Duration::from_secs(2));
        Ok::<_, String>(())
    })
    .unwrap();

    assert_eq!(windows.close_calls(), vec![Handle(1), Handle(2)]);
    assert!(windows.is_open(3u64));
}

#[test]
fn test_unmatched_window_left_open() {
    let windows = InMemoryWindows::new();
    let processes = InMemoryProcesses::new();
    let g = guard(
        GuardConfig::detached("100ms").with_windows(MatchRule::patterns(["Report*"])),
        &windows,
        &processes,
    );

    let opener = windows.clone();
    g.run(move || {
        opener.open(4u64, "Scratch");
        sleep(Duration::from_secs(2));
        Ok::<_, String>(())
    })
    .unwrap();

    assert!(windows.close_calls().is_empty());
    assert!(windows.is_open(4u64));
}

#[test]
fn test_failed_baseline_leaves_domain_untouched() {
    let windows = InMemoryWindows::new();
    windows.fail_enumeration(true);
    let processes = InMemoryProcesses::new();

    let g = guard(
        GuardConfig::detached("100ms").with_windows(MatchRule::All),
        &windows,
        &processes,
    );

    let opener = windows.clone();
    let run = g
        .run_with_report(move || {
            opener.fail_enumeration(false);
            opener.open(5u64, "Anything");
            sleep(Duration::from_secs(2));
            Ok::<_, String>(())
        })
        .unwrap();

    assert!(run.report.expired());
    assert!(windows.is_open(5u64));
    assert!(windows.close_calls().is_empty());
}

#[test]
fn test_new_process_terminated_without_kill() {
    let windows = InMemoryWindows::new();
    let processes = InMemoryProcesses::new();
    processes.spawn(10u64, "shell", &["bash"]);

    let g = guard(
        GuardConfig::detached("100ms").with_processes(MatchRule::patterns(["render*"])),
        &windows,
        &processes,
    );

    let spawner = processes.clone();
    let run = g
        .run_with_report(move || {
            spawner.spawn(11u64, "render-worker", &["render-worker", "--frames", "300"]);
            sleep(Duration::from_secs(2));
            Ok::<_, String>(())
        })
        .unwrap();

    assert_eq!(
        processes.calls(),
        vec![
            ProcessCall::Terminate(Handle(11)),
            ProcessCall::Wait(Handle(11), EXIT_TIMEOUT),
        ]
    );
    assert!(!processes.is_alive(11u64));
    assert!(processes.is_alive(10u64));

    let teardown = run.report.teardown.unwrap();
    assert_eq!(teardown.processes.terminated, 1);
    assert_eq!(teardown.processes.killed, 0);
}

#[test]
fn test_stubborn_process_is_killed() {
    let windows = InMemoryWindows::new();
    let processes = InMemoryProcesses::new();

    let g = guard(
        GuardConfig::detached("100ms")
            .with_processes(MatchRule::All)
            .with_process_exit_timeout(Duration::from_millis(250)),
        &windows,
        &processes,
    );

    let spawner = processes.clone();
    g.run(move || {
        spawner.spawn_stubborn(20u64, "daemon", &["daemon", "--foreground"]);
        sleep(Duration::from_secs(2));
        Ok::<_, String>(())
    })
    .unwrap();

    assert_eq!(
        processes.calls(),
        vec![
            ProcessCall::Terminate(Handle(20)),
            ProcessCall::Wait(Handle(20), Duration::from_millis(250)),
            ProcessCall::Kill(Handle(20)),
        ]
    );
    assert!(!processes.is_alive(20u64));
}

#[test]
fn test_process_matched_by_command_line() {
    let windows = InMemoryWindows::new();
    let processes = InMemoryProcesses::new();

    let g = guard(
        GuardConfig::detached("100ms").with_processes(MatchRule::patterns(["*--headless*"])),
        &windows,
        &processes,
    );

    let spawner = processes.clone();
    g.run(move || {
        spawner.spawn(30u64, "chrome", &["chrome", "--headless", "--disable-gpu"]);
        spawner.spawn(31u64, "chrome", &["chrome"]);
        sleep(Duration::from_secs(2));
        Ok::<_, String>(())
    })
    .unwrap();

    assert!(!processes.is_alive(30u64));
    assert!(processes.is_alive(31u64));
}

#[test]
fn test_uninspectable_process_is_skipped() {
    let windows = InMemoryWindows::new();
    let processes = InMemoryProcesses::new();

    let g = guard(
        GuardConfig::detached("100ms").with_processes(MatchRule::All),
        &windows,
        &processes,
    );

    let spawner = processes.clone();
    g.run(move || {
        spawner.spawn(40u64, "locked", &["locked"]);
        spawner.deny_inspection(40u64);
        spawner.spawn(41u64, "open", &["open"]);
        sleep(Duration::from_secs(2));
        Ok::<_, String>(())
    })
    .unwrap();

    assert!(processes.is_alive(40u64));
    assert!(!processes.is_alive(41u64));
}

#[test]
fn test_domains_are_independent() {
    let windows = InMemoryWindows::new();
    let processes = InMemoryProcesses::new();

    let g = guard(
        GuardConfig::detached("100ms")
            .with_windows(MatchRule::patterns(["build*"]))
            .with_processes(MatchRule::patterns(["build*"])),
        &windows,
        &processes,
    );

    let (opener, spawner) = (windows.clone(), processes.clone());
    g.run(move || {
        opener.open(50u64, "build log");
        spawner.spawn(51u64, "build", &["build"]);
        sleep(Duration::from_secs(2));
        Ok::<_, String>(())
    })
    .unwrap();

    assert!(!windows.is_open(50u64));
    assert!(!processes.is_alive(51u64));
}
