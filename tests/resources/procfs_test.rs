/*!
 * Linux Process Table Tests
 * Real child processes under the /proc backend
 */

use deadline_guard::resources::backends::ProcProcessTable;
use deadline_guard::resources::{match_processes, Matcher};
use deadline_guard::{DeadlineGuard, GuardConfig, Handle, MatchRule};
use serial_test::serial;
use std::process::Command;
use std::time::{Duration, Instant};

#[test]
#[serial]
fn test_expired_command_is_torn_down() {
    let guard = DeadlineGuard::new(
        GuardConfig::joined("300ms")
            .with_processes(MatchRule::patterns(["sleep"]))
            .with_poll_interval(Duration::from_millis(20)),
    )
    .with_process_table(ProcProcessTable::new());

    let started = Instant::now();
    let run = guard
        .run_with_report(|| Command::new("sleep").arg("30").status())
        .unwrap();

    assert!(run.value.is_none());
    assert!(started.elapsed() < Duration::from_secs(10));

    let teardown = run.report.teardown.unwrap();
    assert_eq!(teardown.targets.processes.len(), 1);
    assert_eq!(teardown.processes.terminated + teardown.processes.killed, 1);
}

#[test]
#[serial]
fn test_child_matched_by_command_line() {
    let mut child = Command::new("sleep").arg("31").spawn().unwrap();
    let handle = Handle::from(child.id());

    let table = ProcProcessTable::new();
    let by_args = Matcher::compile(&MatchRule::patterns(["sleep 31"])).unwrap();
    let other = Matcher::compile(&MatchRule::patterns(["sleep 99"])).unwrap();

    assert!(match_processes(&table, &by_args).contains(&handle));
    assert!(!match_processes(&table, &other).contains(&handle));

    child.kill().unwrap();
    child.wait().unwrap();
}
