/*!
 * Async Supervisor Tests
 */

use deadline_guard::resources::backends::{InMemoryProcesses, InMemoryWindows};
use deadline_guard::{DeadlineGuard, GuardConfig, Handle, MatchRule, RunOutcome};
use std::thread::sleep;
use std::time::Duration;

fn guard(config: GuardConfig, windows: &InMemoryWindows) -> DeadlineGuard {
    DeadlineGuard::new(config.with_poll_interval(Duration::from_millis(10)))
        .with_window_system(windows.clone())
        .with_process_table(InMemoryProcesses::new())
}

#[tokio::test]
async fn test_async_fast_work() {
    let windows = InMemoryWindows::new();
    let g = guard(GuardConfig::detached("5s"), &windows);

    let value = g.run_async(|| Ok::<_, String>(11)).await.unwrap();
    assert_eq!(value, Some(11));
}

#[tokio::test]
async fn test_async_expiry_closes_new_window() {
    let windows = InMemoryWindows::new();
    let g = guard(
        GuardConfig::detached("200ms").with_windows(MatchRule::patterns(["Test*"])),
        &windows,
    );

    let opener = windows.clone();
    let run = g
        .run_with_report_async(move || {
            opener.open(9u64, "TestWindow");
            sleep(Duration::from_secs(2));
            Ok::<_, String>(())
        })
        .await
        .unwrap();

    assert_eq!(run.value, None);
    assert_eq!(run.report.outcome, RunOutcome::Expired);
    assert_eq!(windows.close_calls(), vec![Handle(9)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_error_and_join() {
    let windows = InMemoryWindows::new();
    let g = guard(GuardConfig::joined("50ms"), &windows);

    let err = g
        .run_async(|| {
            sleep(Duration::from_millis(300));
            Err::<(), _>("late".to_string())
        })
        .await
        .unwrap_err();

    assert_eq!(err.into_work(), Some("late".to_string()));
}

#[tokio::test]
async fn test_runtime_keeps_ticking_while_guarded() {
    let windows = InMemoryWindows::new();
    let g = guard(GuardConfig::detached("300ms"), &windows);

    let ticker = tokio::spawn(async {
        let mut ticks = 0u32;
        for _ in 0..5 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            ticks += 1;
        }
        ticks
    });

    let value = g
        .run_async(|| {
            sleep(Duration::from_secs(2));
            Ok::<_, String>(())
        })
        .await
        .unwrap();

    assert_eq!(value, None);
    assert_eq!(ticker.await.unwrap(), 5);
}
