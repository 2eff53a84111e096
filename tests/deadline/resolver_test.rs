/*!
 * Resolver Tests
 * Branch selection and arithmetic against the real clock and calendar
 */

use deadline_guard::deadline::{Branch, Deadline, DeadlineResolver, DeadlineSpec, FixedClock};
use deadline_guard::{resolve, DeadlineError};
use pretty_assertions::assert_eq;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const NOW: i64 = 1_700_000_000_000;

fn fixed() -> DeadlineResolver {
    DeadlineResolver::new().with_clock(FixedClock::at_epoch_millis(NOW))
}

#[test]
fn test_unit_duration_is_close_to_now() {
    let before = Deadline::now();
    let deadline = resolve("2s").unwrap();
    let offset = deadline.epoch_millis() - before.epoch_millis();
    assert!((1_900..=2_100).contains(&offset), "offset was {}ms", offset);
}

#[test]
fn test_every_unit_family() {
    let cases = [
        ("250ms", 250),
        ("3 sec", 3_000),
        ("2 minutes", 120_000),
        ("1 hr", 3_600_000),
        ("2d", 172_800_000),
        ("1 week", 604_800_000),
    ];

    for (spec, offset) in cases {
        let d = fixed().resolve(&spec.into()).unwrap();
        assert_eq!(d.epoch_millis(), NOW + offset, "spec {:?}", spec);
    }
}

#[test]
fn test_numeric_forms_are_exact() {
    assert_eq!(fixed().resolve(&1_700_000_500i64.into()).unwrap().epoch_millis(), 1_700_000_500_000);
    assert_eq!(fixed().resolve(&1_700_000_500.75f64.into()).unwrap().epoch_millis(), 1_700_000_500_750);
    assert_eq!(fixed().resolve(&"1700000500".into()).unwrap().epoch_millis(), 1_700_000_500_000);
}

#[test]
fn test_system_time_is_absolute() {
    let at = UNIX_EPOCH + Duration::from_millis(1_800_000_000_123);
    let r = fixed().resolve_detailed(&DeadlineSpec::from(at)).unwrap();
    assert_eq!(r.branch, Branch::Absolute);
    assert_eq!(r.deadline.epoch_millis(), 1_800_000_000_123);
}

#[test]
fn test_past_deadline_resolves_without_error() {
    let d = resolve(1.0).unwrap();
    assert!(d.has_passed());
    assert_eq!(d.remaining(), Duration::ZERO);
}

#[test]
fn test_garbage_is_unresolvable() {
    let err = resolve("not a time at all !!").unwrap_err();
    assert!(matches!(err, DeadlineError::Unresolvable(_)), "{:?}", err);
}

#[test]
fn test_non_finite_epoch_rejected() {
    assert!(matches!(resolve(f64::NAN), Err(DeadlineError::InvalidEpoch(_))));
}

#[cfg(feature = "cron")]
#[test]
fn test_cron_takes_cron_branch() {
    let now = SystemTime::now();
    let r = DeadlineResolver::new()
        .resolve_detailed(&"*/5 * * * *".into())
        .unwrap();
    assert_eq!(r.branch, Branch::Cron);
    assert!(r.deadline > Deadline::from_system_time(now));
    assert!(r.deadline.remaining() <= Duration::from_secs(5 * 60));
}

#[cfg(feature = "cron")]
fn saturday_noon() -> DeadlineResolver {
    use chrono::{Local, TimeZone};

    let at = Local.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap();
    DeadlineResolver::new().with_clock(FixedClock::new(at))
}

#[cfg(feature = "cron")]
#[test]
fn test_cron_weekdays_skip_the_weekend() {
    use chrono::{Datelike, Timelike, Weekday};

    let r = saturday_noon().resolve_detailed(&"0 9 * * 1-5".into()).unwrap();
    assert_eq!(r.branch, Branch::Cron);

    let at = r.deadline.to_local().unwrap();
    assert_eq!(at.weekday(), Weekday::Mon);
    assert_eq!((at.day(), at.hour(), at.minute()), (19, 9, 0));
}

#[cfg(feature = "cron")]
#[test]
fn test_cron_sunday_zero_resolves() {
    use chrono::{Datelike, Weekday};

    let r = saturday_noon().resolve_detailed(&"0 9 * * 0".into()).unwrap();
    assert_eq!(r.branch, Branch::Cron);

    let at = r.deadline.to_local().unwrap();
    assert_eq!(at.weekday(), Weekday::Sun);
    assert_eq!(at.day(), 18);
}

#[cfg(feature = "natural-language")]
#[test]
fn test_in_phrase_is_relative_to_now() {
    let r = fixed().resolve_detailed(&"in 3 hours".into()).unwrap();
    assert_eq!(r.branch, Branch::NaturalLanguage);
    assert_eq!(r.deadline.epoch_millis(), NOW + 3 * 3_600_000);
}

#[test]
fn test_sleep_until_returns_after_deadline() {
    let started = std::time::Instant::now();
    let deadline = deadline_guard::sleep_until("150ms").unwrap();
    assert!(started.elapsed() >= Duration::from_millis(100));
    assert!(deadline.has_passed());
}
