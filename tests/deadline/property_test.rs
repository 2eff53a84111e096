/*!
 * Resolver Properties
 */

use deadline_guard::deadline::{is_numeric, parse_unit_duration, DeadlineResolver, FixedClock};
use proptest::prelude::*;
use std::time::Duration;

const NOW: i64 = 1_700_000_000_000;

proptest! {
    #[test]
    fn prop_whole_seconds_resolve_exactly(secs in 0u32..1_000_000) {
        let resolver = DeadlineResolver::new().with_clock(FixedClock::at_epoch_millis(NOW));
        let d = resolver.resolve(&format!("{}s", secs).into()).unwrap();
        prop_assert_eq!(d.epoch_millis(), NOW + secs as i64 * 1_000);
    }

    #[test]
    fn prop_whole_minutes_parse(mins in 0u64..10_000, spaced in any::<bool>()) {
        let text = if spaced { format!("{} minutes", mins) } else { format!("{}m", mins) };
        prop_assert_eq!(parse_unit_duration(&text), Some(Duration::from_secs(mins * 60)));
    }

    #[test]
    fn prop_integers_are_numeric(n in 0u64..u64::MAX / 2) {
        prop_assert!(is_numeric(&n.to_string()));
    }

    #[test]
    fn prop_epoch_integer_text_is_exact(secs in 0i64..4_000_000_000) {
        let resolver = DeadlineResolver::new().without_calendar();
        let d = resolver.resolve(&secs.to_string().into()).unwrap();
        prop_assert_eq!(d.epoch_millis(), secs * 1_000);
    }

    #[test]
    fn prop_unknown_units_rejected(unit in "[a-z]{5,8}") {
        prop_assume!(deadline_guard::deadline::unit_millis(&unit).is_none());
        prop_assert_eq!(parse_unit_duration(&format!("5{}", unit)), None);
    }
}
