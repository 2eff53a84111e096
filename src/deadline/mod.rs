/*!
 * Deadline Resolution
 *
 * Normalizes heterogeneous deadline specifications into one comparable
 * instant:
 *
 * - **Epoch**: `1700000000`, `"1700000000.5"`
 * - **Duration**: `"500ms"`, `"30 min"`, `"1.5h"`, `"2 weeks"`
 * - **Cron**: `"0 9 * * 1-5"` (next occurrence, crontab numbering)
 * - **Natural language**: `"tomorrow 5pm"`, `"in 3 hours"`
 *
 * ## Example
 *
 * ```ignore
 * let deadline = DeadlineResolver::new().resolve(&"30s".into())?;
 * assert!(!deadline.has_passed());
 * ```
 */

mod calendar;
mod clock;
mod resolver;
mod types;

pub use calendar::{normalize_cron, CalendarError, CalendarParser, CalendarResult, SystemCalendar};
pub use clock::{Clock, FixedClock, SystemClock};
pub use resolver::{
    is_numeric, parse_unit_duration, resolve, sleep_until, unit_millis, Branch, DeadlineResolver,
    Resolution,
};
pub use types::{Deadline, DeadlineSpec};
