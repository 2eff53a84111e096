/*!
 * Deadline Resolver
 *
 * Turns a `DeadlineSpec` into a `Deadline`. Text specs are tried in a fixed
 * order and the first branch that produces a value wins:
 *
 * 1. numeric (epoch seconds, at most one `.`)
 * 2. `<number><unit>` duration, relative to now
 * 3. cron expression (any of `*`, `/`, `,`); a rejected expression falls through
 * 4. natural-language date
 */

use super::calendar::{CalendarError, CalendarParser, SystemCalendar};
use super::clock::{Clock, SystemClock};
use super::types::{Deadline, DeadlineSpec};
use crate::errors::{Capability, DeadlineError, DeadlineResult};
use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::debug;

/// Which resolution branch produced a deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    Epoch,
    Duration,
    Cron,
    NaturalLanguage,
    Relative,
    Absolute,
}

/// A resolved deadline together with the branch that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub deadline: Deadline,
    pub branch: Branch,
}

/// Duration units and the spellings accepted for each
const UNITS: &[(u64, &[&str])] = &[
    (1, &["ms", "millisecond", "milliseconds"]),
    (1_000, &["s", "sec", "secs", "second", "seconds"]),
    (60_000, &["m", "min", "mins", "minute", "minutes"]),
    (3_600_000, &["h", "hr", "hrs", "hour", "hours"]),
    (86_400_000, &["d", "day", "days"]),
    (604_800_000, &["w", "week", "weeks"]),
];

fn unit_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([\d.]+)\s*([a-z]+)$").expect("static regex"))
}

/// Milliseconds per unit, if the unit is known
pub fn unit_millis(unit: &str) -> Option<u64> {
    UNITS
        .iter()
        .find(|(_, spellings)| spellings.contains(&unit))
        .map(|(millis, _)| *millis)
}

/// Parse `<number><unit>` into a duration
///
/// Expects lowercase, trimmed input. Returns `None` for anything that does not
/// fit, including numbers like `1.2.3` and unknown units.
pub fn parse_unit_duration(text: &str) -> Option<Duration> {
    let captures = unit_pattern().captures(text)?;
    let value: f64 = captures.get(1)?.as_str().parse().ok()?;
    let millis = unit_millis(captures.get(2)?.as_str())?;
    Duration::try_from_secs_f64(value * millis as f64 / 1000.0).ok()
}

/// Digits with at most one decimal point
pub fn is_numeric(text: &str) -> bool {
    let mut dots = 0;
    let mut digits = 0;
    for c in text.chars() {
        match c {
            '.' => dots += 1,
            c if c.is_ascii_digit() => digits += 1,
            _ => return false,
        }
    }
    dots <= 1 && digits > 0
}

fn looks_like_cron(text: &str) -> bool {
    text.contains(['*', '/', ','])
}

/// Resolves deadline specs against an injectable clock and calendar parser
#[derive(Clone)]
pub struct DeadlineResolver {
    clock: Arc<dyn Clock>,
    calendar: Option<Arc<dyn CalendarParser>>,
}

impl DeadlineResolver {
    /// System clock, system calendar
    pub fn new() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            calendar: Some(Arc::new(SystemCalendar)),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_calendar(mut self, calendar: impl CalendarParser + 'static) -> Self {
        self.calendar = Some(Arc::new(calendar));
        self
    }

    /// Drop calendar parsing entirely; cron and natural-language specs then
    /// fail with `MissingCapability`
    pub fn without_calendar(mut self) -> Self {
        self.calendar = None;
        self
    }

    /// Resolve to an absolute deadline
    pub fn resolve(&self, spec: &DeadlineSpec) -> DeadlineResult<Deadline> {
        self.resolve_detailed(spec).map(|r| r.deadline)
    }

    /// Resolve and report which branch matched
    pub fn resolve_detailed(&self, spec: &DeadlineSpec) -> DeadlineResult<Resolution> {
        let resolution = match spec {
            DeadlineSpec::Epoch(secs) => Resolution {
                deadline: Deadline::from_epoch_secs(*secs)?,
                branch: Branch::Epoch,
            },
            DeadlineSpec::After(d) => Resolution {
                deadline: self.now_plus(*d, spec)?,
                branch: Branch::Relative,
            },
            DeadlineSpec::At(t) => Resolution {
                deadline: Deadline::from_system_time(*t),
                branch: Branch::Absolute,
            },
            DeadlineSpec::Text(text) => self.resolve_text(text)?,
        };

        debug!(
            spec = %spec,
            branch = ?resolution.branch,
            deadline = %resolution.deadline,
            "deadline resolved"
        );
        Ok(resolution)
    }

    fn resolve_text(&self, raw: &str) -> DeadlineResult<Resolution> {
        let text = raw.trim().to_lowercase();

        if is_numeric(&text) {
            let secs: f64 = text
                .parse()
                .map_err(|_| DeadlineError::Unresolvable(raw.to_string()))?;
            return Ok(Resolution {
                deadline: Deadline::from_epoch_secs(secs)?,
                branch: Branch::Epoch,
            });
        }

        if let Some(d) = parse_unit_duration(&text) {
            return Ok(Resolution {
                deadline: self.now_plus(d, &DeadlineSpec::Text(raw.to_string()))?,
                branch: Branch::Duration,
            });
        }

        let now = self.clock.now();

        if looks_like_cron(&text) {
            let calendar = self.calendar(Capability::Cron, raw)?;
            match calendar.parse_cron(&text, now) {
                Ok(next) => {
                    return Ok(Resolution {
                        deadline: Deadline::from_datetime(&next),
                        branch: Branch::Cron,
                    })
                }
                Err(CalendarError::Unavailable(capability)) => {
                    return Err(DeadlineError::MissingCapability {
                        capability,
                        spec: raw.to_string(),
                    })
                }
                Err(CalendarError::Invalid(reason)) => {
                    debug!(spec = raw, reason = %reason, "not a cron expression, trying natural language");
                }
            }
        }

        let calendar = self.calendar(Capability::NaturalLanguage, raw)?;
        match calendar.parse_natural(&text, now) {
            Ok(Some(at)) => Ok(Resolution {
                deadline: Deadline::from_datetime(&at),
                branch: Branch::NaturalLanguage,
            }),
            Ok(None) | Err(CalendarError::Invalid(_)) => {
                Err(DeadlineError::Unresolvable(raw.to_string()))
            }
            Err(CalendarError::Unavailable(capability)) => Err(DeadlineError::MissingCapability {
                capability,
                spec: raw.to_string(),
            }),
        }
    }

    fn calendar(&self, capability: Capability, raw: &str) -> DeadlineResult<&dyn CalendarParser> {
        self.calendar
            .as_deref()
            .ok_or_else(|| DeadlineError::MissingCapability {
                capability,
                spec: raw.to_string(),
            })
    }

    fn now_plus(&self, d: Duration, spec: &DeadlineSpec) -> DeadlineResult<Deadline> {
        Deadline::from_datetime(&self.clock.now())
            .checked_add(d)
            .ok_or_else(|| DeadlineError::InvalidEpoch(spec.to_string()))
    }
}

impl Default for DeadlineResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DeadlineResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeadlineResolver")
            .field("calendar", &self.calendar.is_some())
            .finish()
    }
}

/// Resolve a spec with the default resolver
pub fn resolve(spec: impl Into<DeadlineSpec>) -> DeadlineResult<Deadline> {
    DeadlineResolver::new().resolve(&spec.into())
}

/// Block the calling thread until the spec's deadline; returns at once if it has passed
pub fn sleep_until(spec: impl Into<DeadlineSpec>) -> DeadlineResult<Deadline> {
    let deadline = resolve(spec)?;
    let remaining = deadline.remaining();
    if !remaining.is_zero() {
        std::thread::sleep(remaining);
    }
    Ok(deadline)
}
