/*!
 * Calendar Parsing Capability
 *
 * Cron and natural-language parsing live behind `CalendarParser` so the
 * resolver can run without them and tests can substitute them. The default
 * `SystemCalendar` is backed by the `cron` and `chrono-english` crates when
 * the matching cargo features are enabled, and reports the capability as
 * unavailable otherwise.
 */

#[cfg(feature = "natural-language")]
use super::resolver::parse_unit_duration;
use crate::errors::Capability;
use chrono::{DateTime, Local};
use thiserror::Error;

/// Calendar parser failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    /// The parser for this capability is not present
    #[error("{0} parsing is not available")]
    Unavailable(Capability),

    /// The parser is present but rejected the input
    #[error("invalid input: {0}")]
    Invalid(String),
}

pub type CalendarResult<T> = Result<T, CalendarError>;

/// Parsing capability consumed by the resolver
pub trait CalendarParser: Send + Sync {
    /// Next scheduled instant strictly after `now`
    fn parse_cron(&self, expr: &str, now: DateTime<Local>) -> CalendarResult<DateTime<Local>>;

    /// Best-effort free-form date; `Ok(None)` when nothing could be made of it
    fn parse_natural(&self, text: &str, now: DateTime<Local>) -> CalendarResult<Option<DateTime<Local>>>;
}

/// Default parser backed by the optional calendar crates
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCalendar;

impl CalendarParser for SystemCalendar {
    #[cfg(feature = "cron")]
    fn parse_cron(&self, expr: &str, now: DateTime<Local>) -> CalendarResult<DateTime<Local>> {
        use std::str::FromStr;

        let normalized = normalize_cron(expr);
        let schedule = cron::Schedule::from_str(&normalized)
            .map_err(|e| CalendarError::Invalid(e.to_string()))?;

        schedule
            .after(&now)
            .next()
            .ok_or_else(|| CalendarError::Invalid(format!("no upcoming occurrence for {:?}", expr)))
    }

    #[cfg(not(feature = "cron"))]
    fn parse_cron(&self, _expr: &str, _now: DateTime<Local>) -> CalendarResult<DateTime<Local>> {
        Err(CalendarError::Unavailable(Capability::Cron))
    }

    #[cfg(feature = "natural-language")]
    fn parse_natural(&self, text: &str, now: DateTime<Local>) -> CalendarResult<Option<DateTime<Local>>> {
        use chrono_english::{parse_date_string, Dialect};

        if let Some(at) = in_duration(text, now) {
            return Ok(Some(at));
        }
        Ok(parse_date_string(text, now, Dialect::Uk).ok())
    }

    #[cfg(not(feature = "natural-language"))]
    fn parse_natural(&self, _text: &str, _now: DateTime<Local>) -> CalendarResult<Option<DateTime<Local>>> {
        Err(CalendarError::Unavailable(Capability::NaturalLanguage))
    }
}

/// `in <number><unit>`, e.g. `in 3 hours`
#[cfg(feature = "natural-language")]
fn in_duration(text: &str, now: DateTime<Local>) -> Option<DateTime<Local>> {
    let rest = text.trim().strip_prefix("in ")?;
    let d = parse_unit_duration(rest.trim())?;
    now.checked_add_signed(chrono::Duration::from_std(d).ok()?)
}

/// Accept classic five-field crontab lines
///
/// The `cron` crate wants a leading seconds field and numbers weekdays 1-7
/// from Sunday. Five fields get `0` prepended and their day-of-week field
/// rewritten from crontab numbering (0-7, 0 and 7 both Sunday). Six or seven
/// fields are taken in the `cron` crate's own syntax: seconds first, year
/// last, Sunday = 1.
pub fn normalize_cron(expr: &str) -> String {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    match fields.as_slice() {
        [minute, hour, dom, month, dow] => {
            format!("0 {} {} {} {} {}", minute, hour, dom, month, crontab_weekdays(dow))
        }
        _ => fields.join(" "),
    }
}

/// Rewrite a crontab day-of-week field into `cron` crate numbering
///
/// Numeric items, ranges and steps are expanded to explicit lists so wrapped
/// ranges like `5-7` survive. Names, `*` and anything unrecognised pass
/// through for the `cron` crate to judge.
fn crontab_weekdays(field: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    for item in field.split(',') {
        match crontab_weekday_item(item) {
            Some(days) => {
                for day in days {
                    let converted = (day % 7 + 1).to_string();
                    if !out.contains(&converted) {
                        out.push(converted);
                    }
                }
            }
            None => out.push(item.to_string()),
        }
    }
    out.join(",")
}

/// Crontab day numbers (0-7) one item selects, if it is numeric
fn crontab_weekday_item(item: &str) -> Option<Vec<u32>> {
    let (range, step) = match item.split_once('/') {
        Some((range, step)) => (range, Some(step.parse::<usize>().ok().filter(|s| *s > 0)?)),
        None => (item, None),
    };

    let (start, end) = match (range.split_once('-'), step) {
        (Some((a, b)), _) => (a.parse::<u32>().ok()?, b.parse::<u32>().ok()?),
        (None, Some(_)) if range == "*" => (0, 6),
        (None, Some(_)) => (range.parse::<u32>().ok()?, 6),
        (None, None) => {
            let day = range.parse::<u32>().ok()?;
            (day, day)
        }
    };

    if start > end || end > 7 {
        return None;
    }
    Some((start..=end).step_by(step.unwrap_or(1)).collect())
}
