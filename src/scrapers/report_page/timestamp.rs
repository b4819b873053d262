//! Timestamp resolution for report and update metadata lines.
//!
//! Pages show either a full stamp (`14:05, Wed 03 January 2024`) or, for
//! recent activity, only a time and weekday (`at 09:10, Monday`). The
//! partial form always describes a past event, so it resolves to the most
//! recent matching weekday strictly before the reference date.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use regex::Regex;

/// `HH:MM, <weekday> DD <Month> YYYY`
static FULL_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2}:\d{2}),\s*(\w{3,9})\s+(\d{1,2})\s+(\w+)\s+(\d{4})").unwrap()
});

/// `at HH:MM, <weekday>`
static PARTIAL_TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"at (\d{1,2}:\d{2}),\s*(\w+)").unwrap());

/// How a timestamp was recovered from a line of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Full date and time printed on the page.
    Exact(NaiveDateTime),
    /// Time plus weekday, resolved against the reference date.
    FromWeekday(NaiveDateTime),
    /// Partial pattern matched but the day word is not a weekday.
    UnknownWeekday(String),
    /// Full pattern matched but names a date that does not exist.
    InvalidDate(String),
}

impl Resolution {
    pub fn datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Exact(dt) | Self::FromWeekday(dt) => Some(*dt),
            Self::UnknownWeekday(_) | Self::InvalidDate(_) => None,
        }
    }
}

/// Try the full pattern, then the partial one. `None` if neither matches.
///
/// A full stamp with an impossible date never falls back to the partial
/// pattern, which would match its prefix and invent a date.
pub fn resolve_timestamp(text: &str, today: NaiveDate) -> Option<Resolution> {
    match parse_full(text) {
        Some(Ok(dt)) => return Some(Resolution::Exact(dt)),
        Some(Err(stamp)) => return Some(Resolution::InvalidDate(stamp)),
        None => {}
    }

    let caps = PARTIAL_TIMESTAMP.captures(text)?;
    let time = NaiveTime::parse_from_str(&caps[1], "%H:%M").ok()?;
    let day_word = &caps[2];

    match Weekday::from_str(day_word) {
        Ok(weekday) => {
            let date = previous_weekday(today, weekday);
            Some(Resolution::FromWeekday(date.and_time(time)))
        }
        Err(_) => Some(Resolution::UnknownWeekday(day_word.to_string())),
    }
}

fn parse_full(text: &str) -> Option<Result<NaiveDateTime, String>> {
    let mut invalid = None;
    for caps in FULL_TIMESTAMP.captures_iter(text) {
        // The weekday is informational; only check it names a day.
        if Weekday::from_str(&caps[2]).is_err() {
            continue;
        }
        let Ok(time) = NaiveTime::parse_from_str(&caps[1], "%H:%M") else {
            invalid.get_or_insert_with(|| caps[0].to_string());
            continue;
        };
        let date_str = format!("{} {} {}", &caps[3], &caps[4], &caps[5]);
        let date = NaiveDate::parse_from_str(&date_str, "%d %B %Y")
            .or_else(|_| NaiveDate::parse_from_str(&date_str, "%d %b %Y"));
        match date {
            Ok(date) => return Some(Ok(date.and_time(time))),
            Err(_) => {
                invalid.get_or_insert_with(|| caps[0].to_string());
            }
        }
    }
    invalid.map(Err)
}

/// Most recent date before `today` falling on `target`. A match on
/// `today` itself steps back a full week.
pub fn previous_weekday(today: NaiveDate, target: Weekday) -> NaiveDate {
    let today_idx = today.weekday().num_days_from_monday();
    let target_idx = target.num_days_from_monday();
    let mut diff = (today_idx + 7 - target_idx) % 7;
    if diff == 0 {
        diff = 7;
    }
    today - Days::new(u64::from(diff))
}
