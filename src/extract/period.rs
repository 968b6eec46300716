//! Time-period phrase extraction.
//!
//! Maps a fixed set of Spanish/English period phrases to a concrete
//! inclusive date range, computed against an injected "now" so the same
//! text and reference time always yield the same range.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

static LAST_N_DAYS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[úu]ltimos\s+(\d{1,3})\s+d[íi]as").expect("last-n-days pattern must compile")
});

/// Extract a period phrase into a concrete range relative to `now`.
pub fn extract_period(text: &str, now: DateTime<Utc>) -> Option<DateRange> {
    let lower = text.to_lowercase();
    let today = now.date_naive();

    if let Some(caps) = LAST_N_DAYS_RE.captures(&lower) {
        let n: i64 = caps[1].parse().ok()?;
        if n == 0 {
            return None;
        }
        return Some(DateRange {
            start: today - Duration::days(n - 1),
            end: today,
        });
    }

    if contains_any(&lower, &["hoy", "today", "hasta hoy"]) {
        return Some(DateRange { start: today, end: today });
    }
    if contains_any(&lower, &["esta semana", "semana actual", "this week"]) {
        return Some(week_of(today));
    }
    if contains_any(&lower, &["semana pasada", "last week"]) {
        let this_week = week_of(today);
        return Some(DateRange {
            start: this_week.start - Duration::days(7),
            end: this_week.start - Duration::days(1),
        });
    }
    if contains_any(&lower, &["mes pasado", "last month"]) {
        let first_of_month = today.with_day(1)?;
        return Some(DateRange {
            start: first_of_month.checked_sub_months(Months::new(1))?,
            end: first_of_month - Duration::days(1),
        });
    }
    if contains_any(&lower, &["este mes", "mes actual", "this month", "del mes"]) {
        return Some(month_of(today));
    }

    None
}

/// The month containing `date`, as an inclusive range.
pub fn month_of(date: NaiveDate) -> DateRange {
    let start = date.with_day(1).expect("day 1 always valid");
    let end = start
        .checked_add_months(Months::new(1))
        .expect("in-range month arithmetic")
        - Duration::days(1);
    DateRange { start, end }
}

/// The ISO week (Monday-Sunday) containing `date`.
fn week_of(date: NaiveDate) -> DateRange {
    let start = date - Duration::days(date.weekday().num_days_from_monday() as i64);
    DateRange {
        start,
        end: start + Duration::days(6),
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}
