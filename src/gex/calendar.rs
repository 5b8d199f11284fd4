//! Expiry calendar: business-day counts, the annualization policy and the
//! standard monthly expiry heuristic.

use super::config;
use chrono::{Datelike, NaiveDate, Weekday};

/// Weekdays in `[start, end)`, negated when `end` precedes `start`.
///
/// Exchange holidays are not excluded.
pub fn business_days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    if end < start {
        return -business_days_between(end, start);
    }

    let days = (end - start).num_days();
    let full_weeks = days / 7;
    let remainder = days % 7;
    let first = i64::from(start.weekday().num_days_from_monday());

    let tail = (0..remainder)
        .filter(|offset| (first + offset) % 7 < 5)
        .count() as i64;

    full_weeks * 5 + tail
}

/// Annualized time to expiry on a 262 business-day year.
///
/// Same-day expiries count as one business day so that 0DTE contracts keep
/// contributing gamma; contracts already past expiry get zero time.
pub fn years_to_expiry(today: NaiveDate, expiry: NaiveDate) -> f64 {
    match business_days_between(today, expiry) {
        0 => 1.0 / config::BUSINESS_DAYS_PER_YEAR,
        days if days < 0 => 0.0,
        days => days as f64 / config::BUSINESS_DAYS_PER_YEAR,
    }
}

/// Friday falling on day 15 to 21 of its month.
///
/// Approximates "third Friday" without checking the occurrence count.
pub fn is_standard_monthly(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Fri
        && (config::MONTHLY_FIRST_DAY..=config::MONTHLY_LAST_DAY).contains(&date.day())
}
