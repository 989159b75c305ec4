//! Calendar-date arithmetic: range generation, week bucketing, delay math.
//!
//! Everything operates on plain `NaiveDate`s; milestone dates carry no time
//! component and no timezone conversion happens here.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Zoom level of the main tracker table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Day,
    Week,
    Month,
}

/// Every date from `start` through `end` inclusive, stepping one calendar
/// day. Empty when `start > end`.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        dates.push(current);
        match current.checked_add_days(Days::new(1)) {
            Some(next) => current = next,
            None => break,
        }
    }
    dates
}

/// Default date range when no explicit range is chosen.
///
/// Day view shows today only; week view spans 7 days back through 28 days
/// ahead; month view spans 7 days back through 2 calendar months ahead.
pub fn default_range(mode: ViewMode, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    match mode {
        ViewMode::Day => (today, today),
        ViewMode::Week => (
            today.checked_sub_days(Days::new(7)).unwrap_or(today),
            today.checked_add_days(Days::new(28)).unwrap_or(today),
        ),
        ViewMode::Month => (
            today.checked_sub_days(Days::new(7)).unwrap_or(today),
            today.checked_add_months(Months::new(2)).unwrap_or(today),
        ),
    }
}

/// Full Sunday-start weeks covering `first..=last`, rounded outward.
///
/// Each returned week is exactly seven consecutive dates.
pub fn calendar_weeks(first: NaiveDate, last: NaiveDate) -> Vec<Vec<NaiveDate>> {
    if first > last {
        return Vec::new();
    }
    let back = u64::from(first.weekday().num_days_from_sunday());
    let forward = u64::from(6 - last.weekday().num_days_from_sunday());
    let start = first.checked_sub_days(Days::new(back)).unwrap_or(first);
    let end = last.checked_add_days(Days::new(forward)).unwrap_or(last);

    date_range(start, end)
        .chunks(7)
        .map(<[NaiveDate]>::to_vec)
        .collect()
}

/// Signed delay in whole days: `actual - planned`.
///
/// Positive means late, negative early. For calendar dates this equals the
/// original millisecond formula `ceil((actual - planned) / 86_400_000)`.
pub fn days_delay(planned: NaiveDate, actual: NaiveDate) -> i64 {
    actual.signed_duration_since(planned).num_days()
}

/// Gantt bar length in days: `end - start`, zero for a same-day interval.
pub fn span_days(start: NaiveDate, end: NaiveDate) -> i64 {
    end.signed_duration_since(start).num_days()
}
