//! Week window for the availability grid.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// A day column in the visible week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub is_today: bool,
    pub is_past: bool,
}

impl CalendarDay {
    pub fn iso(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Short column header, e.g. "Mon 15".
    pub fn header(&self) -> String {
        self.date.format("%a %-d").to_string()
    }
}

/// Which week to show when the grid first opens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekStartPolicy {
    /// Always the week containing today.
    #[default]
    Current,
    /// On a Saturday or Sunday with weekends hidden, jump to next Monday.
    SkipWeekend,
}

/// Monday of the ISO week containing `date`. Sunday belongs to the week
/// that started six days earlier.
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    let back = date.weekday().num_days_from_monday();
    date - Duration::days(i64::from(back))
}

pub fn day_count(include_weekends: bool) -> u32 {
    if include_weekends { 7 } else { 5 }
}

/// Mon–Fri (or Mon–Sun) starting at `week_start`.
pub fn visible_days(
    week_start: NaiveDate,
    include_weekends: bool,
    today: NaiveDate,
) -> Vec<CalendarDay> {
    (0..day_count(include_weekends))
        .map(|offset| {
            let date = week_start + Duration::days(i64::from(offset));
            CalendarDay {
                date,
                is_today: date == today,
                is_past: date < today,
            }
        })
        .collect()
}

/// Move `delta_weeks` weeks forward (or back) and re-align to Monday.
pub fn shift_week(week_start: NaiveDate, delta_weeks: i64) -> NaiveDate {
    monday_of(week_start + Duration::days(delta_weeks * 7))
}

/// Human-readable span of the visible week, e.g. "Jan 15 – Jan 19, 2024".
pub fn week_label(week_start: NaiveDate, include_weekends: bool) -> String {
    let end = week_start + Duration::days(i64::from(day_count(include_weekends)) - 1);
    format!(
        "{} – {}",
        week_start.format("%b %-d"),
        end.format("%b %-d, %Y")
    )
}

pub fn initial_week(today: NaiveDate, policy: WeekStartPolicy, include_weekends: bool) -> NaiveDate {
    let current = monday_of(today);
    let on_weekend = matches!(today.weekday(), Weekday::Sat | Weekday::Sun);

    match policy {
        WeekStartPolicy::SkipWeekend if on_weekend && !include_weekends => shift_week(current, 1),
        _ => current,
    }
}
