//! Time-of-day slots for the weekly availability grid.
//!
//! A grid is the set of bookable start times in one day: a fixed stride of
//! the meeting duration, laid out inside a configurable day window. The
//! grid is rebuilt whenever the duration changes.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;

use crate::error::{SlotLinkError, SlotLinkResult};
use crate::payload::MeetingDuration;

pub const DEFAULT_DAY_START_MINUTES: u32 = 8 * 60;
pub const DEFAULT_DAY_END_MINUTES: u32 = 19 * 60;
const MINUTES_PER_DAY: u32 = 24 * 60;

/// The part of the day in which slots may start, in minutes since midnight.
/// `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    start: u32,
    end: u32,
}

impl Default for DayWindow {
    fn default() -> Self {
        DayWindow {
            start: DEFAULT_DAY_START_MINUTES,
            end: DEFAULT_DAY_END_MINUTES,
        }
    }
}

impl DayWindow {
    pub fn new(start: u32, end: u32) -> SlotLinkResult<Self> {
        if start >= end || end > MINUTES_PER_DAY {
            return Err(SlotLinkError::Config(format!(
                "Invalid day window {}–{}: start must be before end, end at most 24:00",
                format_minutes(start),
                format_minutes(end)
            )));
        }
        Ok(DayWindow { start, end })
    }

    /// Parse a window from two "HH:MM" strings ("24:00" allowed as an end).
    pub fn parse(start: &str, end: &str) -> SlotLinkResult<Self> {
        DayWindow::new(parse_minutes(start)?, parse_minutes(end)?)
    }

    pub fn start_minutes(&self) -> u32 {
        self.start
    }

    pub fn end_minutes(&self) -> u32 {
        self.end
    }
}

/// One selectable start time within a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    pub start_minutes: u32,
    pub label: String,
}

impl TimeSlot {
    pub fn new(start_minutes: u32) -> Self {
        TimeSlot {
            start_minutes,
            label: format_minutes(start_minutes),
        }
    }

    pub fn time(&self) -> NaiveTime {
        minutes_to_time(self.start_minutes)
    }

    pub fn is_past(&self, date: NaiveDate, now: NaiveDateTime) -> bool {
        is_past(self.start_minutes, date, now)
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Slots at a fixed `duration` stride starting at the window start. A final
/// slot that would run past the window end is dropped.
pub fn generate_slots(duration: MeetingDuration, window: DayWindow) -> Vec<TimeSlot> {
    let step = duration.minutes();
    let count = (window.end - window.start) / step;

    (0..count)
        .map(|i| TimeSlot::new(window.start + i * step))
        .collect()
}

/// Whether a slot starting `start_minutes` after midnight on `date` has
/// already begun at `now` (both in the organiser's local time).
pub fn is_past(start_minutes: u32, date: NaiveDate, now: NaiveDateTime) -> bool {
    let today = now.date();
    if date < today {
        return true;
    }
    if date == today {
        let now_minutes = now.hour() * 60 + now.minute();
        return now_minutes >= start_minutes;
    }
    false
}

/// The grid of slots for one duration and day window.
#[derive(Debug, Clone)]
pub struct TimeGrid {
    duration: MeetingDuration,
    window: DayWindow,
    slots: Vec<TimeSlot>,
}

impl TimeGrid {
    pub fn new(duration: MeetingDuration, window: DayWindow) -> Self {
        TimeGrid {
            duration,
            window,
            slots: generate_slots(duration, window),
        }
    }

    pub fn duration(&self) -> MeetingDuration {
        self.duration
    }

    pub fn window(&self) -> DayWindow {
        self.window
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    /// Whether a time of day lands exactly on one of this grid's slots.
    pub fn contains(&self, time: NaiveTime) -> bool {
        let minutes = time.hour() * 60 + time.minute();
        time.second() == 0 && self.slots.iter().any(|s| s.start_minutes == minutes)
    }
}

pub fn format_minutes(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

fn minutes_to_time(minutes: u32) -> NaiveTime {
    NaiveTime::from_num_seconds_from_midnight_opt((minutes % MINUTES_PER_DAY) * 60, 0)
        .unwrap_or(NaiveTime::MIN)
}

/// Parse "HH:MM" into minutes since midnight. "24:00" is accepted.
pub fn parse_minutes(s: &str) -> SlotLinkResult<u32> {
    let invalid = || SlotLinkError::Config(format!("Invalid time of day '{s}'. Expected HH:MM"));

    let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
    let hours = u32::from_str(h).map_err(|_| invalid())?;
    let minutes = u32::from_str(m).map_err(|_| invalid())?;

    if minutes >= 60 || hours > 24 || (hours == 24 && minutes > 0) {
        return Err(invalid());
    }
    Ok(hours * 60 + minutes)
}
