//! Local slot keys and their conversion to and from UTC instants.
//!
//! Every conversion takes the timezone explicitly; nothing here reads the
//! host clock or zone.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, SecondsFormat,
    TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;

use crate::error::{SlotLinkError, SlotLinkResult};

const KEY_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// A slot addressed by organiser-local date and time of day,
/// formatted `YYYY-MM-DDTHH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalSlotKey(NaiveDateTime);

impl LocalSlotKey {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        let time = time.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(time);
        LocalSlotKey(date.and_time(time))
    }

    /// Build a key from a grid date and an "HH:MM" time key.
    pub fn from_parts(date: NaiveDate, time_key: &str) -> SlotLinkResult<Self> {
        let time = NaiveTime::parse_from_str(time_key, "%H:%M")
            .map_err(|_| SlotLinkError::InvalidSlotKey(format!("{date}T{time_key}")))?;
        Ok(LocalSlotKey::new(date, time))
    }

    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    pub fn time(&self) -> NaiveTime {
        self.0.time()
    }

    /// The "HH:MM" part of the key.
    pub fn time_key(&self) -> String {
        self.0.format("%H:%M").to_string()
    }

    pub fn minutes_from_midnight(&self) -> u32 {
        self.0.hour() * 60 + self.0.minute()
    }

    pub fn naive(&self) -> NaiveDateTime {
        self.0
    }

    /// Same time of day on another date.
    pub fn on_date(&self, date: NaiveDate) -> Self {
        LocalSlotKey(date.and_time(self.0.time()))
    }

    /// The instant this wall-clock time denotes in `tz`.
    ///
    /// Ambiguous times (clocks going back) resolve to the earlier instant.
    /// Times inside a spring-forward gap are read with the offset in force
    /// before the gap, so 02:30 in a 02:00→03:00 jump lands on 03:30.
    pub fn to_utc(&self, tz: &Tz) -> DateTime<Utc> {
        match tz.from_local_datetime(&self.0) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
            LocalResult::None => {
                let before = tz
                    .offset_from_utc_datetime(&(self.0 - Duration::days(1)))
                    .fix();
                let utc = self.0 - Duration::seconds(i64::from(before.local_minus_utc()));
                utc.and_utc()
            }
        }
    }

    /// The key a UTC instant shows as in `tz`, truncated to the minute.
    pub fn from_utc(instant: DateTime<Utc>, tz: &Tz) -> Self {
        let local = instant.with_timezone(tz).naive_local();
        LocalSlotKey::new(local.date(), local.time())
    }
}

impl fmt::Display for LocalSlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(KEY_FORMAT))
    }
}

impl FromStr for LocalSlotKey {
    type Err = SlotLinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDateTime::parse_from_str(s.trim(), KEY_FORMAT)
            .map(|dt| LocalSlotKey::new(dt.date(), dt.time()))
            .map_err(|_| SlotLinkError::InvalidSlotKey(s.to_string()))
    }
}

/// Parse an IANA timezone name.
pub fn parse_timezone(name: &str) -> SlotLinkResult<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| SlotLinkError::InvalidTimezone(name.to_string()))
}

/// `2024-01-15T09:00:00.000Z`
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an ISO-8601 instant with an offset, normalised to UTC.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
