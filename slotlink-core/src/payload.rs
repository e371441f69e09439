//! The scheduling payload carried inside a booking link.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{
    Field, MAX_NAME_LEN, MAX_TITLE_LEN, MAX_VIDEO_LINK_LEN, ValidationErrors,
};

/// Meeting lengths an organiser can offer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum MeetingDuration {
    Fifteen,
    #[default]
    Thirty,
    FortyFive,
    Sixty,
    Ninety,
}

impl MeetingDuration {
    pub const ALL: [MeetingDuration; 5] = [
        MeetingDuration::Fifteen,
        MeetingDuration::Thirty,
        MeetingDuration::FortyFive,
        MeetingDuration::Sixty,
        MeetingDuration::Ninety,
    ];

    pub fn minutes(&self) -> u32 {
        match self {
            MeetingDuration::Fifteen => 15,
            MeetingDuration::Thirty => 30,
            MeetingDuration::FortyFive => 45,
            MeetingDuration::Sixty => 60,
            MeetingDuration::Ninety => 90,
        }
    }

    pub fn as_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.minutes()))
    }

    pub fn from_minutes(minutes: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.minutes() == minutes)
    }
}

impl TryFrom<u32> for MeetingDuration {
    type Error = String;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        MeetingDuration::from_minutes(minutes)
            .ok_or_else(|| format!("Unsupported duration {minutes}; expected 15, 30, 45, 60 or 90"))
    }
}

impl From<MeetingDuration> for u32 {
    fn from(d: MeetingDuration) -> Self {
        d.minutes()
    }
}

impl fmt::Display for MeetingDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} minutes", self.minutes())
    }
}

/// Everything an attendee needs to book: who, what, how long, and the
/// candidate start instants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulingPayload {
    pub title: String,
    pub organizer_name: String,
    pub organizer_email: String,
    pub duration: MeetingDuration,
    pub video_link: Option<String>,
    /// The organiser's IANA zone. Informational: slots are already UTC.
    pub organizer_timezone: String,
    /// Slot start instants, addressed by position.
    pub slots: Vec<DateTime<Utc>>,
}

impl SchedulingPayload {
    pub fn slot(&self, index: usize) -> Option<DateTime<Utc>> {
        self.slots.get(index).copied()
    }

    pub fn slot_end(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        start + self.duration.as_duration()
    }

    pub fn is_ready_to_share(&self) -> bool {
        !self.slots.is_empty()
    }

    /// Field checks applied before a payload may be encoded into a link.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        errors.check_text(Field::Title, &self.title, "Meeting title", MAX_TITLE_LEN);
        errors.check_text(
            Field::OrganizerName,
            &self.organizer_name,
            "Your name",
            MAX_NAME_LEN,
        );
        errors.check_email(Field::OrganizerEmail, &self.organizer_email);

        if let Some(link) = &self.video_link {
            if link.trim().is_empty() {
                errors.push(Field::VideoLink, "Video link is empty; leave it out instead");
            } else if link.chars().count() > MAX_VIDEO_LINK_LEN {
                errors.push(
                    Field::VideoLink,
                    format!("Video link must be at most {MAX_VIDEO_LINK_LEN} characters"),
                );
            }
        }

        if self.organizer_timezone.parse::<chrono_tz::Tz>().is_err() {
            errors.push(
                Field::Timezone,
                format!("Unknown timezone '{}'", self.organizer_timezone),
            );
        }

        if !self.is_ready_to_share() {
            errors.push(Field::Slots, "Select at least one available time slot");
        }

        errors.into_result()
    }
}
