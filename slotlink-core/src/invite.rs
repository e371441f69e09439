//! Calendar invites (.ics) attached to booking confirmations.

use chrono::{DateTime, Utc};
use icalendar::{Calendar, Component, EventLike, Property};

/// Location used when the organiser gave no video link.
pub const LOCATION_TBC: &str = "To be confirmed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteEvent {
    pub uid: String,
    pub organizer_name: String,
    pub organizer_email: String,
    pub attendee_name: String,
    pub attendee_email: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location: String,
    pub video_link: Option<String>,
}

impl InviteEvent {
    /// A fresh globally unique UID for a new booking.
    pub fn new_uid() -> String {
        format!("{}@slotlink", uuid::Uuid::new_v4())
    }

    pub fn description(&self) -> String {
        let mut description = format!("Meeting with {} via slotlink.", self.organizer_name);
        if let Some(link) = &self.video_link {
            description.push_str("\nJoin: ");
            description.push_str(link);
        }
        description
    }
}

/// Render a single-event `METHOD:REQUEST` calendar for `event`.
pub fn render_ics(event: &InviteEvent) -> String {
    let mut cal = Calendar::new();

    let mut ics_event = icalendar::Event::new();
    ics_event.uid(&event.uid);
    ics_event.summary(&event.title);
    ics_event.add_property("DTSTAMP", format_utc(&Utc::now()));
    ics_event.add_property("DTSTART", format_utc(&event.start));
    ics_event.add_property("DTEND", format_utc(&event.end));
    ics_event.description(&event.description());
    ics_event.location(&event.location);
    ics_event.add_property("STATUS", "CONFIRMED");
    ics_event.add_property("SEQUENCE", "0");

    let mut organizer = Property::new("ORGANIZER", format!("mailto:{}", event.organizer_email));
    organizer.add_parameter("CN", &event.organizer_name);
    ics_event.append_property(organizer);

    let mut attendee = Property::new("ATTENDEE", format!("mailto:{}", event.attendee_email));
    attendee.add_parameter("CN", &event.attendee_name);
    attendee.add_parameter("RSVP", "TRUE");
    ics_event.append_multi_property(attendee);

    if let Some(link) = &event.video_link {
        ics_event.add_property("URL", link);
    }

    cal.push(ics_event.done());
    finish_calendar(&cal.done().to_string())
}

fn format_utc(instant: &DateTime<Utc>) -> String {
    instant.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Normalise the icalendar crate's envelope: our PRODID, no CALSCALE
/// (Gregorian is implied) and `METHOD:REQUEST` after the version line.
fn finish_calendar(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len() + 32);

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:-//slotlink//Booking//EN\r\n");
            continue;
        }
        if line == "CALSCALE:GREGORIAN" || line.starts_with("METHOD:") {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");

        if line == "VERSION:2.0" {
            result.push_str("METHOD:REQUEST\r\n");
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(video_link: Option<&str>) -> InviteEvent {
        InviteEvent {
            uid: "abc-123@slotlink".into(),
            organizer_name: "Jane Smith".into(),
            organizer_email: "jane@company.com".into(),
            attendee_name: "James Chen".into(),
            attendee_email: "james@x.com".into(),
            title: "Intro call".into(),
            start: Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
            location: video_link.unwrap_or(LOCATION_TBC).to_string(),
            video_link: video_link.map(str::to_string),
        }
    }

    fn lines(ics: &str) -> Vec<&str> {
        ics.split("\r\n").collect()
    }

    #[test]
    fn request_envelope() {
        let ics = render_ics(&event(None));
        let lines = lines(&ics);

        assert_eq!(lines[0], "BEGIN:VCALENDAR");
        let version = lines.iter().position(|l| *l == "VERSION:2.0").unwrap();
        assert_eq!(lines[version + 1], "METHOD:REQUEST");
        assert!(lines.contains(&"PRODID:-//slotlink//Booking//EN"));
        assert!(!lines.contains(&"CALSCALE:GREGORIAN"));
        assert_eq!(lines.iter().filter(|l| l.starts_with("METHOD:")).count(), 1);
    }

    #[test]
    fn event_fields_are_utc() {
        let ics = render_ics(&event(None));
        let lines = lines(&ics);

        assert!(lines.contains(&"UID:abc-123@slotlink"));
        assert!(lines.contains(&"DTSTART:20240115T093000Z"));
        assert!(lines.contains(&"DTEND:20240115T100000Z"));
        assert!(lines.contains(&"STATUS:CONFIRMED"));
        assert!(lines.contains(&"SEQUENCE:0"));
        assert!(lines.contains(&"LOCATION:To be confirmed"));
        assert!(!lines.iter().any(|l| l.starts_with("URL")));
        assert!(ics.contains("mailto:jane@company.com"));
        assert!(ics.contains("mailto:james@x.com"));
    }

    #[test]
    fn video_link_becomes_location_and_url() {
        let ics = render_ics(&event(Some("https://meet.example.com/x")));
        let lines = lines(&ics);

        assert!(lines.contains(&"LOCATION:https://meet.example.com/x"));
        assert!(lines.contains(&"URL:https://meet.example.com/x"));
    }

    #[test]
    fn description_mentions_join_link() {
        assert_eq!(
            event(Some("https://meet.example.com/x")).description(),
            "Meeting with Jane Smith via slotlink.\nJoin: https://meet.example.com/x"
        );
        assert_eq!(event(None).description(), "Meeting with Jane Smith via slotlink.");
    }
}
