//! Attendee-side view of a decoded booking link.
//!
//! Slots are shown in the viewer's zone, grouped by local calendar date.
//! Each slot keeps the index it has in the payload; that index is what gets
//! submitted at booking time, so grouping never renumbers anything.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::{SlotLinkError, SlotLinkResult};
use crate::local_time::format_instant;
use crate::payload::{MeetingDuration, SchedulingPayload};
use crate::validation::{Field, MAX_NAME_LEN, ValidationErrors};

/// A bookable slot as listed for the attendee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotChoice {
    pub index: usize,
    pub start: DateTime<Utc>,
    pub label: String,
}

/// Slots falling on one local date, e.g. "Monday, January 15, 2024".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateGroup {
    pub date_label: String,
    pub slots: Vec<SlotChoice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedSlot {
    pub index: usize,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// "Monday, January 15, 14:30 – 15:00 IST"
    pub summary: String,
}

/// Identifies the schedule a booking refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ScheduleRef {
    Token {
        booking_data: String,
    },
    BookId {
        book_id: String,
    },
}

/// Body sent to the booking service. The service resolves `slot_index`
/// against its own decode of the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingSubmission {
    #[serde(flatten)]
    pub schedule: ScheduleRef,
    pub slot_index: usize,
    pub attendee_name: String,
    pub attendee_email: String,
}

pub struct AttendeeView {
    payload: SchedulingPayload,
    viewer_tz: Tz,
}

impl AttendeeView {
    pub fn new(payload: SchedulingPayload, viewer_tz: Tz) -> Self {
        AttendeeView { payload, viewer_tz }
    }

    pub fn payload(&self) -> &SchedulingPayload {
        &self.payload
    }

    pub fn viewer_tz(&self) -> Tz {
        self.viewer_tz
    }

    pub fn has_slots(&self) -> bool {
        !self.payload.slots.is_empty()
    }

    /// Group slots by viewer-local date, in order of first appearance.
    pub fn group_by_local_date(&self) -> Vec<DateGroup> {
        let mut groups: Vec<DateGroup> = Vec::new();

        for (index, start) in self.payload.slots.iter().enumerate() {
            let date_label = self.date_label(start);
            let choice = SlotChoice {
                index,
                start: *start,
                label: self.format_range(start),
            };

            match groups.iter_mut().find(|g| g.date_label == date_label) {
                Some(group) => group.slots.push(choice),
                None => groups.push(DateGroup {
                    date_label,
                    slots: vec![choice],
                }),
            }
        }

        groups
    }

    pub fn date_label(&self, start: &DateTime<Utc>) -> String {
        start
            .with_timezone(&self.viewer_tz)
            .format("%A, %B %-d, %Y")
            .to_string()
    }

    /// "14:30 – 15:00 IST" for this payload's duration.
    pub fn format_range(&self, start: &DateTime<Utc>) -> String {
        format_range(start, self.payload.duration, &self.viewer_tz)
    }

    /// Pure selection: resolves an index to its slot without touching the
    /// payload.
    pub fn select(&self, index: usize) -> SlotLinkResult<SelectedSlot> {
        let start = self.payload.slot(index).ok_or(SlotLinkError::SlotUnavailable {
            index,
            available: self.payload.slots.len(),
        })?;
        let local = start.with_timezone(&self.viewer_tz);

        Ok(SelectedSlot {
            index,
            start,
            end: self.payload.slot_end(start),
            summary: format!(
                "{}, {}",
                local.format("%A, %B %-d"),
                self.format_range(&start)
            ),
        })
    }

    /// Validate attendee details and build the request body for a
    /// previously selected slot.
    pub fn booking_submission(
        &self,
        schedule: ScheduleRef,
        selected: &SelectedSlot,
        attendee_name: &str,
        attendee_email: &str,
    ) -> SlotLinkResult<BookingSubmission> {
        let mut errors = ValidationErrors::new();
        errors.check_text(Field::AttendeeName, attendee_name, "Your name", MAX_NAME_LEN);
        errors.check_email(Field::AttendeeEmail, attendee_email);
        errors.into_result()?;

        Ok(BookingSubmission {
            schedule,
            slot_index: selected.index,
            attendee_name: attendee_name.trim().to_string(),
            attendee_email: attendee_email.trim().to_string(),
        })
    }
}

/// Local start–end time with the zone abbreviation in force at the start.
pub fn format_range(start: &DateTime<Utc>, duration: MeetingDuration, tz: &Tz) -> String {
    let local_start = start.with_timezone(tz);
    let local_end = (*start + duration.as_duration()).with_timezone(tz);
    format!(
        "{} – {} {}",
        local_start.format("%H:%M"),
        local_end.format("%H:%M"),
        local_start.format("%Z")
    )
}

impl std::fmt::Debug for AttendeeView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttendeeView")
            .field("title", &self.payload.title)
            .field("slots", &self.payload.slots.iter().map(format_instant).collect::<Vec<_>>())
            .field("viewer_tz", &self.viewer_tz.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn payload(slots: Vec<DateTime<Utc>>) -> SchedulingPayload {
        SchedulingPayload {
            title: "Intro call".into(),
            organizer_name: "Jane Smith".into(),
            organizer_email: "jane@company.com".into(),
            duration: MeetingDuration::Thirty,
            video_link: None,
            organizer_timezone: "UTC".into(),
            slots,
        }
    }

    fn utc(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, h, m, 0).unwrap()
    }

    #[test]
    fn groups_follow_viewer_dates() {
        // 21:00 UTC on the 15th is already the 16th in Kolkata
        let view = AttendeeView::new(
            payload(vec![utc(15, 9, 0), utc(15, 21, 0), utc(16, 9, 0)]),
            chrono_tz::Asia::Kolkata,
        );
        let groups = view.group_by_local_date();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].date_label, "Monday, January 15, 2024");
        assert_eq!(groups[1].date_label, "Tuesday, January 16, 2024");
        let second: Vec<usize> = groups[1].slots.iter().map(|s| s.index).collect();
        assert_eq!(second, [1, 2]);
    }

    #[test]
    fn grouping_never_renumbers_unsorted_slots() {
        let view = AttendeeView::new(
            payload(vec![utc(16, 9, 0), utc(15, 9, 0), utc(16, 10, 0)]),
            chrono_tz::UTC,
        );
        let groups = view.group_by_local_date();

        assert_eq!(groups[0].date_label, "Tuesday, January 16, 2024");
        let indices: Vec<Vec<usize>> = groups
            .iter()
            .map(|g| g.slots.iter().map(|s| s.index).collect())
            .collect();
        assert_eq!(indices, vec![vec![0, 2], vec![1]]);
    }

    #[test]
    fn range_uses_zone_abbreviation() {
        let start = utc(15, 9, 0);
        assert_eq!(
            format_range(&start, MeetingDuration::Thirty, &chrono_tz::Europe::London),
            "09:00 – 09:30 GMT"
        );
        assert_eq!(
            format_range(&start, MeetingDuration::Ninety, &chrono_tz::Asia::Kolkata),
            "14:30 – 16:00 IST"
        );
    }

    #[test]
    fn select_is_bounds_checked() {
        let view = AttendeeView::new(payload(vec![utc(15, 9, 0)]), chrono_tz::UTC);

        let selected = view.select(0).unwrap();
        assert_eq!(selected.end, utc(15, 9, 30));
        assert_eq!(selected.summary, "Monday, January 15, 09:00 – 09:30 UTC");

        assert!(matches!(
            view.select(1),
            Err(SlotLinkError::SlotUnavailable { index: 1, available: 1 })
        ));
    }

    #[test]
    fn booking_submission_validates_attendee() {
        let view = AttendeeView::new(payload(vec![utc(15, 9, 0)]), chrono_tz::UTC);
        let selected = view.select(0).unwrap();
        let schedule = ScheduleRef::BookId {
            book_id: "abc123".into(),
        };

        let err = view
            .booking_submission(schedule.clone(), &selected, "", "nope")
            .unwrap_err();
        let SlotLinkError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.has(Field::AttendeeName));
        assert!(errors.has(Field::AttendeeEmail));

        let body = view
            .booking_submission(schedule, &selected, " James Chen ", "james@x.com")
            .unwrap();
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "book_id": "abc123",
                "slot_index": 0,
                "attendee_name": "James Chen",
                "attendee_email": "james@x.com",
            })
        );
    }
}
