//! End-to-end flows through the public API: organiser builds a link,
//! attendee views it in another zone and books.

use chrono::{TimeZone, Utc};
use slotlink_core::booking::{Booking, BookingRequest};
use slotlink_core::codec::{self, decode_for_booking, decode_for_edit};
use slotlink_core::local_time::format_instant;
use slotlink_core::mail::{Mailer, OutgoingMail};
use slotlink_core::organizer::{GridSettings, OrganizerForm, OrganizerSession};
use slotlink_core::presenter::{AttendeeView, ScheduleRef};
use slotlink_core::store::{MemoryScheduleStore, ScheduleResolver, ScheduleStore};
use slotlink_core::{LocalSlotKey, MeetingDuration, SlotLinkError, SlotLinkResult};
use std::sync::Mutex;

fn key(s: &str) -> LocalSlotKey {
    s.parse().unwrap()
}

fn organiser() -> OrganizerSession {
    let now = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();
    let mut session = OrganizerSession::new(chrono_tz::UTC, now, GridSettings::default());
    session.form = OrganizerForm {
        title: "Intro call".into(),
        organizer_name: "Jane Smith".into(),
        organizer_email: "jane@company.com".into(),
        video_link: String::new(),
    };
    session.set_duration(MeetingDuration::Thirty);
    session.next_week();
    session.press(key("2024-01-15T09:00"));
    session.enter(key("2024-01-15T09:30"));
    session.release();
    session
}

#[derive(Default)]
struct Outbox(Mutex<Vec<OutgoingMail>>);

impl Mailer for Outbox {
    async fn send(&self, mail: &OutgoingMail) -> SlotLinkResult<()> {
        self.0.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

#[test]
fn utc_organiser_link_carries_utc_instants() {
    let links = organiser().generate_links("https://example.com/schedule").unwrap();
    let payload = decode_for_booking(&links.token).unwrap();

    let slots: Vec<String> = payload.slots.iter().map(format_instant).collect();
    assert_eq!(slots, ["2024-01-15T09:00:00.000Z", "2024-01-15T09:30:00.000Z"]);
    assert_eq!(payload.duration, MeetingDuration::Thirty);
    assert_eq!(payload.organizer_timezone, "UTC");
}

#[test]
fn kolkata_viewer_sees_one_group() {
    let links = organiser().generate_links("https://example.com/schedule").unwrap();
    let payload = decode_for_booking(&links.token).unwrap();
    let view = AttendeeView::new(payload, chrono_tz::Asia::Kolkata);

    let groups = view.group_by_local_date();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].date_label, "Monday, January 15, 2024");
    let labels: Vec<&str> = groups[0].slots.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, ["14:30 – 15:00 IST", "15:00 – 15:30 IST"]);
}

#[tokio::test]
async fn booking_second_slot_sends_invite_for_it() {
    let links = organiser().generate_links("https://example.com/schedule").unwrap();
    let view = AttendeeView::new(decode_for_booking(&links.token).unwrap(), chrono_tz::Asia::Kolkata);
    let selected = view.select(1).unwrap();
    let submission = view
        .booking_submission(
            ScheduleRef::Token {
                booking_data: links.token.clone(),
            },
            &selected,
            "James Chen",
            "james@x.com",
        )
        .unwrap();

    // what the service does with the submitted body
    let request: BookingRequest =
        serde_json::from_value(serde_json::to_value(&submission).unwrap()).unwrap();
    let payload = ScheduleResolver::token_only()
        .resolve_booking(request.book_id.as_deref(), request.booking_data.as_deref())
        .unwrap();
    let booking = Booking::resolve(&payload, &request).unwrap();

    assert_eq!(booking.start, Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap());
    assert_eq!(booking.end(), Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap());

    let outbox = Outbox::default();
    booking.dispatch(&outbox).await.unwrap();
    let sent = outbox.0.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].subject, "Confirmed: Intro call");
    let ics = &sent[0].attachments[0].content;
    assert!(ics.contains("DTSTART:20240115T093000Z"));
    assert!(ics.contains("DTEND:20240115T100000Z"));
    assert_eq!(sent[1].subject, "New booking: James Chen — Intro call");
}

#[test]
fn out_of_range_index_is_unavailable() {
    let links = organiser().generate_links("https://example.com/schedule").unwrap();
    let payload = decode_for_booking(&links.token).unwrap();
    let request = BookingRequest {
        booking_data: Some(links.token),
        book_id: None,
        slot_index: payload.slots.len(),
        attendee_name: "James Chen".into(),
        attendee_email: "james@x.com".into(),
    };

    assert!(matches!(
        Booking::resolve(&payload, &request),
        Err(SlotLinkError::SlotUnavailable { index: 2, available: 2 })
    ));
}

#[test]
fn truncated_token_is_malformed() {
    let links = organiser().generate_links("https://example.com/schedule").unwrap();
    let truncated = &links.token[..links.token.len() / 2];

    assert!(matches!(
        decode_for_booking(truncated),
        Err(SlotLinkError::MalformedPayload(_))
    ));
    assert!(matches!(
        decode_for_booking("not a token at all"),
        Err(SlotLinkError::MalformedPayload(_))
    ));
}

#[test]
fn edit_round_trip_restores_the_session() {
    let original = organiser();
    let links = original.generate_links("https://example.com/schedule").unwrap();
    let prefill = decode_for_edit(&links.token).unwrap();

    let mut reopened = OrganizerSession::new(
        chrono_tz::UTC,
        Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap(),
        GridSettings::default(),
    );
    reopened.apply_prefill(prefill);

    assert_eq!(reopened.form, original.form);
    assert_eq!(reopened.selection(), original.selection());
    assert_eq!(reopened.week_start(), original.week_start());
    assert_eq!(reopened.to_payload(), original.to_payload());
}

#[test]
fn stored_schedule_feeds_the_same_presenter() {
    let store = MemoryScheduleStore::new();
    let stored = store.create(&organiser().to_payload()).unwrap();
    let booking_url = codec::booking_url("https://example.com/schedule", stored.book_id.as_str());
    assert!(booking_url.ends_with(&format!("?book={}", stored.book_id)));

    let payload = ScheduleResolver::new(Some(&store))
        .resolve_booking(Some(stored.book_id.as_str()), None)
        .unwrap();
    let view = AttendeeView::new(payload, chrono_tz::Europe::London);
    assert_eq!(view.group_by_local_date()[0].slots.len(), 2);
}
