//! Turning an attendee's choice into a confirmed booking.
//!
//! The slot index an attendee submits is only meaningful against the
//! payload it was picked from, so it is re-checked against the payload the
//! service resolved for the request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SlotLinkError, SlotLinkResult};
use crate::invite::{InviteEvent, LOCATION_TBC, render_ics};
use crate::mail::message::{self, MeetingDetails};
use crate::mail::{Mailbox, Mailer, OutgoingMail};
use crate::payload::{MeetingDuration, SchedulingPayload};
use crate::validation::{Field, MAX_NAME_LEN, ValidationErrors, is_valid_email};

/// Highest slot index a request may carry.
pub const MAX_SLOT_INDEX: usize = 999;

/// A booking as submitted by an attendee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_id: Option<String>,
    pub slot_index: usize,
    pub attendee_name: String,
    pub attendee_email: String,
}

impl BookingRequest {
    /// Field checks that do not need the schedule.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check_text(
            Field::AttendeeName,
            &self.attendee_name,
            "Your name",
            MAX_NAME_LEN,
        );
        errors.check_email(Field::AttendeeEmail, &self.attendee_email);
        if self.slot_index > MAX_SLOT_INDEX {
            errors.push(Field::Slots, format!("Slot index must be at most {MAX_SLOT_INDEX}"));
        }
        errors.into_result()
    }

    pub fn attendee(&self) -> Mailbox {
        Mailbox::new(self.attendee_name.trim(), self.attendee_email.trim())
    }
}

/// A slot resolved against its schedule, ready to be confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub title: String,
    pub organizer: Mailbox,
    pub attendee: Mailbox,
    pub start: DateTime<Utc>,
    pub duration: MeetingDuration,
    pub video_link: Option<String>,
}

impl Booking {
    pub fn resolve(payload: &SchedulingPayload, request: &BookingRequest) -> SlotLinkResult<Self> {
        request.validate()?;

        let start = payload
            .slot(request.slot_index)
            .ok_or(SlotLinkError::SlotUnavailable {
                index: request.slot_index,
                available: payload.slots.len(),
            })?;

        let organizer_email = payload.organizer_email.trim();
        if !is_valid_email(organizer_email) {
            return Err(SlotLinkError::InvalidOrganizerEmail(
                payload.organizer_email.clone(),
            ));
        }

        Ok(Booking {
            title: payload.title.trim().to_string(),
            organizer: Mailbox::new(payload.organizer_name.trim(), organizer_email),
            attendee: request.attendee(),
            start,
            duration: payload.duration,
            video_link: payload.video_link.as_deref().map(str::trim).map(str::to_string),
        })
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.start + self.duration.as_duration()
    }

    pub fn invite(&self) -> InviteEvent {
        InviteEvent {
            uid: InviteEvent::new_uid(),
            organizer_name: self.organizer.name.clone(),
            organizer_email: self.organizer.email.clone(),
            attendee_name: self.attendee.name.clone(),
            attendee_email: self.attendee.email.clone(),
            title: self.title.clone(),
            start: self.start,
            end: self.end(),
            location: self
                .video_link
                .clone()
                .unwrap_or_else(|| LOCATION_TBC.to_string()),
            video_link: self.video_link.clone(),
        }
    }

    fn details(&self) -> MeetingDetails<'_> {
        MeetingDetails {
            title: &self.title,
            organizer: &self.organizer,
            attendee: &self.attendee,
            start: self.start,
            duration: self.duration,
            video_link: self.video_link.as_deref(),
        }
    }

    pub fn confirmation_mail(&self) -> OutgoingMail {
        message::attendee_confirmation(&self.details(), render_ics(&self.invite()))
    }

    pub fn notification_mail(&self) -> OutgoingMail {
        message::organizer_notification(&self.details())
    }

    /// Send the attendee confirmation, then the organiser notification.
    /// Nothing is retried; a failure is logged and reported as
    /// [`SlotLinkError::DeliveryFailure`].
    pub async fn dispatch<M: Mailer>(&self, mailer: &M) -> SlotLinkResult<()> {
        for mail in [self.confirmation_mail(), self.notification_mail()] {
            if let Err(e) = mailer.send(&mail).await {
                tracing::error!(
                    error = %e,
                    organizer = %self.organizer.email,
                    attendee = %self.attendee.email,
                    "Booking email send failed"
                );
                return Err(match e {
                    SlotLinkError::DeliveryFailure(msg) => SlotLinkError::DeliveryFailure(msg),
                    other => SlotLinkError::DeliveryFailure(other.to_string()),
                });
            }
        }

        tracing::info!(
            title = %self.title,
            start = %self.start,
            organizer = %self.organizer.email,
            attendee = %self.attendee.email,
            "Booking confirmed"
        );
        Ok(())
    }
}
