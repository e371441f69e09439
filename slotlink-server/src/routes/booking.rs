//! Attendee booking and organiser edit-link endpoints

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde::Deserialize;

use slotlink_core::SlotLinkError;
use slotlink_core::booking::{Booking, BookingRequest};
use slotlink_core::mail::{Mailbox, Mailer, message};
use slotlink_core::validation::{Field, ValidationErrors};

use crate::routes::{AppError, JsonBody, MessageResponse};
use crate::state::AppState;

pub const BOOKING_CONFIRMED: &str =
    "Booking confirmed! A calendar invite has been sent to your email.";
pub const INVALID_BOOKING_LINK: &str = "Invalid booking link.";
pub const SLOT_UNAVAILABLE: &str = "The selected time slot is no longer available.";
pub const INVALID_ORGANIZER_EMAIL: &str =
    "The booking link contains an invalid organiser email address.";
pub const BOOKING_MAIL_FAILED: &str = "The booking was received but confirmation emails could not be sent. Please contact the organiser directly.";
pub const EDIT_LINK_SENT: &str = "Edit link sent! Check your inbox.";
pub const INVALID_EDIT_LINK: &str = "Invalid edit link.";
pub const EDIT_LINK_MAIL_FAILED: &str = "Could not send the email. Please try again shortly.";

pub fn router<M: Mailer + 'static>() -> Router<AppState<M>> {
    Router::new()
        .route("/book", post(book::<M>))
        .route("/email-edit", post(email_edit::<M>))
}

/// POST /book - Confirm a slot and mail both parties
async fn book<M: Mailer + 'static>(
    State(state): State<AppState<M>>,
    JsonBody(req): JsonBody<BookingRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    req.validate().map_err(AppError::validation)?;

    let payload = state
        .resolver()
        .resolve_booking(req.book_id.as_deref(), req.booking_data.as_deref())
        .map_err(|e| {
            tracing::debug!(error = %e, "Unresolvable booking reference");
            AppError::unprocessable(INVALID_BOOKING_LINK)
        })?;

    let booking = Booking::resolve(&payload, &req).map_err(|e| match e {
        SlotLinkError::SlotUnavailable { .. } => AppError::unprocessable(SLOT_UNAVAILABLE),
        SlotLinkError::InvalidOrganizerEmail(_) => AppError::unprocessable(INVALID_ORGANIZER_EMAIL),
        other => AppError::from(other),
    })?;

    booking
        .dispatch(state.mailer.as_ref())
        .await
        .map_err(|_| AppError::new(StatusCode::INTERNAL_SERVER_ERROR, BOOKING_MAIL_FAILED))?;

    Ok(MessageResponse::ok(BOOKING_CONFIRMED))
}

/// Request body for mailing an edit link
#[derive(Debug, Deserialize)]
pub struct EmailEditRequest {
    pub email: String,
    #[serde(default)]
    pub edit_token: Option<String>,
    #[serde(default)]
    pub booking_data: Option<String>,
}

/// POST /email-edit - Mail the organiser their edit link
async fn email_edit<M: Mailer + 'static>(
    State(state): State<AppState<M>>,
    JsonBody(req): JsonBody<EmailEditRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let mut errors = ValidationErrors::new();
    errors.check_email(Field::OrganizerEmail, &req.email);
    errors.into_result().map_err(AppError::validation)?;

    let target = state
        .resolver()
        .resolve_edit_link(
            state.base_url(),
            req.edit_token.as_deref(),
            req.booking_data.as_deref(),
        )
        .map_err(|e| {
            tracing::debug!(error = %e, "Unresolvable edit reference");
            AppError::unprocessable(INVALID_EDIT_LINK)
        })?;

    let email = req.email.trim();
    let mail = message::organizer_edit_link(
        Mailbox::new(target.organizer_name, email),
        &target.title,
        &target.edit_url,
    );

    if let Err(e) = state.mailer.send(&mail).await {
        tracing::error!(error = %e, email, "Edit link email failed");
        return Err(AppError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            EDIT_LINK_MAIL_FAILED,
        ));
    }

    Ok(MessageResponse::ok(EDIT_LINK_SENT))
}
