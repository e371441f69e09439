//! Create, update and fetch schedules

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use slotlink_core::codec::{self, WirePayload};
use slotlink_core::mail::Mailer;
use slotlink_core::payload::SchedulingPayload;
use slotlink_core::store::{MAX_EDIT_TOKEN_LEN, StoredSchedule};

use crate::routes::booking::INVALID_EDIT_LINK;
use crate::routes::{AppError, JsonBody};
use crate::state::AppState;

const SCHEDULE_NOT_FOUND: &str = "Schedule not found";

pub fn router<M: Mailer + 'static>() -> Router<AppState<M>> {
    Router::new()
        .route("/create", post(create::<M>))
        .route("/update", post(update::<M>))
        .route("/schedule/{book_id}", get(schedule::<M>))
        .route("/schedule/edit/{edit_token}", get(schedule_for_edit::<M>))
}

#[derive(Debug, Serialize)]
pub struct CreateResponse {
    pub success: bool,
    pub booking_url: String,
    pub edit_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_token: Option<String>,
}

/// Strictly convert and validate submitted form fields.
fn validated(wire: WirePayload) -> Result<SchedulingPayload, AppError> {
    let payload = wire.into_payload()?;
    payload.validate().map_err(AppError::validation)?;
    Ok(payload)
}

/// POST /create - Turn organiser form fields into shareable links
async fn create<M: Mailer + 'static>(
    State(state): State<AppState<M>>,
    JsonBody(form): JsonBody<WirePayload>,
) -> Result<Json<CreateResponse>, AppError> {
    let payload = validated(form)?;
    let base_url = state.base_url();

    let response = match &state.store {
        Some(store) => {
            let stored = store.create(&payload)?;
            tracing::info!(book_id = %stored.book_id, slots = payload.slots.len(), "Schedule created");
            CreateResponse {
                success: true,
                booking_url: codec::booking_url(base_url, stored.book_id.as_str()),
                edit_url: codec::edit_url(base_url, stored.edit_token.as_str()),
                book_id: Some(stored.book_id.to_string()),
                edit_token: Some(stored.edit_token.to_string()),
            }
        }
        None => {
            let token = codec::encode(&payload)?;
            CreateResponse {
                success: true,
                booking_url: codec::booking_url(base_url, &token),
                edit_url: codec::edit_url(base_url, &token),
                book_id: None,
                edit_token: None,
            }
        }
    };

    Ok(Json(response))
}

/// Request body for updating a stored schedule
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub edit_token: String,
    #[serde(flatten)]
    pub schedule: WirePayload,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub success: bool,
    pub book_id: String,
    pub booking_url: String,
}

/// POST /update - Replace a stored schedule, authorised by its edit token
async fn update<M: Mailer + 'static>(
    State(state): State<AppState<M>>,
    JsonBody(req): JsonBody<UpdateRequest>,
) -> Result<Json<UpdateResponse>, AppError> {
    let store = state
        .store
        .as_ref()
        .ok_or_else(|| AppError::not_found(INVALID_EDIT_LINK))?;
    if req.edit_token.len() > MAX_EDIT_TOKEN_LEN
        || store.find_by_edit_token(&req.edit_token)?.is_none()
    {
        return Err(AppError::not_found(INVALID_EDIT_LINK));
    }

    let payload = validated(req.schedule)?;
    let stored = store.update(&req.edit_token, &payload)?;
    tracing::info!(book_id = %stored.book_id, "Schedule updated");

    Ok(Json(UpdateResponse {
        success: true,
        booking_url: codec::booking_url(state.base_url(), stored.book_id.as_str()),
        book_id: stored.book_id.to_string(),
    }))
}

fn found(stored: Option<StoredSchedule>) -> Result<StoredSchedule, AppError> {
    stored.ok_or_else(|| AppError::not_found(SCHEDULE_NOT_FOUND))
}

/// GET /schedule/{book_id} - Schedule as an attendee sees it
async fn schedule<M: Mailer + 'static>(
    State(state): State<AppState<M>>,
    Path(book_id): Path<String>,
) -> Result<Json<WirePayload>, AppError> {
    let stored = found(state.resolver().stored_by_book_id(Some(&book_id)))?;
    Ok(Json(stored.schedule))
}

#[derive(Debug, Serialize)]
pub struct EditableSchedule {
    #[serde(flatten)]
    pub schedule: WirePayload,
    pub book_id: String,
}

/// GET /schedule/edit/{edit_token} - Schedule for the organiser to edit
async fn schedule_for_edit<M: Mailer + 'static>(
    State(state): State<AppState<M>>,
    Path(edit_token): Path<String>,
) -> Result<Json<EditableSchedule>, AppError> {
    let stored = found(state.resolver().stored_by_edit_token(Some(&edit_token)))?;
    Ok(Json(EditableSchedule {
        book_id: stored.book_id.to_string(),
        schedule: stored.schedule,
    }))
}
