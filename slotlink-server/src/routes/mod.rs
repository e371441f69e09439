pub mod booking;
pub mod schedules;
pub mod view;

use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use slotlink_core::SlotLinkError;
use slotlink_core::validation::ValidationErrors;

/// `{ success, message }` body shared by every action endpoint.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationErrors>,
}

impl MessageResponse {
    pub fn ok(message: &str) -> Json<Self> {
        Json(MessageResponse {
            success: true,
            message: message.to_string(),
            errors: None,
        })
    }
}

/// `Json` whose rejections (bad syntax, missing fields, wrong types) answer
/// with the same `{ success, message }` body as every other error.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// An error with the status and message the client should see.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    errors: Option<ValidationErrors>,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        AppError {
            status,
            message: message.into(),
            errors: None,
        }
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn validation(errors: ValidationErrors) -> Self {
        AppError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: errors.to_string(),
            errors: Some(errors),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(MessageResponse {
            success: false,
            message: self.message,
            errors: self.errors,
        });
        (self.status, body).into_response()
    }
}

/// Body rejections keep their status; anything else maps by kind and
/// unexpected failures become a 500.
impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        if let Some(rejection) = err.downcast_ref::<JsonRejection>() {
            return Self::new(rejection.status(), rejection.body_text());
        }
        match err.downcast_ref::<SlotLinkError>() {
            Some(SlotLinkError::Validation(errors)) => Self::validation(errors.clone()),
            Some(
                e @ (SlotLinkError::MalformedPayload(_)
                | SlotLinkError::InvalidTimezone(_)
                | SlotLinkError::InvalidSlotKey(_)
                | SlotLinkError::SlotUnavailable { .. }
                | SlotLinkError::InvalidOrganizerEmail(_)),
            ) => Self::unprocessable(e.to_string()),
            Some(e @ SlotLinkError::ScheduleNotFound(_)) => Self::not_found(e.to_string()),
            _ => {
                tracing::error!(error = %err, "Request failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        }
    }
}
