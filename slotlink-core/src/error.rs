//! Error types for slotlink.

use thiserror::Error;

use crate::validation::ValidationErrors;

/// Errors that can occur in slotlink operations.
#[derive(Error, Debug)]
pub enum SlotLinkError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Slot {index} is not available ({available} slots in this link)")]
    SlotUnavailable { index: usize, available: usize },

    #[error("Invalid organiser email address: {0}")]
    InvalidOrganizerEmail(String),

    #[error("Mail delivery failed: {0}")]
    DeliveryFailure(String),

    #[error("Mailer '{0}' not found in PATH")]
    MailerNotInstalled(String),

    #[error("Mailer request timed out after {0}s")]
    MailerTimeout(u64),

    #[error("Schedule not found: {0}")]
    ScheduleNotFound(String),

    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid slot key '{0}'. Expected YYYY-MM-DDTHH:MM")]
    InvalidSlotKey(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<ValidationErrors> for SlotLinkError {
    fn from(errors: ValidationErrors) -> Self {
        SlotLinkError::Validation(errors)
    }
}

/// Result type alias for slotlink operations.
pub type SlotLinkResult<T> = Result<T, SlotLinkError>;
