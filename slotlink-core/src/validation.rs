//! Field-level validation for organiser and attendee input.

use std::fmt;

use serde::Serialize;

pub const MAX_TITLE_LEN: usize = 120;
pub const MAX_NAME_LEN: usize = 120;
pub const MAX_EMAIL_LEN: usize = 255;
pub const MAX_VIDEO_LINK_LEN: usize = 500;

/// The form field a validation message belongs to, serialised under the
/// name the form submits it as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Field {
    #[serde(rename = "title")]
    Title,
    #[serde(rename = "organizer")]
    OrganizerName,
    #[serde(rename = "email")]
    OrganizerEmail,
    #[serde(rename = "link")]
    VideoLink,
    #[serde(rename = "tz")]
    Timezone,
    #[serde(rename = "slots")]
    Slots,
    #[serde(rename = "attendee_name")]
    AttendeeName,
    #[serde(rename = "attendee_email")]
    AttendeeEmail,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::OrganizerName => "organizer",
            Field::OrganizerEmail => "email",
            Field::VideoLink => "link",
            Field::Timezone => "tz",
            Field::Slots => "slots",
            Field::AttendeeName => "attendee_name",
            Field::AttendeeEmail => "attendee_email",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

/// All field errors collected from one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: Field, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn has(&self, field: Field) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// Ok when nothing was collected.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Require a trimmed, non-empty value no longer than `max` characters.
    pub fn check_text(&mut self, field: Field, value: &str, label: &str, max: usize) {
        let value = value.trim();
        if value.is_empty() {
            self.push(field, format!("{label} is required"));
        } else if value.chars().count() > max {
            self.push(field, format!("{label} must be at most {max} characters"));
        }
    }

    pub fn check_email(&mut self, field: Field, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            self.push(field, "Email address is required");
        } else if value.len() > MAX_EMAIL_LEN {
            self.push(
                field,
                format!("Email address must be at most {MAX_EMAIL_LEN} characters"),
            );
        } else if !is_valid_email(value) {
            self.push(field, "Enter a valid email address");
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field.as_str(), e.message))
            .collect();
        write!(f, "{}", messages.join("; "))
    }
}

/// Loose `local@domain.tld` check: no whitespace, exactly one `@`, and a dot
/// inside the domain with text on both sides.
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}
