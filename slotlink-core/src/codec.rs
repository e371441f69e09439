//! Token encoding for scheduling payloads.
//!
//! A token is the payload's JSON wire form, base64-encoded with the URL-safe
//! alphabet and no padding, so it can sit in a query string untouched.
//! Tokens from older links that used the standard alphabet still decode.
//!
//! Decoding comes in two strengths:
//! - [`decode_for_booking`] is strict and is what the booking service and
//!   the attendee view rely on.
//! - [`decode_for_edit`] is lenient and only used to pre-fill the
//!   organiser form, where missing fields simply stay blank.

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SlotLinkError, SlotLinkResult};
use crate::local_time::{format_instant, parse_instant};
use crate::payload::{MeetingDuration, SchedulingPayload};

/// Longest token accepted from a link.
pub const MAX_TOKEN_LEN: usize = 8192;

const DEFAULT_TITLE: &str = "Meeting";
const DEFAULT_TIMEZONE: &str = "UTC";

/// JSON shape of a payload as it travels in links and over the API.
///
/// Every field is optional on the way in; presence and types are checked
/// when converting into a [`SchedulingPayload`] or [`EditPrefill`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WirePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tz: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slots: Option<Vec<String>>,
}

impl From<&SchedulingPayload> for WirePayload {
    fn from(payload: &SchedulingPayload) -> Self {
        WirePayload {
            title: Some(payload.title.clone()),
            organizer: Some(payload.organizer_name.clone()),
            email: Some(payload.organizer_email.clone()),
            duration: Some(payload.duration.minutes()),
            link: Some(payload.video_link.clone().unwrap_or_default()),
            tz: Some(payload.organizer_timezone.clone()),
            slots: Some(payload.slots.iter().map(format_instant).collect()),
        }
    }
}

impl WirePayload {
    /// Strict conversion: slots, organiser and email must be present, the
    /// duration must be one on offer and every slot must parse.
    pub fn into_payload(self) -> SlotLinkResult<SchedulingPayload> {
        let organizer_name = required(self.organizer, "organizer")?;
        let organizer_email = required(self.email, "email")?;
        let raw_slots = self
            .slots
            .ok_or_else(|| SlotLinkError::MalformedPayload("missing field 'slots'".into()))?;

        let duration = match self.duration {
            Some(minutes) => MeetingDuration::try_from(minutes).map_err(SlotLinkError::MalformedPayload)?,
            None => MeetingDuration::default(),
        };

        let slots = raw_slots
            .iter()
            .map(|s| {
                parse_instant(s).ok_or_else(|| {
                    SlotLinkError::MalformedPayload(format!("invalid slot instant '{s}'"))
                })
            })
            .collect::<SlotLinkResult<Vec<_>>>()?;

        Ok(SchedulingPayload {
            title: non_blank(self.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            organizer_name,
            organizer_email,
            duration,
            video_link: non_blank(self.link),
            organizer_timezone: non_blank(self.tz).unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
            slots,
        })
    }

    pub fn into_prefill(self) -> EditPrefill {
        let slots = self
            .slots
            .unwrap_or_default()
            .iter()
            .filter_map(|s| parse_instant(s))
            .collect();

        EditPrefill {
            title: self.title.unwrap_or_default(),
            organizer_name: self.organizer.unwrap_or_default(),
            organizer_email: self.email.unwrap_or_default(),
            duration: self
                .duration
                .and_then(MeetingDuration::from_minutes)
                .unwrap_or_default(),
            video_link: self.link.unwrap_or_default(),
            organizer_timezone: non_blank(self.tz),
            slots,
        }
    }
}

/// Organiser form values recovered from an edit link. Anything the link
/// did not carry is left blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EditPrefill {
    pub title: String,
    pub organizer_name: String,
    pub organizer_email: String,
    pub duration: MeetingDuration,
    pub video_link: String,
    pub organizer_timezone: Option<String>,
    pub slots: Vec<DateTime<Utc>>,
}

pub fn encode(payload: &SchedulingPayload) -> SlotLinkResult<String> {
    encode_wire(&WirePayload::from(payload))
}

pub fn encode_wire(wire: &WirePayload) -> SlotLinkResult<String> {
    let json =
        serde_json::to_vec(wire).map_err(|e| SlotLinkError::Serialization(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a token without interpreting its fields.
pub fn decode_wire(token: &str) -> SlotLinkResult<WirePayload> {
    let bytes = decode_bytes(token)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| SlotLinkError::MalformedPayload(format!("invalid JSON: {e}")))
}

pub fn decode_for_booking(token: &str) -> SlotLinkResult<SchedulingPayload> {
    decode_wire(token)?.into_payload()
}

pub fn decode_for_edit(token: &str) -> SlotLinkResult<EditPrefill> {
    Ok(decode_wire(token)?.into_prefill())
}

fn decode_bytes(token: &str) -> SlotLinkResult<Vec<u8>> {
    let token = token.trim();
    if token.is_empty() {
        return Err(SlotLinkError::MalformedPayload("empty token".into()));
    }
    if token.len() > MAX_TOKEN_LEN {
        return Err(SlotLinkError::MalformedPayload(format!(
            "token longer than {MAX_TOKEN_LEN} characters"
        )));
    }

    // Form decoding turns '+' from the standard alphabet into spaces.
    let token = token.replace(' ', "+");

    URL_SAFE_NO_PAD
        .decode(&token)
        .or_else(|_| STANDARD.decode(&token))
        .or_else(|_| URL_SAFE.decode(&token))
        .map_err(|e| SlotLinkError::MalformedPayload(format!("invalid encoding: {e}")))
}

fn required(value: Option<String>, field: &str) -> SlotLinkResult<String> {
    non_blank(value)
        .ok_or_else(|| SlotLinkError::MalformedPayload(format!("missing field '{field}'")))
}

/// Blank values count as absent; anything else is kept byte for byte so a
/// decoded payload equals the one that was encoded.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Append `key=value` to a base URL that may already carry a query string.
pub fn link_with_param(base_url: &str, key: &str, value: &str) -> String {
    let sep = if base_url.contains('?') { '&' } else { '?' };
    format!("{base_url}{sep}{key}={value}")
}

/// Attendee-mode link for a token or booking id.
pub fn booking_url(base_url: &str, reference: &str) -> String {
    link_with_param(base_url, "book", reference)
}

/// Organiser pre-fill link for a token or edit token.
pub fn edit_url(base_url: &str, reference: &str) -> String {
    link_with_param(base_url, "edit", reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> SchedulingPayload {
        SchedulingPayload {
            title: "30-min Interview".into(),
            organizer_name: "Jane Smith".into(),
            organizer_email: "jane@company.com".into(),
            duration: MeetingDuration::Thirty,
            video_link: Some("https://meet.example.com/abc".into()),
            organizer_timezone: "Europe/London".into(),
            slots: vec![
                Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap(),
            ],
        }
    }

    fn token_for(json: &str) -> String {
        URL_SAFE_NO_PAD.encode(json)
    }

    #[test]
    fn round_trip_preserves_payload() {
        let payload = sample();
        let token = encode(&payload).unwrap();
        assert_eq!(decode_for_booking(&token).unwrap(), payload);
    }

    #[test]
    fn round_trip_without_video_link_or_slots_order_change() {
        let mut payload = sample();
        payload.video_link = None;
        payload.slots.reverse();
        let token = encode(&payload).unwrap();
        assert_eq!(decode_for_booking(&token).unwrap(), payload);
    }

    #[test]
    fn round_trip_keeps_surrounding_whitespace() {
        let payload = SchedulingPayload {
            title: "Intro call ".into(),
            organizer_name: "  Jane Smith".into(),
            organizer_email: " jane@company.com ".into(),
            video_link: Some(" https://meet.example.com/abc ".into()),
            ..sample()
        };
        assert!(payload.validate().is_ok());

        let token = encode(&payload).unwrap();
        assert_eq!(decode_for_booking(&token).unwrap(), payload);
    }

    #[test]
    fn millisecond_instants_survive() {
        let mut payload = sample();
        payload.slots = vec![Utc.timestamp_millis_opt(1_705_309_200_123).unwrap()];
        let token = encode(&payload).unwrap();
        assert_eq!(decode_for_booking(&token).unwrap().slots, payload.slots);
    }

    #[test]
    fn token_is_url_safe() {
        let token = encode(&sample()).unwrap();
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "token: {token}"
        );
    }

    #[test]
    fn wire_form_matches_link_format() {
        let wire = WirePayload::from(&sample());
        let json = serde_json::to_string(&wire).unwrap();
        assert_eq!(
            json,
            r#"{"title":"30-min Interview","organizer":"Jane Smith","email":"jane@company.com","duration":30,"link":"https://meet.example.com/abc","tz":"Europe/London","slots":["2024-01-15T09:00:00.000Z","2024-01-15T09:30:00.000Z"]}"#
        );
    }

    #[test]
    fn legacy_standard_base64_still_decodes() {
        let json = r#"{"title":"Chat?","organizer":"Jane","email":"jane@company.com","duration":60,"link":"","tz":"UTC","slots":["2024-01-15T09:00:00.000Z"]}"#;
        let legacy = STANDARD.encode(json);
        let payload = decode_for_booking(&legacy).unwrap();
        assert_eq!(payload.duration, MeetingDuration::Sixty);
        assert_eq!(payload.video_link, None);

        // '+' mangled into ' ' by query decoding
        let mangled = legacy.replace('+', " ");
        assert!(decode_for_booking(&mangled).is_ok());
    }

    #[test]
    fn optional_fields_get_defaults() {
        let token = token_for(r#"{"organizer":"Jane","email":"jane@company.com","slots":[]}"#);
        let payload = decode_for_booking(&token).unwrap();
        assert_eq!(payload.title, "Meeting");
        assert_eq!(payload.duration, MeetingDuration::Thirty);
        assert_eq!(payload.video_link, None);
        assert_eq!(payload.organizer_timezone, "UTC");
        assert!(payload.slots.is_empty());
    }

    #[test]
    fn strict_decode_requires_booking_fields() {
        for json in [
            r#"{"organizer":"Jane","email":"jane@company.com"}"#,
            r#"{"email":"jane@company.com","slots":[]}"#,
            r#"{"organizer":"Jane","slots":[]}"#,
            r#"{"organizer":"  ","email":"jane@company.com","slots":[]}"#,
        ] {
            let err = decode_for_booking(&token_for(json)).unwrap_err();
            assert!(matches!(err, SlotLinkError::MalformedPayload(_)), "{json}");
        }
    }

    #[test]
    fn strict_decode_rejects_wrong_types_and_values() {
        for json in [
            r#"{"organizer":"Jane","email":"j@x.com","slots":"2024-01-15T09:00:00Z"}"#,
            r#"{"organizer":"Jane","email":"j@x.com","duration":"30","slots":[]}"#,
            r#"{"organizer":"Jane","email":"j@x.com","duration":25,"slots":[]}"#,
            r#"{"organizer":"Jane","email":"j@x.com","slots":["tomorrow"]}"#,
            r#"[1,2,3]"#,
        ] {
            let err = decode_for_booking(&token_for(json)).unwrap_err();
            assert!(matches!(err, SlotLinkError::MalformedPayload(_)), "{json}");
        }
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let token = encode(&sample()).unwrap();
        let truncated = &token[..token.len() / 2];

        for bad in ["", "   ", "!!!not base64!!!", truncated, "bm90IGpzb24"] {
            let err = decode_for_booking(bad).unwrap_err();
            assert!(matches!(err, SlotLinkError::MalformedPayload(_)), "{bad:?}");
        }
    }

    #[test]
    fn oversized_tokens_are_rejected() {
        let huge = "A".repeat(MAX_TOKEN_LEN + 1);
        assert!(matches!(
            decode_wire(&huge),
            Err(SlotLinkError::MalformedPayload(_))
        ));
    }

    #[test]
    fn lenient_decode_leaves_missing_fields_blank() {
        let token = token_for(
            r#"{"title":"Sync","duration":45,"slots":["2024-01-15T09:00:00.000Z","garbage"]}"#,
        );
        let prefill = decode_for_edit(&token).unwrap();
        assert_eq!(prefill.title, "Sync");
        assert_eq!(prefill.organizer_name, "");
        assert_eq!(prefill.organizer_email, "");
        assert_eq!(prefill.duration, MeetingDuration::FortyFive);
        assert_eq!(prefill.video_link, "");
        assert_eq!(prefill.organizer_timezone, None);
        assert_eq!(prefill.slots.len(), 1);
    }

    #[test]
    fn lenient_decode_still_rejects_undecodable_tokens() {
        assert!(decode_for_edit("%%%").is_err());
    }

    #[test]
    fn link_helpers_respect_existing_query() {
        assert_eq!(
            booking_url("https://example.com/scheduler", "abc"),
            "https://example.com/scheduler?book=abc"
        );
        assert_eq!(
            edit_url("https://example.com/?lang=en", "xyz"),
            "https://example.com/?lang=en&edit=xyz"
        );
    }
}
