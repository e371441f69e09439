//! Server-side schedules.
//!
//! Instead of carrying the whole payload, a link can carry a short
//! [`BookId`]. The organiser gets a separate [`EditToken`], which is the
//! only capability needed to change the schedule.

mod file;
mod memory;

pub use file::FileScheduleStore;
pub use memory::MemoryScheduleStore;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::{self, WirePayload};
use crate::error::{SlotLinkError, SlotLinkResult};
use crate::payload::SchedulingPayload;

const BOOK_ID_LEN: usize = 12;
const EDIT_TOKEN_LEN: usize = 32;
/// Longest book id accepted from a request.
pub const MAX_BOOK_ID_LEN: usize = 16;
/// Longest edit token accepted from a request.
pub const MAX_EDIT_TOKEN_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(String);

impl BookId {
    pub fn generate() -> Self {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(BOOK_ID_LEN);
        BookId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditToken(String);

impl EditToken {
    pub fn generate() -> Self {
        let token = uuid::Uuid::new_v4().simple().to_string();
        debug_assert_eq!(token.len(), EDIT_TOKEN_LEN);
        EditToken(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EditToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ids and tokens only ever contain lowercase hex; anything else cannot
/// name a stored schedule.
pub(crate) fn is_plausible_id(s: &str, max_len: usize) -> bool {
    !s.is_empty() && s.len() <= max_len && s.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSchedule {
    pub book_id: BookId,
    pub edit_token: EditToken,
    pub schedule: WirePayload,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredSchedule {
    pub fn new(payload: &SchedulingPayload) -> Self {
        let now = Utc::now();
        StoredSchedule {
            book_id: BookId::generate(),
            edit_token: EditToken::generate(),
            schedule: WirePayload::from(payload),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn replace(&mut self, payload: &SchedulingPayload) {
        self.schedule = WirePayload::from(payload);
        self.updated_at = Utc::now();
    }

    pub fn payload(&self) -> SlotLinkResult<SchedulingPayload> {
        self.schedule.clone().into_payload()
    }
}

pub trait ScheduleStore: Send + Sync {
    fn create(&self, payload: &SchedulingPayload) -> SlotLinkResult<StoredSchedule>;

    /// Replace the schedule owned by `edit_token`. Unknown tokens are
    /// [`SlotLinkError::ScheduleNotFound`].
    fn update(&self, edit_token: &str, payload: &SchedulingPayload) -> SlotLinkResult<StoredSchedule>;

    fn find_by_book_id(&self, book_id: &str) -> SlotLinkResult<Option<StoredSchedule>>;

    fn find_by_edit_token(&self, edit_token: &str) -> SlotLinkResult<Option<StoredSchedule>>;
}

/// Where an edit link points and how to address its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditLinkTarget {
    pub edit_url: String,
    pub organizer_name: String,
    pub title: String,
}

/// Looks schedules up by stored id first and falls back to a self-contained
/// token.
#[derive(Clone, Copy)]
pub struct ScheduleResolver<'a> {
    store: Option<&'a dyn ScheduleStore>,
}

impl<'a> ScheduleResolver<'a> {
    pub fn new(store: Option<&'a dyn ScheduleStore>) -> Self {
        ScheduleResolver { store }
    }

    pub fn token_only() -> Self {
        ScheduleResolver { store: None }
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// The payload a booking refers to. Store errors are logged and treated
    /// like a miss.
    pub fn resolve_booking(
        &self,
        book_id: Option<&str>,
        token: Option<&str>,
    ) -> SlotLinkResult<SchedulingPayload> {
        if let Some(stored) = self.stored_by_book_id(book_id) {
            return stored.payload();
        }

        match token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => codec::decode_for_booking(token),
            None => Err(SlotLinkError::MalformedPayload(
                "no booking reference given".into(),
            )),
        }
    }

    /// The edit link to mail to an organiser.
    pub fn resolve_edit_link(
        &self,
        base_url: &str,
        edit_token: Option<&str>,
        token: Option<&str>,
    ) -> SlotLinkResult<EditLinkTarget> {
        if let Some(stored) = self.stored_by_edit_token(edit_token) {
            return Ok(EditLinkTarget {
                edit_url: codec::edit_url(base_url, stored.edit_token.as_str()),
                organizer_name: stored.schedule.organizer.unwrap_or_default(),
                title: stored.schedule.title.unwrap_or_default(),
            });
        }

        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SlotLinkError::MalformedPayload("no edit reference given".into()))?;
        let wire = codec::decode_wire(token)?;

        Ok(EditLinkTarget {
            edit_url: codec::edit_url(base_url, token),
            organizer_name: wire.organizer.unwrap_or_default(),
            title: wire.title.unwrap_or_default(),
        })
    }

    pub fn stored_by_book_id(&self, book_id: Option<&str>) -> Option<StoredSchedule> {
        let store = self.store?;
        let book_id = book_id.filter(|id| is_plausible_id(id, MAX_BOOK_ID_LEN))?;
        store
            .find_by_book_id(book_id)
            .inspect_err(|e| tracing::warn!(error = %e, book_id, "Schedule lookup failed"))
            .ok()
            .flatten()
    }

    pub fn stored_by_edit_token(&self, edit_token: Option<&str>) -> Option<StoredSchedule> {
        let store = self.store?;
        let edit_token = edit_token.filter(|t| is_plausible_id(t, MAX_EDIT_TOKEN_LEN))?;
        store
            .find_by_edit_token(edit_token)
            .inspect_err(|e| tracing::warn!(error = %e, "Schedule lookup by edit token failed"))
            .ok()
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(super) fn sample(title: &str) -> SchedulingPayload {
        SchedulingPayload {
            title: title.into(),
            organizer_name: "Jane Smith".into(),
            organizer_email: "jane@company.com".into(),
            duration: crate::payload::MeetingDuration::Thirty,
            video_link: None,
            organizer_timezone: "UTC".into(),
            slots: vec![Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()],
        }
    }

    #[test]
    fn generated_ids_have_fixed_shape() {
        let id = BookId::generate();
        let token = EditToken::generate();
        assert_eq!(id.as_str().len(), 12);
        assert_eq!(token.as_str().len(), 32);
        assert!(is_plausible_id(id.as_str(), MAX_BOOK_ID_LEN));
        assert_ne!(BookId::generate(), id);
    }

    #[test]
    fn implausible_ids_are_rejected() {
        assert!(!is_plausible_id("", 16));
        assert!(!is_plausible_id("../etc/passwd", 64));
        assert!(!is_plausible_id(&"a".repeat(17), 16));
    }

    #[test]
    fn resolver_prefers_store_then_token() {
        let store = MemoryScheduleStore::new();
        let stored = store.create(&sample("Stored")).unwrap();
        let token = codec::encode(&sample("Token")).unwrap();
        let resolver = ScheduleResolver::new(Some(&store));

        let p = resolver
            .resolve_booking(Some(stored.book_id.as_str()), Some(&token))
            .unwrap();
        assert_eq!(p.title, "Stored");

        let p = resolver.resolve_booking(Some("unknown123"), Some(&token)).unwrap();
        assert_eq!(p.title, "Token");

        assert!(matches!(
            resolver.resolve_booking(Some("unknown123"), None),
            Err(SlotLinkError::MalformedPayload(_))
        ));
    }

    #[test]
    fn token_only_resolver_ignores_book_ids() {
        let resolver = ScheduleResolver::token_only();
        assert!(resolver.resolve_booking(Some("abc"), None).is_err());
    }

    #[test]
    fn edit_link_from_store_uses_edit_token() {
        let store = MemoryScheduleStore::new();
        let stored = store.create(&sample("Stored")).unwrap();
        let resolver = ScheduleResolver::new(Some(&store));

        let target = resolver
            .resolve_edit_link("https://x/s", Some(stored.edit_token.as_str()), None)
            .unwrap();
        assert_eq!(target.edit_url, format!("https://x/s?edit={}", stored.edit_token));
        assert_eq!(target.organizer_name, "Jane Smith");
        assert_eq!(target.title, "Stored");
    }

    #[test]
    fn edit_link_from_token_reuses_it() {
        let token = codec::encode(&sample("Token")).unwrap();
        let target = ScheduleResolver::token_only()
            .resolve_edit_link("https://x/s", None, Some(&token))
            .unwrap();
        assert_eq!(target.edit_url, format!("https://x/s?edit={token}"));

        assert!(
            ScheduleResolver::token_only()
                .resolve_edit_link("https://x/s", None, Some("!!!"))
                .is_err()
        );
    }
}
