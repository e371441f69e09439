//! In-process schedule store. Contents are lost on restart.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::{ScheduleStore, StoredSchedule};
use crate::error::{SlotLinkError, SlotLinkResult};
use crate::payload::SchedulingPayload;

#[derive(Debug, Default)]
struct Inner {
    by_book_id: HashMap<String, StoredSchedule>,
    /// edit token -> book id
    edits: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct MemoryScheduleStore {
    inner: RwLock<Inner>,
}

impl MemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_book_id
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ScheduleStore for MemoryScheduleStore {
    fn create(&self, payload: &SchedulingPayload) -> SlotLinkResult<StoredSchedule> {
        let stored = StoredSchedule::new(payload);
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner
            .edits
            .insert(stored.edit_token.to_string(), stored.book_id.to_string());
        inner
            .by_book_id
            .insert(stored.book_id.to_string(), stored.clone());
        Ok(stored)
    }

    fn update(&self, edit_token: &str, payload: &SchedulingPayload) -> SlotLinkResult<StoredSchedule> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let book_id = inner
            .edits
            .get(edit_token)
            .cloned()
            .ok_or_else(|| SlotLinkError::ScheduleNotFound("unknown edit token".into()))?;
        let stored = inner
            .by_book_id
            .get_mut(&book_id)
            .ok_or(SlotLinkError::ScheduleNotFound(book_id))?;
        stored.replace(payload);
        Ok(stored.clone())
    }

    fn find_by_book_id(&self, book_id: &str) -> SlotLinkResult<Option<StoredSchedule>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.by_book_id.get(book_id).cloned())
    }

    fn find_by_edit_token(&self, edit_token: &str) -> SlotLinkResult<Option<StoredSchedule>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner
            .edits
            .get(edit_token)
            .and_then(|book_id| inner.by_book_id.get(book_id))
            .cloned())
    }
}
