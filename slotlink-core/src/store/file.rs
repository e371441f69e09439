//! Schedules persisted as JSON files.
//!
//! ```text
//! <root>/
//!   schedules/<book_id>.json
//!   edits/<edit_token>        contains the book id
//! ```

use std::path::{Path, PathBuf};

use super::{
    MAX_BOOK_ID_LEN, MAX_EDIT_TOKEN_LEN, ScheduleStore, StoredSchedule, is_plausible_id,
};
use crate::error::{SlotLinkError, SlotLinkResult};
use crate::payload::SchedulingPayload;

#[derive(Debug, Clone)]
pub struct FileScheduleStore {
    root: PathBuf,
}

impl FileScheduleStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> SlotLinkResult<Self> {
        let store = FileScheduleStore { root: root.into() };
        std::fs::create_dir_all(store.schedules_dir())?;
        std::fs::create_dir_all(store.edits_dir())?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn schedules_dir(&self) -> PathBuf {
        self.root.join("schedules")
    }

    fn edits_dir(&self) -> PathBuf {
        self.root.join("edits")
    }

    fn schedule_path(&self, book_id: &str) -> PathBuf {
        self.schedules_dir().join(format!("{book_id}.json"))
    }

    fn write_schedule(&self, stored: &StoredSchedule) -> SlotLinkResult<()> {
        let json = serde_json::to_string_pretty(stored)
            .map_err(|e| SlotLinkError::Serialization(e.to_string()))?;
        let path = self.schedule_path(stored.book_id.as_str());
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn read_schedule(&self, book_id: &str) -> SlotLinkResult<Option<StoredSchedule>> {
        let path = self.schedule_path(book_id);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| SlotLinkError::Serialization(format!("{}: {e}", path.display())))
    }

    fn book_id_for(&self, edit_token: &str) -> SlotLinkResult<Option<String>> {
        if !is_plausible_id(edit_token, MAX_EDIT_TOKEN_LEN) {
            return Ok(None);
        }
        match std::fs::read_to_string(self.edits_dir().join(edit_token)) {
            Ok(book_id) => Ok(Some(book_id.trim().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl ScheduleStore for FileScheduleStore {
    fn create(&self, payload: &SchedulingPayload) -> SlotLinkResult<StoredSchedule> {
        let stored = StoredSchedule::new(payload);
        self.write_schedule(&stored)?;
        std::fs::write(
            self.edits_dir().join(stored.edit_token.as_str()),
            stored.book_id.as_str(),
        )?;
        tracing::debug!(book_id = %stored.book_id, "Schedule created");
        Ok(stored)
    }

    fn update(&self, edit_token: &str, payload: &SchedulingPayload) -> SlotLinkResult<StoredSchedule> {
        let mut stored = self
            .find_by_edit_token(edit_token)?
            .ok_or_else(|| SlotLinkError::ScheduleNotFound("unknown edit token".into()))?;
        stored.replace(payload);
        self.write_schedule(&stored)?;
        tracing::debug!(book_id = %stored.book_id, "Schedule updated");
        Ok(stored)
    }

    fn find_by_book_id(&self, book_id: &str) -> SlotLinkResult<Option<StoredSchedule>> {
        if !is_plausible_id(book_id, MAX_BOOK_ID_LEN) {
            return Ok(None);
        }
        self.read_schedule(book_id)
    }

    fn find_by_edit_token(&self, edit_token: &str) -> SlotLinkResult<Option<StoredSchedule>> {
        let Some(book_id) = self.book_id_for(edit_token)? else {
            return Ok(None);
        };
        Ok(self
            .find_by_book_id(&book_id)?
            .filter(|stored| stored.edit_token.as_str() == edit_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::sample;

    #[test]
    fn schedules_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let stored = FileScheduleStore::open(dir.path())
            .unwrap()
            .create(&sample("Intro"))
            .unwrap();

        let reopened = FileScheduleStore::open(dir.path()).unwrap();
        let found = reopened
            .find_by_book_id(stored.book_id.as_str())
            .unwrap()
            .unwrap();
        assert_eq!(found, stored);
        assert!(
            dir.path()
                .join("schedules")
                .join(format!("{}.json", stored.book_id))
                .exists()
        );
    }

    #[test]
    fn update_through_edit_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileScheduleStore::open(dir.path()).unwrap();
        let stored = store.create(&sample("Intro")).unwrap();

        store
            .update(stored.edit_token.as_str(), &sample("Panel"))
            .unwrap();

        let found = store
            .find_by_edit_token(stored.edit_token.as_str())
            .unwrap()
            .unwrap();
        assert_eq!(found.payload().unwrap().title, "Panel");
        assert_eq!(found.created_at, stored.created_at);
    }

    #[test]
    fn unknown_and_hostile_ids_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileScheduleStore::open(dir.path()).unwrap();

        assert_eq!(store.find_by_book_id("abcdef123456").unwrap(), None);
        assert_eq!(store.find_by_book_id("../../secret").unwrap(), None);
        assert_eq!(store.find_by_edit_token("../schedules/x").unwrap(), None);
        assert!(matches!(
            store.update("0123456789abcdef0123456789abcdef", &sample("x")),
            Err(SlotLinkError::ScheduleNotFound(_))
        ));
    }
}
