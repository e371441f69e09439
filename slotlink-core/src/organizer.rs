//! The organiser's scheduling session.
//!
//! Binds the time grid, the visible week and the slot selection to one
//! timezone and one "now", both resolved when the session starts.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::calendar_week::{self, CalendarDay, WeekStartPolicy};
use crate::codec::{self, EditPrefill};
use crate::error::SlotLinkResult;
use crate::local_time::LocalSlotKey;
use crate::payload::{MeetingDuration, SchedulingPayload};
use crate::selection::{DragGesture, SelectAction, SlotSelection};
use crate::time_grid::{DayWindow, TimeGrid, TimeSlot, is_past};
use crate::validation::ValidationErrors;

/// Grid preferences that outlive a single session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridSettings {
    pub window: DayWindow,
    pub show_weekends: bool,
    pub week_start: WeekStartPolicy,
}

/// Free-text fields of the organiser form, as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrganizerForm {
    pub title: String,
    pub organizer_name: String,
    pub organizer_email: String,
    pub video_link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedLinks {
    pub token: String,
    pub booking_url: String,
    pub edit_url: String,
}

#[derive(Debug)]
pub struct OrganizerSession {
    pub form: OrganizerForm,
    grid: TimeGrid,
    selection: SlotSelection,
    week_start: NaiveDate,
    show_weekends: bool,
    tz: Tz,
    now: NaiveDateTime,
    drag: Option<DragGesture>,
}

impl OrganizerSession {
    pub fn new(tz: Tz, now: DateTime<Utc>, settings: GridSettings) -> Self {
        let now = now.with_timezone(&tz).naive_local();
        let week_start =
            calendar_week::initial_week(now.date(), settings.week_start, settings.show_weekends);

        OrganizerSession {
            form: OrganizerForm::default(),
            grid: TimeGrid::new(MeetingDuration::default(), settings.window),
            selection: SlotSelection::new(),
            week_start,
            show_weekends: settings.show_weekends,
            tz,
            now,
            drag: None,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date()
    }

    pub fn duration(&self) -> MeetingDuration {
        self.grid.duration()
    }

    /// Changing the duration changes the grid stride, so every selected
    /// key is dropped.
    pub fn set_duration(&mut self, duration: MeetingDuration) {
        if duration == self.grid.duration() {
            return;
        }
        self.grid = TimeGrid::new(duration, self.grid.window());
        self.selection.clear();
        self.drag = None;
    }

    pub fn show_weekends(&self) -> bool {
        self.show_weekends
    }

    pub fn set_show_weekends(&mut self, show: bool) {
        self.show_weekends = show;
    }

    pub fn week_start(&self) -> NaiveDate {
        self.week_start
    }

    pub fn prev_week(&mut self) {
        self.week_start = calendar_week::shift_week(self.week_start, -1);
    }

    pub fn next_week(&mut self) {
        self.week_start = calendar_week::shift_week(self.week_start, 1);
    }

    pub fn go_to_week_of(&mut self, date: NaiveDate) {
        self.week_start = calendar_week::monday_of(date);
    }

    pub fn visible_days(&self) -> Vec<CalendarDay> {
        calendar_week::visible_days(self.week_start, self.show_weekends, self.today())
    }

    pub fn time_slots(&self) -> &[TimeSlot] {
        self.grid.slots()
    }

    pub fn week_label(&self) -> String {
        calendar_week::week_label(self.week_start, self.show_weekends)
    }

    pub fn selection(&self) -> &SlotSelection {
        &self.selection
    }

    pub fn selected_count(&self) -> usize {
        self.selection.count()
    }

    pub fn is_selected(&self, key: &LocalSlotKey) -> bool {
        self.selection.contains(key)
    }

    /// Cells off the grid or already started cannot be interacted with.
    pub fn is_selectable(&self, key: &LocalSlotKey) -> bool {
        self.grid.contains(key.time()) && !is_past(key.minutes_from_midnight(), key.date(), self.now)
    }

    /// Pointer down on a cell. Returns false if the cell is not selectable.
    pub fn press(&mut self, key: LocalSlotKey) -> bool {
        if !self.is_selectable(&key) {
            return false;
        }
        self.drag = Some(DragGesture::press(&mut self.selection, key));
        true
    }

    /// Pointer moved onto a cell while a gesture may be in progress.
    pub fn enter(&mut self, key: LocalSlotKey) -> bool {
        if !self.is_selectable(&key) {
            return false;
        }
        match self.drag.as_mut() {
            Some(drag) => drag.enter(&mut self.selection, key),
            None => false,
        }
    }

    pub fn release(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Single tap: toggles exactly one cell.
    pub fn tap(&mut self, key: LocalSlotKey) -> Option<SelectAction> {
        if !self.is_selectable(&key) {
            return None;
        }
        Some(self.selection.toggle(key))
    }

    fn visible_dates(&self) -> HashSet<NaiveDate> {
        self.visible_days().into_iter().map(|d| d.date).collect()
    }

    pub fn has_week_slots(&self) -> bool {
        self.selection.has_any_on(&self.visible_dates())
    }

    pub fn clear_visible_week(&mut self) -> usize {
        let dates = self.visible_dates();
        self.selection.clear_dates(&dates)
    }

    /// Copy the visible week's selection onto the following week. The view
    /// stays on the current week.
    pub fn copy_to_next_week(&mut self) -> usize {
        let target = calendar_week::shift_week(self.week_start, 1);
        self.selection.copy_week(
            self.week_start,
            target,
            calendar_week::day_count(self.show_weekends),
            self.now,
        )
    }

    /// The payload the current form and selection describe, with slots in
    /// ascending order.
    pub fn to_payload(&self) -> SchedulingPayload {
        let mut slots: Vec<DateTime<Utc>> =
            self.selection.keys().map(|key| key.to_utc(&self.tz)).collect();
        slots.sort();
        slots.dedup();

        let video_link = self.form.video_link.trim();
        SchedulingPayload {
            title: self.form.title.trim().to_string(),
            organizer_name: self.form.organizer_name.trim().to_string(),
            organizer_email: self.form.organizer_email.trim().to_string(),
            duration: self.grid.duration(),
            video_link: (!video_link.is_empty()).then(|| video_link.to_string()),
            organizer_timezone: self.tz.name().to_string(),
            slots,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.to_payload().validate()
    }

    /// Validate and produce the attendee and edit links for `base_url`.
    pub fn generate_links(&self, base_url: &str) -> SlotLinkResult<GeneratedLinks> {
        let payload = self.to_payload();
        payload.validate()?;
        let token = codec::encode(&payload)?;

        Ok(GeneratedLinks {
            booking_url: codec::booking_url(base_url, &token),
            edit_url: codec::edit_url(base_url, &token),
            token,
        })
    }

    /// Pre-fill the form from an edit token. A token that cannot be decoded
    /// leaves the session untouched.
    pub fn load_edit(&mut self, token: &str) -> bool {
        match codec::decode_for_edit(token) {
            Ok(prefill) => {
                self.apply_prefill(prefill);
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unreadable edit link");
                false
            }
        }
    }

    /// Slots are re-keyed in this session's zone and the grid moves to the
    /// week of the first slot.
    pub fn apply_prefill(&mut self, prefill: EditPrefill) {
        self.form = OrganizerForm {
            title: prefill.title,
            organizer_name: prefill.organizer_name,
            organizer_email: prefill.organizer_email,
            video_link: prefill.video_link,
        };
        self.grid = TimeGrid::new(prefill.duration, self.grid.window());
        self.drag = None;
        self.selection = prefill
            .slots
            .iter()
            .map(|instant| LocalSlotKey::from_utc(*instant, &self.tz))
            .collect();

        if let Some(first) = prefill.slots.first() {
            let first_local = first.with_timezone(&self.tz).date_naive();
            self.go_to_week_of(first_local);
        }
    }
}
