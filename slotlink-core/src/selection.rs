//! The organiser's selected availability.
//!
//! Selections are local slot keys held in an ordered set. Every mutation is
//! idempotent per key: selecting a selected key or deselecting an absent
//! one changes nothing.

use std::collections::{BTreeSet, HashSet};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::local_time::LocalSlotKey;
use crate::time_grid::is_past;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectAction {
    Select,
    Deselect,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotSelection {
    keys: BTreeSet<LocalSlotKey>,
}

impl SlotSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &LocalSlotKey) -> bool {
        self.keys.contains(key)
    }

    /// Selected keys in chronological (local) order.
    pub fn keys(&self) -> impl Iterator<Item = &LocalSlotKey> {
        self.keys.iter()
    }

    /// The action a press on `key` would start: deselect if it is selected.
    pub fn action_for(&self, key: &LocalSlotKey) -> SelectAction {
        if self.contains(key) {
            SelectAction::Deselect
        } else {
            SelectAction::Select
        }
    }

    /// Flip one key and report which way it went.
    pub fn toggle(&mut self, key: LocalSlotKey) -> SelectAction {
        let action = self.action_for(&key);
        self.apply(key, action);
        action
    }

    /// Apply `action` to one key. Returns whether anything changed.
    pub fn apply(&mut self, key: LocalSlotKey, action: SelectAction) -> bool {
        match action {
            SelectAction::Select => self.keys.insert(key),
            SelectAction::Deselect => self.keys.remove(&key),
        }
    }

    pub fn apply_range<I>(&mut self, keys: I, action: SelectAction) -> usize
    where
        I: IntoIterator<Item = LocalSlotKey>,
    {
        keys.into_iter()
            .filter(|key| self.apply(*key, action))
            .count()
    }

    /// Copy the selected times of each of the first `day_count` days of
    /// `source_week` onto the same weekday of `target_week`. Target cells
    /// that are already past at `now` are skipped; existing target
    /// selections are kept. Returns the number of keys added.
    pub fn copy_week(
        &mut self,
        source_week: NaiveDate,
        target_week: NaiveDate,
        day_count: u32,
        now: NaiveDateTime,
    ) -> usize {
        let source_end = source_week + Duration::days(i64::from(day_count));
        let shift = target_week - source_week;

        let copies: Vec<LocalSlotKey> = self
            .keys
            .iter()
            .filter(|key| key.date() >= source_week && key.date() < source_end)
            .map(|key| key.on_date(key.date() + shift))
            .filter(|key| !is_past(key.minutes_from_midnight(), key.date(), now))
            .collect();

        self.apply_range(copies, SelectAction::Select)
    }

    /// Remove every key falling on one of `dates`.
    pub fn clear_dates(&mut self, dates: &HashSet<NaiveDate>) -> usize {
        let before = self.keys.len();
        self.keys.retain(|key| !dates.contains(&key.date()));
        before - self.keys.len()
    }

    pub fn has_any_on(&self, dates: &HashSet<NaiveDate>) -> bool {
        self.keys.iter().any(|key| dates.contains(&key.date()))
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}

impl FromIterator<LocalSlotKey> for SlotSelection {
    fn from_iter<I: IntoIterator<Item = LocalSlotKey>>(iter: I) -> Self {
        SlotSelection {
            keys: iter.into_iter().collect(),
        }
    }
}

/// One press–move–release gesture over the grid.
///
/// The action is fixed when the gesture starts, from the pressed cell's
/// prior state, and each cell the pointer enters receives it at most once.
#[derive(Debug, Clone)]
pub struct DragGesture {
    action: SelectAction,
    visited: HashSet<LocalSlotKey>,
}

impl DragGesture {
    /// Start a gesture on `key` and apply the action to it.
    pub fn press(selection: &mut SlotSelection, key: LocalSlotKey) -> Self {
        let action = selection.action_for(&key);
        let mut gesture = DragGesture {
            action,
            visited: HashSet::new(),
        };
        gesture.enter(selection, key);
        gesture
    }

    pub fn action(&self) -> SelectAction {
        self.action
    }

    /// The pointer moved onto `key`. Re-entered cells are left alone.
    pub fn enter(&mut self, selection: &mut SlotSelection, key: LocalSlotKey) -> bool {
        if !self.visited.insert(key) {
            return false;
        }
        selection.apply(key, self.action);
        true
    }

    pub fn visited(&self) -> usize {
        self.visited.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> LocalSlotKey {
        s.parse().unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn dates(list: &[&str]) -> HashSet<NaiveDate> {
        list.iter().map(|s| date(s)).collect()
    }

    #[test]
    fn toggle_reports_action() {
        let mut sel = SlotSelection::new();
        assert_eq!(sel.toggle(key("2024-01-15T09:00")), SelectAction::Select);
        assert!(sel.contains(&key("2024-01-15T09:00")));
        assert_eq!(sel.toggle(key("2024-01-15T09:00")), SelectAction::Deselect);
        assert!(sel.is_empty());
    }

    #[test]
    fn apply_range_is_idempotent() {
        let mut sel = SlotSelection::new();
        let range = [key("2024-01-15T09:00"), key("2024-01-15T09:30")];

        assert_eq!(sel.apply_range(range, SelectAction::Select), 2);
        assert_eq!(sel.apply_range(range, SelectAction::Select), 0);
        assert_eq!(sel.count(), 2);

        assert_eq!(sel.apply_range(range, SelectAction::Deselect), 2);
        assert_eq!(sel.apply_range(range, SelectAction::Deselect), 0);
        assert_eq!(sel.count(), 0);
    }

    #[test]
    fn count_tracks_net_toggles() {
        let mut sel = SlotSelection::new();
        let a = key("2024-01-15T09:00");
        let b = key("2024-01-15T09:30");
        let c = key("2024-01-16T10:00");

        sel.toggle(a);
        sel.toggle(b);
        sel.toggle(a);
        sel.toggle(c);
        sel.toggle(a);
        // a toggled 3x, b 1x, c 1x
        assert_eq!(sel.count(), 3);

        sel.clear_dates(&dates(&["2024-01-16"]));
        assert_eq!(sel.count(), 2);
        assert!(!sel.contains(&c));
    }

    #[test]
    fn drag_from_unselected_selects_everything_once() {
        let mut sel = SlotSelection::new();
        let cells = ["2024-01-15T09:00", "2024-01-15T09:30", "2024-01-15T10:00", "2024-01-15T10:30"];

        let mut drag = DragGesture::press(&mut sel, key(cells[0]));
        assert_eq!(drag.action(), SelectAction::Select);
        // pointer path B, C, B, D, C
        for s in [cells[1], cells[2], cells[1], cells[3], cells[2]] {
            drag.enter(&mut sel, key(s));
        }

        assert_eq!(drag.visited(), 4);
        assert!(cells.iter().all(|s| sel.contains(&key(s))));
        assert_eq!(sel.count(), 4);
    }

    #[test]
    fn drag_from_selected_deselects_and_leaves_unselected_alone() {
        let mut sel: SlotSelection = [key("2024-01-15T09:00"), key("2024-01-15T10:00")]
            .into_iter()
            .collect();

        let mut drag = DragGesture::press(&mut sel, key("2024-01-15T09:00"));
        assert_eq!(drag.action(), SelectAction::Deselect);
        drag.enter(&mut sel, key("2024-01-15T09:30"));
        drag.enter(&mut sel, key("2024-01-15T10:00"));

        assert!(sel.is_empty());
    }

    #[test]
    fn copy_week_unions_into_target() {
        let mut sel: SlotSelection = [
            key("2024-01-15T09:00"),
            key("2024-01-17T14:00"),
            key("2024-01-23T11:00"),
        ]
        .into_iter()
        .collect();
        let now = key("2024-01-10T12:00").naive();

        let added = sel.copy_week(date("2024-01-15"), date("2024-01-22"), 5, now);

        assert_eq!(added, 2);
        assert!(sel.contains(&key("2024-01-22T09:00")));
        assert!(sel.contains(&key("2024-01-24T14:00")));
        assert!(sel.contains(&key("2024-01-23T11:00")), "existing target kept");
        assert_eq!(sel.count(), 5);
    }

    #[test]
    fn copy_week_ignores_days_outside_the_visible_range() {
        let mut sel: SlotSelection = [key("2024-01-20T10:00")].into_iter().collect();
        let now = key("2024-01-10T12:00").naive();

        assert_eq!(sel.copy_week(date("2024-01-15"), date("2024-01-22"), 5, now), 0);
        assert_eq!(sel.copy_week(date("2024-01-15"), date("2024-01-22"), 7, now), 1);
        assert!(sel.contains(&key("2024-01-27T10:00")));
    }

    #[test]
    fn copy_week_skips_past_targets() {
        let mut sel: SlotSelection = [
            key("2024-01-08T09:00"),
            key("2024-01-08T16:00"),
            key("2024-01-09T09:00"),
        ]
        .into_iter()
        .collect();
        // Monday 2024-01-15 at noon
        let now = key("2024-01-15T12:00").naive();

        sel.copy_week(date("2024-01-08"), date("2024-01-15"), 5, now);

        assert!(!sel.contains(&key("2024-01-15T09:00")));
        assert!(sel.contains(&key("2024-01-15T16:00")));
        assert!(sel.contains(&key("2024-01-16T09:00")));
        assert!(
            sel.keys()
                .filter(|k| k.date() >= date("2024-01-15"))
                .all(|k| !is_past(k.minutes_from_midnight(), k.date(), now))
        );
    }

    #[test]
    fn clear_dates_only_touches_given_days() {
        let mut sel: SlotSelection = [
            key("2024-01-15T09:00"),
            key("2024-01-16T09:00"),
            key("2024-01-22T09:00"),
        ]
        .into_iter()
        .collect();

        let week = dates(&["2024-01-15", "2024-01-16", "2024-01-17", "2024-01-18", "2024-01-19"]);
        assert!(sel.has_any_on(&week));
        assert_eq!(sel.clear_dates(&week), 2);
        assert!(!sel.has_any_on(&week));
        assert!(sel.contains(&key("2024-01-22T09:00")));
    }
}
