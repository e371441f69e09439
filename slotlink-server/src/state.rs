use std::sync::Arc;

use anyhow::Result;
use slotlink_core::config::SlotlinkConfig;
use slotlink_core::mail::Mailer;
use slotlink_core::organizer::GridSettings;
use slotlink_core::store::{ScheduleResolver, ScheduleStore};

/// Shared application state
pub struct AppState<M> {
    pub config: Arc<SlotlinkConfig>,
    pub grid: GridSettings,
    pub mailer: Arc<M>,
    /// `None` when links carry the whole schedule.
    pub store: Option<Arc<dyn ScheduleStore>>,
}

// Derived Clone would require M: Clone.
impl<M> Clone for AppState<M> {
    fn clone(&self) -> Self {
        AppState {
            config: Arc::clone(&self.config),
            grid: self.grid,
            mailer: Arc::clone(&self.mailer),
            store: self.store.clone(),
        }
    }
}

impl<M: Mailer> AppState<M> {
    pub fn new(
        config: SlotlinkConfig,
        mailer: M,
        store: Option<Arc<dyn ScheduleStore>>,
    ) -> Result<Self> {
        let grid = config.grid_settings()?;
        Ok(AppState {
            config: Arc::new(config),
            grid,
            mailer: Arc::new(mailer),
            store,
        })
    }

    pub fn resolver(&self) -> ScheduleResolver<'_> {
        ScheduleResolver::new(self.store.as_deref())
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }
}
