pub mod book;
pub mod edit;
pub mod new;
pub mod show;
pub mod week;

use anyhow::Result;
use slotlink_core::config::SlotlinkConfig;

/// Config for defaults only; a broken file should not block offline commands.
pub fn load_config() -> SlotlinkConfig {
    SlotlinkConfig::load()
        .inspect_err(|e| tracing::warn!(error = %e, "Using default configuration"))
        .unwrap_or_default()
}

pub fn parse_date(input: &str) -> Result<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("Invalid date \"{}\". Expected YYYY-MM-DD", input))
}
