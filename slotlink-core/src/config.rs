//! slotlink configuration.
//!
//! Read from `~/.config/slotlink/config.toml` and overridable with
//! `SLOTLINK__*` environment variables (`SLOTLINK__SERVER__PORT=9000`).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::calendar_week::WeekStartPolicy;
use crate::error::{SlotLinkError, SlotLinkResult};
use crate::mail::provider::DEFAULT_MAILER_TIMEOUT;
use crate::mail::{LogMailer, MailProvider, MailTransport};
use crate::organizer::GridSettings;
use crate::store::{FileScheduleStore, MemoryScheduleStore, ScheduleStore};
use crate::time_grid::DayWindow;

static DEFAULT_BASE_URL: &str = "http://localhost:8080/";
static DEFAULT_DAY_START: &str = "08:00";
static DEFAULT_DAY_END: &str = "19:00";
static DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_day_start() -> String {
    DEFAULT_DAY_START.to_string()
}

fn default_day_end() -> String {
    DEFAULT_DAY_END.to_string()
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_mail_timeout() -> String {
    humantime::format_duration(DEFAULT_MAILER_TIMEOUT).to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotlinkConfig {
    /// Page that booking and edit links point at.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_day_start")]
    pub day_start: String,

    #[serde(default = "default_day_end")]
    pub day_end: String,

    #[serde(default)]
    pub show_weekends: bool,

    #[serde(default)]
    pub week_start: WeekStartPolicy,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageMode {
    /// Links carry the whole schedule; nothing is stored.
    #[default]
    Token,
    Memory,
    File,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub mode: StorageMode,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Mailer binary suffix, e.g. "outbox" for `slotlink-mailer-outbox`.
    pub provider: Option<String>,
    #[serde(default = "default_mail_timeout")]
    pub timeout: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        MailConfig {
            provider: None,
            timeout: default_mail_timeout(),
        }
    }
}

impl Default for SlotlinkConfig {
    fn default() -> Self {
        SlotlinkConfig {
            base_url: default_base_url(),
            day_start: default_day_start(),
            day_end: default_day_end(),
            show_weekends: false,
            week_start: WeekStartPolicy::default(),
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            mail: MailConfig::default(),
        }
    }
}

impl SlotlinkConfig {
    pub fn config_path() -> SlotLinkResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SlotLinkError::Config("Could not determine config directory".into()))?
            .join("slotlink");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the user's config, writing a commented default file first if
    /// there is none.
    pub fn load() -> SlotLinkResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> SlotLinkResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("SLOTLINK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| SlotLinkError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| SlotLinkError::Config(e.to_string()))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> SlotLinkResult<()> {
        let contents = format!(
            "\
# slotlink configuration

# Page that booking and edit links point at:
# base_url = \"{DEFAULT_BASE_URL}\"

# Hours offered in the availability grid:
# day_start = \"{DEFAULT_DAY_START}\"
# day_end = \"{DEFAULT_DAY_END}\"

# Show Saturday and Sunday columns:
# show_weekends = false

# Week shown first: \"current\", or \"skip_weekend\" to open on next week
# when today is a hidden weekend day:
# week_start = \"current\"

# [server]
# host = \"{DEFAULT_HOST}\"
# port = {DEFAULT_PORT}

# Where schedules live: \"token\" (inside the link), \"memory\" or \"file\":
# [storage]
# mode = \"token\"
# path = \"~/.local/share/slotlink\"

# External mailer (slotlink-mailer-<provider>); without one, mail is only logged:
# [mail]
# provider = \"outbox\"
# timeout = \"10s\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SlotLinkError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| SlotLinkError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn day_window(&self) -> SlotLinkResult<DayWindow> {
        DayWindow::parse(&self.day_start, &self.day_end)
    }

    pub fn grid_settings(&self) -> SlotLinkResult<GridSettings> {
        Ok(GridSettings {
            window: self.day_window()?,
            show_weekends: self.show_weekends,
            week_start: self.week_start,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn mail_timeout(&self) -> SlotLinkResult<Duration> {
        humantime::parse_duration(self.mail.timeout.trim()).map_err(|e| {
            SlotLinkError::Config(format!("Invalid mail timeout '{}': {e}", self.mail.timeout))
        })
    }

    pub fn mail_transport(&self) -> SlotLinkResult<MailTransport> {
        match self.mail.provider.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(MailTransport::Provider(
                MailProvider::from_name(name).with_timeout(self.mail_timeout()?),
            )),
            _ => Ok(MailTransport::Log(LogMailer)),
        }
    }

    /// Storage directory with `~` expanded; defaults to the platform data
    /// directory.
    pub fn storage_path(&self) -> SlotLinkResult<PathBuf> {
        match &self.storage.path {
            Some(path) => Ok(PathBuf::from(
                shellexpand::tilde(&path.to_string_lossy()).into_owned(),
            )),
            None => dirs::data_dir()
                .map(|dir| dir.join("slotlink"))
                .ok_or_else(|| SlotLinkError::Config("Could not determine data directory".into())),
        }
    }

    pub fn open_store(&self) -> SlotLinkResult<Option<Arc<dyn ScheduleStore>>> {
        let store: Arc<dyn ScheduleStore> = match self.storage.mode {
            StorageMode::Token => return Ok(None),
            StorageMode::Memory => Arc::new(MemoryScheduleStore::new()),
            StorageMode::File => Arc::new(FileScheduleStore::open(self.storage_path()?)?),
        };
        Ok(Some(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SlotlinkConfig::load_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.day_window().unwrap(), DayWindow::default());
        assert_eq!(config.storage.mode, StorageMode::Token);
        assert_eq!(config.mail_timeout().unwrap(), Duration::from_secs(10));
        assert!(matches!(config.mail_transport().unwrap(), MailTransport::Log(_)));
    }

    #[test]
    fn default_file_is_all_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slotlink").join("config.toml");
        SlotlinkConfig::create_default_config(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(
            content
                .lines()
                .all(|l| l.is_empty() || l.starts_with('#'))
        );
        let config = SlotlinkConfig::load_from(&path).unwrap();
        assert_eq!(config.server_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn reads_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
base_url = "https://meet.example.com/schedule"
day_end = "23:00"
show_weekends = true
week_start = "skip_weekend"

[server]
port = 9000

[storage]
mode = "file"
path = "/var/lib/slotlink"

[mail]
provider = "outbox"
timeout = "3s"
"#,
        )
        .unwrap();

        let config = SlotlinkConfig::load_from(&path).unwrap();
        let grid = config.grid_settings().unwrap();
        assert_eq!(grid.window.end_minutes(), 23 * 60);
        assert!(grid.show_weekends);
        assert_eq!(grid.week_start, WeekStartPolicy::SkipWeekend);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage_path().unwrap(), PathBuf::from("/var/lib/slotlink"));
        assert_eq!(config.mail_timeout().unwrap(), Duration::from_secs(3));
        match config.mail_transport().unwrap() {
            MailTransport::Provider(p) => assert_eq!(p.name(), "outbox"),
            other => panic!("unexpected transport {other:?}"),
        }
    }

    #[test]
    fn bad_day_window_is_a_config_error() {
        let config = SlotlinkConfig {
            day_start: "19:00".into(),
            day_end: "08:00".into(),
            ..SlotlinkConfig::default()
        };
        assert!(config.grid_settings().is_err());
    }

    #[test]
    fn memory_storage_opens_a_store() {
        let config = SlotlinkConfig {
            storage: StorageConfig {
                mode: StorageMode::Memory,
                path: None,
            },
            ..SlotlinkConfig::default()
        };
        assert!(config.open_store().unwrap().is_some());
        assert!(SlotlinkConfig::default().open_store().unwrap().is_none());
    }
}
