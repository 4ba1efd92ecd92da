use crate::global;
use crate::platform::PlatformId;
use crate::session::{AutomaticLeave, SessionConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bot: BotConfig,
    pub automatic_leave: AutomaticLeaveConfig,
    pub callback: CallbackConfig,
    pub hook: HookConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub platform: PlatformId,
    pub meeting_url: Option<String>,
    pub bot_name: String,
    /// Identifier the bot manager uses for this bot, echoed in callbacks.
    pub connection_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomaticLeaveConfig {
    pub waiting_room_timeout_ms: u64,
    pub no_one_joined_timeout_ms: u64,
    pub everyone_left_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackConfig {
    /// Base URL of the bot manager; `/started` and `/exited` are appended.
    pub url: Option<String>,
    pub timeout_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    /// Shell command to run after the session terminates.
    /// Receives the session exit as JSON via stdin.
    /// Env vars: MEETING_BOT_SESSION_ID, MEETING_BOT_PLATFORM,
    /// MEETING_BOT_MEETING_URL, MEETING_BOT_EXIT_CODE, MEETING_BOT_REASON
    pub post_command: String,
    /// Timeout in seconds for the post_command (default: 300)
    pub timeout_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            platform: PlatformId::GoogleMeet,
            meeting_url: None,
            bot_name: "Meeting Bot".to_string(),
            connection_id: None,
        }
    }
}

impl Default for AutomaticLeaveConfig {
    fn default() -> Self {
        Self {
            waiting_room_timeout_ms: 300_000,
            no_one_joined_timeout_ms: 120_000,
            everyone_left_timeout_ms: 60_000,
        }
    }
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_seconds: 10,
        }
    }
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            post_command: String::new(),
            timeout_seconds: 300,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 3838,
        }
    }
}

impl From<&AutomaticLeaveConfig> for AutomaticLeave {
    fn from(config: &AutomaticLeaveConfig) -> Self {
        Self {
            waiting_room_timeout: Duration::from_millis(config.waiting_room_timeout_ms),
            no_one_joined_timeout: Duration::from_millis(config.no_one_joined_timeout_ms),
            everyone_left_timeout: Duration::from_millis(config.everyone_left_timeout_ms),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from `config_path`, writing defaults there if it does not exist.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Build the immutable per-session config.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(
            self.bot.platform,
            self.bot.meeting_url.clone().unwrap_or_default(),
        )
        .with_bot_name(self.bot.bot_name.clone())
        .with_connection_id(self.bot.connection_id.clone())
        .with_automatic_leave(AutomaticLeave::from(&self.automatic_leave))
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}
