/// Player configuration
use crate::error::{Result, SyncError};
use onair_engine::AdapterConfig;
use onair_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Prefix for environment overrides, e.g. `ONAIR_SYNC__POLL_INTERVAL_MS`
pub const ENV_PREFIX: &str = "ONAIR";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct PlayerConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub sync: SyncSettings,
}

/// Readiness probe settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineSettings {
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(default = "default_max_init_attempts")]
    pub max_init_attempts: u32,
}

/// Glue timings and behavior toggles
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SyncSettings {
    #[serde(default = "default_auto_advance")]
    pub auto_advance: bool,

    #[serde(default = "default_play_pause_debounce_ms")]
    pub play_pause_debounce_ms: u64,

    #[serde(default = "default_command_debounce_ms")]
    pub mute_debounce_ms: u64,

    #[serde(default = "default_command_debounce_ms")]
    pub volume_debounce_ms: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_autoplay_delay_ms")]
    pub autoplay_delay_ms: u64,

    #[serde(default = "default_recovery_delay_ms")]
    pub recovery_delay_ms: u64,

    #[serde(default = "default_max_recovery_remounts")]
    pub max_recovery_remounts: u32,
}

impl PlayerConfig {
    /// Load configuration from an optional file and the environment
    ///
    /// A path that is given must exist. Environment variables prefixed with
    /// `ONAIR_` override file values; nested keys use `__`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env_prefix(path, ENV_PREFIX)
    }

    fn load_with_env_prefix(path: Option<&Path>, prefix: &str) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(SyncError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            settings = settings.add_source(config::File::from(path));
        }

        settings = settings.add_source(
            config::Environment::with_prefix(prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.playback.history_size == 0 {
            return Err(SyncError::Config(
                "playback.history_size must be at least 1".to_string(),
            ));
        }

        if self.playback.volume > 100 {
            return Err(SyncError::Config(format!(
                "playback.volume must be 0-100, got {}",
                self.playback.volume
            )));
        }

        if !self.playback.history_walk_threshold_secs.is_finite()
            || self.playback.history_walk_threshold_secs < 0.0
        {
            return Err(SyncError::Config(
                "playback.history_walk_threshold_secs must be a non-negative number".to_string(),
            ));
        }

        if self.engine.max_init_attempts == 0 {
            return Err(SyncError::Config(
                "engine.max_init_attempts must be at least 1".to_string(),
            ));
        }

        if self.sync.poll_interval_ms == 0 {
            return Err(SyncError::Config(
                "sync.poll_interval_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn adapter_config(&self) -> AdapterConfig {
        AdapterConfig {
            settle_delay: Duration::from_millis(self.engine.settle_delay_ms),
            retry_backoff: Duration::from_millis(self.engine.retry_backoff_ms),
            max_init_attempts: self.engine.max_init_attempts,
        }
    }
}

impl SyncSettings {
    pub fn play_pause_debounce(&self) -> Duration {
        Duration::from_millis(self.play_pause_debounce_ms)
    }

    pub fn mute_debounce(&self) -> Duration {
        Duration::from_millis(self.mute_debounce_ms)
    }

    pub fn volume_debounce(&self) -> Duration {
        Duration::from_millis(self.volume_debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn autoplay_delay(&self) -> Duration {
        Duration::from_millis(self.autoplay_delay_ms)
    }

    pub fn recovery_delay(&self) -> Duration {
        Duration::from_millis(self.recovery_delay_ms)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_init_attempts: default_max_init_attempts(),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            auto_advance: default_auto_advance(),
            play_pause_debounce_ms: default_play_pause_debounce_ms(),
            mute_debounce_ms: default_command_debounce_ms(),
            volume_debounce_ms: default_command_debounce_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            autoplay_delay_ms: default_autoplay_delay_ms(),
            recovery_delay_ms: default_recovery_delay_ms(),
            max_recovery_remounts: default_max_recovery_remounts(),
        }
    }
}

// Default values
fn default_settle_delay_ms() -> u64 {
    500
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_max_init_attempts() -> u32 {
    3
}

fn default_auto_advance() -> bool {
    true
}

fn default_play_pause_debounce_ms() -> u64 {
    500
}

fn default_command_debounce_ms() -> u64 {
    200
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_autoplay_delay_ms() -> u64 {
    200
}

fn default_recovery_delay_ms() -> u64 {
    5000
}

fn default_max_recovery_remounts() -> u32 {
    1
}
