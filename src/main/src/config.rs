use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use time::UtcOffset;

use crate::playback::{ActionPlan, FailurePolicy};
use crate::speaker::{SonosCredentials, SonosSettings};

mod secrets;

pub use secrets::Secrets;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingVariable(&'static str),

    #[error("environment variable {name} has invalid value {value:?}")]
    InvalidVariable { name: &'static str, value: String },

    #[error("invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}

#[toml_cfg::toml_config]
#[derive(Copy, Clone, Debug)]
pub struct TomlConfig {
    #[default(2)]
    sample_count: usize,
    #[default(10)]
    sample_interval_secs: u64,
    #[default(60)]
    telemetry_read_timeout_secs: u64,
    #[default(30)]
    cooldown_minutes: u64,
    #[default(0)]
    quiet_hours_utc_offset: i8,

    #[default(45)]
    hold_secs: u64,
    #[default(33)]
    volume: u8,
    #[default("0")]
    playlist_id: &'static str,
    #[default(10)]
    request_timeout_secs: u64,
    #[default("continue")]
    actuator_failure_policy: &'static str,

    #[default("./config.json")]
    state_path: &'static str,
    #[default("./tibber-monitor.log")]
    log_path: &'static str,

    #[default("wss://api.tibber.com/v1-beta/gql/subscriptions")]
    telemetry_url: &'static str,
    #[default("https://api.sonos.com")]
    sonos_auth_url: &'static str,
    #[default("https://api.ws.sonos.com/control/api/v1")]
    sonos_control_url: &'static str,
}

pub struct Config {
    pub sample_count: usize,
    pub sample_interval: time::Duration,
    pub telemetry_read_timeout: Duration,
    pub telemetry_url: String,
    pub cooldown: time::Duration,
    pub quiet_hours_offset: UtcOffset,
    pub state_path: PathBuf,
    // Log to stderr when unset
    pub log_path: Option<PathBuf>,
    pub plan: ActionPlan,
    pub sonos: SonosSettings,
    pub secrets: Secrets,
}

impl Config {
    pub fn read() -> Result<Self, ConfigError> {
        Config::new(TOML_CONFIG, Secrets::from_env()?)
    }

    pub fn new(config: TomlConfig, secrets: Secrets) -> Result<Self, ConfigError> {
        if config.sample_count < 2 {
            return Err(ConfigError::InvalidSetting {
                name: "sample_count",
                reason: format!("at least 2 samples are needed, got {}", config.sample_count),
            });
        }
        if config.sample_interval_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "sample_interval_secs",
                reason: "must be positive".to_string(),
            });
        }
        if config.volume > 100 {
            return Err(ConfigError::InvalidSetting {
                name: "volume",
                reason: format!("{} is above 100", config.volume),
            });
        }

        let quiet_hours_offset = UtcOffset::from_hms(config.quiet_hours_utc_offset, 0, 0)
            .map_err(|e| ConfigError::InvalidSetting {
                name: "quiet_hours_utc_offset",
                reason: e.to_string(),
            })?;
        let on_failure = config
            .actuator_failure_policy
            .parse::<FailurePolicy>()
            .map_err(|reason| ConfigError::InvalidSetting {
                name: "actuator_failure_policy",
                reason,
            })?;

        let log_path = match config.log_path.trim() {
            "" => None,
            path => Some(PathBuf::from(path)),
        };

        Ok(Config {
            sample_count: config.sample_count,
            sample_interval: time::Duration::seconds(config.sample_interval_secs as i64),
            telemetry_read_timeout: Duration::from_secs(config.telemetry_read_timeout_secs),
            telemetry_url: config.telemetry_url.to_string(),
            cooldown: time::Duration::minutes(config.cooldown_minutes as i64),
            quiet_hours_offset,
            state_path: PathBuf::from(config.state_path),
            log_path,
            plan: ActionPlan {
                playlist_id: config.playlist_id.to_string(),
                volume: config.volume,
                hold: Duration::from_secs(config.hold_secs),
                on_failure,
            },
            sonos: SonosSettings {
                auth_url: config.sonos_auth_url.to_string(),
                control_url: config.sonos_control_url.to_string(),
                request_timeout: Duration::from_secs(config.request_timeout_secs),
            },
            secrets,
        })
    }

    pub fn sonos_credentials(&self) -> SonosCredentials {
        SonosCredentials {
            refresh_token: self.secrets.sonos_refresh_token.clone(),
            credentials: self.secrets.sonos_credentials.clone(),
            household_id: self.secrets.sonos_household_id.clone(),
            group_id: self.secrets.sonos_group_id.clone(),
        }
    }
}
