use std::env;

use super::ConfigError;

const TIBBER_HOME_ID: &str = "TIBBER_HOME_ID";
const TIBBER_TOKEN: &str = "TIBBER_TOKEN";
const SONOS_REFRESH_TOKEN: &str = "SONOS_REFRESH_TOKEN";
const SONOS_CREDENTIALS: &str = "SONOS_CREDENTIALS";
const SONOS_HOUSEHOLD_ID: &str = "SONOS_HOUSEHOLD_ID";
const SONOS_GROUP_ID: &str = "SONOS_GROUP_ID";
const HOURLY_TRIGGER_RATE: &str = "HOURLY_TRIGGER_RATE";
// Older deployments still use the misspelled name
const LEGACY_HOURLY_TRIGGER_RATE: &str = "HOURLEY_TRIGGER_RATE";

// Values that only ever come from the environment
#[derive(Clone)]
pub struct Secrets {
    pub tibber_home_id: String,
    pub tibber_token: String,
    pub sonos_refresh_token: String,
    pub sonos_credentials: String,
    pub sonos_household_id: String,
    pub sonos_group_id: String,
    pub hourly_trigger_rate: f64,
}

impl Secrets {
    pub fn from_env() -> Result<Self, ConfigError> {
        Secrets::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::MissingVariable(name))
        };

        let (rate_name, rate) = match lookup(HOURLY_TRIGGER_RATE) {
            Some(value) => (HOURLY_TRIGGER_RATE, value),
            None => {
                let legacy = required(LEGACY_HOURLY_TRIGGER_RATE)
                    .map_err(|_| ConfigError::MissingVariable(HOURLY_TRIGGER_RATE))?;
                (LEGACY_HOURLY_TRIGGER_RATE, legacy)
            }
        };
        let hourly_trigger_rate = rate
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|rate| rate.is_finite())
            .ok_or(ConfigError::InvalidVariable {
                name: rate_name,
                value: rate.clone(),
            })?;

        Ok(Secrets {
            tibber_home_id: required(TIBBER_HOME_ID)?,
            tibber_token: required(TIBBER_TOKEN)?,
            sonos_refresh_token: required(SONOS_REFRESH_TOKEN)?,
            sonos_credentials: required(SONOS_CREDENTIALS)?,
            sonos_household_id: required(SONOS_HOUSEHOLD_ID)?,
            sonos_group_id: required(SONOS_GROUP_ID)?,
            hourly_trigger_rate,
        })
    }
}
