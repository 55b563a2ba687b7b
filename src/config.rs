use crate::domain::Decimal;
use crate::engine::RollupPolicy;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// JSON array of deals preloaded at startup.
    pub seed_path: Option<PathBuf>,
    /// Projected invalid rate, in percent, above which previews raise a warning.
    pub invalid_threshold_pct: Decimal,
    /// Fallback conversion fraction for rollup lines without reported FTDs.
    pub conversion_rate: Decimal,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            seed_path: None,
            invalid_threshold_pct: Decimal::from_count(8),
            conversion_rate: RollupPolicy::default().conversion_rate,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let port = match env_map.get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?,
            None => defaults.port,
        };

        let seed_path = env_map
            .get("SEED_PATH")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let invalid_threshold_pct = match env_map.get("INVALID_THRESHOLD_PCT") {
            Some(raw) => {
                let pct = parse_decimal("INVALID_THRESHOLD_PCT", raw)?;
                if pct.is_negative() || pct > Decimal::hundred() {
                    return Err(ConfigError::InvalidValue(
                        "INVALID_THRESHOLD_PCT".to_string(),
                        format!("must be between 0 and 100, got {}", pct),
                    ));
                }
                pct
            }
            None => defaults.invalid_threshold_pct,
        };

        let conversion_rate = match env_map.get("CONVERSION_RATE") {
            Some(raw) => {
                let rate = parse_decimal("CONVERSION_RATE", raw)?;
                if rate.is_negative() || rate > Decimal::one() {
                    return Err(ConfigError::InvalidValue(
                        "CONVERSION_RATE".to_string(),
                        format!("must be between 0 and 1, got {}", rate),
                    ));
                }
                rate
            }
            None => defaults.conversion_rate,
        };

        Ok(Config {
            port,
            seed_path,
            invalid_threshold_pct,
            conversion_rate,
        })
    }

    pub fn rollup_policy(&self) -> RollupPolicy {
        RollupPolicy {
            conversion_rate: self.conversion_rate,
        }
    }
}

fn parse_decimal(name: &str, raw: &str) -> Result<Decimal, ConfigError> {
    Decimal::from_str_canonical(raw.trim()).map_err(|_| {
        ConfigError::InvalidValue(name.to_string(), format!("must be a decimal, got {}", raw))
    })
}
