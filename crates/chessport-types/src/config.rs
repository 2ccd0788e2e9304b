use std::{fs, path::Path};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{ChessportError, Result};

pub const DEFAULT_MIN_INTERVAL_MS: u64 = 7_500;
pub const DEFAULT_TOKEN_ENV: &str = "LICHESS_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.chess.com".into(),
            user_agent: concat!("chessport/", env!("CARGO_PKG_VERSION")).into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    pub base_url: String,
    pub token_env: String,
    pub timeout_secs: u64,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://lichess.org".into(),
            token_env: DEFAULT_TOKEN_ENV.into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    pub min_interval_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: DEFAULT_MIN_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimestampConfig {
    /// Zone the archive writes its date/time tags in.
    pub reference_timezone: String,
    /// IANA zone to convert into; the machine's local zone when unset.
    pub target_timezone: Option<String>,
}

impl Default for TimestampConfig {
    fn default() -> Self {
        Self {
            reference_timezone: "UTC".into(),
            target_timezone: None,
        }
    }
}

impl TimestampConfig {
    pub fn reference_zone(&self) -> Result<Tz> {
        parse_zone("timestamps.reference_timezone", &self.reference_timezone)
    }

    pub fn target_zone(&self) -> Result<Option<Tz>> {
        self.target_timezone
            .as_deref()
            .map(|name| parse_zone("timestamps.target_timezone", name))
            .transpose()
    }
}

fn parse_zone(field: &str, name: &str) -> Result<Tz> {
    name.parse::<Tz>().map_err(|err| {
        ChessportError::Configuration(format!("{field} '{name}' is not a known timezone: {err}"))
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpsConfig {
    pub log_level: String,
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChessportConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub destination: DestinationConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub timestamps: TimestampConfig,
    #[serde(default)]
    pub ops: OpsConfig,
}

impl ChessportConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref).map_err(|err| {
            ChessportError::Configuration(format!(
                "unable to read config file {}: {err}",
                path_ref.display()
            ))
        })?;
        toml::from_str(&contents).map_err(|err| {
            ChessportError::Configuration(format!(
                "failed to parse config file {}: {err}",
                path_ref.display()
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.source.base_url.trim().is_empty() {
            return Err(ChessportError::Configuration(
                "source.base_url must not be empty".into(),
            ));
        }
        if self.destination.base_url.trim().is_empty() {
            return Err(ChessportError::Configuration(
                "destination.base_url must not be empty".into(),
            ));
        }
        if self.source.timeout_secs == 0 || self.destination.timeout_secs == 0 {
            return Err(ChessportError::Configuration(
                "timeout_secs must be greater than zero".into(),
            ));
        }
        if self.destination.token_env.trim().is_empty() {
            return Err(ChessportError::Configuration(
                "destination.token_env must name an environment variable".into(),
            ));
        }
        if self.pacing.min_interval_ms == 0 {
            return Err(ChessportError::Configuration(
                "pacing.min_interval_ms must be greater than zero".into(),
            ));
        }
        self.timestamps.reference_zone()?;
        self.timestamps.target_zone()?;
        Ok(())
    }
}
