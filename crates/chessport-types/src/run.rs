use std::{env, fmt};

use serde::{Deserialize, Serialize};

use crate::{month::YearMonth, time_control::FilterSet, ChessportError, Result};

/// Bearer token for the destination service. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ChessportError::Configuration(
                "destination token must not be empty".into(),
            ));
        }
        Ok(Self(token.trim().to_string()))
    }

    pub fn from_env(var: &str) -> Result<Self> {
        match env::var(var) {
            Ok(value) => Self::new(value).map_err(|_| {
                ChessportError::Configuration(format!("environment variable {var} is empty"))
            }),
            Err(_) => Err(ChessportError::Configuration(format!(
                "environment variable {var} must be set to a lichess API token"
            ))),
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Everything one invocation needs, fixed before the first request.
#[derive(Debug, Clone)]
pub struct RunConfiguration {
    pub username: String,
    pub credential: Credential,
    pub filter: FilterSet,
    pub convert_timezone: bool,
    pub verbose: bool,
    pub months: Vec<YearMonth>,
}

impl RunConfiguration {
    pub fn validate(&self) -> Result<()> {
        let name = self.username.trim();
        if name.is_empty() {
            return Err(ChessportError::Configuration(
                "username must not be empty".into(),
            ));
        }
        if name.contains(['/', '?', '#']) || name.chars().any(char::is_whitespace) {
            return Err(ChessportError::Configuration(format!(
                "'{}' is not a valid chess.com username",
                self.username
            )));
        }
        Ok(())
    }
}

/// Compact summary of the run settings for the first progress line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub username: String,
    pub months: Vec<YearMonth>,
    pub filter: String,
    pub convert_timezone: bool,
}

impl From<&RunConfiguration> for RunSummary {
    fn from(config: &RunConfiguration) -> Self {
        Self {
            username: config.username.clone(),
            months: config.months.clone(),
            filter: config.filter.to_string(),
            convert_timezone: config.convert_timezone,
        }
    }
}
