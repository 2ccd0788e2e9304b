use std::path::{Path, PathBuf};

use chessport_types::{
    config::ChessportConfig,
    month::{MonthSelector, YearMonth},
    run::{Credential, RunConfiguration},
    time_control::FilterSet,
    ChessportError, Result,
};
use chrono::NaiveDate;
use clap::{ArgGroup, Parser};

/// Import chess.com games into a lichess.org account.
///
/// The lichess API token is read from the LICHESS_TOKEN environment variable.
#[derive(Parser, Debug)]
#[command(name = "chessport", version)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["current", "month", "range"])
))]
pub struct Cli {
    /// chess.com username whose games are imported
    pub username: String,

    /// Show the number of games and import progress
    #[arg(short, long)]
    pub verbose: bool,

    /// Only import these game types (bullet, blitz, rapid, daily), space separated
    #[arg(short, long, num_args = 0.., value_name = "TYPE")]
    pub filter: Option<Vec<String>>,

    /// Keep the archive's UTC timestamps instead of converting to local time
    #[arg(short, long)]
    pub utc: bool,

    /// Import games from the current month
    #[arg(short, long)]
    pub current: bool,

    /// Import games from the given month
    #[arg(short, long, value_name = "YYYY/MM")]
    pub month: Option<YearMonth>,

    /// Import games from every month in the inclusive range
    #[arg(short, long, num_args = 2, value_names = ["START", "END"])]
    pub range: Option<Vec<YearMonth>>,

    /// TOML configuration file
    #[arg(long, env = "CHESSPORT_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Fetch and filter but do not submit anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Write the run's progress events to this file as JSON lines
    #[arg(long, value_name = "PATH")]
    pub events: Option<PathBuf>,
}

impl Cli {
    pub fn selector(&self) -> Result<MonthSelector> {
        match (self.month, self.range.as_deref()) {
            (Some(month), _) => Ok(MonthSelector::Single(month)),
            (None, Some([start, end])) => Ok(MonthSelector::Range {
                start: *start,
                end: *end,
            }),
            (None, Some(_)) => Err(ChessportError::Configuration(
                "--range takes exactly two months".into(),
            )),
            (None, None) => Ok(MonthSelector::Current),
        }
    }

    pub fn filter_set(&self) -> Result<FilterSet> {
        FilterSet::from_names(self.filter.iter().flatten())
    }

    /// Resolves everything the run needs; fails before any network access.
    pub fn run_configuration(
        &self,
        config: &ChessportConfig,
        today: NaiveDate,
    ) -> Result<RunConfiguration> {
        let credential = Credential::from_env(&config.destination.token_env)?;
        let run = RunConfiguration {
            username: self.username.trim().to_string(),
            credential,
            filter: self.filter_set()?,
            convert_timezone: !self.utc,
            verbose: self.verbose,
            months: self.selector()?.resolve(today),
        };
        run.validate()?;
        Ok(run)
    }
}

/// Explicit config paths must load; without one the built-in defaults apply.
pub fn load_config(path: Option<&Path>) -> Result<ChessportConfig> {
    let config = match path {
        Some(path) => ChessportConfig::from_file(path)?,
        None => ChessportConfig::default(),
    };
    config.validate()?;
    Ok(config)
}
