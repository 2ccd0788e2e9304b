use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{game::GameRecord, ChessportError, Result};

/// Pace category of a game as shown on the source site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeClass {
    Bullet,
    Blitz,
    Rapid,
    Daily,
}

impl TimeClass {
    pub const ALL: [TimeClass; 4] = [
        TimeClass::Bullet,
        TimeClass::Blitz,
        TimeClass::Rapid,
        TimeClass::Daily,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TimeClass::Bullet => "bullet",
            TimeClass::Blitz => "blitz",
            TimeClass::Rapid => "rapid",
            TimeClass::Daily => "daily",
        }
    }
}

impl fmt::Display for TimeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeClass {
    type Err = ChessportError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        TimeClass::ALL
            .into_iter()
            .find(|class| class.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                ChessportError::Configuration(format!(
                    "unknown time-control category '{s}' (expected bullet, blitz, rapid or daily)"
                ))
            })
    }
}

/// Parsed value of a PGN `TimeControl` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeControl {
    /// Live game: base seconds plus per-move increment.
    Live { base_secs: u32, increment_secs: u32 },
    /// Correspondence game, e.g. `1/86400`.
    Correspondence { moves: u32, secs_per_period: u32 },
}

impl TimeControl {
    /// Moves assumed when folding the increment into an estimated duration.
    pub const ESTIMATED_MOVES: u32 = 40;
    pub const BULLET_LIMIT_SECS: u32 = 180;
    pub const BLITZ_LIMIT_SECS: u32 = 600;

    pub fn estimated_secs(&self) -> Option<u32> {
        match self {
            TimeControl::Live {
                base_secs,
                increment_secs,
            } => Some(base_secs.saturating_add(increment_secs.saturating_mul(Self::ESTIMATED_MOVES))),
            TimeControl::Correspondence { .. } => None,
        }
    }

    pub fn class(&self) -> TimeClass {
        match self.estimated_secs() {
            None => TimeClass::Daily,
            Some(secs) if secs < Self::BULLET_LIMIT_SECS => TimeClass::Bullet,
            Some(secs) if secs < Self::BLITZ_LIMIT_SECS => TimeClass::Blitz,
            Some(_) => TimeClass::Rapid,
        }
    }
}

impl FromStr for TimeControl {
    type Err = ChessportError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim();
        let invalid = || ChessportError::Pgn(format!("unrecognised time control '{raw}'"));
        let number = |part: &str| part.trim().parse::<u32>().map_err(|_| invalid());

        if let Some((moves, period)) = raw.split_once('/') {
            return Ok(TimeControl::Correspondence {
                moves: number(moves)?,
                secs_per_period: number(period)?,
            });
        }

        let (base, increment) = match raw.split_once('+') {
            Some((base, increment)) => (number(base)?, number(increment)?),
            None => (number(raw)?, 0),
        };
        Ok(TimeControl::Live {
            base_secs: base,
            increment_secs: increment,
        })
    }
}

/// Set of categories a run is restricted to. Empty admits everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    classes: BTreeSet<TimeClass>,
}

impl FilterSet {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let classes = names
            .into_iter()
            .map(|name| name.as_ref().parse::<TimeClass>())
            .collect::<Result<BTreeSet<_>>>()?;
        Ok(Self { classes })
    }

    pub fn is_active(&self) -> bool {
        !self.classes.is_empty()
    }

    pub fn classes(&self) -> impl Iterator<Item = TimeClass> + '_ {
        self.classes.iter().copied()
    }

    /// Records without a readable time control only pass an inactive filter.
    pub fn admits(&self, game: &GameRecord) -> bool {
        if !self.is_active() {
            return true;
        }
        game.time_class()
            .map(|class| self.classes.contains(&class))
            .unwrap_or(false)
    }
}

impl fmt::Display for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_active() {
            return f.write_str("all");
        }
        let names: Vec<&str> = self.classes.iter().map(|class| class.as_str()).collect();
        f.write_str(&names.join(", "))
    }
}
