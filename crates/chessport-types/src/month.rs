use std::{fmt, str::FromStr};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{ChessportError, Result};

/// A calendar month as addressed by the archive API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(ChessportError::Configuration(format!(
                "month must be between 01 and 12, got {month}"
            )));
        }
        Ok(Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn succ(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}/{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = ChessportError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || {
            ChessportError::Configuration(format!("expected a month as YYYY/MM, got '{s}'"))
        };
        let (year, month) = s.trim().split_once('/').ok_or_else(invalid)?;
        let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if year.len() != 4 || !digits(year) || !(1..=2).contains(&month.len()) || !digits(month) {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        YearMonth::new(year, month)
    }
}

/// Which months a run covers, as requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonthSelector {
    Current,
    Single(YearMonth),
    Range { start: YearMonth, end: YearMonth },
}

impl MonthSelector {
    /// Expands the selector into ascending months. `today` decides the current month.
    /// A range whose start is after its end covers no months.
    pub fn resolve(&self, today: NaiveDate) -> Vec<YearMonth> {
        match *self {
            MonthSelector::Current => vec![YearMonth::containing(today)],
            MonthSelector::Single(month) => vec![month],
            MonthSelector::Range { start, end } => {
                let mut months = Vec::new();
                let mut cursor = start;
                while cursor <= end {
                    months.push(cursor);
                    cursor = cursor.succ();
                }
                months
            }
        }
    }
}
