use std::fmt;

use chessport_types::{config::TimestampConfig, game::GameRecord, Result};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

const DATE_FORMAT: &str = "%Y.%m.%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Date/time tag pairs, most specific first. The first complete pair is rewritten.
const TAG_PAIRS: [(&str, &str); 2] = [("UTCDate", "UTCTime"), ("Date", "Time")];

/// A timezone the adjuster can read wall times from or write them into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Zone {
    Local,
    Fixed(FixedOffset),
    Named(Tz),
}

impl Zone {
    fn to_utc(&self, wall: &NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            Zone::Local => localize(&Local, wall),
            Zone::Fixed(offset) => localize(offset, wall),
            Zone::Named(tz) => localize(tz, wall),
        }
    }

    fn wall_time(&self, instant: &DateTime<Utc>) -> NaiveDateTime {
        match self {
            Zone::Local => instant.with_timezone(&Local).naive_local(),
            Zone::Fixed(offset) => instant.with_timezone(offset).naive_local(),
            Zone::Named(tz) => instant.with_timezone(tz).naive_local(),
        }
    }
}

fn localize<Z: TimeZone>(zone: &Z, wall: &NaiveDateTime) -> Option<DateTime<Utc>> {
    zone.from_local_datetime(wall)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingTags,
    Malformed(String),
    /// The wall time falls into a DST gap of the reference zone.
    NonexistentTime(NaiveDateTime),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingTags => f.write_str("no date/time tags"),
            SkipReason::Malformed(detail) => write!(f, "malformed date/time: {detail}"),
            SkipReason::NonexistentTime(wall) => {
                write!(f, "{wall} does not exist in the reference timezone")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Adjustment {
    Converted {
        from: NaiveDateTime,
        to: NaiveDateTime,
    },
    Skipped(SkipReason),
}

/// Rewrites a game's date/time tags from the archive's zone into another zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimestampAdjuster {
    reference: Zone,
    target: Zone,
}

impl TimestampAdjuster {
    pub fn new(reference: Zone, target: Zone) -> Self {
        Self { reference, target }
    }

    /// Reference zone from config, target is the configured zone or the local one.
    pub fn from_config(config: &TimestampConfig) -> Result<Self> {
        let reference = Zone::Named(config.reference_zone()?);
        let target = config
            .target_zone()?
            .map(Zone::Named)
            .unwrap_or(Zone::Local);
        Ok(Self::new(reference, target))
    }

    pub fn inverse(&self) -> Self {
        Self::new(self.target, self.reference)
    }

    pub fn adjust(&self, game: &mut GameRecord) -> Adjustment {
        let outcome = self.try_adjust(game);
        match &outcome {
            Adjustment::Converted { from, to } => {
                debug!("Adjusted game timestamp {} -> {}", from, to)
            }
            Adjustment::Skipped(reason) => {
                warn!("Leaving timestamp of {} unchanged: {}", game.describe(), reason)
            }
        }
        outcome
    }

    fn try_adjust(&self, game: &mut GameRecord) -> Adjustment {
        let Some((date_tag, time_tag, date, time)) = TAG_PAIRS.iter().find_map(|(d, t)| {
            Some((*d, *t, game.tag(d)?.to_string(), game.tag(t)?.to_string()))
        }) else {
            return Adjustment::Skipped(SkipReason::MissingTags);
        };

        let wall = match parse_wall_time(&date, &time) {
            Ok(wall) => wall,
            Err(reason) => return Adjustment::Skipped(reason),
        };
        let Some(instant) = self.reference.to_utc(&wall) else {
            return Adjustment::Skipped(SkipReason::NonexistentTime(wall));
        };
        let shifted = self.target.wall_time(&instant);

        game.set_tag(date_tag, &shifted.format(DATE_FORMAT).to_string());
        game.set_tag(time_tag, &shifted.format(TIME_FORMAT).to_string());
        Adjustment::Converted {
            from: wall,
            to: shifted,
        }
    }
}

fn parse_wall_time(date: &str, time: &str) -> std::result::Result<NaiveDateTime, SkipReason> {
    let date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
        .map_err(|err| SkipReason::Malformed(format!("date '{date}': {err}")))?;
    let time = NaiveTime::parse_from_str(time.trim(), TIME_FORMAT)
        .map_err(|err| SkipReason::Malformed(format!("time '{time}': {err}")))?;
    Ok(date.and_time(time))
}
