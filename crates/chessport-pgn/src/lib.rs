//! PGN handling: splitting archives into games, filtering by time control,
//! and shifting recorded timestamps between timezones.

pub mod filter;
pub mod split;
pub mod timestamp;

pub use filter::{filter_games, tally_classes};
pub use split::{parse_games, split_games, Games};
pub use timestamp::{Adjustment, SkipReason, TimestampAdjuster, Zone};

