//! Shared domain types for the chessport workspace.

pub mod config;
pub mod events;
pub mod game;
pub mod month;
pub mod report;
pub mod run;
pub mod time_control;

mod errors;

pub use errors::{ChessportError, Result};
