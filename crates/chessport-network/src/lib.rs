//! HTTP access to the source archive and the destination import API, plus
//! the pacing that keeps submissions under the destination's rate limit.

pub mod archive;
pub mod import;
pub mod pacing;

#[cfg(test)]
mod test_server;

pub use archive::{ArchiveSource, ChessComArchive};
pub use import::{DryRunImporter, GameImporter, ImportReceipt, ImportSubmitter, LichessImporter};
pub use pacing::{Clock, ManualClock, Pacer, TokioClock};

use chessport_types::ChessportError;

pub fn archive_error(message: impl Into<String>) -> ChessportError {
    ChessportError::Archive(message.into())
}

pub fn import_error(message: impl Into<String>) -> ChessportError {
    ChessportError::Import(message.into())
}

/// First `max_chars` characters of a response body, on one line.
pub(crate) fn excerpt(body: &str, max_chars: usize) -> String {
    let flat = body.trim().replace(['\r', '\n'], " ");
    match flat.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}
