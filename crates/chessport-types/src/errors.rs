use thiserror::Error;

pub type Result<T, E = ChessportError> = std::result::Result<T, E>;

/// Unified error type covering common failure scenarios across subsystems.
#[derive(Debug, Error)]
pub enum ChessportError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("archive error: {0}")]
    Archive(String),
    #[error("import error: {0}")]
    Import(String),
    #[error("rate limited by destination: {0}")]
    RateLimited(String),
    #[error("pgn error: {0}")]
    Pgn(String),
    #[error("orchestrator error: {0}")]
    Orchestrator(String),
    #[error("operational error: {0}")]
    Ops(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

