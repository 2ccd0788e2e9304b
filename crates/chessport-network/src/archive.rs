use std::time::Duration;

use async_trait::async_trait;
use chessport_types::{config::SourceConfig, month::YearMonth, Result};
use reqwest::{header, Client};
use tracing::{debug, info};

use crate::{archive_error, excerpt};

#[async_trait]
pub trait ArchiveSource: Send + Sync {
    /// Raw multi-game PGN for one user and month. Empty when no games were played.
    async fn fetch_month(&self, username: &str, month: YearMonth) -> Result<String>;
}

/// Reads the chess.com public monthly PGN archive.
pub struct ChessComArchive {
    client: Client,
    base_url: String,
}

impl ChessComArchive {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|err| archive_error(format!("failed to create HTTP client: {err}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn archive_url(&self, username: &str, month: YearMonth) -> String {
        format!(
            "{}/pub/player/{}/games/{:04}/{:02}/pgn",
            self.base_url,
            username.trim().to_lowercase(),
            month.year,
            month.month
        )
    }
}

#[async_trait]
impl ArchiveSource for ChessComArchive {
    async fn fetch_month(&self, username: &str, month: YearMonth) -> Result<String> {
        let url = self.archive_url(username, month);
        info!("Fetching {} archive for {}", month, username);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/x-chess-pgn")
            .send()
            .await
            .map_err(|err| {
                archive_error(format!(
                    "could not reach the archive for {username} {month}: {err}"
                ))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|err| {
            archive_error(format!(
                "failed to read the archive for {username} {month}: {err}"
            ))
        })?;

        if !status.is_success() {
            return Err(archive_error(format!(
                "archive for {username} {month} returned {status}: {}",
                excerpt(&body, 200)
            )));
        }

        debug!("Fetched {} bytes for {} {}", body.len(), username, month);
        Ok(body)
    }
}
