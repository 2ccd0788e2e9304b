use std::time::Duration;

use async_trait::async_trait;
use chessport_types::{
    config::DestinationConfig, game::GameRecord, run::Credential, ChessportError, Result,
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    excerpt, import_error,
    pacing::{Clock, Pacer},
};

/// What the destination reports for a successfully imported game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImportReceipt {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl ImportReceipt {
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_else(|err| {
            debug!("Import response was not a receipt ({}): {}", err, excerpt(body, 120));
            Self::default()
        })
    }
}

#[async_trait]
pub trait GameImporter: Send + Sync {
    async fn import_game(&self, game: &GameRecord) -> Result<ImportReceipt>;
}

/// Posts games to the lichess.org import endpoint.
pub struct LichessImporter {
    client: Client,
    endpoint: String,
    credential: Credential,
}

impl LichessImporter {
    pub fn new(config: &DestinationConfig, credential: Credential) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| import_error(format!("failed to create HTTP client: {err}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/import", config.base_url.trim_end_matches('/')),
            credential,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GameImporter for LichessImporter {
    async fn import_game(&self, game: &GameRecord) -> Result<ImportReceipt> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.credential.expose())
            .form(&[("pgn", game.as_str())])
            .send()
            .await
            .map_err(|err| import_error(format!("request failed: {err}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| {
                import_error(format!("failed to read the import response ({status}): {err}"))
            })?;
        match status {
            s if s.is_success() => Ok(ImportReceipt::from_body(&body)),
            StatusCode::TOO_MANY_REQUESTS => Err(ChessportError::RateLimited(format!(
                "{status}: {}",
                excerpt(&body, 200)
            ))),
            _ => Err(import_error(format!("{status}: {}", excerpt(&body, 200)))),
        }
    }
}

/// Accepts every game without contacting the destination.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunImporter;

#[async_trait]
impl GameImporter for DryRunImporter {
    async fn import_game(&self, game: &GameRecord) -> Result<ImportReceipt> {
        info!("Dry run: would import {}", game.describe());
        Ok(ImportReceipt::default())
    }
}

/// Importer plus the run-wide pacer; every submission goes through here.
pub struct ImportSubmitter<I: GameImporter, C: Clock> {
    importer: I,
    pacer: Pacer<C>,
}

impl<I: GameImporter, C: Clock> ImportSubmitter<I, C> {
    pub fn new(importer: I, pacer: Pacer<C>) -> Self {
        Self { importer, pacer }
    }

    pub fn pacer(&self) -> &Pacer<C> {
        &self.pacer
    }

    /// Waits for the pacing interval, then submits. Failed attempts count as submissions.
    pub async fn submit(&mut self, game: &GameRecord) -> Result<ImportReceipt> {
        self.pacer.wait_turn().await;
        let outcome = self.importer.import_game(game).await;
        self.pacer.mark_submitted();
        outcome
    }
}
