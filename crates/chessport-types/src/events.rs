use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    month::YearMonth,
    report::{ImportFailure, MonthReport, RunReport},
    run::RunSummary,
};

/// Progress event emitted by the orchestrator while a run advances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub payload: RunEventPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunEventPayload {
    RunStarted(RunSummary),
    MonthStarted {
        month: YearMonth,
    },
    GamesFound {
        month: YearMonth,
        found: usize,
        matched: usize,
    },
    GameImported {
        month: YearMonth,
        index: usize,
        total: usize,
        url: Option<String>,
    },
    GameFailed(ImportFailure),
    MonthFinished(MonthReport),
    RunFinished(RunReport),
}

impl RunEvent {
    pub fn new(payload: RunEventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            payload,
        }
    }
}
