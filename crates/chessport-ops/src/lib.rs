//! Operational helpers: logging setup and progress reporting.

use std::{
    io::{self, Write},
    sync::{Arc, Mutex},
};

use chessport_types::{
    config::OpsConfig,
    events::{RunEvent, RunEventPayload},
    ChessportError, Result,
};
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(config: &OpsConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|err| ChessportError::Ops(format!("failed to create log filter: {err}")))?;

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|err| ChessportError::Ops(format!("tracing init error: {err}")))?;
    Ok(())
}

/// Receiver of run progress events.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: &RunEvent);
}

/// Prints human-readable progress to stdout when verbose.
pub struct ConsoleReporter<W: Write + Send = io::Stdout> {
    verbose: bool,
    out: Mutex<W>,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self::with_writer(verbose, io::stdout())
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn with_writer(verbose: bool, out: W) -> Self {
        Self {
            verbose,
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> ProgressSink for ConsoleReporter<W> {
    fn emit(&self, event: &RunEvent) {
        if !self.verbose {
            return;
        }
        let lines = render(&event.payload);
        if lines.is_empty() {
            return;
        }
        if let Ok(mut out) = self.out.lock() {
            for line in lines {
                let _ = writeln!(out, "{line}");
            }
            let _ = out.flush();
        }
    }
}

/// Human-readable lines for one event.
pub fn render(payload: &RunEventPayload) -> Vec<String> {
    match payload {
        RunEventPayload::RunStarted(summary) => {
            let months: Vec<String> = summary.months.iter().map(|m| m.to_string()).collect();
            vec![format!(
                "Importing games of {} for {} (filter: {}, timestamps: {})",
                summary.username,
                months.join(", "),
                summary.filter,
                if summary.convert_timezone { "local" } else { "UTC" }
            )]
        }
        RunEventPayload::MonthStarted { month } => vec![format!("Fetching games from {month}...")],
        RunEventPayload::GamesFound {
            month,
            found,
            matched,
        } => {
            if found == matched {
                vec![format!("{month}: {found} games to import")]
            } else {
                vec![format!(
                    "{month}: {matched} of {found} games pass the filter"
                )]
            }
        }
        RunEventPayload::GameImported {
            index, total, url, ..
        } => match url {
            Some(url) => vec![format!("Imported {index}/{total} -> {url}")],
            None => vec![format!("Imported {index}/{total}")],
        },
        RunEventPayload::GameFailed(failure) => vec![format!(
            "Failed {} game {} ({}): {}",
            failure.month, failure.index, failure.label, failure.reason
        )],
        RunEventPayload::MonthFinished(report) => {
            let mut lines = vec![report.summary_line()];
            lines.extend(report.class_lines());
            lines
        }
        RunEventPayload::RunFinished(report) => {
            let mut lines = vec![format!("Finished: {}", report.summary_line())];
            let failures: Vec<_> = report.failures().collect();
            if !failures.is_empty() {
                lines.push("Games that were not imported:".to_string());
                lines.extend(failures.iter().map(|failure| {
                    format!(
                        "  {} #{} {}: {}",
                        failure.month, failure.index, failure.label, failure.reason
                    )
                }));
            }
            lines
        }
    }
}

/// In-memory event history for inspection and tests.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<RunEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<RunEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Events as JSON lines, e.g. for attaching to a bug report.
    pub fn to_json_lines(&self) -> Result<String> {
        let mut doc = String::new();
        for event in self.snapshot() {
            let line = serde_json::to_string(&event)
                .map_err(|err| ChessportError::Ops(format!("failed to encode event: {err}")))?;
            doc.push_str(&line);
            doc.push('\n');
        }
        Ok(doc)
    }
}

impl ProgressSink for EventLog {
    fn emit(&self, event: &RunEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Fans events out to several sinks.
pub struct Broadcast(pub Vec<Box<dyn ProgressSink>>);

impl ProgressSink for Broadcast {
    fn emit(&self, event: &RunEvent) {
        for sink in &self.0 {
            sink.emit(event);
        }
    }
}
