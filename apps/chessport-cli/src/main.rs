mod cli;

use std::{fs, time::Duration};

use anyhow::{Context, Result};
use chessport_network::{
    ChessComArchive, Clock, DryRunImporter, GameImporter, ImportSubmitter, LichessImporter, Pacer,
    TokioClock,
};
use chessport_ops::{init_tracing, Broadcast, ConsoleReporter, EventLog, ProgressSink};
use chessport_orchestrator::{MigrationRunner, Migrator};
use chessport_pgn::TimestampAdjuster;
use chessport_types::{report::RunReport, run::RunConfiguration};
use chrono::Local;
use clap::Parser;
use tracing::info;

use crate::cli::{load_config, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.ops)?;

    let run_config = cli.run_configuration(&config, Local::now().date_naive())?;
    let adjuster = TimestampAdjuster::from_config(&config.timestamps)?;
    let archive = ChessComArchive::new(&config.source)?;

    let events = EventLog::new();
    let progress = Broadcast(vec![
        Box::new(ConsoleReporter::new(run_config.verbose)),
        Box::new(events.clone()),
    ]);

    let outcome = if cli.dry_run {
        info!("Dry run: games will not be submitted");
        let submitter = ImportSubmitter::new(DryRunImporter, Pacer::new(TokioClock, Duration::ZERO));
        drive(run_config, archive, submitter, adjuster, progress).await
    } else {
        let importer = LichessImporter::new(&config.destination, run_config.credential.clone())?;
        let pacer = Pacer::new(
            TokioClock,
            Duration::from_millis(config.pacing.min_interval_ms),
        );
        drive(
            run_config,
            archive,
            ImportSubmitter::new(importer, pacer),
            adjuster,
            progress,
        )
        .await
    };

    if let Some(path) = &cli.events {
        fs::write(path, events.to_json_lines()?)
            .with_context(|| format!("failed to write events to {}", path.display()))?;
    }

    let report = outcome?;
    info!("{}", report.summary_line());
    Ok(())
}

async fn drive<I, C, P>(
    run_config: RunConfiguration,
    archive: ChessComArchive,
    submitter: ImportSubmitter<I, C>,
    adjuster: TimestampAdjuster,
    progress: P,
) -> chessport_types::Result<RunReport>
where
    I: GameImporter,
    C: Clock,
    P: ProgressSink,
{
    let mut migrator = Migrator::new(run_config, archive, submitter, adjuster, progress);
    migrator.run().await
}
