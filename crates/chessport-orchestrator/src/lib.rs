//! Run orchestrator: fetches each selected month, filters and adjusts its
//! games, and submits them one by one through the paced submitter.

use async_trait::async_trait;
use chessport_network::{ArchiveSource, Clock, GameImporter, ImportSubmitter};
use chessport_ops::ProgressSink;
use chessport_pgn::{filter_games, parse_games, tally_classes, TimestampAdjuster};
use chessport_types::{
    events::{RunEvent, RunEventPayload},
    game::GameRecord,
    month::YearMonth,
    report::{ImportFailure, MonthReport, RunReport},
    run::{RunConfiguration, RunSummary},
    ChessportError, Result,
};
use tracing::{error, info, warn};

pub struct Migrator<A, I, C, P>
where
    A: ArchiveSource,
    I: GameImporter,
    C: Clock,
    P: ProgressSink,
{
    config: RunConfiguration,
    archive: A,
    submitter: ImportSubmitter<I, C>,
    adjuster: Option<TimestampAdjuster>,
    progress: P,
}

impl<A, I, C, P> Migrator<A, I, C, P>
where
    A: ArchiveSource,
    I: GameImporter,
    C: Clock,
    P: ProgressSink,
{
    /// The adjuster is only applied when the configuration asks for local timestamps.
    pub fn new(
        config: RunConfiguration,
        archive: A,
        submitter: ImportSubmitter<I, C>,
        adjuster: TimestampAdjuster,
        progress: P,
    ) -> Self {
        let adjuster = config.convert_timezone.then_some(adjuster);
        Self {
            config,
            archive,
            submitter,
            adjuster,
            progress,
        }
    }

    fn emit(&self, payload: RunEventPayload) {
        self.progress.emit(&RunEvent::new(payload));
    }

    pub async fn migrate_month(&mut self, month: YearMonth) -> Result<MonthReport> {
        let username = self.config.username.clone();
        self.emit(RunEventPayload::MonthStarted { month });

        let raw = self
            .archive
            .fetch_month(&username, month)
            .await?;

        let games: Vec<GameRecord> = parse_games(&raw).collect();
        let mut report = MonthReport::new(month);
        report.found = games.len();
        report.per_class = tally_classes(&games, &self.config.filter);

        let mut selected: Vec<GameRecord> = filter_games(games, &self.config.filter).collect();
        report.matched = selected.len();
        info!(
            "{} {}: {} games found, {} selected",
            username, month, report.found, report.matched
        );
        self.emit(RunEventPayload::GamesFound {
            month,
            found: report.found,
            matched: report.matched,
        });

        let total = selected.len();
        for (offset, game) in selected.iter_mut().enumerate() {
            let index = offset + 1;
            if let Some(adjuster) = &self.adjuster {
                adjuster.adjust(game);
            }

            match self.submitter.submit(game).await {
                Ok(receipt) => {
                    report.imported += 1;
                    if let Some(tally) = game
                        .time_class()
                        .and_then(|class| report.per_class.get_mut(&class))
                    {
                        tally.imported += 1;
                    }
                    self.emit(RunEventPayload::GameImported {
                        month,
                        index,
                        total,
                        url: receipt.url,
                    });
                }
                Err(err) => {
                    let failure = ImportFailure {
                        month,
                        index,
                        label: game.describe(),
                        reason: err.to_string(),
                    };
                    warn!(
                        "Game {}/{} of {} {} was not imported: {}",
                        index, total, username, month, err
                    );
                    report.failures.push(failure.clone());
                    self.emit(RunEventPayload::GameFailed(failure));
                }
            }
        }

        self.emit(RunEventPayload::MonthFinished(report.clone()));
        Ok(report)
    }
}

#[async_trait]
pub trait MigrationRunner {
    async fn run(&mut self) -> Result<RunReport>;
}

#[async_trait]
impl<A, I, C, P> MigrationRunner for Migrator<A, I, C, P>
where
    A: ArchiveSource,
    I: GameImporter,
    C: Clock,
    P: ProgressSink,
{
    async fn run(&mut self) -> Result<RunReport> {
        self.config.validate()?;
        info!(
            "Starting import for {} over {} month(s)",
            self.config.username,
            self.config.months.len()
        );
        self.emit(RunEventPayload::RunStarted(RunSummary::from(&self.config)));

        let mut report = RunReport::default();
        for month in self.config.months.clone() {
            let month_report = self.migrate_month(month).await.map_err(|err| {
                error!("Stopping at {}: {}", month, err);
                orchestrator_error(format!(
                    "run for {} stopped at {} after {} completed month(s): {err}",
                    self.config.username,
                    month,
                    report.months.len()
                ))
            })?;
            report.months.push(month_report);
        }

        info!("Run finished: {}", report.summary_line());
        self.emit(RunEventPayload::RunFinished(report.clone()));
        Ok(report)
    }
}

pub fn orchestrator_error(message: impl Into<String>) -> ChessportError {
    ChessportError::Orchestrator(message.into())
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
        time::Duration,
    };

    use chessport_network::{archive_error, ImportReceipt, ManualClock, Pacer};
    use chessport_ops::{ConsoleReporter, EventLog};
    use chessport_pgn::Zone;
    use chessport_types::{
        run::Credential,
        time_control::{FilterSet, TimeClass},
    };
    use chrono::FixedOffset;

    use super::*;

    const INTERVAL: Duration = Duration::from_millis(7_500);

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    fn pgn(white: &str, time_control: &str, date: &str, time: &str) -> String {
        format!(
            "[Event \"Live Chess\"]\n[White \"{white}\"]\n[Black \"opponent\"]\n\
             [UTCDate \"{date}\"]\n[UTCTime \"{time}\"]\n[TimeControl \"{time_control}\"]\n\n\
             1. e4 e5 2. Nf3 1-0\n\n\n"
        )
    }

    fn archive_of(games: usize, time_control: &str) -> String {
        (1..=games)
            .map(|n| pgn(&format!("player{n}"), time_control, "2022.08.10", "12:00:00"))
            .collect()
    }

    #[derive(Clone, Default)]
    struct ScriptedArchive {
        months: HashMap<YearMonth, std::result::Result<String, String>>,
        requested: Arc<Mutex<Vec<YearMonth>>>,
    }

    impl ScriptedArchive {
        fn with(mut self, month: YearMonth, body: impl Into<String>) -> Self {
            self.months.insert(month, Ok(body.into()));
            self
        }

        fn failing(mut self, month: YearMonth, status: &str) -> Self {
            self.months.insert(month, Err(status.to_string()));
            self
        }

        fn requested(&self) -> Vec<YearMonth> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ArchiveSource for ScriptedArchive {
        async fn fetch_month(&self, username: &str, month: YearMonth) -> Result<String> {
            self.requested.lock().unwrap().push(month);
            match self.months.get(&month) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(status)) => Err(archive_error(format!(
                    "archive for {username} {month} returned {status}"
                ))),
                None => Ok(String::new()),
            }
        }
    }

    #[derive(Clone, Default)]
    struct RecordingImporter {
        submitted: Arc<Mutex<Vec<String>>>,
        rate_limited_calls: Vec<usize>,
    }

    impl RecordingImporter {
        fn rejecting(calls: &[usize]) -> Self {
            Self {
                rate_limited_calls: calls.to_vec(),
                ..Default::default()
            }
        }

        fn submitted(&self) -> Vec<String> {
            self.submitted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GameImporter for RecordingImporter {
        async fn import_game(&self, game: &GameRecord) -> Result<ImportReceipt> {
            let call = {
                let mut submitted = self.submitted.lock().unwrap();
                submitted.push(game.as_str().to_string());
                submitted.len()
            };
            if self.rate_limited_calls.contains(&call) {
                return Err(ChessportError::RateLimited("429 Too Many Requests".into()));
            }
            Ok(ImportReceipt {
                id: Some(format!("game{call}")),
                url: Some(format!("https://lichess.org/game{call}")),
            })
        }
    }

    fn run_config(months: Vec<YearMonth>, filter: FilterSet, convert: bool) -> RunConfiguration {
        RunConfiguration {
            username: "Hikaru".into(),
            credential: Credential::new("lip_test").unwrap(),
            filter,
            convert_timezone: convert,
            verbose: true,
            months,
        }
    }

    fn migrator<P: ProgressSink>(
        config: RunConfiguration,
        archive: ScriptedArchive,
        importer: RecordingImporter,
        clock: ManualClock,
        progress: P,
    ) -> Migrator<ScriptedArchive, RecordingImporter, ManualClock, P> {
        let adjuster = TimestampAdjuster::new(
            Zone::Fixed(FixedOffset::east_opt(0).unwrap()),
            Zone::Fixed(FixedOffset::east_opt(2 * 3600).unwrap()),
        );
        Migrator::new(
            config,
            archive,
            ImportSubmitter::new(importer, Pacer::new(clock, INTERVAL)),
            adjuster,
            progress,
        )
    }

    #[tokio::test]
    async fn empty_month_submits_nothing() {
        let importer = RecordingImporter::default();
        let clock = ManualClock::new();
        let reporter = ConsoleReporter::with_writer(true, Vec::new());
        let mut runner = migrator(
            run_config(vec![ym(2022, 8)], FilterSet::all(), true),
            ScriptedArchive::default().with(ym(2022, 8), ""),
            importer.clone(),
            clock.clone(),
            reporter,
        );

        let report = runner.run().await.expect("run completes");
        assert_eq!(report.found(), 0);
        assert_eq!(report.imported(), 0);
        assert!(importer.submitted().is_empty());
        assert!(clock.sleeps().is_empty());

        let Migrator { progress, .. } = runner;
        let out = String::from_utf8(progress.into_inner()).unwrap();
        assert!(out.contains("2022/08: 0 games found, 0 imported"), "{out}");
    }

    #[tokio::test]
    async fn run_without_months_finishes_empty() {
        let archive = ScriptedArchive::default();
        let log = EventLog::new();
        let mut runner = migrator(
            run_config(Vec::new(), FilterSet::all(), true),
            archive.clone(),
            RecordingImporter::default(),
            ManualClock::new(),
            log.clone(),
        );

        let report = runner.run().await.expect("run completes");
        assert!(report.months.is_empty());
        assert!(archive.requested().is_empty());
        assert_eq!(report.summary_line(), "0 month(s): 0 games found, 0 imported");
        assert!(matches!(
            log.snapshot().last().map(|event| &event.payload),
            Some(RunEventPayload::RunFinished(_))
        ));
    }

    #[tokio::test]
    async fn range_is_processed_in_order_with_separate_counts() {
        let archive = ScriptedArchive::default()
            .with(ym(2022, 8), archive_of(2, "180"))
            .with(ym(2022, 9), archive_of(3, "600"));
        let importer = RecordingImporter::default();
        let clock = ManualClock::new();
        let log = EventLog::new();
        let mut runner = migrator(
            run_config(vec![ym(2022, 8), ym(2022, 9)], FilterSet::all(), false),
            archive.clone(),
            importer.clone(),
            clock.clone(),
            log.clone(),
        );

        let report = runner.run().await.expect("run completes");
        assert_eq!(archive.requested(), vec![ym(2022, 8), ym(2022, 9)]);
        assert_eq!(report.months.len(), 2);
        assert_eq!(report.months[0].month, ym(2022, 8));
        assert_eq!((report.months[0].found, report.months[0].imported), (2, 2));
        assert_eq!((report.months[1].found, report.months[1].imported), (3, 3));
        assert_eq!(report.months[1].per_class[&TimeClass::Rapid].imported, 3);

        // The pacing gap also applies to the first game of September.
        assert_eq!(clock.sleeps(), vec![INTERVAL; 4]);

        let finished: Vec<YearMonth> = log
            .snapshot()
            .into_iter()
            .filter_map(|event| match event.payload {
                RunEventPayload::MonthFinished(month) => Some(month.month),
                _ => None,
            })
            .collect();
        assert_eq!(finished, vec![ym(2022, 8), ym(2022, 9)]);
    }

    #[tokio::test]
    async fn rate_limited_game_does_not_stop_the_month() {
        let importer = RecordingImporter::rejecting(&[5]);
        let clock = ManualClock::new();
        let mut runner = migrator(
            run_config(vec![ym(2022, 8)], FilterSet::all(), false),
            ScriptedArchive::default().with(ym(2022, 8), archive_of(10, "180+2")),
            importer.clone(),
            clock.clone(),
            EventLog::new(),
        );

        let report = runner.run().await.expect("run completes");
        let month = &report.months[0];
        assert_eq!(importer.submitted().len(), 10);
        assert_eq!(month.found, 10);
        assert_eq!(month.imported, 9);
        assert_eq!(month.failures.len(), 1);
        assert_eq!(month.failures[0].index, 5);
        assert_eq!(month.failures[0].label, "player5 vs opponent (2022.08.10)");
        assert!(month.failures[0].reason.contains("429"));
        assert_eq!(clock.sleeps().len(), 9);
        assert_eq!(
            month.summary_line(),
            "2022/08: 10 games found, 9 imported, 1 failed"
        );
    }

    #[tokio::test]
    async fn fetch_failure_aborts_remaining_months() {
        let archive = ScriptedArchive::default()
            .with(ym(2022, 8), archive_of(1, "60"))
            .failing(ym(2022, 9), "503 Service Unavailable");
        let importer = RecordingImporter::default();
        let mut runner = migrator(
            run_config(
                vec![ym(2022, 8), ym(2022, 9), ym(2022, 10)],
                FilterSet::all(),
                false,
            ),
            archive.clone(),
            importer.clone(),
            ManualClock::new(),
            EventLog::new(),
        );

        let err = runner.run().await.expect_err("september fails");
        let message = err.to_string();
        assert!(message.contains("Hikaru"), "{message}");
        assert!(message.contains("2022/09"), "{message}");
        assert_eq!(archive.requested(), vec![ym(2022, 8), ym(2022, 9)]);
        assert_eq!(importer.submitted().len(), 1);
    }

    #[tokio::test]
    async fn filter_without_matches_imports_nothing() {
        let importer = RecordingImporter::default();
        let clock = ManualClock::new();
        let reporter = ConsoleReporter::with_writer(true, Vec::new());
        let mut runner = migrator(
            run_config(
                vec![ym(2022, 8)],
                FilterSet::from_names(["daily"]).unwrap(),
                false,
            ),
            ScriptedArchive::default().with(ym(2022, 8), archive_of(4, "180")),
            importer.clone(),
            clock,
            reporter,
        );

        let report = runner.run().await.expect("run completes");
        let month = &report.months[0];
        assert_eq!(month.found, 4);
        assert_eq!(month.matched, 0);
        assert_eq!(month.imported, 0);
        assert_eq!(month.per_class.len(), 1);
        assert_eq!(month.per_class[&TimeClass::Daily].imported, 0);
        assert!(importer.submitted().is_empty());

        let Migrator { progress, .. } = runner;
        let out = String::from_utf8(progress.into_inner()).unwrap();
        assert!(out.contains("daily: 0 found, 0 imported"), "{out}");
    }

    #[tokio::test]
    async fn timestamps_are_converted_only_when_requested() {
        let body = pgn("alice", "300", "2022.08.31", "23:15:00");

        let converting = RecordingImporter::default();
        let mut runner = migrator(
            run_config(vec![ym(2022, 8)], FilterSet::all(), true),
            ScriptedArchive::default().with(ym(2022, 8), body.clone()),
            converting.clone(),
            ManualClock::new(),
            EventLog::new(),
        );
        runner.run().await.expect("run completes");
        let sent = GameRecord::new(converting.submitted()[0].clone());
        assert_eq!(sent.tag("UTCDate"), Some("2022.09.01"));
        assert_eq!(sent.tag("UTCTime"), Some("01:15:00"));

        let untouched = RecordingImporter::default();
        let mut runner = migrator(
            run_config(vec![ym(2022, 8)], FilterSet::all(), false),
            ScriptedArchive::default().with(ym(2022, 8), body.clone()),
            untouched.clone(),
            ManualClock::new(),
            EventLog::new(),
        );
        runner.run().await.expect("run completes");
        assert_eq!(untouched.submitted(), vec![body.trim().to_string()]);
    }
}
