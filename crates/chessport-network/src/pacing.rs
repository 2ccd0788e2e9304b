use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use tracing::debug;

/// Time source for pacing, injectable so tests never actually sleep.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual clock: sleeping advances time instantly and is recorded.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Arc<Mutex<Duration>>,
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
            sleeps: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn advance(&self, duration: Duration) {
        if let Ok(mut elapsed) = self.elapsed.lock() {
            *elapsed += duration;
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let elapsed = self.elapsed.lock().map(|e| *e).unwrap_or_default();
        self.origin + elapsed
    }

    async fn sleep(&self, duration: Duration) {
        if let Ok(mut sleeps) = self.sleeps.lock() {
            sleeps.push(duration);
        }
        self.advance(duration);
    }
}

/// Enforces a minimum gap between the end of one submission and the start of the next.
///
/// One pacer lives for the whole run, so the gap also holds across months.
#[derive(Debug)]
pub struct Pacer<C: Clock> {
    clock: C,
    min_interval: Duration,
    last_submission: Option<Instant>,
}

impl<C: Clock> Pacer<C> {
    pub fn new(clock: C, min_interval: Duration) -> Self {
        Self {
            clock,
            min_interval,
            last_submission: None,
        }
    }

    pub fn last_submission(&self) -> Option<Instant> {
        self.last_submission
    }

    /// Sleeps until the interval since the previous submission has passed.
    pub async fn wait_turn(&self) -> Duration {
        let Some(last) = self.last_submission else {
            return Duration::ZERO;
        };
        let elapsed = self.clock.now().saturating_duration_since(last);
        let remaining = self.min_interval.saturating_sub(elapsed);
        if !remaining.is_zero() {
            debug!("Pacing: waiting {:?} before next submission", remaining);
            self.clock.sleep(remaining).await;
        }
        remaining
    }

    pub fn mark_submitted(&mut self) {
        self.last_submission = Some(self.clock.now());
    }
}
