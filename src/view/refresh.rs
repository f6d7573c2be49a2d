//! Periodic background refresh for one table.
//!
//! A ticker task wakes every interval and launches at most one fetch at a time; a tick
//! that finds a fetch still running is dropped. Results travel back over a channel and
//! are applied by the interactive thread, which discards anything tagged with an epoch
//! older than the last `stop`.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::{LensError, LensResult};
use crate::source::{DataSource, Row};

struct Snapshot {
    epoch: u64,
    result: LensResult<Vec<Row>>,
}

#[derive(Default)]
struct Shared {
    in_flight: AtomicBool,
    failures: AtomicU32,
    fetches: AtomicU64,
    skipped: AtomicU64,
    last_tick: Mutex<Option<Instant>>,
}

/// Counters exposed for the status line and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub fetches: u64,
    pub skipped: u64,
    pub discarded: u64,
    pub failures: u32,
}

/// Everything a spawned task needs to launch a fetch
#[derive(Clone)]
struct Launcher {
    source: Arc<dyn DataSource>,
    shared: Arc<Shared>,
    tx: UnboundedSender<Snapshot>,
    shutdown: CancellationToken,
    epoch: u64,
}

impl Launcher {
    /// Start a fetch unless one is already running
    fn launch(&self) -> bool {
        if self.shared.in_flight.swap(true, Ordering::AcqRel) {
            self.shared.skipped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Fetch still in flight, skipping tick");
            return false;
        }
        self.shared.fetches.fetch_add(1, Ordering::Relaxed);

        let this = self.clone();
        tokio::spawn(async move {
            let result = this.source.fetch(this.shutdown.child_token()).await;
            match &result {
                Ok(rows) => {
                    this.shared.failures.store(0, Ordering::Relaxed);
                    tracing::debug!("Fetched {} rows", rows.len());
                }
                Err(e) => {
                    this.shared.failures.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!("Refresh failed: {}", e);
                }
            }
            this.shared.in_flight.store(false, Ordering::Release);
            // the receiver is gone once the table is dropped
            let _ = this.tx.send(Snapshot {
                epoch: this.epoch,
                result,
            });
        });
        true
    }
}

/// Number of ticks between attempts after `failures` consecutive errors
pub fn backoff_spacing(failures: u32, max_ticks: u32) -> u64 {
    if failures == 0 {
        return 1;
    }
    let spacing = 1u64 << failures.min(16);
    spacing.min(u64::from(max_ticks.max(1)))
}

/// Background refresh state owned by one table
pub struct Refresher {
    source: Arc<dyn DataSource>,
    interval: Duration,
    max_backoff_ticks: u32,
    shutdown: CancellationToken,
    shared: Arc<Shared>,
    epoch: u64,
    discarded: u64,
    tx: UnboundedSender<Snapshot>,
    rx: UnboundedReceiver<Snapshot>,
    ticker: Option<CancellationToken>,
}

impl Refresher {
    pub fn new(
        source: Arc<dyn DataSource>,
        interval: Duration,
        max_backoff_ticks: u32,
        shutdown: CancellationToken,
    ) -> LensResult<Self> {
        if interval.is_zero() {
            return Err(LensError::Configuration(
                "refresh interval must be greater than zero".to_string(),
            ));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        Ok(Self {
            source,
            interval,
            max_backoff_ticks,
            shutdown,
            shared: Arc::new(Shared::default()),
            epoch: 0,
            discarded: 0,
            tx,
            rx,
            ticker: None,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn in_flight(&self) -> bool {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    pub fn last_tick(&self) -> Option<Instant> {
        *self.shared.last_tick.lock()
    }

    pub fn stats(&self) -> RefreshStats {
        RefreshStats {
            fetches: self.shared.fetches.load(Ordering::Relaxed),
            skipped: self.shared.skipped.load(Ordering::Relaxed),
            discarded: self.discarded,
            failures: self.shared.failures.load(Ordering::Relaxed),
        }
    }

    fn launcher(&self) -> Launcher {
        Launcher {
            source: Arc::clone(&self.source),
            shared: Arc::clone(&self.shared),
            tx: self.tx.clone(),
            shutdown: self.shutdown.clone(),
            epoch: self.epoch,
        }
    }

    /// Schedule the recurring task. The first tick fires one interval from now.
    pub fn start(&mut self) {
        if self.ticker.is_some() {
            return;
        }
        let cancel = CancellationToken::new();
        self.ticker = Some(cancel.clone());

        let launcher = self.launcher();
        let interval = self.interval;
        let max_backoff = self.max_backoff_ticks;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut tick: u64 = 0;
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                tick += 1;
                *launcher.shared.last_tick.lock() = Some(Instant::now());

                let failures = launcher.shared.failures.load(Ordering::Relaxed);
                if tick % backoff_spacing(failures, max_backoff) != 0 {
                    launcher.shared.skipped.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!("Backing off after {} failures", failures);
                    continue;
                }
                launcher.launch();
            }
            tracing::debug!("Refresh ticker stopped");
        });
    }

    /// Cancel the recurring task. A fetch already running completes, but its result
    /// will be discarded.
    pub fn stop(&mut self) {
        if let Some(cancel) = self.ticker.take() {
            cancel.cancel();
        }
        self.epoch += 1;
    }

    /// Out-of-cycle fetch. Returns false when one is already running.
    pub fn force(&self) -> bool {
        self.launcher().launch()
    }

    /// Next fresh result, if any. Stale results are dropped along the way.
    pub fn poll(&mut self) -> Option<LensResult<Vec<Row>>> {
        while let Ok(snapshot) = self.rx.try_recv() {
            if snapshot.epoch != self.epoch {
                self.discarded += 1;
                tracing::debug!("Discarding result from a stopped refresh");
                continue;
            }
            return Some(snapshot.result);
        }
        None
    }
}

impl Drop for Refresher {
    fn drop(&mut self) {
        if let Some(cancel) = self.ticker.take() {
            cancel.cancel();
        }
    }
}
