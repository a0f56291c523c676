use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

/// Execution events emitted by the engine.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted { years: usize },
    ThrottleWaited { end_year: i32, duration: Duration },
    YearStarted { end_year: i32, era: String },
    YearFinished { end_year: i32, wide_rows: usize },
    YearFailed { end_year: i32, error: String },
    RunFinished {
        elapsed: Duration,
        metrics: ExecutionMetricsSnapshot,
    },
}

/// Observer hook for execution events.
pub trait ExecutionObserver: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent);
}

/// Forwards execution events to `tracing`.
#[derive(Debug, Default)]
pub struct TracingExecutionObserver;

impl ExecutionObserver for TracingExecutionObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::YearFailed { end_year, error } => warn!(end_year, %error, "year failed"),
            ExecutionEvent::RunFinished { metrics, .. } => info!(%metrics, "run finished"),
            other => debug!(event = ?other),
        }
    }
}

/// Real-time metrics for an execution run.
///
/// The engine updates these counters during execution; callers can snapshot them at any time.
pub struct ExecutionMetrics {
    run_id: AtomicU64,
    elapsed_ns: AtomicU64,

    years_started: AtomicU64,
    years_finished: AtomicU64,
    years_failed: AtomicU64,
    rows_emitted: AtomicU64,
    throttle_wait_ns: AtomicU64,

    active_years: AtomicUsize,
    max_active_years: AtomicUsize,
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self {
            run_id: AtomicU64::new(0),
            elapsed_ns: AtomicU64::new(0),
            years_started: AtomicU64::new(0),
            years_finished: AtomicU64::new(0),
            years_failed: AtomicU64::new(0),
            rows_emitted: AtomicU64::new(0),
            throttle_wait_ns: AtomicU64::new(0),
            active_years: AtomicUsize::new(0),
            max_active_years: AtomicUsize::new(0),
        }
    }

    pub fn begin_run(&self) {
        let _ = self.run_id.fetch_add(1, Ordering::SeqCst);

        self.elapsed_ns.store(0, Ordering::SeqCst);
        self.years_started.store(0, Ordering::SeqCst);
        self.years_finished.store(0, Ordering::SeqCst);
        self.years_failed.store(0, Ordering::SeqCst);
        self.rows_emitted.store(0, Ordering::SeqCst);
        self.throttle_wait_ns.store(0, Ordering::SeqCst);
        self.active_years.store(0, Ordering::SeqCst);
        self.max_active_years.store(0, Ordering::SeqCst);
    }

    pub fn end_run(&self, elapsed: Duration) {
        self.elapsed_ns.store(saturating_nanos(elapsed), Ordering::SeqCst);
    }

    pub fn on_year_start(&self) {
        let _ = self.years_started.fetch_add(1, Ordering::SeqCst);
        let now = self.active_years.fetch_add(1, Ordering::SeqCst) + 1;
        update_max_usize(&self.max_active_years, now);
    }

    /// `rows` is `None` when the year failed.
    pub fn on_year_end(&self, rows: Option<usize>) {
        match rows {
            Some(n) => {
                let _ = self.years_finished.fetch_add(1, Ordering::SeqCst);
                let _ = self.rows_emitted.fetch_add(n as u64, Ordering::SeqCst);
            }
            None => {
                let _ = self.years_failed.fetch_add(1, Ordering::SeqCst);
            }
        }
        let _ = self.active_years.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn on_throttle_wait(&self, d: Duration) {
        let _ = self.throttle_wait_ns.fetch_add(saturating_nanos(d), Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ExecutionMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        ExecutionMetricsSnapshot {
            run_id: self.run_id.load(Ordering::SeqCst),
            elapsed: (elapsed_ns > 0).then(|| Duration::from_nanos(elapsed_ns)),
            years_started: self.years_started.load(Ordering::SeqCst),
            years_finished: self.years_finished.load(Ordering::SeqCst),
            years_failed: self.years_failed.load(Ordering::SeqCst),
            rows_emitted: self.rows_emitted.load(Ordering::SeqCst),
            throttle_wait: Duration::from_nanos(self.throttle_wait_ns.load(Ordering::SeqCst)),
            max_active_years: self.max_active_years.load(Ordering::SeqCst),
        }
    }
}

impl Default for ExecutionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn saturating_nanos(d: Duration) -> u64 {
    d.as_nanos().min(u64::MAX as u128) as u64
}

fn update_max_usize(dst: &AtomicUsize, now: usize) {
    let _ = dst.fetch_max(now, Ordering::SeqCst);
}

/// Immutable snapshot of [`ExecutionMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMetricsSnapshot {
    pub run_id: u64,
    pub elapsed: Option<Duration>,
    pub years_started: u64,
    pub years_finished: u64,
    pub years_failed: u64,
    /// Canonical wide rows emitted across finished years (State rows included).
    pub rows_emitted: u64,
    pub throttle_wait: Duration,
    pub max_active_years: usize,
}

impl fmt::Display for ExecutionMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={}, years={}/{} (failed {}), rows_emitted={}, max_active_years={}, throttle_wait={:?}, elapsed={:?}",
            self.run_id,
            self.years_finished,
            self.years_started,
            self.years_failed,
            self.rows_emitted,
            self.max_active_years,
            self.throttle_wait,
            self.elapsed
        )
    }
}
