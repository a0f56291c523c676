//! Multi-year execution with configurable parallelism.
//!
//! This module sits "above" [`crate::processing`] and provides:
//!
//! - Parallel normalization of independent years on a rayon pool
//! - A bound on concurrently normalized years (each one holds its raw tables in memory)
//! - Real-time metrics + observer hooks for monitoring
//!
//! Each year is still the pure single-threaded chain of [`crate::processing::process`]; output
//! order always follows request order.

mod observer;
mod semaphore;

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use rayon::ThreadPool;
use rayon::ThreadPoolBuilder;

use crate::canonical::{TidyRow, WideRow};
use crate::error::EnrollmentResult;
use crate::processing::{process_with_options, tidy, ProcessOptions};
use crate::types::{Era, RawSource};

pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver, TracingExecutionObserver,
};

use semaphore::Semaphore;

/// Configuration for the [`ExecutionEngine`].
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Upper bound on years normalized at the same time.
    pub max_in_flight_years: usize,
    /// Options passed to every year's [`process_with_options`] call.
    pub process: ProcessOptions,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        let n = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self {
            num_threads: Some(n),
            max_in_flight_years: n.max(1),
            process: ProcessOptions::default(),
        }
    }
}

/// One year's input.
#[derive(Debug, Clone)]
pub struct YearRequest {
    pub source: RawSource,
    pub end_year: i32,
}

impl YearRequest {
    pub fn new(source: RawSource, end_year: i32) -> Self {
        Self { source, end_year }
    }
}

/// One year's canonical wide rows.
#[derive(Debug, Clone, PartialEq)]
pub struct YearOutput {
    pub end_year: i32,
    pub era: Era,
    pub wide: Vec<WideRow>,
}

/// Runs independent years in parallel.
pub struct ExecutionEngine {
    pool: ThreadPool,
    opts: ExecutionOptions,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl ExecutionEngine {
    /// Create a new engine with the given options.
    ///
    /// `num_threads == Some(0)` and `max_in_flight_years == 0` are treated as one.
    pub fn new(opts: ExecutionOptions) -> EnrollmentResult<Self> {
        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
            .max(1);

        let pool = ThreadPoolBuilder::new().num_threads(n_threads).build()?;

        Ok(Self {
            pool,
            opts,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        })
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Normalize every requested year.
    ///
    /// All years run to completion; if any failed, the first failure in request order is
    /// returned.
    pub fn process_years(&self, requests: &[YearRequest]) -> EnrollmentResult<Vec<YearOutput>> {
        self.pool.install(|| self.process_years_impl(requests))
    }

    /// Normalize and pivot every requested year, concatenating tidy rows in request order.
    pub fn tidy_years(&self, requests: &[YearRequest]) -> EnrollmentResult<Vec<TidyRow>> {
        let outputs = self.process_years(requests)?;
        let per_year: Vec<Vec<TidyRow>> = self
            .pool
            .install(|| outputs.par_iter().map(|o| tidy(&o.wide)).collect());
        Ok(per_year.into_iter().flatten().collect())
    }

    fn process_years_impl(&self, requests: &[YearRequest]) -> EnrollmentResult<Vec<YearOutput>> {
        let start = Instant::now();
        self.metrics.begin_run();
        self.emit(ExecutionEvent::RunStarted {
            years: requests.len(),
        });

        let sem = Semaphore::new(self.opts.max_in_flight_years);
        let results: Vec<EnrollmentResult<YearOutput>> = requests
            .par_iter()
            .map(|req| {
                let permit = sem.acquire();
                if !permit.waited.is_zero() {
                    self.metrics.on_throttle_wait(permit.waited);
                    self.emit(ExecutionEvent::ThrottleWaited {
                        end_year: req.end_year,
                        duration: permit.waited,
                    });
                }

                self.metrics.on_year_start();
                self.emit(ExecutionEvent::YearStarted {
                    end_year: req.end_year,
                    era: req.source.era.clone(),
                });

                let out = self.run_year(req);
                match &out {
                    Ok(o) => {
                        self.metrics.on_year_end(Some(o.wide.len()));
                        self.emit(ExecutionEvent::YearFinished {
                            end_year: req.end_year,
                            wide_rows: o.wide.len(),
                        });
                    }
                    Err(e) => {
                        self.metrics.on_year_end(None);
                        self.emit(ExecutionEvent::YearFailed {
                            end_year: req.end_year,
                            error: e.to_string(),
                        });
                    }
                }
                drop(permit);
                out
            })
            .collect();

        self.metrics.end_run(start.elapsed());
        self.emit(ExecutionEvent::RunFinished {
            elapsed: start.elapsed(),
            metrics: self.metrics.snapshot(),
        });

        results.into_iter().collect()
    }

    fn run_year(&self, req: &YearRequest) -> EnrollmentResult<YearOutput> {
        let wide = process_with_options(&req.source, req.end_year, &self.opts.process)?;
        let era = req.source.era()?;
        Ok(YearOutput {
            end_year: req.end_year,
            era,
            wide,
        })
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}
