//! Ordered fan-out/fan-in over a thread pool.
//!
//! A producer feeds `(index, input)` pairs into a bounded channel, workers
//! apply the function and send `(index, outcome)` to a result channel, and the
//! calling thread collects until every worker has hung up. Collected pairs are
//! sorted by index, so the i-th outcome always belongs to the i-th input.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use crossbeam::channel;
use mktstructure_core::config::RunnerConfig;
use mktstructure_core::{Error, Result};
use tracing::{debug, info};

use crate::progress::ProgressTracker;

/// Batch executor with a fixed number of workers.
#[derive(Debug, Clone)]
pub struct ParallelRunner {
    workers: usize,
    /// Pending inputs buffered per worker.
    queue_capacity: usize,
    log_progress: bool,
}

/// One worker per CPU, like `new(0)`. Pass `new(1)` for the sequential path.
impl Default for ParallelRunner {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ParallelRunner {
    /// Runner with `workers` threads; 0 uses one per CPU.
    pub fn new(workers: usize) -> Self {
        let workers = if workers == 0 { num_cpus::get().max(1) } else { workers };
        Self {
            workers,
            queue_capacity: 2,
            log_progress: false,
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self {
            queue_capacity: config.queue_capacity.max(1),
            log_progress: config.progress,
            ..Self::new(config.workers)
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn with_progress_log(mut self, enabled: bool) -> Self {
        self.log_progress = enabled;
        self
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Apply `f` to every input and return one outcome per input, in input
    /// order. A panic in `f` becomes `Error::Worker` for that item only.
    ///
    /// `progress` is called once per completed item with `(completed, total)`.
    pub fn run<I, O, F>(
        &self,
        inputs: Vec<I>,
        f: F,
        progress: Option<&mut dyn FnMut(usize, usize)>,
    ) -> Vec<Result<O>>
    where
        I: Send,
        O: Send,
        F: Fn(I) -> Result<O> + Sync,
    {
        let mut tracker = ProgressTracker::new(inputs.len(), self.log_progress, progress);
        let outcomes = if self.workers <= 1 || inputs.len() <= 1 {
            info!(items = inputs.len(), "Sequential execution");
            run_sequential(inputs, &f, &mut tracker)
        } else {
            let workers = self.workers.min(inputs.len());
            info!(items = inputs.len(), "Parallel execution with {} workers", workers);
            self.run_parallel(inputs, &f, workers, &mut tracker)
        };
        let failed = outcomes.iter().filter(|o| o.is_err()).count();
        debug!(completed = tracker.completed(), failed, "batch finished");
        outcomes
    }

    /// Like [`run`](Self::run) but all-or-nothing: every item still runs, then
    /// the error of the lowest failing index is returned.
    pub fn run_strict<I, O, F>(
        &self,
        inputs: Vec<I>,
        f: F,
        progress: Option<&mut dyn FnMut(usize, usize)>,
    ) -> Result<Vec<O>>
    where
        I: Send,
        O: Send,
        F: Fn(I) -> Result<O> + Sync,
    {
        self.run(inputs, f, progress).into_iter().collect()
    }

    fn run_parallel<I, O, F>(
        &self,
        inputs: Vec<I>,
        f: &F,
        workers: usize,
        tracker: &mut ProgressTracker<'_>,
    ) -> Vec<Result<O>>
    where
        I: Send,
        O: Send,
        F: Fn(I) -> Result<O> + Sync,
    {
        let total = inputs.len();
        let (task_tx, task_rx) = channel::bounded::<(usize, I)>(self.queue_capacity * workers);
        let (result_tx, result_rx) = channel::unbounded::<(usize, Result<O>)>();
        let mut collected: Vec<(usize, Result<O>)> = Vec::with_capacity(total);

        thread::scope(|scope| {
            scope.spawn(move || {
                for task in inputs.into_iter().enumerate() {
                    if task_tx.send(task).is_err() {
                        break;
                    }
                }
            });

            for worker in 0..workers {
                let task_rx = task_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    let mut handled = 0usize;
                    for (index, input) in task_rx.iter() {
                        let outcome = apply(f, index, input);
                        handled += 1;
                        if result_tx.send((index, outcome)).is_err() {
                            break;
                        }
                    }
                    debug!(worker, handled, "worker done");
                });
            }
            // The result channel closes once the last worker drops its sender.
            drop(task_rx);
            drop(result_tx);

            for pair in result_rx.iter() {
                collected.push(pair);
                tracker.tick();
            }
        });

        collected.sort_by_key(|(index, _)| *index);
        collected.into_iter().map(|(_, outcome)| outcome).collect()
    }
}

fn run_sequential<I, O, F>(inputs: Vec<I>, f: &F, tracker: &mut ProgressTracker<'_>) -> Vec<Result<O>>
where
    F: Fn(I) -> Result<O>,
{
    inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            let outcome = apply(f, index, input);
            tracker.tick();
            outcome
        })
        .collect()
}

fn apply<I, O, F>(f: &F, index: usize, input: I) -> Result<O>
where
    F: Fn(I) -> Result<O>,
{
    match panic::catch_unwind(AssertUnwindSafe(|| f(input))) {
        Ok(outcome) => outcome,
        Err(payload) => Err(Error::worker(index, panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
