//! Run download tasks concurrently under one in-flight bound.
//!
//! Keeps up to `max_in_flight` tasks running at once; when one finishes,
//! the next waiting target is dispatched until none remain.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use url::Url;

use crate::download::{DownloadError, DownloadFailure, DownloadReceipt, DownloadTask};
use crate::fetch::Fetcher;
use crate::persist::ImageSink;

/// Capacity shared by the worker pool and the dispatch bound.
pub const DEFAULT_WORKER_SLOTS: usize = 12;

/// Fan-in product: every receipt and every failure of one batch,
/// finalized once when the last task resolves.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub completed: Vec<DownloadReceipt>,
    pub failed: Vec<DownloadFailure>,
}

impl BatchOutcome {
    pub fn task_count(&self) -> usize {
        self.completed.len() + self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, result: Result<DownloadReceipt, DownloadFailure>) {
        match result {
            Ok(receipt) => self.completed.push(receipt),
            Err(failure) => self.failed.push(failure),
        }
    }
}

pub struct ParallelDownloader {
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn ImageSink>,
    max_in_flight: usize,
}

impl ParallelDownloader {
    pub fn new(fetcher: Arc<dyn Fetcher>, sink: Arc<dyn ImageSink>) -> Self {
        Self {
            fetcher,
            sink,
            max_in_flight: DEFAULT_WORKER_SLOTS,
        }
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Dispatches one task per target, never holding more than
    /// `max_in_flight` at once, and resolves only after every task has
    /// reached a terminal state. One task's failure neither cancels nor
    /// suppresses its siblings; the outcome retains all failures. An
    /// empty target list resolves immediately without touching the
    /// network.
    pub async fn run_all(&self, targets: Vec<Url>) -> BatchOutcome {
        let mut waiting = targets.into_iter();
        let mut in_flight: HashMap<tokio::task::Id, Url> = HashMap::new();
        let mut join_set = JoinSet::new();
        let mut outcome = BatchOutcome::default();

        loop {
            while join_set.len() < self.max_in_flight {
                let Some(target) = waiting.next() else {
                    break;
                };
                let task = DownloadTask::new(target);
                let fetcher = Arc::clone(&self.fetcher);
                let sink = Arc::clone(&self.sink);
                let tracked = task.target.clone();
                let handle = join_set.spawn(task.run(fetcher, sink));
                in_flight.insert(handle.id(), tracked);
            }

            if join_set.is_empty() {
                break;
            }

            let Some(joined) = join_set.join_next_with_id().await else {
                break;
            };
            match joined {
                Ok((id, result)) => {
                    in_flight.remove(&id);
                    outcome.record(result);
                }
                Err(join_err) => {
                    // A panicking task still counts against its target.
                    match in_flight.remove(&join_err.id()) {
                        Some(target) => outcome.record(Err(DownloadFailure {
                            target,
                            error: DownloadError::Worker(join_err.to_string()),
                        })),
                        None => log::error!("joined a task that was never tracked: {join_err}"),
                    }
                }
            }
        }

        outcome
    }
}
