use crate::cache::{Connect, NamespaceCache};
use crate::config::TriplexerConfig;
use crate::error::TriplexError;
use crate::namespace::Namespace;
use crate::pairing::PairingWorker;
use crate::summary::{RunSummary, WorkerFailure, WorkerSummary};
use std::thread;
use tracing::{debug, error, info, warn};

/// Runs a pool of pairing workers over one namespace and merges their
/// statistics.
pub struct Orchestrator {
    namespace: Namespace,
    workers: usize,
}

impl Orchestrator {
    pub fn new(namespace: Namespace, workers: usize) -> Result<Self, TriplexError> {
        if workers == 0 {
            return Err(TriplexError::Config("at least one worker is required".to_string()));
        }
        Ok(Self { namespace, workers })
    }

    pub fn from_config(config: &TriplexerConfig) -> Result<Self, TriplexError> {
        Self::new(config.namespace.clone(), config.workers)
    }

    /// Blocks until every worker has drained the queue or failed. An
    /// unreachable cache aborts before any worker starts.
    pub fn run<C: Connect>(&self, connector: &C) -> Result<RunSummary, TriplexError> {
        let mut probe = NamespaceCache::new(self.namespace.clone(), connector.connect()?);
        probe.ping()?;
        let pending_at_start = probe.pending_count()?;

        info!(
            namespace = %self.namespace,
            workers = self.workers,
            pending = pending_at_start,
            "finding allowed duplex-pair comparisons among each target's duplexes"
        );

        let outcomes: Vec<Result<WorkerSummary, WorkerFailure>> = thread::scope(|s| {
            let handles: Vec<_> = (0..self.workers)
                .map(|id| {
                    let namespace = self.namespace.clone();
                    s.spawn(move || run_worker(id, namespace, connector))
                })
                .collect();
            handles
                .into_iter()
                .enumerate()
                .map(|(id, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        error!(worker = id, "worker panicked");
                        Err(WorkerFailure {
                            summary: WorkerSummary::new(id),
                            error: TriplexError::Other(format!("worker {} panicked", id)),
                        })
                    })
                })
                .collect()
        });

        let mut summary = RunSummary::new(self.namespace.key(), self.workers, pending_at_start);
        for outcome in outcomes {
            summary.record(outcome);
        }
        summary.pending_at_end = match probe.pending_count() {
            Ok(n) => Some(n),
            Err(e) => {
                warn!(error = %e, "could not read pending targets after the run");
                None
            }
        };

        let t = summary.totals;
        info!(
            namespace = %self.namespace,
            targets = t.targets_examined,
            qualifying = t.targets_qualifying,
            pairs = t.pairs_examined,
            triplexes = t.pairs_qualifying,
            failed_workers = summary.failures.len(),
            "pairing finished"
        );
        Ok(summary)
    }
}

fn run_worker<C: Connect>(
    id: usize,
    namespace: Namespace,
    connector: &C,
) -> Result<WorkerSummary, WorkerFailure> {
    let conn = connector.connect().map_err(|error| {
        error!(worker = id, error = %error, "worker could not connect to the cache");
        WorkerFailure { summary: WorkerSummary::new(id), error }
    })?;
    debug!(worker = id, "worker connected");
    PairingWorker::new(id, NamespaceCache::new(namespace, conn)).run()
}
