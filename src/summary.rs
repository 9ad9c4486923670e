use crate::error::TriplexError;
use serde::Serialize;
use std::fmt;
use std::iter::Sum;
use std::ops::AddAssign;

/// Counters every pairing worker accumulates. A target counts as examined
/// as soon as it is claimed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PairingCounters {
    pub targets_examined: usize,
    pub targets_qualifying: usize,
    pub pairs_examined: usize,
    pub pairs_qualifying: usize,
}

impl AddAssign for PairingCounters {
    fn add_assign(&mut self, other: Self) {
        self.targets_examined += other.targets_examined;
        self.targets_qualifying += other.targets_qualifying;
        self.pairs_examined += other.pairs_examined;
        self.pairs_qualifying += other.pairs_qualifying;
    }
}

impl Sum for PairingCounters {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |mut acc, c| {
            acc += c;
            acc
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerSummary {
    pub worker: usize,
    #[serde(flatten)]
    pub counters: PairingCounters,
}

impl WorkerSummary {
    pub fn new(worker: usize) -> Self {
        Self { worker, counters: PairingCounters::default() }
    }
}

/// A worker that stopped on an error. Whatever it persisted before failing
/// stays in the cache; the target it held at the time is not retried.
#[derive(Debug)]
pub struct WorkerFailure {
    pub summary: WorkerSummary,
    pub error: TriplexError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    pub worker: usize,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub namespace: String,
    pub workers: usize,
    pub pending_at_start: usize,
    /// `None` when the cache could no longer be queried after the run.
    pub pending_at_end: Option<usize>,
    pub totals: PairingCounters,
    pub per_worker: Vec<WorkerSummary>,
    pub failures: Vec<FailureReport>,
}

impl RunSummary {
    pub fn new(namespace: String, workers: usize, pending_at_start: usize) -> Self {
        Self {
            namespace,
            workers,
            pending_at_start,
            pending_at_end: None,
            totals: PairingCounters::default(),
            per_worker: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Folds one worker's result in. Failed workers still contribute the
    /// counters they reached.
    pub fn record(&mut self, outcome: Result<WorkerSummary, WorkerFailure>) {
        let summary = match outcome {
            Ok(summary) => summary,
            Err(failure) => {
                self.failures.push(FailureReport {
                    worker: failure.summary.worker,
                    error: failure.error.to_string(),
                });
                failure.summary
            }
        };
        self.totals += summary.counters;
        self.per_worker.push(summary);
        self.per_worker.sort_by_key(|s| s.worker);
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn to_json(&self) -> Result<String, TriplexError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "namespace        {}", self.namespace)?;
        writeln!(f, "workers          {}", self.workers)?;
        writeln!(f, "pending at start {}", self.pending_at_start)?;
        match self.pending_at_end {
            Some(n) => writeln!(f, "pending at end   {}", n)?,
            None => writeln!(f, "pending at end   unknown")?,
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>8} {:>10} {:>10} {:>12} {:>12}",
            "worker", "targets", "qualifying", "pairs", "qualifying"
        )?;
        for s in &self.per_worker {
            let c = s.counters;
            writeln!(
                f,
                "{:>8} {:>10} {:>10} {:>12} {:>12}",
                s.worker, c.targets_examined, c.targets_qualifying, c.pairs_examined, c.pairs_qualifying
            )?;
        }
        let t = self.totals;
        writeln!(
            f,
            "{:>8} {:>10} {:>10} {:>12} {:>12}",
            "total", t.targets_examined, t.targets_qualifying, t.pairs_examined, t.pairs_qualifying
        )?;
        for failure in &self.failures {
            writeln!(f, "worker {} failed: {}", failure.worker, failure.error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(worker: usize, targets: usize, qualifying: usize, pairs: usize, kept: usize) -> WorkerSummary {
        WorkerSummary {
            worker,
            counters: PairingCounters {
                targets_examined: targets,
                targets_qualifying: qualifying,
                pairs_examined: pairs,
                pairs_qualifying: kept,
            },
        }
    }

    #[test]
    fn test_record_merges_counters() {
        let mut run = RunSummary::new("ns".into(), 2, 5);
        run.record(Ok(summary(1, 3, 1, 10, 2)));
        run.record(Ok(summary(0, 2, 0, 1, 0)));
        assert_eq!(
            run.totals,
            PairingCounters { targets_examined: 5, targets_qualifying: 1, pairs_examined: 11, pairs_qualifying: 2 }
        );
        assert_eq!(run.per_worker[0].worker, 0);
        assert!(run.is_success());
    }

    #[test]
    fn test_failed_worker_is_reported() {
        let mut run = RunSummary::new("ns".into(), 1, 1);
        run.record(Err(WorkerFailure {
            summary: summary(0, 1, 0, 0, 0),
            error: TriplexError::Cache("connection reset".into()),
        }));
        assert!(!run.is_success());
        assert_eq!(run.totals.targets_examined, 1);
        assert_eq!(run.failures[0].error, "Cache error: connection reset");
        assert!(run.to_string().contains("worker 0 failed"));
    }

    #[test]
    fn test_counters_sum() {
        let total: PairingCounters = [summary(0, 1, 1, 3, 1), summary(1, 2, 0, 0, 0)]
            .into_iter()
            .map(|s| s.counters)
            .sum();
        assert_eq!(total.targets_examined, 3);
        assert_eq!(total.pairs_examined, 3);
    }

    #[test]
    fn test_json_flattens_worker_counters() {
        let mut run = RunSummary::new("microrna.org:aug.2010:hsa:hg19".into(), 1, 1);
        run.record(Ok(summary(0, 1, 1, 3, 1)));
        run.pending_at_end = Some(0);
        let value: serde_json::Value = serde_json::from_str(&run.to_json().unwrap()).unwrap();
        assert_eq!(value["per_worker"][0]["targets_examined"], 1);
        assert_eq!(value["totals"]["pairs_qualifying"], 1);
        assert_eq!(value["pending_at_end"], 0);
    }
}
