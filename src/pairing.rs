use crate::cache::{CacheBackend, NamespaceCache};
use crate::duplex::DuplexField;
use crate::error::TriplexError;
use crate::summary::{WorkerFailure, WorkerSummary};
use itertools::Itertools;
use tracing::{debug, error, info};

/// Seed binding distance window (nt) observed for cooperative miRNA pairs
/// in experimentally validated triplexes (Saetrom et al. 2007). Both bounds
/// are inclusive.
pub const MIN_DISTANCE: u64 = 13;
pub const MAX_DISTANCE: u64 = 35;

pub fn binding_distance(start1: i64, start2: i64) -> u64 {
    start1.abs_diff(start2)
}

pub fn is_allowed(distance: u64) -> bool {
    (MIN_DISTANCE..=MAX_DISTANCE).contains(&distance)
}

/// What comparing one target's duplexes produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetOutcome {
    pub pairs_examined: usize,
    pub allowed_pairs: Vec<(String, String)>,
}

impl TargetOutcome {
    pub fn qualifies(&self) -> bool {
        !self.allowed_pairs.is_empty()
    }
}

/// Drains the pending-target set of one namespace. Several workers may run
/// against the same namespace; the only thing they share is the cache.
pub struct PairingWorker<B: CacheBackend> {
    summary: WorkerSummary,
    cache: NamespaceCache<B>,
}

impl<B: CacheBackend> PairingWorker<B> {
    pub fn new(id: usize, cache: NamespaceCache<B>) -> Self {
        Self { summary: WorkerSummary::new(id), cache }
    }

    pub fn id(&self) -> usize {
        self.summary.worker
    }

    /// Claims targets until none are left. Any error stops this worker; the
    /// target in hand at that moment is dropped, not requeued.
    pub fn run(mut self) -> Result<WorkerSummary, WorkerFailure> {
        let worker = self.id();
        loop {
            let target = match self.cache.claim_target() {
                Ok(Some(target)) => target,
                Ok(None) => break,
                Err(e) => return Err(self.fail(e)),
            };
            self.summary.counters.targets_examined += 1;
            debug!(worker, target_key = %target, "generating allowed triplexes for target");

            match self.process_target(&target) {
                Ok(outcome) => {
                    let c = &mut self.summary.counters;
                    c.pairs_examined += outcome.pairs_examined;
                    if outcome.qualifies() {
                        c.targets_qualifying += 1;
                        c.pairs_qualifying += outcome.allowed_pairs.len();
                    }
                }
                Err(e) => return Err(self.fail(e)),
            }
        }

        let c = self.summary.counters;
        info!(
            worker,
            targets = c.targets_examined,
            qualifying = c.targets_qualifying,
            pairs = c.pairs_examined,
            triplexes = c.pairs_qualifying,
            "worker {}: examined {} targets, {} of which are targeted by {} putative triplexes",
            worker,
            c.targets_examined,
            c.targets_qualifying,
            c.pairs_qualifying
        );
        Ok(self.summary)
    }

    fn fail(self, error: TriplexError) -> WorkerFailure {
        error!(worker = self.id(), error = %error, "worker aborted");
        WorkerFailure { summary: self.summary, error }
    }

    /// Compares every unordered pair of the target's duplexes and persists
    /// the allowed ones.
    pub fn process_target(&mut self, target: &str) -> Result<TargetOutcome, TriplexError> {
        let mut duplexes = self.cache.duplex_set(target)?;
        if duplexes.len() < 2 {
            debug!(target_key = target, duplexes = duplexes.len(), "too few duplexes to pair");
            return Ok(TargetOutcome::default());
        }
        duplexes.sort();

        let starts = duplexes
            .iter()
            .map(|d| self.alignment_start(d))
            .collect::<Result<Vec<i64>, TriplexError>>()?;

        let mut outcome = TargetOutcome::default();
        for ((d1, s1), (d2, s2)) in duplexes.iter().zip(&starts).tuple_combinations() {
            outcome.pairs_examined += 1;
            let distance = binding_distance(*s1, *s2);
            if is_allowed(distance) {
                debug!(duplex1 = %d1, duplex2 = %d2, distance, "range allowed, triplex kept");
                outcome.allowed_pairs.push((d1.clone(), d2.clone()));
            } else {
                debug!(duplex1 = %d1, duplex2 = %d2, distance, "range disallowed, triplex ignored");
            }
        }

        if outcome.qualifies() {
            self.cache.mark_qualifying_target(target)?;
            for (d1, d2) in &outcome.allowed_pairs {
                self.cache.append_qualifying_duplex(target, d1)?;
                self.cache.append_qualifying_duplex(target, d2)?;
            }
            debug!(
                target_key = target,
                kept = outcome.allowed_pairs.len(),
                pairs = outcome.pairs_examined,
                "target forms allowed binding range triplexes"
            );
        }
        Ok(outcome)
    }

    fn alignment_start(&mut self, duplex: &str) -> Result<i64, TriplexError> {
        let field = DuplexField::GeneStart.name();
        let value = self.cache.field(duplex, field)?.ok_or_else(|| TriplexError::MissingField {
            duplex: duplex.to_string(),
            field,
        })?;
        value.trim().parse().map_err(|_| TriplexError::InvalidCoordinate {
            duplex: duplex.to_string(),
            value,
        })
    }
}
