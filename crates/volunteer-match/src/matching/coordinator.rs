use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{error, info, warn};

use super::optimizer::{GeneticOptimizer, OptimizationOutcome};
use super::publisher::{PublishOutcome, ResultSink};
use super::registry::{PreferenceRegistry, RegistrySnapshot};

/// Acknowledgement returned as soon as a run has been queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunTicket {
    pub sequence: u64,
}

/// Everything known about a finished run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub sequence: u64,
    pub people: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: OptimizationOutcome,
    pub publish: PublishOutcome,
}

struct RunContext<S> {
    registry: Arc<PreferenceRegistry>,
    optimizer: Arc<GeneticOptimizer>,
    sink: Arc<S>,
    seed: Option<u64>,
}

impl<S> Clone for RunContext<S> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            optimizer: Arc::clone(&self.optimizer),
            sink: Arc::clone(&self.sink),
            seed: self.seed,
        }
    }
}

impl<S: ResultSink> RunContext<S> {
    fn execute(&self, sequence: u64, snapshot: RegistrySnapshot) -> RunSummary {
        let started_at = Utc::now();
        info!(sequence, people = snapshot.len(), "optimizer run started");

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(sequence)),
            None => StdRng::from_entropy(),
        };
        let outcome = self.optimizer.optimize(&snapshot, &mut rng);

        if !outcome.feasible {
            warn!(
                sequence,
                services = outcome.over_capacity.len(),
                "best assignment exceeds service capacity"
            );
        }
        info!(
            sequence,
            total_cost = outcome.total_cost,
            dissatisfaction = outcome.dissatisfaction,
            "optimizer run finished"
        );

        let publish = self
            .sink
            .publish_run(sequence, outcome.assignments.clone());

        RunSummary {
            sequence,
            people: snapshot.len(),
            started_at,
            finished_at: Utc::now(),
            outcome,
            publish,
        }
    }
}

/// Starts optimizer runs against the current registry contents and forwards each result to the
/// sink. Every run carries a sequence number so the sink can discard results that arrive after
/// a newer run has already been published.
pub struct RunCoordinator<S> {
    context: RunContext<S>,
    sequence: AtomicU64,
    start_lock: Mutex<()>,
}

impl<S> RunCoordinator<S>
where
    S: ResultSink + 'static,
{
    pub fn new(
        registry: Arc<PreferenceRegistry>,
        optimizer: Arc<GeneticOptimizer>,
        sink: Arc<S>,
    ) -> Self {
        Self {
            context: RunContext {
                registry,
                optimizer,
                sink,
                seed: None,
            },
            sequence: AtomicU64::new(0),
            start_lock: Mutex::new(()),
        }
    }

    /// Derive each run's random generator from `seed` plus the run sequence number.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.context.seed = seed;
        self
    }

    /// Snapshot the registry, queue a run on the blocking worker pool and return immediately.
    ///
    /// Submissions made after this returns are not part of the run. Must be called from within
    /// a tokio runtime.
    pub fn trigger_run(&self) -> RunTicket {
        let (sequence, snapshot) = self.begin_run();
        let context = self.context.clone();

        let worker = tokio::task::spawn_blocking(move || context.execute(sequence, snapshot));
        tokio::spawn(async move {
            if let Err(err) = worker.await {
                error!(sequence, error = %err, "optimizer run aborted");
            }
        });

        RunTicket { sequence }
    }

    /// Execute a run on the calling thread and return its summary.
    pub fn run_now(&self) -> RunSummary {
        let (sequence, snapshot) = self.begin_run();
        self.context.execute(sequence, snapshot)
    }

    pub fn last_sequence(&self) -> u64 {
        self.sequence.load(Ordering::Acquire)
    }

    /// Sequence numbers and snapshots are taken together so a higher sequence never runs on
    /// older registry contents.
    fn begin_run(&self) -> (u64, RegistrySnapshot) {
        let _guard = self
            .start_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let sequence = self.sequence.fetch_add(1, Ordering::AcqRel) + 1;
        (sequence, self.context.registry.snapshot())
    }
}
