use std::sync::Arc;

use super::catalog::ServiceCatalog;
use super::coordinator::{RunCoordinator, RunSummary, RunTicket};
use super::domain::{Person, PersonId};
use super::optimizer::{GeneticOptimizer, OptimizerConfig};
use super::publisher::{ResultPublisher, Subscription, SubscriptionId};
use super::registry::{PreferenceRegistry, RegistrySnapshot};
use super::validation::ValidationError;

/// Service composing the preference registry, run coordinator, and result publisher behind
/// the operations transports call.
pub struct MatchingService {
    registry: Arc<PreferenceRegistry>,
    publisher: Arc<ResultPublisher>,
    coordinator: RunCoordinator<ResultPublisher>,
}

impl MatchingService {
    pub fn new(catalog: Arc<ServiceCatalog>, config: OptimizerConfig) -> Self {
        let registry = Arc::new(PreferenceRegistry::new(Arc::clone(&catalog)));
        let optimizer = Arc::new(GeneticOptimizer::new(catalog, config));
        let publisher = Arc::new(ResultPublisher::new());
        let coordinator =
            RunCoordinator::new(Arc::clone(&registry), optimizer, Arc::clone(&publisher));

        Self {
            registry,
            publisher,
            coordinator,
        }
    }

    /// Make every run reproducible from `seed`.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.coordinator = self.coordinator.with_seed(seed);
        self
    }

    /// Record (or replace) a volunteer's ranked preferences.
    pub fn submit_preferences(&self, person: Person) -> Result<Arc<Person>, ValidationError> {
        self.registry.upsert(person)
    }

    /// Start an optimizer run in the background; the result arrives through subscriptions.
    pub fn trigger_run(&self) -> RunTicket {
        self.coordinator.trigger_run()
    }

    /// Run the optimizer on the calling thread, publishing and returning the result.
    pub fn run_now(&self) -> RunSummary {
        self.coordinator.run_now()
    }

    pub fn subscribe(&self) -> Subscription {
        self.publisher.subscribe()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.publisher.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.publisher.subscriber_count()
    }

    pub fn catalog(&self) -> &Arc<ServiceCatalog> {
        self.registry.catalog()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.registry.snapshot()
    }

    pub fn person(&self, id: &PersonId) -> Option<Arc<Person>> {
        self.registry.get(id)
    }
}
