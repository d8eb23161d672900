//! Preference intake, genetic roster search and result broadcasting.
//!
//! Submissions land in the [`PreferenceRegistry`]; a trigger makes the [`RunCoordinator`]
//! snapshot the registry, run the [`GeneticOptimizer`] on a blocking worker and hand the
//! result to the [`ResultPublisher`], which pushes it to every live [`Subscription`].

pub mod catalog;
pub mod coordinator;
pub mod domain;
pub mod optimizer;
pub mod publisher;
pub mod registry;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use catalog::{CatalogError, Service, ServiceCatalog};
pub use coordinator::{RunCoordinator, RunSummary, RunTicket};
pub use domain::{Assignment, Person, PersonId, Preference};
pub use optimizer::{
    capacity_violations, placement_cost, CapacityViolation, GeneticOptimizer,
    InvalidOptimizerConfig, OptimizationOutcome, OptimizerConfig, INFEASIBLE_COST,
};
pub use publisher::{
    AssignmentBatch, PublishOutcome, PublishReport, ResultPublisher, ResultSink, Subscription,
    SubscriptionId,
};
pub use registry::{PreferenceRegistry, RegistrySnapshot};
pub use router::matching_router;
pub use service::MatchingService;
pub use validation::ValidationError;
