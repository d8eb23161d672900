//! Genetic search for a capacity-respecting roster with minimal total dissatisfaction.
//!
//! Each run seeds a population of greedy randomized candidates, then evolves it for a fixed
//! number of generations using elitism, binary tournament selection, uniform crossover and a
//! capacity-aware single-person mutation. The random source is supplied by the caller so a
//! seeded generator reproduces a run exactly.

mod cost;
mod population;

use std::sync::Arc;

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use super::catalog::ServiceCatalog;
use super::domain::Assignment;
use super::registry::RegistrySnapshot;
use population::{tournament, Problem};

pub use cost::{
    capacity_violations, placement_cost, CapacityViolation, INFEASIBLE_COST, UNLISTED_PENALTY,
};

const DEFAULT_POPULATION_SIZE: usize = 50;
const DEFAULT_MAX_GENERATIONS: usize = 100;
const DEFAULT_MUTATION_RATE: f64 = 0.1;
const DEFAULT_ELITE_FRACTION: f64 = 0.1;

/// Tuning knobs for the genetic search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerConfig {
    pub population_size: usize,
    pub max_generations: usize,
    pub mutation_rate: f64,
    pub elite_fraction: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            population_size: DEFAULT_POPULATION_SIZE,
            max_generations: DEFAULT_MAX_GENERATIONS,
            mutation_rate: DEFAULT_MUTATION_RATE,
            elite_fraction: DEFAULT_ELITE_FRACTION,
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<(), InvalidOptimizerConfig> {
        if self.population_size == 0 {
            return Err(InvalidOptimizerConfig::EmptyPopulation);
        }
        if !is_probability(self.mutation_rate) {
            return Err(InvalidOptimizerConfig::MutationRate(self.mutation_rate));
        }
        if !is_probability(self.elite_fraction) {
            return Err(InvalidOptimizerConfig::EliteFraction(self.elite_fraction));
        }
        Ok(())
    }

    /// Number of top candidates copied unchanged into the next generation. Never zero, so the
    /// best cost can only stay level or improve between generations.
    pub fn elite_count(&self) -> usize {
        let elites = (self.population_size as f64 * self.elite_fraction).floor() as usize;
        elites.clamp(1, self.population_size.max(1))
    }

    fn sanitized(self) -> Self {
        let defaults = Self::default();
        Self {
            population_size: self.population_size.max(1),
            max_generations: self.max_generations,
            mutation_rate: if is_probability(self.mutation_rate) {
                self.mutation_rate
            } else {
                defaults.mutation_rate
            },
            elite_fraction: if is_probability(self.elite_fraction) {
                self.elite_fraction
            } else {
                defaults.elite_fraction
            },
        }
    }
}

fn is_probability(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

/// Rejected optimizer settings.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidOptimizerConfig {
    #[error("population size must be at least 1")]
    EmptyPopulation,
    #[error("mutation rate must be within 0..=1 (found {0})")]
    MutationRate(f64),
    #[error("elite fraction must be within 0..=1 (found {0})")]
    EliteFraction(f64),
}

/// Result of one optimizer run.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationOutcome {
    /// One entry per person, in snapshot order.
    pub assignments: Vec<Assignment>,
    /// Candidate cost: the dissatisfaction sum, or [`INFEASIBLE_COST`] when over capacity.
    pub total_cost: u64,
    /// Sum of per-person costs regardless of feasibility.
    pub dissatisfaction: u64,
    pub feasible: bool,
    /// Best population cost at the start of every generation, plus the final ranking.
    pub best_cost_by_generation: Vec<u64>,
    pub over_capacity: Vec<CapacityViolation>,
}

impl OptimizationOutcome {
    fn empty() -> Self {
        Self {
            assignments: Vec::new(),
            total_cost: 0,
            dissatisfaction: 0,
            feasible: true,
            best_cost_by_generation: Vec::new(),
            over_capacity: Vec::new(),
        }
    }
}

/// Genetic assignment search bound to one service catalog.
#[derive(Debug, Clone)]
pub struct GeneticOptimizer {
    catalog: Arc<ServiceCatalog>,
    config: OptimizerConfig,
}

impl GeneticOptimizer {
    pub fn new(catalog: Arc<ServiceCatalog>, config: OptimizerConfig) -> Self {
        Self {
            catalog,
            config: config.sanitized(),
        }
    }

    pub fn catalog(&self) -> &Arc<ServiceCatalog> {
        &self.catalog
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Runs the full generation budget against `snapshot` and returns the best candidate found.
    ///
    /// Infeasible inputs (more demand than capacity) still produce a result; check
    /// [`OptimizationOutcome::feasible`] or [`capacity_violations`].
    pub fn optimize<R: Rng + ?Sized>(
        &self,
        snapshot: &RegistrySnapshot,
        rng: &mut R,
    ) -> OptimizationOutcome {
        if snapshot.is_empty() {
            return OptimizationOutcome::empty();
        }

        let problem = Problem::new(&self.catalog, snapshot.people());
        let size = self.config.population_size;
        let elites = self.config.elite_count();

        let mut population: Vec<_> = (0..size).map(|_| problem.seed(rng)).collect();
        let mut history = Vec::with_capacity(self.config.max_generations + 1);

        for _ in 0..self.config.max_generations {
            let ranked = problem.rank(population);
            history.push(ranked[0].cost);

            let mut next = Vec::with_capacity(size);
            next.extend(ranked.iter().take(elites).map(|entry| entry.candidate.clone()));

            while next.len() < size {
                let left = tournament(&ranked, rng);
                let right = tournament(&ranked, rng);
                let mut child = problem.crossover(left, right, rng);
                if rng.gen_bool(self.config.mutation_rate) {
                    problem.mutate(&mut child, rng);
                }
                next.push(child);
            }

            population = next;
        }

        let mut ranked = problem.rank(population);
        history.push(ranked[0].cost);
        let best = ranked.swap_remove(0);

        debug!(
            people = problem.people(),
            generations = self.config.max_generations,
            best_cost = best.cost,
            "genetic search finished"
        );

        let assignments: Vec<Assignment> = snapshot
            .people()
            .iter()
            .zip(&best.candidate.slots)
            .map(|(person, slot)| {
                let service_name = slot.map(|service| self.catalog.services()[service].name.clone());
                Assignment {
                    person_id: person.id.clone(),
                    cost: placement_cost(person, service_name.as_deref()),
                    service_name,
                }
            })
            .collect();

        let dissatisfaction = assignments
            .iter()
            .fold(0u64, |total, assignment| total.saturating_add(assignment.cost));
        let over_capacity = capacity_violations(&self.catalog, &assignments);

        OptimizationOutcome {
            feasible: over_capacity.is_empty(),
            total_cost: best.cost,
            dissatisfaction,
            best_cost_by_generation: history,
            over_capacity,
            assignments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_values() {
        let config = OptimizerConfig::default();
        assert_eq!(config.population_size, 50);
        assert_eq!(config.max_generations, 100);
        assert_eq!(config.elite_count(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_settings() {
        let zero = OptimizerConfig {
            population_size: 0,
            ..OptimizerConfig::default()
        };
        assert_eq!(zero.validate(), Err(InvalidOptimizerConfig::EmptyPopulation));

        let wild = OptimizerConfig {
            mutation_rate: 1.5,
            ..OptimizerConfig::default()
        };
        assert_eq!(wild.validate(), Err(InvalidOptimizerConfig::MutationRate(1.5)));

        let nan = OptimizerConfig {
            elite_fraction: f64::NAN,
            ..OptimizerConfig::default()
        };
        assert!(matches!(
            nan.validate(),
            Err(InvalidOptimizerConfig::EliteFraction(_))
        ));
    }

    #[test]
    fn small_populations_keep_one_elite() {
        let config = OptimizerConfig {
            population_size: 4,
            ..OptimizerConfig::default()
        };
        assert_eq!(config.elite_count(), 1);
    }

    #[test]
    fn new_sanitizes_unusable_settings() {
        let optimizer = GeneticOptimizer::new(
            Arc::new(ServiceCatalog::standard()),
            OptimizerConfig {
                population_size: 0,
                mutation_rate: -1.0,
                ..OptimizerConfig::default()
            },
        );
        assert_eq!(optimizer.config().population_size, 1);
        assert_eq!(optimizer.config().mutation_rate, DEFAULT_MUTATION_RATE);
    }
}
