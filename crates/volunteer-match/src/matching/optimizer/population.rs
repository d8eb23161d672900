use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;

use super::cost::{squared, unlisted_cost, INFEASIBLE_COST};
use crate::matching::catalog::ServiceCatalog;
use crate::matching::domain::Person;

/// A volunteer's preferences resolved to catalog indices.
#[derive(Debug, Clone)]
struct Chooser {
    /// `(service index, cost)` in rank order.
    choices: Vec<(usize, u64)>,
    unlisted: u64,
}

impl Chooser {
    fn cost(&self, slot: Option<usize>) -> u64 {
        slot.and_then(|service| {
            self.choices
                .iter()
                .find(|(choice, _)| *choice == service)
                .map(|(_, cost)| *cost)
        })
        .unwrap_or(self.unlisted)
    }
}

/// One full tentative assignment: slot `i` holds the service index for person `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Candidate {
    pub(crate) slots: Vec<Option<usize>>,
}

#[derive(Debug, Clone)]
pub(crate) struct Scored {
    pub(crate) cost: u64,
    pub(crate) candidate: Candidate,
}

/// The search space of one run: who is being placed and how much room each service has.
#[derive(Debug)]
pub(crate) struct Problem {
    capacities: Vec<usize>,
    choosers: Vec<Chooser>,
}

impl Problem {
    pub(crate) fn new(catalog: &ServiceCatalog, people: &[Arc<Person>]) -> Self {
        let capacities = catalog
            .services()
            .iter()
            .map(|service| service.capacity)
            .collect();

        let choosers = people
            .iter()
            .map(|person| Chooser {
                choices: person
                    .preferences
                    .iter()
                    .enumerate()
                    .filter_map(|(position, preference)| {
                        catalog
                            .index_of(&preference.service_name)
                            .map(|service| (service, squared(position)))
                    })
                    .collect(),
                unlisted: unlisted_cost(person.preferences.len()),
            })
            .collect();

        Self {
            capacities,
            choosers,
        }
    }

    pub(crate) fn people(&self) -> usize {
        self.choosers.len()
    }

    pub(crate) fn loads(&self, candidate: &Candidate) -> Vec<usize> {
        let mut loads = vec![0; self.capacities.len()];
        for service in candidate.slots.iter().flatten() {
            loads[*service] += 1;
        }
        loads
    }

    pub(crate) fn over_capacity(&self, candidate: &Candidate) -> Vec<usize> {
        self.loads(candidate)
            .into_iter()
            .zip(&self.capacities)
            .enumerate()
            .filter(|(_, (load, capacity))| load > *capacity)
            .map(|(service, _)| service)
            .collect()
    }

    /// Sum of per-person costs, or [`INFEASIBLE_COST`] when any service is over capacity.
    pub(crate) fn total_cost(&self, candidate: &Candidate) -> u64 {
        if !self.over_capacity(candidate).is_empty() {
            return INFEASIBLE_COST;
        }

        self.choosers
            .iter()
            .zip(&candidate.slots)
            .fold(0u64, |total, (chooser, slot)| {
                total.saturating_add(chooser.cost(*slot))
            })
    }

    /// Scores every candidate and sorts ascending by cost.
    pub(crate) fn rank(&self, population: Vec<Candidate>) -> Vec<Scored> {
        let mut scored: Vec<Scored> = population
            .into_iter()
            .map(|candidate| Scored {
                cost: self.total_cost(&candidate),
                candidate,
            })
            .collect();
        scored.sort_by_key(|entry| entry.cost);
        scored
    }

    /// Greedy randomized construction: each person (in shuffled order) takes the first of their
    /// shuffled preferences that still has room, then the first catalog service with room.
    pub(crate) fn seed<R: Rng + ?Sized>(&self, rng: &mut R) -> Candidate {
        let mut slots = vec![None; self.choosers.len()];
        let mut loads = vec![0usize; self.capacities.len()];

        let mut order: Vec<usize> = (0..self.choosers.len()).collect();
        order.shuffle(rng);

        for person in order {
            let mut preferred: Vec<usize> = self.choosers[person]
                .choices
                .iter()
                .map(|(service, _)| *service)
                .collect();
            preferred.shuffle(rng);

            let has_room = |service: &usize| loads[*service] < self.capacities[*service];
            let chosen = preferred
                .into_iter()
                .find(has_room)
                .or_else(|| (0..self.capacities.len()).find(has_room));

            if let Some(service) = chosen {
                loads[service] += 1;
            }
            slots[person] = chosen;
        }

        Candidate { slots }
    }

    /// Uniform crossover: each person's placement comes from either parent with equal odds.
    pub(crate) fn crossover<R: Rng + ?Sized>(
        &self,
        left: &Candidate,
        right: &Candidate,
        rng: &mut R,
    ) -> Candidate {
        let slots = left
            .slots
            .iter()
            .zip(&right.slots)
            .map(|(a, b)| if rng.gen_bool(0.5) { *a } else { *b })
            .collect();
        Candidate { slots }
    }

    /// Moves one random person onto a random service that still has room in `candidate`.
    /// Leaves the candidate untouched when every service is full.
    pub(crate) fn mutate<R: Rng + ?Sized>(&self, candidate: &mut Candidate, rng: &mut R) {
        if candidate.slots.is_empty() {
            return;
        }

        let person = rng.gen_range(0..candidate.slots.len());
        let loads = self.loads(candidate);
        let open: Vec<usize> = loads
            .iter()
            .zip(&self.capacities)
            .enumerate()
            .filter(|(_, (load, capacity))| load < capacity)
            .map(|(service, _)| service)
            .collect();

        if let Some(service) = open.choose(rng) {
            candidate.slots[person] = Some(*service);
        }
    }
}

/// Binary tournament: draw two candidates uniformly and keep the cheaper one.
pub(crate) fn tournament<'a, R: Rng + ?Sized>(ranked: &'a [Scored], rng: &mut R) -> &'a Candidate {
    let first = &ranked[rng.gen_range(0..ranked.len())];
    let second = &ranked[rng.gen_range(0..ranked.len())];
    if first.cost < second.cost {
        &first.candidate
    } else {
        &second.candidate
    }
}
