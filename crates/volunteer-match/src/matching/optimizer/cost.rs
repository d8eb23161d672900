use std::collections::HashMap;

use serde::Serialize;

use crate::matching::catalog::ServiceCatalog;
use crate::matching::domain::{Assignment, Person};

/// Cost reported for any candidate that puts more people on a service than it can take.
pub const INFEASIBLE_COST: u64 = u64::MAX;

/// Multiplier applied to `k²` when a volunteer lands outside their `k` stated preferences.
pub const UNLISTED_PENALTY: u64 = 10;

/// Dissatisfaction of placing `person` on `service` (`None` meaning unassigned).
///
/// A service at 0-based rank position `i` costs `i²`; anything unlisted costs `10 · k²`.
pub fn placement_cost(person: &Person, service: Option<&str>) -> u64 {
    match service.and_then(|name| person.position_of(name)) {
        Some(position) => squared(position),
        None => unlisted_cost(person.preferences.len()),
    }
}

pub(crate) fn squared(position: usize) -> u64 {
    let position = position as u64;
    position.saturating_mul(position)
}

pub(crate) fn unlisted_cost(list_len: usize) -> u64 {
    UNLISTED_PENALTY.saturating_mul(squared(list_len))
}

/// A service whose assigned head count exceeds its capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapacityViolation {
    pub service_name: String,
    pub capacity: usize,
    pub assigned: usize,
}

/// Re-checks a returned assignment list against the catalog.
///
/// An empty result means the assignment is feasible. Services missing from the catalog are
/// reported with a capacity of zero.
pub fn capacity_violations(
    catalog: &ServiceCatalog,
    assignments: &[Assignment],
) -> Vec<CapacityViolation> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in assignments
        .iter()
        .filter_map(|assignment| assignment.service_name.as_deref())
    {
        *counts.entry(name).or_default() += 1;
    }

    let mut violations: Vec<CapacityViolation> = counts
        .into_iter()
        .filter_map(|(name, assigned)| {
            let capacity = catalog.get(name).map_or(0, |service| service.capacity);
            (assigned > capacity).then(|| CapacityViolation {
                service_name: name.to_string(),
                capacity,
                assigned,
            })
        })
        .collect();
    violations.sort_by(|left, right| left.service_name.cmp(&right.service_name));
    violations
}
