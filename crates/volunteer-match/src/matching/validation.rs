use std::collections::HashSet;

use super::catalog::ServiceCatalog;
use super::domain::Person;

/// Reasons a preference submission is refused before it reaches the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("volunteer id must not be blank")]
    MissingId,
    #[error("preference list must not be empty")]
    EmptyPreferences,
    #[error("preference list names {found} services but the catalog only has {max}")]
    TooManyPreferences { max: usize, found: usize },
    #[error("service '{0}' is not in the catalog")]
    UnknownService(String),
    #[error("service '{0}' is listed more than once")]
    DuplicateService(String),
    #[error("ranks must run 1..={expected} without gaps or repeats")]
    NonContiguousRanks { expected: usize },
}

/// Checks a submission against the catalog and normalizes it into rank order.
pub(crate) fn normalize_submission(
    catalog: &ServiceCatalog,
    mut person: Person,
) -> Result<Person, ValidationError> {
    if person.id.as_str().trim().is_empty() {
        return Err(ValidationError::MissingId);
    }

    let count = person.preferences.len();
    if count == 0 {
        return Err(ValidationError::EmptyPreferences);
    }
    if count > catalog.len() {
        return Err(ValidationError::TooManyPreferences {
            max: catalog.len(),
            found: count,
        });
    }

    let mut seen = HashSet::with_capacity(count);
    for preference in &person.preferences {
        if !catalog.contains(&preference.service_name) {
            return Err(ValidationError::UnknownService(
                preference.service_name.clone(),
            ));
        }
        if !seen.insert(preference.service_name.as_str()) {
            return Err(ValidationError::DuplicateService(
                preference.service_name.clone(),
            ));
        }
    }

    person.preferences.sort_by_key(|preference| preference.rank);
    let contiguous = person
        .preferences
        .iter()
        .zip(1u32..)
        .all(|(preference, expected)| preference.rank == expected);
    if !contiguous {
        return Err(ValidationError::NonContiguousRanks { expected: count });
    }

    Ok(person)
}
