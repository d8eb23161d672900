use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::BuildHasher;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::catalog::ServiceCatalog;
use super::domain::{Person, PersonId};
use super::validation::{normalize_submission, ValidationError};

const SHARD_COUNT: usize = 16;

type Shard = RwLock<HashMap<PersonId, Arc<Person>>>;

/// Concurrent store holding the latest preference submission per volunteer.
///
/// Records are immutable `Arc<Person>` values, so replacing one is a pointer swap inside a
/// single shard. Writers touching different shards never contend.
#[derive(Debug)]
pub struct PreferenceRegistry {
    catalog: Arc<ServiceCatalog>,
    shards: Box<[Shard]>,
    hasher: RandomState,
}

impl PreferenceRegistry {
    pub fn new(catalog: Arc<ServiceCatalog>) -> Self {
        let shards = (0..SHARD_COUNT)
            .map(|_| RwLock::new(HashMap::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            catalog,
            shards,
            hasher: RandomState::new(),
        }
    }

    pub fn catalog(&self) -> &Arc<ServiceCatalog> {
        &self.catalog
    }

    /// Validate and store a submission, fully replacing any earlier list for the same id.
    pub fn upsert(&self, person: Person) -> Result<Arc<Person>, ValidationError> {
        let person = Arc::new(normalize_submission(&self.catalog, person)?);

        let previous = self
            .shard(&person.id)
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(person.id.clone(), Arc::clone(&person));

        debug!(
            person_id = %person.id,
            preferences = person.preferences.len(),
            replaced = previous.is_some(),
            "stored preference submission"
        );

        Ok(person)
    }

    pub fn get(&self, id: &PersonId) -> Option<Arc<Person>> {
        self.shard(id)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Point-in-time copy of every stored record, ordered by id.
    ///
    /// Every shard's read lock is held while copying, so no write lands halfway through.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let guards: Vec<_> = self
            .shards
            .iter()
            .map(|shard| shard.read().unwrap_or_else(PoisonError::into_inner))
            .collect();

        let mut people: Vec<Arc<Person>> = guards
            .iter()
            .flat_map(|guard| guard.values().cloned())
            .collect();
        drop(guards);

        people.sort_by(|left, right| left.id.cmp(&right.id));
        RegistrySnapshot {
            people: people.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.read().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.write().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }

    fn shard(&self, id: &PersonId) -> &Shard {
        let slot = (self.hasher.hash_one(id) as usize) % self.shards.len();
        &self.shards[slot]
    }
}

/// Immutable view of the registry used as optimizer input.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    people: Arc<[Arc<Person>]>,
}

impl RegistrySnapshot {
    pub fn from_people(mut people: Vec<Person>) -> Self {
        people.sort_by(|left, right| left.id.cmp(&right.id));
        Self {
            people: people.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn people(&self) -> &[Arc<Person>] {
        &self.people
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    pub fn get(&self, id: &PersonId) -> Option<&Arc<Person>> {
        self.people
            .binary_search_by(|person| person.id.cmp(id))
            .ok()
            .map(|position| &self.people[position])
    }
}
