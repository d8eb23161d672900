use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A service volunteers can be rostered onto, with the most people it can take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub capacity: usize,
}

impl Service {
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
        }
    }
}

/// Immutable, ordered set of services. Catalog order is the fallback order used when a
/// volunteer's own preferences are all full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCatalog {
    services: Vec<Service>,
    index: HashMap<String, usize>,
}

impl ServiceCatalog {
    pub fn new(services: Vec<Service>) -> Result<Self, CatalogError> {
        if services.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut index = HashMap::with_capacity(services.len());
        for (position, service) in services.iter().enumerate() {
            if service.name.trim().is_empty() {
                return Err(CatalogError::BlankName { position });
            }
            if index.insert(service.name.clone(), position).is_some() {
                return Err(CatalogError::DuplicateService {
                    name: service.name.clone(),
                });
            }
        }

        Ok(Self { services, index })
    }

    /// The event roster used when no catalog file is configured.
    pub fn standard() -> Self {
        let services: Vec<Service> = [
            ("Reception", 4),
            ("Logistics", 3),
            ("Food Service", 5),
            ("Security", 4),
            ("Media", 2),
            ("Transport", 3),
            ("Medical", 2),
            ("Info Desk", 3),
            ("Cleanup", 4),
            ("Tech Support", 3),
        ]
        .into_iter()
        .map(|(name, capacity)| Service::new(name, capacity))
        .collect();

        let index = services
            .iter()
            .enumerate()
            .map(|(position, service)| (service.name.clone(), position))
            .collect();

        Self { services, index }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parses a JSON array of `{ "name": ..., "capacity": ... }` objects.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let services: Vec<Service> = serde_json::from_reader(reader)?;
        Self::new(services)
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Service> {
        self.index_of(name).map(|position| &self.services[position])
    }

    pub fn total_capacity(&self) -> usize {
        self.services.iter().map(|service| service.capacity).sum()
    }
}

/// Failures raised while building a catalog from configuration.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog must list at least one service")]
    Empty,
    #[error("service at position {position} has a blank name")]
    BlankName { position: usize },
    #[error("service '{name}' is listed more than once")]
    DuplicateService { name: String },
    #[error("unable to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}
