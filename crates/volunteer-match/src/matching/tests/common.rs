use std::sync::Arc;

use axum::body::to_bytes;
use axum::response::Response;
use serde_json::Value;

use crate::matching::catalog::{Service, ServiceCatalog};
use crate::matching::domain::Person;
use crate::matching::optimizer::OptimizerConfig;
use crate::matching::registry::RegistrySnapshot;
use crate::matching::service::MatchingService;

pub(super) fn pair_catalog() -> Arc<ServiceCatalog> {
    Arc::new(
        ServiceCatalog::new(vec![Service::new("A", 1), Service::new("B", 1)])
            .expect("pair catalog"),
    )
}

pub(super) fn contested_pair() -> RegistrySnapshot {
    RegistrySnapshot::from_people(vec![
        Person::ranked("p1", "First", ["A", "B"]),
        Person::ranked("p2", "Second", ["A", "B"]),
    ])
}

/// Twenty volunteers spread over the standard catalog with overlapping favourites.
pub(super) fn event_roster() -> Vec<Person> {
    let services = [
        "Reception",
        "Logistics",
        "Food Service",
        "Security",
        "Media",
        "Transport",
        "Medical",
        "Info Desk",
        "Cleanup",
        "Tech Support",
    ];

    (0..20usize)
        .map(|volunteer| {
            let picks: Vec<&str> = (0..3)
                .map(|offset| services[(volunteer * 3 + offset * 4) % services.len()])
                .collect();
            Person::ranked(format!("v{volunteer:02}"), format!("Volunteer {volunteer}"), picks)
        })
        .collect()
}

pub(super) fn quick_config() -> OptimizerConfig {
    OptimizerConfig {
        population_size: 30,
        max_generations: 40,
        ..OptimizerConfig::default()
    }
}

pub(super) fn build_service() -> MatchingService {
    MatchingService::new(Arc::new(ServiceCatalog::standard()), quick_config()).with_seed(Some(7))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json body")
}
