use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use volunteer_match::error::AppError;
use volunteer_match::matching::ServiceCatalog;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads the catalog file when one is configured, otherwise the standard event catalog.
pub(crate) fn load_catalog(path: Option<&Path>) -> Result<Arc<ServiceCatalog>, AppError> {
    let catalog = match path {
        Some(path) => ServiceCatalog::from_path(path)?,
        None => ServiceCatalog::standard(),
    };
    Ok(Arc::new(catalog))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_the_standard_catalog() {
        let catalog = load_catalog(None).expect("standard catalog");
        assert_eq!(catalog.len(), 10);
        assert_eq!(catalog.total_capacity(), 33);
    }

    #[test]
    fn missing_catalog_files_are_reported() {
        let err = load_catalog(Some(Path::new("/nonexistent/catalog.json")))
            .expect_err("missing file");
        assert!(matches!(err, AppError::Catalog(_)));
    }
}
