//! Shared builders for the end-to-end tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;

use fixline_core::{
    AvailabilityWindow, Complexity, GeoPoint, JobCategory, JobRequest, Money, Urgency, WorkerId,
    WorkerProfile,
};
use fixline_engine::{DispatchEngine, EngineConfig, Notifier, RecordingNotifier};
use fixline_registry::WorkerRegistry;

/// Moscow city center; every test job and worker lives around here.
pub const BASE: GeoPoint = GeoPoint::new(55.7558, 37.6173);

/// Installs a compact tracing subscriber driven by `RUST_LOG`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An electrical repair request at the base location.
pub fn electrical_request() -> JobRequest {
    JobRequest {
        category: JobCategory::Electrical,
        urgency: Urgency::Normal,
        complexity: Complexity::Simple,
        labor_minutes: None,
        materials_cost: Money::from_major(200),
        address: "Tverskaya 7".to_string(),
        location: BASE,
        required_tools: vec!["multimeter".to_string()],
    }
}

/// An always-available electrician near the base location.
pub fn electrician(id: &str, rating: f64, capacity: u32) -> WorkerProfile {
    WorkerProfile {
        id: WorkerId::new(id),
        full_name: format!("Electrician {id}"),
        specializations: vec![JobCategory::Electrical],
        location: BASE,
        service_radius_km: 25.0,
        tools: vec!["multimeter".to_string(), "drill".to_string()],
        rating,
        daily_capacity: capacity,
        availability: AvailabilityWindow::full_week(0, 24),
        registered_at: Utc::now(),
    }
}

/// Engine over the given workers, with a recording notifier attached.
pub fn test_engine(
    workers: &[WorkerProfile],
) -> (
    Arc<DispatchEngine>,
    Arc<WorkerRegistry>,
    Arc<RecordingNotifier>,
) {
    init_tracing();
    let registry = Arc::new(WorkerRegistry::new());
    for worker in workers {
        registry.register(worker.clone()).expect("register worker");
    }
    let notifier = Arc::new(RecordingNotifier::new());
    let engine = DispatchEngine::new(
        EngineConfig::default(),
        Arc::clone(&registry),
        Arc::clone(&notifier) as Arc<dyn Notifier>,
    );
    (engine, registry, notifier)
}
