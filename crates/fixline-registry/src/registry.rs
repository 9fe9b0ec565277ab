//! The worker registry and its per-worker reservation primitive.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use fixline_core::{GeoPoint, JobCategory, JobId, WorkerId, WorkerProfile, WorkerSnapshot};

use crate::error::{RegistryError, Result};

/// Lifetime counters kept per worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStats {
    /// Jobs currently holding a reservation.
    pub open_jobs: u32,
    /// Jobs this worker has completed, lifetime.
    pub completed_jobs: u64,
}

/// Per-worker mutable state behind its own lock.
///
/// `load` is the single mutation point for capacity: reserve and release
/// serialize through it, so two jobs racing for the last slot can never
/// both win.
#[derive(Debug)]
struct WorkerSlot {
    profile: RwLock<WorkerProfile>,
    load: Mutex<WorkerLoad>,
}

#[derive(Debug, Default)]
struct WorkerLoad {
    /// Jobs that currently hold a reservation. Tracking the job IDs (not
    /// a bare counter) is what makes reserve/release idempotent per job.
    holders: HashSet<JobId>,
    completed_jobs: u64,
}

/// The single owner of live worker state.
///
/// Workers are held behind per-worker locks; no registry operation takes
/// a lock spanning more than one worker, so unrelated jobs never
/// serialize against each other.
#[derive(Debug, Default)]
pub struct WorkerRegistry {
    slots: RwLock<HashMap<WorkerId, Arc<WorkerSlot>>>,
}

impl WorkerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a worker.
    ///
    /// Ratings outside [0, 5] are clamped.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyRegistered`] on a duplicate ID.
    pub fn register(&self, mut profile: WorkerProfile) -> Result<()> {
        if !(0.0..=5.0).contains(&profile.rating) {
            warn!(worker = %profile.id, rating = profile.rating, "clamping rating into [0, 5]");
            profile.rating = profile.rating.clamp(0.0, 5.0);
        }
        let mut slots = self.slots.write();
        if slots.contains_key(&profile.id) {
            return Err(RegistryError::AlreadyRegistered(profile.id));
        }
        debug!(worker = %profile.id, "worker registered");
        slots.insert(
            profile.id.clone(),
            Arc::new(WorkerSlot {
                profile: RwLock::new(profile),
                load: Mutex::new(WorkerLoad::default()),
            }),
        );
        Ok(())
    }

    /// Removes a worker. Held reservations are forgotten with a warning;
    /// the jobs holding them are expected to be re-matched by their owner.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::WorkerNotFound`] if the worker is unknown.
    pub fn deregister(&self, worker_id: &WorkerId) -> Result<WorkerProfile> {
        let slot = self
            .slots
            .write()
            .remove(worker_id)
            .ok_or_else(|| RegistryError::WorkerNotFound(worker_id.clone()))?;
        let open = slot.load.lock().holders.len();
        if open > 0 {
            warn!(worker = %worker_id, open, "deregistered worker still held reservations");
        }
        let profile = slot.profile.read().clone();
        Ok(profile)
    }

    /// Number of registered workers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    /// Returns true if no workers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    fn slot(&self, worker_id: &WorkerId) -> Result<Arc<WorkerSlot>> {
        self.slots
            .read()
            .get(worker_id)
            .cloned()
            .ok_or_else(|| RegistryError::WorkerNotFound(worker_id.clone()))
    }

    /// Point-in-time view of one worker.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::WorkerNotFound`] if the worker is unknown.
    pub fn snapshot(&self, worker_id: &WorkerId) -> Result<WorkerSnapshot> {
        let slot = self.slot(worker_id)?;
        Ok(Self::snapshot_of(&slot))
    }

    fn snapshot_of(slot: &WorkerSlot) -> WorkerSnapshot {
        let profile = slot.profile.read();
        let open_jobs = slot.load.lock().holders.len() as u32;
        WorkerSnapshot {
            id: profile.id.clone(),
            location: profile.location,
            tools: profile.tools.clone(),
            rating: profile.rating,
            open_jobs,
            daily_capacity: profile.daily_capacity,
            registered_at: profile.registered_at,
        }
    }

    /// Lifetime counters for one worker.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::WorkerNotFound`] if the worker is unknown.
    pub fn stats(&self, worker_id: &WorkerId) -> Result<WorkerStats> {
        let slot = self.slot(worker_id)?;
        let load = slot.load.lock();
        Ok(WorkerStats {
            open_jobs: load.holders.len() as u32,
            completed_jobs: load.completed_jobs,
        })
    }

    /// Workers eligible for a job right now: matching specialization,
    /// job within the worker's service radius, spare capacity, and an
    /// availability window covering `now`.
    ///
    /// Tool coverage deliberately does not filter here; it only feeds
    /// the Matcher's score.
    #[must_use]
    pub fn find_candidates(
        &self,
        category: JobCategory,
        location: &GeoPoint,
        now: DateTime<Utc>,
    ) -> Vec<WorkerSnapshot> {
        let slots: Vec<Arc<WorkerSlot>> = self.slots.read().values().cloned().collect();
        let mut candidates = Vec::new();
        for slot in slots {
            let eligible = {
                let profile = slot.profile.read();
                profile.has_specialization(category)
                    && profile.location.distance_km(location) <= profile.service_radius_km
                    && profile.available_at(now)
            };
            if !eligible {
                continue;
            }
            let snapshot = Self::snapshot_of(&slot);
            if snapshot.open_jobs < snapshot.daily_capacity {
                candidates.push(snapshot);
            }
        }
        candidates
    }

    /// Reserves one open-job slot on a worker for a job.
    ///
    /// Atomic per worker: the check and the increment happen under the
    /// worker's load lock. Idempotent per job: re-reserving for a job
    /// that already holds the slot succeeds without double-counting.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::CapacityExceeded`] when the worker is
    /// full, [`RegistryError::WorkerNotFound`] for an unknown worker.
    pub fn reserve(&self, worker_id: &WorkerId, job_id: &JobId) -> Result<()> {
        let slot = self.slot(worker_id)?;
        let capacity = slot.profile.read().daily_capacity;
        let mut load = slot.load.lock();
        if load.holders.contains(job_id) {
            return Ok(());
        }
        if load.holders.len() as u32 >= capacity {
            return Err(RegistryError::CapacityExceeded {
                worker_id: worker_id.clone(),
            });
        }
        load.holders.insert(job_id.clone());
        debug!(worker = %worker_id, job = %job_id, open = load.holders.len(), "reserved");
        Ok(())
    }

    /// Releases a job's reservation on a worker.
    ///
    /// Idempotent: releasing a job that holds no reservation is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::WorkerNotFound`] for an unknown worker.
    pub fn release(&self, worker_id: &WorkerId, job_id: &JobId) -> Result<()> {
        let slot = self.slot(worker_id)?;
        let mut load = slot.load.lock();
        if load.holders.remove(job_id) {
            debug!(worker = %worker_id, job = %job_id, open = load.holders.len(), "released");
        } else {
            debug!(worker = %worker_id, job = %job_id, "release was a no-op");
        }
        Ok(())
    }

    /// Records a completed job: releases the reservation and bumps the
    /// lifetime counter.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::WorkerNotFound`] for an unknown worker.
    pub fn record_completion(&self, worker_id: &WorkerId, job_id: &JobId) -> Result<()> {
        let slot = self.slot(worker_id)?;
        let mut load = slot.load.lock();
        load.holders.remove(job_id);
        load.completed_jobs += 1;
        debug!(worker = %worker_id, job = %job_id, total = load.completed_jobs, "completion recorded");
        Ok(())
    }
}
