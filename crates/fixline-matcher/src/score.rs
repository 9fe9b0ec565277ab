//! Candidate scoring.
//!
//! `score = 0.4*proximity + 0.3*workload + 0.2*rating + 0.1*tools`.
//! Ties break on rating, then registration time, then id, so a given
//! candidate set always ranks the same way.

use fixline_core::{GeoPoint, WorkerSnapshot};

/// Weight of geographic proximity in the composite score.
pub const PROXIMITY_WEIGHT: f64 = 0.4;
/// Weight of spare capacity in the composite score.
pub const WORKLOAD_WEIGHT: f64 = 0.3;
/// Weight of rating in the composite score.
pub const RATING_WEIGHT: f64 = 0.2;
/// Weight of tool coverage in the composite score.
pub const TOOLS_WEIGHT: f64 = 0.1;

/// Distance at which the proximity component reaches zero.
pub const PROXIMITY_HORIZON_KM: f64 = 30.0;

/// A candidate with its composite score.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    /// The scored worker snapshot.
    pub snapshot: WorkerSnapshot,
    /// Composite score in [0, 1].
    pub score: f64,
    /// Distance from the worker's base to the job, in kilometers.
    pub distance_km: f64,
}

/// Scores one candidate against a job.
#[must_use]
pub fn score_candidate(
    snapshot: WorkerSnapshot,
    job_location: &GeoPoint,
    required_tools: &[String],
) -> ScoredCandidate {
    let distance_km = snapshot.location.distance_km(job_location);
    let proximity = (1.0 - distance_km / PROXIMITY_HORIZON_KM).max(0.0);

    let workload = if snapshot.daily_capacity == 0 {
        0.0
    } else {
        1.0 - f64::from(snapshot.open_jobs) / f64::from(snapshot.daily_capacity)
    };

    let rating = snapshot.rating / 5.0;

    let tools = if required_tools.iter().all(|t| snapshot.tools.contains(t)) {
        1.0
    } else {
        0.0
    };

    let score = PROXIMITY_WEIGHT * proximity
        + WORKLOAD_WEIGHT * workload
        + RATING_WEIGHT * rating
        + TOOLS_WEIGHT * tools;

    ScoredCandidate {
        snapshot,
        score,
        distance_km,
    }
}

/// Scores and ranks candidates, best first.
#[must_use]
pub fn rank_candidates(
    candidates: Vec<WorkerSnapshot>,
    job_location: &GeoPoint,
    required_tools: &[String],
) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|c| score_candidate(c, job_location, required_tools))
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.snapshot.rating.total_cmp(&a.snapshot.rating))
            .then_with(|| a.snapshot.registered_at.cmp(&b.snapshot.registered_at))
            .then_with(|| a.snapshot.id.as_str().cmp(b.snapshot.id.as_str()))
    });

    scored
}
