//! The sequential offer/timeout/escalation loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use fixline_core::{JobId, OfferOutcome, SharedJob, WorkerId};
use fixline_registry::{RegistryError, WorkerRegistry};

use crate::error::{MatchError, Result};
use crate::offers::{OfferAnswer, OfferBoard};
use crate::score::rank_candidates;

/// Matching knobs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MatchConfig {
    /// How long a worker has to answer one offer.
    pub offer_timeout: Duration,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            offer_timeout: Duration::from_secs(15 * 60),
        }
    }
}

/// Delivers offer notifications to the worker channel.
///
/// The matcher announces each offer through this seam; channel adapters
/// (bot, app push) implement it outside the engine core.
pub trait OfferNotifier: Send + Sync {
    /// An offer went out to a worker with the given answer deadline.
    fn offer_sent(
        &self,
        job_id: &JobId,
        worker_id: &WorkerId,
        deadline: chrono::DateTime<Utc>,
    );
}

/// Notifier that drops everything. Useful in tests and batch tools.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOfferNotifier;

impl OfferNotifier for NoopOfferNotifier {
    fn offer_sent(
        &self,
        _job_id: &JobId,
        _worker_id: &WorkerId,
        _deadline: chrono::DateTime<Utc>,
    ) {
    }
}

/// Drives one job through candidate ranking and sequential offers until
/// a worker accepts or candidates run out.
pub struct Matcher {
    registry: Arc<WorkerRegistry>,
    board: Arc<OfferBoard>,
    notifier: Arc<dyn OfferNotifier>,
    config: MatchConfig,
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Matcher {
    /// Creates a matcher over the given registry and offer board.
    #[must_use]
    pub fn new(
        registry: Arc<WorkerRegistry>,
        board: Arc<OfferBoard>,
        notifier: Arc<dyn OfferNotifier>,
        config: MatchConfig,
    ) -> Self {
        Self {
            registry,
            board,
            notifier,
            config,
        }
    }

    /// The offer board this matcher resolves offers through.
    #[must_use]
    pub fn board(&self) -> &Arc<OfferBoard> {
        &self.board
    }

    /// Runs one matching attempt for a job.
    ///
    /// On success the accepted worker's reservation stays held; the
    /// caller finalizes the assignment. On every other exit all
    /// reservations taken by this run have been released.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::NoAvailableWorker`] when candidates are
    /// exhausted and [`MatchError::Cancelled`] when the token fires
    /// while the run is in flight.
    pub async fn run(&self, job: &SharedJob, cancel: &CancellationToken) -> Result<WorkerId> {
        loop {
            if cancel.is_cancelled() {
                return Err(MatchError::Cancelled);
            }

            let (job_id, category, location, required_tools, excluded) = {
                let j = job.read();
                (
                    j.id.clone(),
                    j.category,
                    j.location,
                    j.required_tools.clone(),
                    j.offers()
                        .iter()
                        .map(|o| o.worker_id.clone())
                        .collect::<Vec<_>>(),
                )
            };

            let candidates: Vec<_> = self
                .registry
                .find_candidates(category, &location, Utc::now())
                .into_iter()
                .filter(|c| !excluded.contains(&c.id))
                .collect();

            let ranked = rank_candidates(candidates, &location, &required_tools);
            let Some(top) = ranked.into_iter().next() else {
                info!(job = %job_id, offers = excluded.len(), "candidates exhausted");
                return Err(MatchError::NoAvailableWorker);
            };
            let worker_id = top.snapshot.id.clone();

            // Reserve before offering. Losing the race for the last slot
            // skips the candidate without an offer record; the next loop
            // iteration re-reads the registry.
            match self.registry.reserve(&worker_id, &job_id) {
                Ok(()) => {}
                Err(RegistryError::CapacityExceeded { .. }) => {
                    debug!(job = %job_id, worker = %worker_id, "lost capacity race, skipping");
                    continue;
                }
                Err(RegistryError::WorkerNotFound(_)) => {
                    debug!(job = %job_id, worker = %worker_id, "worker deregistered, skipping");
                    continue;
                }
                Err(err) => return Err(err.into()),
            }

            let offered_at = Utc::now();
            let deadline = offered_at
                + chrono::Duration::from_std(self.config.offer_timeout).unwrap_or_default();
            let mut rx = self.board.open(job_id.clone(), worker_id.clone(), deadline);
            self.notifier.offer_sent(&job_id, &worker_id, deadline);
            info!(
                job = %job_id,
                worker = %worker_id,
                score = top.score,
                distance_km = top.distance_km,
                "offer sent"
            );

            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    if self.board.withdraw(&job_id).is_some() {
                        OfferOutcome::Withdrawn
                    } else {
                        // A worker answer removed the entry first; honor it.
                        Self::drain(&mut rx, OfferOutcome::Withdrawn).await
                    }
                }
                answer = &mut rx => match answer {
                    Ok(OfferAnswer::Accepted) => OfferOutcome::Accepted,
                    Ok(OfferAnswer::Declined) => OfferOutcome::Declined,
                    Err(_) => OfferOutcome::Expired,
                },
                () = tokio::time::sleep(self.config.offer_timeout) => {
                    if self.board.withdraw(&job_id).is_some() {
                        OfferOutcome::Expired
                    } else {
                        Self::drain(&mut rx, OfferOutcome::Expired).await
                    }
                }
            };

            let decided_at = Utc::now();
            job.write()
                .record_offer(worker_id.clone(), offered_at, outcome, decided_at);

            match outcome {
                OfferOutcome::Accepted => {
                    info!(job = %job_id, worker = %worker_id, "offer accepted");
                    return Ok(worker_id);
                }
                OfferOutcome::Declined | OfferOutcome::Expired => {
                    debug!(job = %job_id, worker = %worker_id, ?outcome, "offer not taken");
                    self.release_quietly(&worker_id, &job_id);
                }
                OfferOutcome::Withdrawn => {
                    info!(job = %job_id, worker = %worker_id, "offer withdrawn by cancellation");
                    self.release_quietly(&worker_id, &job_id);
                    return Err(MatchError::Cancelled);
                }
            }
        }
    }

    /// Reads the answer that won the race against a timeout or
    /// cancellation; `fallback` covers a dropped sender.
    async fn drain(
        rx: &mut tokio::sync::oneshot::Receiver<OfferAnswer>,
        fallback: OfferOutcome,
    ) -> OfferOutcome {
        match rx.await {
            Ok(OfferAnswer::Accepted) => OfferOutcome::Accepted,
            Ok(OfferAnswer::Declined) => OfferOutcome::Declined,
            Err(_) => fallback,
        }
    }

    fn release_quietly(&self, worker_id: &WorkerId, job_id: &JobId) {
        if let Err(err) = self.registry.release(worker_id, job_id) {
            warn!(worker = %worker_id, job = %job_id, %err, "release after offer failed");
        }
    }
}
