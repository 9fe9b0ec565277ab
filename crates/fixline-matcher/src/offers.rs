//! The write-once offer board.
//!
//! At most one offer is pending per job. Accept and decline signals,
//! the timeout, and job cancellation all race to resolve it; whoever
//! removes the board entry first wins, and every later signal is a
//! no-op. Removal and delivery happen under one lock, so there is no
//! window where an offer is neither pending nor decided.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use fixline_core::{JobId, WorkerId};

/// A worker's answer to a pending offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferAnswer {
    /// The worker takes the job.
    Accepted,
    /// The worker passes.
    Declined,
}

#[derive(Debug)]
struct PendingOffer {
    worker_id: WorkerId,
    deadline: DateTime<Utc>,
    tx: oneshot::Sender<OfferAnswer>,
}

/// All offers currently awaiting an answer, keyed by job.
#[derive(Debug, Default)]
pub struct OfferBoard {
    pending: Mutex<HashMap<JobId, PendingOffer>>,
}

impl OfferBoard {
    /// Creates an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an offer for a job and returns the receiver the matching
    /// run awaits. A leftover entry for the same job is dropped with a
    /// warning; its receiver sees a closed channel.
    pub fn open(
        &self,
        job_id: JobId,
        worker_id: WorkerId,
        deadline: DateTime<Utc>,
    ) -> oneshot::Receiver<OfferAnswer> {
        let (tx, rx) = oneshot::channel();
        let mut pending = self.pending.lock();
        if pending
            .insert(
                job_id.clone(),
                PendingOffer {
                    worker_id,
                    deadline,
                    tx,
                },
            )
            .is_some()
        {
            warn!(job = %job_id, "replaced a pending offer that was never resolved");
        }
        rx
    }

    /// Resolves a pending offer with a worker's answer.
    ///
    /// Returns false (and does nothing) when no offer is pending for the
    /// job or the offer is pending with a different worker: late accepts
    /// after the timeout took the entry, duplicate answers, and stale
    /// answers from an earlier escalation step all land here.
    pub fn resolve(&self, job_id: &JobId, worker_id: &WorkerId, answer: OfferAnswer) -> bool {
        let mut pending = self.pending.lock();
        let Some(offer) = pending.get(job_id) else {
            debug!(job = %job_id, worker = %worker_id, "no pending offer, ignoring answer");
            return false;
        };
        if &offer.worker_id != worker_id {
            debug!(
                job = %job_id,
                answered_by = %worker_id,
                pending_with = %offer.worker_id,
                "answer from a worker without the pending offer, ignoring"
            );
            return false;
        }
        if let Some(offer) = pending.remove(job_id) {
            let _ = offer.tx.send(answer);
        }
        true
    }

    /// Takes the pending offer for a job without delivering an answer.
    ///
    /// The timeout and cancellation paths use this: a `Some` return means
    /// the caller won the race and decides the outcome; `None` means a
    /// worker answer got there first and the receiver already holds it.
    pub fn withdraw(&self, job_id: &JobId) -> Option<WorkerId> {
        self.pending
            .lock()
            .remove(job_id)
            .map(|offer| offer.worker_id)
    }

    /// The worker and deadline of the offer currently pending for a job.
    #[must_use]
    pub fn pending_offer(&self, job_id: &JobId) -> Option<(WorkerId, DateTime<Utc>)> {
        self.pending
            .lock()
            .get(job_id)
            .map(|offer| (offer.worker_id.clone(), offer.deadline))
    }

    /// Number of offers awaiting an answer.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}
