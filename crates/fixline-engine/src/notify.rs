//! Outbound notification seam.
//!
//! The engine core performs no channel I/O. Adapters (chat bot, web,
//! push) implement [`Notifier`]; the engine calls it synchronously at
//! each externally visible step.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::debug;

use fixline_core::{CancelReason, Job, JobId, Money, WorkerId};
use fixline_settlement::Transaction;

/// Outbound messages produced by the engine.
pub trait Notifier: Send + Sync {
    /// A quote is ready for client display; the breakdown is on the job.
    fn quote_ready(&self, job: &Job);

    /// An offer went out to a worker with an answer deadline.
    fn offer_sent(&self, job_id: &JobId, worker_id: &WorkerId, deadline: DateTime<Utc>);

    /// A worker accepted; the job is assigned.
    fn job_assigned(&self, job_id: &JobId, worker_id: &WorkerId);

    /// Matching exhausted all candidates; the job is parked.
    fn job_unassigned(&self, job_id: &JobId);

    /// The job was cancelled.
    fn job_cancelled(&self, job_id: &JobId, reason: CancelReason);

    /// The payment settled; the transaction is final.
    fn job_settled(&self, job_id: &JobId, transaction: &Transaction);
}

/// Notifier that logs and drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn quote_ready(&self, job: &Job) {
        debug!(job = %job.id, "quote ready");
    }

    fn offer_sent(&self, job_id: &JobId, worker_id: &WorkerId, _deadline: DateTime<Utc>) {
        debug!(job = %job_id, worker = %worker_id, "offer sent");
    }

    fn job_assigned(&self, job_id: &JobId, worker_id: &WorkerId) {
        debug!(job = %job_id, worker = %worker_id, "job assigned");
    }

    fn job_unassigned(&self, job_id: &JobId) {
        debug!(job = %job_id, "job unassigned");
    }

    fn job_cancelled(&self, job_id: &JobId, reason: CancelReason) {
        debug!(job = %job_id, %reason, "job cancelled");
    }

    fn job_settled(&self, job_id: &JobId, transaction: &Transaction) {
        debug!(job = %job_id, payout = %transaction.master_payout, "job settled");
    }
}

/// One recorded outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierEvent {
    /// Quote computed for a job.
    QuoteReady {
        /// The quoted job.
        job_id: JobId,
        /// Final quote total.
        total: Money,
    },
    /// Offer sent to a worker.
    OfferSent {
        /// The offering job.
        job_id: JobId,
        /// The worker offered to.
        worker_id: WorkerId,
    },
    /// Job assigned to a worker.
    Assigned {
        /// The assigned job.
        job_id: JobId,
        /// The accepting worker.
        worker_id: WorkerId,
    },
    /// Job parked with no available worker.
    Unassigned {
        /// The parked job.
        job_id: JobId,
    },
    /// Job cancelled.
    Cancelled {
        /// The cancelled job.
        job_id: JobId,
        /// Why.
        reason: CancelReason,
    },
    /// Payment settled.
    Settled {
        /// The settled job.
        job_id: JobId,
        /// Worker payout from the split.
        payout: Money,
    },
}

/// In-memory notifier for tests: records every event and wakes waiters.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<NotifierEvent>>,
    changed: Notify,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<NotifierEvent> {
        self.events.lock().clone()
    }

    /// Waits until the recorded events satisfy the predicate.
    pub async fn wait_for(&self, pred: impl Fn(&[NotifierEvent]) -> bool) {
        loop {
            let notified = self.changed.notified();
            if pred(&self.events()) {
                return;
            }
            notified.await;
        }
    }

    /// Waits for the `n`-th offer and returns the worker it went to.
    pub async fn wait_for_offer(&self, n: usize) -> WorkerId {
        self.wait_for(|events| {
            events
                .iter()
                .filter(|e| matches!(e, NotifierEvent::OfferSent { .. }))
                .count()
                > n
        })
        .await;
        let offer = self
            .events()
            .iter()
            .filter_map(|e| match e {
                NotifierEvent::OfferSent { worker_id, .. } => Some(worker_id.clone()),
                _ => None,
            })
            .nth(n);
        match offer {
            Some(worker_id) => worker_id,
            // unreachable: wait_for saw n+1 offers
            None => WorkerId::new("missing"),
        }
    }

    fn push(&self, event: NotifierEvent) {
        self.events.lock().push(event);
        self.changed.notify_waiters();
    }
}

impl Notifier for RecordingNotifier {
    fn quote_ready(&self, job: &Job) {
        let total = job.quote.map_or(Money::ZERO, |q| q.total);
        self.push(NotifierEvent::QuoteReady {
            job_id: job.id.clone(),
            total,
        });
    }

    fn offer_sent(&self, job_id: &JobId, worker_id: &WorkerId, _deadline: DateTime<Utc>) {
        self.push(NotifierEvent::OfferSent {
            job_id: job_id.clone(),
            worker_id: worker_id.clone(),
        });
    }

    fn job_assigned(&self, job_id: &JobId, worker_id: &WorkerId) {
        self.push(NotifierEvent::Assigned {
            job_id: job_id.clone(),
            worker_id: worker_id.clone(),
        });
    }

    fn job_unassigned(&self, job_id: &JobId) {
        self.push(NotifierEvent::Unassigned {
            job_id: job_id.clone(),
        });
    }

    fn job_cancelled(&self, job_id: &JobId, reason: CancelReason) {
        self.push(NotifierEvent::Cancelled {
            job_id: job_id.clone(),
            reason,
        });
    }

    fn job_settled(&self, job_id: &JobId, transaction: &Transaction) {
        self.push(NotifierEvent::Settled {
            job_id: job_id.clone(),
            payout: transaction.master_payout,
        });
    }
}
