//! The dispatch orchestrator.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use fixline_core::{
    Actor, CancelReason, CoreError, Job, JobId, JobRequest, JobStatus, Money, PaymentId,
    SharedJob, WorkerId,
};
use fixline_matcher::{MatchConfig, MatchError, Matcher, OfferAnswer, OfferBoard, OfferNotifier};
use fixline_pricing::{PricingCalculator, PricingInput};
use fixline_registry::WorkerRegistry;
use fixline_settlement::{PaymentMethod, Transaction, TransactionLedger};

use crate::config::EngineConfig;
use crate::error::{DispatchError, Result};
use crate::notify::Notifier;

/// Forwards the matcher's offer announcements to the engine notifier.
struct OfferBridge(Arc<dyn Notifier>);

impl OfferNotifier for OfferBridge {
    fn offer_sent(&self, job_id: &JobId, worker_id: &WorkerId, deadline: chrono::DateTime<Utc>) {
        self.0.offer_sent(job_id, worker_id, deadline);
    }
}

/// An in-flight matching run for one job.
struct MatchRun {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// The state machine that owns every job's lifecycle.
///
/// One engine instance serves many concurrent jobs; each matching run is
/// its own tokio task coordinating with the others only through the
/// registry's per-worker reservations and the offer board.
pub struct DispatchEngine {
    config: EngineConfig,
    registry: Arc<WorkerRegistry>,
    pricing: PricingCalculator,
    ledger: TransactionLedger,
    matcher: Matcher,
    board: Arc<OfferBoard>,
    notifier: Arc<dyn Notifier>,
    jobs: RwLock<HashMap<JobId, SharedJob>>,
    runs: Mutex<HashMap<JobId, MatchRun>>,
    shutdown: CancellationToken,
    /// Handle to ourselves for the tasks we spawn (watchdogs, matching
    /// runs, the sweeper); set once by `new`.
    weak_self: Weak<DispatchEngine>,
}

impl std::fmt::Debug for DispatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchEngine")
            .field("jobs", &self.jobs.read().len())
            .finish_non_exhaustive()
    }
}

impl DispatchEngine {
    /// Creates an engine over the given registry and notifier.
    #[must_use]
    pub fn new(
        config: EngineConfig,
        registry: Arc<WorkerRegistry>,
        notifier: Arc<dyn Notifier>,
    ) -> Arc<Self> {
        let board = Arc::new(OfferBoard::new());
        let matcher = Matcher::new(
            Arc::clone(&registry),
            Arc::clone(&board),
            Arc::new(OfferBridge(Arc::clone(&notifier))),
            MatchConfig {
                offer_timeout: config.offer_timeout,
            },
        );
        let pricing = PricingCalculator::new(config.rates.clone());
        let ledger = TransactionLedger::new(config.fees.clone());
        Arc::new_cyclic(|weak_self| Self {
            config,
            registry,
            pricing,
            ledger,
            matcher,
            board,
            notifier,
            jobs: RwLock::new(HashMap::new()),
            runs: Mutex::new(HashMap::new()),
            shutdown: CancellationToken::new(),
            weak_self: weak_self.clone(),
        })
    }

    fn strong_self(&self) -> Option<Arc<Self>> {
        self.weak_self.upgrade()
    }

    /// The worker registry this engine dispatches against.
    #[must_use]
    pub fn registry(&self) -> &Arc<WorkerRegistry> {
        &self.registry
    }

    /// The settlement ledger.
    #[must_use]
    pub fn ledger(&self) -> &TransactionLedger {
        &self.ledger
    }

    /// Snapshot of one job.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::JobNotFound`] for an unknown ID.
    pub fn job(&self, job_id: &JobId) -> Result<Job> {
        let shared = self.shared_job(job_id)?;
        let job = shared.read().clone();
        Ok(job)
    }

    fn shared_job(&self, job_id: &JobId) -> Result<SharedJob> {
        self.jobs
            .read()
            .get(job_id)
            .cloned()
            .ok_or_else(|| DispatchError::JobNotFound(job_id.clone()))
    }

    /// Accepts a job request: prices it and parks it awaiting client
    /// confirmation. Returns the quoted job for display.
    ///
    /// # Errors
    ///
    /// Pricing failures propagate and no job is created.
    pub fn submit_job_request(&self, request: JobRequest) -> Result<Job> {
        let quote = self.pricing.quote(&PricingInput {
            category: request.category,
            complexity: request.complexity,
            urgency: request.urgency,
            labor_minutes: request.labor_minutes,
            materials_cost: request.materials_cost,
        })?;

        let mut job = Job::new(request);
        job.quote = Some(quote);
        job.transition(JobStatus::Quoted, Actor::System)?;
        info!(job = %job.id, total = %quote.total, "job quoted");

        let job_id = job.id.clone();
        let shared: SharedJob = Arc::new(parking_lot::RwLock::new(job.clone()));
        self.jobs.write().insert(job_id.clone(), shared);
        self.notifier.quote_ready(&job);

        // Quote-expiry watchdog: fires once, no-ops unless still quoted.
        if let Some(engine) = self.strong_self() {
            let expiry = self.config.quote_expiry;
            tokio::spawn(async move {
                tokio::time::sleep(expiry).await;
                engine.expire_quote(&job_id);
            });
        }

        Ok(job)
    }

    fn expire_quote(&self, job_id: &JobId) {
        let Ok(shared) = self.shared_job(job_id) else {
            return;
        };
        let expired = {
            let mut job = shared.write();
            if job.status() == JobStatus::Quoted {
                job.cancel_reason = Some(CancelReason::QuoteExpired);
                job.transition(JobStatus::Cancelled, Actor::System).is_ok()
            } else {
                false
            }
        };
        if expired {
            info!(job = %job_id, "quote expired");
            self.notifier
                .job_cancelled(job_id, CancelReason::QuoteExpired);
        }
    }

    /// Client confirmed the quote: starts matching.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::JobNotFound`] or an invalid-transition
    /// error when the job is not awaiting confirmation.
    pub fn confirm_quote(&self, job_id: &JobId) -> Result<()> {
        let shared = self.shared_job(job_id)?;
        shared
            .write()
            .transition(JobStatus::Confirmed, Actor::Client)?;
        self.start_matching(job_id, &shared)
    }

    /// Client rejected the quote: cancels the job.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::JobNotFound`] or an invalid-transition
    /// error when the job is past the quote stage.
    pub fn reject_quote(&self, job_id: &JobId) -> Result<()> {
        let shared = self.shared_job(job_id)?;
        {
            let mut job = shared.write();
            job.transition(JobStatus::Cancelled, Actor::Client)?;
            job.cancel_reason = Some(CancelReason::QuoteRejected);
        }
        self.notifier
            .job_cancelled(job_id, CancelReason::QuoteRejected);
        Ok(())
    }

    fn start_matching(&self, job_id: &JobId, shared: &SharedJob) -> Result<()> {
        shared
            .write()
            .transition(JobStatus::Matching, Actor::System)?;

        let Some(engine) = self.strong_self() else {
            return Ok(());
        };
        let cancel = CancellationToken::new();
        let job = Arc::clone(shared);
        let id = job_id.clone();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            engine.run_match(id, job, token).await;
        });
        self.runs
            .lock()
            .insert(job_id.clone(), MatchRun { cancel, handle });
        Ok(())
    }

    async fn run_match(self: Arc<Self>, job_id: JobId, job: SharedJob, cancel: CancellationToken) {
        let result = self.matcher.run(&job, &cancel).await;
        match result {
            Ok(worker_id) => {
                let transitioned = {
                    let mut j = job.write();
                    j.assigned_worker = Some(worker_id.clone());
                    j.transition(JobStatus::Assigned, Actor::Worker)
                };
                match transitioned {
                    Ok(()) => {
                        info!(job = %job_id, worker = %worker_id, "job assigned");
                        self.notifier.job_assigned(&job_id, &worker_id);
                    }
                    Err(err) => {
                        warn!(job = %job_id, %err, "assignment transition failed");
                    }
                }
            }
            Err(MatchError::NoAvailableWorker) => {
                let transitioned = job.write().transition(JobStatus::Unassigned, Actor::System);
                match transitioned {
                    Ok(()) => {
                        info!(job = %job_id, "no available worker, job parked");
                        self.notifier.job_unassigned(&job_id);
                    }
                    Err(err) => {
                        warn!(job = %job_id, %err, "unassigned transition failed");
                    }
                }
            }
            // cancel_job owns the transition on this path
            Err(MatchError::Cancelled) => {
                debug!(job = %job_id, "matching run cancelled");
            }
            Err(err) => {
                warn!(job = %job_id, %err, "matching run failed");
            }
        }
        self.runs.lock().remove(&job_id);
    }

    /// Worker accepted a pending offer. A stale or duplicate answer is a
    /// recorded no-op.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::JobNotFound`] for an unknown job.
    pub fn worker_accept(&self, job_id: &JobId, worker_id: &WorkerId) -> Result<()> {
        self.shared_job(job_id)?;
        if !self.board.resolve(job_id, worker_id, OfferAnswer::Accepted) {
            debug!(job = %job_id, worker = %worker_id, "accept had no pending offer");
        }
        Ok(())
    }

    /// Worker declined a pending offer. A stale or duplicate answer is a
    /// recorded no-op.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::JobNotFound`] for an unknown job.
    pub fn worker_decline(&self, job_id: &JobId, worker_id: &WorkerId) -> Result<()> {
        self.shared_job(job_id)?;
        if !self.board.resolve(job_id, worker_id, OfferAnswer::Declined) {
            debug!(job = %job_id, worker = %worker_id, "decline had no pending offer");
        }
        Ok(())
    }

    /// Worker reported starting the work. Duplicate reports are no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::JobNotFound`] or an invalid-transition
    /// error when the job was never assigned.
    pub fn report_job_started(&self, job_id: &JobId) -> Result<()> {
        let shared = self.shared_job(job_id)?;
        let mut job = shared.write();
        match job.status() {
            JobStatus::InProgress | JobStatus::Completed | JobStatus::Settled => {
                debug!(job = %job_id, "duplicate started signal");
                Ok(())
            }
            _ => {
                job.transition(JobStatus::InProgress, Actor::Worker)?;
                Ok(())
            }
        }
    }

    /// Worker reported finishing the work: the reservation is released
    /// and the completion counted. Duplicate reports are no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::JobNotFound`] or an invalid-transition
    /// error when the job is not in progress.
    pub fn report_job_completed(&self, job_id: &JobId) -> Result<()> {
        let shared = self.shared_job(job_id)?;
        let worker_id = {
            let mut job = shared.write();
            match job.status() {
                JobStatus::Completed | JobStatus::Settled => {
                    debug!(job = %job_id, "duplicate completed signal");
                    return Ok(());
                }
                _ => {
                    job.transition(JobStatus::Completed, Actor::Worker)?;
                    job.assigned_worker.clone()
                }
            }
        };
        if let Some(worker_id) = worker_id {
            // The job is completed either way; a missing worker (raced
            // deregistration) only costs the stats bump.
            if let Err(err) = self.registry.record_completion(&worker_id, job_id) {
                warn!(job = %job_id, worker = %worker_id, %err, "completion stats not recorded");
            }
        }
        Ok(())
    }

    /// Applies a payment capture result from the gateway adapter.
    ///
    /// Settlement is idempotent per (job, payment): a retried capture
    /// returns the existing transaction. A capture for an already settled
    /// job returns its transaction without touching the ledger.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::PaymentCaptureFailed`] when the gateway
    /// reported failure (the job stays completed and unsettled), plus
    /// settlement and transition errors.
    pub fn capture_payment_result(
        &self,
        job_id: &JobId,
        payment_id: &PaymentId,
        gross: Money,
        method: PaymentMethod,
        succeeded: bool,
    ) -> Result<Transaction> {
        let shared = self.shared_job(job_id)?;

        if !succeeded {
            warn!(job = %job_id, payment = %payment_id, "payment capture failed");
            return Err(DispatchError::PaymentCaptureFailed {
                job_id: job_id.clone(),
                payment_id: payment_id.clone(),
            });
        }

        // The write lock spans the ledger write and the transition, so
        // two concurrent captures for one job serialize: the second sees
        // `Settled` and takes the idempotent path.
        let transaction = {
            let mut job = shared.write();
            match job.status() {
                JobStatus::Settled => return Ok(self.ledger.find(job_id, payment_id)?),
                JobStatus::Completed => {}
                other => {
                    return Err(CoreError::InvalidTransition {
                        from: other,
                        to: JobStatus::Settled,
                    }
                    .into());
                }
            }
            let transaction = self.ledger.settle(job_id, payment_id, gross, method)?;
            job.transition(JobStatus::Settled, Actor::System)?;
            transaction
        };
        self.notifier.job_settled(job_id, &transaction);
        Ok(transaction)
    }

    /// Cancels a job.
    ///
    /// Supervisory: a pending matching run is cancelled and awaited, and
    /// any held reservation released, before the job reads as cancelled.
    /// Cancelling an already cancelled job is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::JobNotFound`] or an invalid-transition
    /// error for completed/settled jobs.
    pub async fn cancel_job(
        &self,
        job_id: &JobId,
        reason: CancelReason,
        actor: Actor,
    ) -> Result<()> {
        let shared = self.shared_job(job_id)?;

        let run = self.runs.lock().remove(job_id);
        if let Some(run) = run {
            run.cancel.cancel();
            if let Err(err) = run.handle.await {
                warn!(job = %job_id, %err, "matching task aborted");
            }
        }

        let held_by = {
            let mut job = shared.write();
            if job.status() == JobStatus::Cancelled {
                return Ok(());
            }
            let held_by = match job.status() {
                JobStatus::Assigned | JobStatus::InProgress => job.assigned_worker.clone(),
                _ => None,
            };
            job.transition(JobStatus::Cancelled, actor)?;
            job.cancel_reason = Some(reason);
            held_by
        };

        if let Some(worker_id) = held_by {
            self.registry.release(&worker_id, job_id)?;
        }
        info!(job = %job_id, %reason, "job cancelled");
        self.notifier.job_cancelled(job_id, reason);
        Ok(())
    }

    /// Starts the background sweeper that re-matches unassigned jobs and
    /// cancels the ones past the retry window. Runs until
    /// [`DispatchEngine::stop`].
    pub fn start(&self) -> Option<JoinHandle<()>> {
        let engine = self.strong_self()?;
        Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = engine.shutdown.cancelled() => break,
                    () = tokio::time::sleep(engine.config.rematch_interval) => {
                        engine.sweep_unassigned().await;
                    }
                }
            }
        }))
    }

    /// Stops the background sweeper.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    async fn sweep_unassigned(&self) {
        let parked: Vec<(JobId, SharedJob)> = self
            .jobs
            .read()
            .iter()
            .filter(|(_, shared)| shared.read().status() == JobStatus::Unassigned)
            .map(|(id, shared)| (id.clone(), Arc::clone(shared)))
            .collect();

        let now = Utc::now();
        for (job_id, shared) in parked {
            let first_parked_at = shared
                .read()
                .history()
                .iter()
                .find(|c| c.to == JobStatus::Unassigned)
                .map(|c| c.at);
            let expired = first_parked_at.is_some_and(|at| {
                (now - at).to_std().unwrap_or_default() > self.config.unassigned_retry_window
            });

            if expired {
                if let Err(err) = self
                    .cancel_job(&job_id, CancelReason::NoWorkerFound, Actor::System)
                    .await
                {
                    warn!(job = %job_id, %err, "retry-window cancellation failed");
                }
            } else {
                debug!(job = %job_id, "re-matching unassigned job");
                if let Err(err) = self.start_matching(&job_id, &shared) {
                    warn!(job = %job_id, %err, "re-match start failed");
                }
            }
        }
    }
}
