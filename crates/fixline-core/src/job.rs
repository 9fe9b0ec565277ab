//! The job aggregate: categories, tiers, status machine, offer history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::geo::GeoPoint;
use crate::ids::{JobId, WorkerId};
use crate::money::{Money, Rate};

/// Service category of a repair job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobCategory {
    /// Electrical work: outlets, wiring, panels.
    Electrical,
    /// Plumbing: pipes, faucets, leaks.
    Plumbing,
    /// Household appliance repair.
    Appliance,
    /// General renovation work.
    Renovation,
}

impl JobCategory {
    /// All categories, in a stable order.
    pub const ALL: [Self; 4] = [
        Self::Electrical,
        Self::Plumbing,
        Self::Appliance,
        Self::Renovation,
    ];

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Electrical => "electrical",
            Self::Plumbing => "plumbing",
            Self::Appliance => "appliance",
            Self::Renovation => "renovation",
        }
    }
}

impl std::fmt::Display for JobCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How soon the client needs the work done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    /// Any time this week.
    Flexible,
    /// Within a day or two.
    Normal,
    /// Today.
    Urgent,
    /// Emergency: sparks, flooding.
    Critical,
}

impl Urgency {
    /// Price multiplier applied to the labor portion of a quote.
    #[must_use]
    pub const fn multiplier(&self) -> Rate {
        match self {
            Self::Flexible | Self::Normal => Rate::from_percent(100),
            Self::Urgent => Rate::from_percent(150),
            Self::Critical => Rate::from_percent(200),
        }
    }
}

/// Estimated difficulty of the work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    /// Quick swap: outlet, switch, bulb socket.
    Simple,
    /// Breaker, wiring section, single fixture.
    Medium,
    /// Rewiring, panel upgrade, multi-fixture work.
    Complex,
}

impl Complexity {
    /// Default labor estimate in minutes when the upstream diagnosis
    /// did not supply an explicit figure.
    #[must_use]
    pub const fn default_labor_minutes(&self) -> u32 {
        match self {
            Self::Simple => 30,
            Self::Medium => 90,
            Self::Complex => 180,
        }
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Request accepted, not yet priced.
    Created,
    /// Quote computed, awaiting client confirmation.
    Quoted,
    /// Client confirmed, matching not yet started.
    Confirmed,
    /// A matching run is in flight.
    Matching,
    /// A worker accepted the offer and holds a reservation.
    Assigned,
    /// The worker reported starting the work.
    InProgress,
    /// Work done, awaiting payment capture.
    Completed,
    /// Payment captured and split; the job is immutable.
    Settled,
    /// Terminated before completion.
    Cancelled,
    /// Matching exhausted all candidates; eligible for re-match.
    Unassigned,
}

impl JobStatus {
    /// Checks whether a transition to `target` is valid.
    #[must_use]
    pub const fn can_transition_to(&self, target: &Self) -> bool {
        use JobStatus::{
            Assigned, Cancelled, Completed, Confirmed, Created, InProgress, Matching, Quoted,
            Settled, Unassigned,
        };

        matches!(
            (self, target),
            (Created, Quoted)
                | (Quoted, Confirmed)
                | (Confirmed, Matching)
                | (Matching, Assigned | Unassigned)
                | (Assigned, InProgress)
                | (InProgress, Completed)
                | (Completed, Settled)
                | (Unassigned, Matching)
                | (
                    Created | Quoted | Confirmed | Matching | Assigned | InProgress | Unassigned,
                    Cancelled
                )
        )
    }

    /// Returns true for states a job can never leave.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Settled | Self::Cancelled)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Quoted => "quoted",
            Self::Confirmed => "confirmed",
            Self::Matching => "matching",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Settled => "settled",
            Self::Cancelled => "cancelled",
            Self::Unassigned => "unassigned",
        };
        write!(f, "{name}")
    }
}

/// Who triggered a status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    /// The client channel.
    Client,
    /// The worker channel.
    Worker,
    /// The engine itself (pricing, matching, timers).
    System,
    /// A human operator.
    Operator,
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client => write!(f, "client"),
            Self::Worker => write!(f, "worker"),
            Self::System => write!(f, "system"),
            Self::Operator => write!(f, "operator"),
        }
    }
}

/// Why a job was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// The client asked to cancel.
    ClientRequest,
    /// The client rejected the quote.
    QuoteRejected,
    /// The quote-confirmation deadline elapsed.
    QuoteExpired,
    /// No worker could be found within the retry window.
    NoWorkerFound,
    /// A human operator cancelled the job.
    OperatorAction,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ClientRequest => "client_request",
            Self::QuoteRejected => "quote_rejected",
            Self::QuoteExpired => "quote_expired",
            Self::NoWorkerFound => "no_worker_found",
            Self::OperatorAction => "operator_action",
        };
        write!(f, "{name}")
    }
}

/// Final outcome of a single offer to a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferOutcome {
    /// The worker accepted within the deadline.
    Accepted,
    /// The worker explicitly declined.
    Declined,
    /// The deadline elapsed without an answer.
    Expired,
    /// The job was cancelled while the offer was pending.
    Withdrawn,
}

/// One entry in a job's append-only offer history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferRecord {
    /// The worker the offer went to.
    pub worker_id: WorkerId,
    /// When the offer was sent.
    pub offered_at: DateTime<Utc>,
    /// How the offer resolved.
    pub outcome: OfferOutcome,
    /// When the outcome was decided.
    pub decided_at: DateTime<Utc>,
}

/// One entry in a job's append-only status history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    /// State before the transition.
    pub from: JobStatus,
    /// State after the transition.
    pub to: JobStatus,
    /// When the transition happened.
    pub at: DateTime<Utc>,
    /// Who triggered it.
    pub actor: Actor,
}

/// The priced breakdown retained on a job for display and settlement
/// reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteBreakdown {
    /// Labor portion before the urgency multiplier.
    pub labor: Money,
    /// Materials estimate passed in by the diagnosis layer.
    pub materials: Money,
    /// Urgency multiplier that was applied to labor.
    pub multiplier: Rate,
    /// Labor after the multiplier, plus materials, before clamping.
    pub subtotal: Money,
    /// Final quote, clamped into the category's bounds.
    pub total: Money,
}

/// A fully-formed job request handed in by the upstream diagnosis layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    /// Service category.
    pub category: JobCategory,
    /// Urgency tier.
    pub urgency: Urgency,
    /// Complexity tier.
    pub complexity: Complexity,
    /// Explicit labor estimate in minutes; falls back to the complexity
    /// default when absent.
    pub labor_minutes: Option<u32>,
    /// Materials cost estimate.
    pub materials_cost: Money,
    /// Street address for the worker.
    pub address: String,
    /// Geocoded location.
    pub location: GeoPoint,
    /// Tool tags the job requires.
    pub required_tools: Vec<String>,
}

/// A job shared between the orchestrator and an in-flight matching run.
///
/// The lock is only ever held for short synchronous reads and writes,
/// never across an await point.
pub type SharedJob = std::sync::Arc<parking_lot::RwLock<Job>>;

/// A repair job moving through intake, matching, execution, and settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique identifier.
    pub id: JobId,
    /// Service category.
    pub category: JobCategory,
    /// Urgency tier.
    pub urgency: Urgency,
    /// Complexity tier.
    pub complexity: Complexity,
    /// Explicit labor estimate in minutes, if supplied.
    pub labor_minutes: Option<u32>,
    /// Street address.
    pub address: String,
    /// Geocoded location.
    pub location: GeoPoint,
    /// Tool tags the job requires.
    pub required_tools: Vec<String>,
    /// Materials cost estimate.
    pub materials_cost: Money,
    /// Quote breakdown, set once by pricing.
    pub quote: Option<QuoteBreakdown>,
    /// The worker currently holding the assignment, if any.
    pub assigned_worker: Option<WorkerId>,
    /// Why the job was cancelled, when it was.
    pub cancel_reason: Option<CancelReason>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last status transition.
    pub updated_at: DateTime<Utc>,
    status: JobStatus,
    offers: Vec<OfferRecord>,
    history: Vec<StatusChange>,
}

impl Job {
    /// Creates a job in the `Created` state from a request.
    #[must_use]
    pub fn new(request: JobRequest) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::generate(),
            category: request.category,
            urgency: request.urgency,
            complexity: request.complexity,
            labor_minutes: request.labor_minutes,
            address: request.address,
            location: request.location,
            required_tools: request.required_tools,
            materials_cost: request.materials_cost,
            quote: None,
            assigned_worker: None,
            cancel_reason: None,
            created_at: now,
            updated_at: now,
            status: JobStatus::Created,
            offers: Vec::new(),
            history: Vec::new(),
        }
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> JobStatus {
        self.status
    }

    /// The append-only offer history.
    #[must_use]
    pub fn offers(&self) -> &[OfferRecord] {
        &self.offers
    }

    /// The append-only status history.
    #[must_use]
    pub fn history(&self) -> &[StatusChange] {
        &self.history
    }

    /// Returns true if this job has already offered to the given worker
    /// in the current or any prior matching run.
    #[must_use]
    pub fn has_offered(&self, worker_id: &WorkerId) -> bool {
        self.offers.iter().any(|o| &o.worker_id == worker_id)
    }

    /// Labor minutes to price with: explicit estimate or complexity default.
    #[must_use]
    pub fn effective_labor_minutes(&self) -> u32 {
        self.labor_minutes
            .unwrap_or_else(|| self.complexity.default_labor_minutes())
    }

    /// Performs a status transition, recording it in the history.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransition`] if the state machine does
    /// not permit the move.
    pub fn transition(&mut self, to: JobStatus, actor: Actor) -> Result<(), CoreError> {
        if !self.status.can_transition_to(&to) {
            return Err(CoreError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        let now = Utc::now();
        self.history.push(StatusChange {
            from: self.status,
            to,
            at: now,
            actor,
        });
        self.status = to;
        self.updated_at = now;
        Ok(())
    }

    /// Appends an offer outcome to the history.
    pub fn record_offer(
        &mut self,
        worker_id: WorkerId,
        offered_at: DateTime<Utc>,
        outcome: OfferOutcome,
        decided_at: DateTime<Utc>,
    ) {
        self.offers.push(OfferRecord {
            worker_id,
            offered_at,
            outcome,
            decided_at,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn request() -> JobRequest {
        JobRequest {
            category: JobCategory::Electrical,
            urgency: Urgency::Normal,
            complexity: Complexity::Simple,
            labor_minutes: None,
            materials_cost: Money::from_major(200),
            address: "Lenina 1".to_string(),
            location: GeoPoint::new(55.75, 37.61),
            required_tools: vec!["multimeter".to_string()],
        }
    }

    #[test]
    fn new_job_starts_created() {
        let job = Job::new(request());
        assert_eq!(job.status(), JobStatus::Created);
        assert!(job.offers().is_empty());
        assert!(job.history().is_empty());
    }

    #[test]
    fn happy_path_transitions() {
        let mut job = Job::new(request());
        let path = [
            JobStatus::Quoted,
            JobStatus::Confirmed,
            JobStatus::Matching,
            JobStatus::Assigned,
            JobStatus::InProgress,
            JobStatus::Completed,
            JobStatus::Settled,
        ];
        for next in path {
            job.transition(next, Actor::System).unwrap();
        }
        assert_eq!(job.status(), JobStatus::Settled);
        assert_eq!(job.history().len(), 7);
        assert_eq!(job.history()[0].from, JobStatus::Created);
        assert_eq!(job.history()[6].to, JobStatus::Settled);
    }

    #[test]
    fn invalid_transition_is_rejected_and_not_recorded() {
        let mut job = Job::new(request());
        let err = job.transition(JobStatus::Assigned, Actor::System);
        assert!(err.is_err());
        assert_eq!(job.status(), JobStatus::Created);
        assert!(job.history().is_empty());
    }

    #[test_case(JobStatus::Created)]
    #[test_case(JobStatus::Quoted)]
    #[test_case(JobStatus::Confirmed)]
    #[test_case(JobStatus::Matching)]
    #[test_case(JobStatus::Assigned)]
    #[test_case(JobStatus::InProgress)]
    #[test_case(JobStatus::Unassigned)]
    fn cancellable_states(from: JobStatus) {
        assert!(from.can_transition_to(&JobStatus::Cancelled));
    }

    #[test]
    fn terminal_states_go_nowhere() {
        for target in [
            JobStatus::Created,
            JobStatus::Quoted,
            JobStatus::Matching,
            JobStatus::Cancelled,
        ] {
            assert!(!JobStatus::Settled.can_transition_to(&target));
            assert!(!JobStatus::Cancelled.can_transition_to(&target));
        }
        assert!(JobStatus::Settled.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn unassigned_can_rematch() {
        assert!(JobStatus::Unassigned.can_transition_to(&JobStatus::Matching));
    }

    #[test]
    fn completed_cannot_cancel() {
        assert!(!JobStatus::Completed.can_transition_to(&JobStatus::Cancelled));
    }

    #[test]
    fn offer_history_tracks_workers() {
        let mut job = Job::new(request());
        let now = Utc::now();
        let w = WorkerId::new("w-1");
        job.record_offer(w.clone(), now, OfferOutcome::Declined, now);
        assert!(job.has_offered(&w));
        assert!(!job.has_offered(&WorkerId::new("w-2")));
    }

    #[test]
    fn effective_minutes_fall_back_to_complexity() {
        let mut req = request();
        assert_eq!(Job::new(req.clone()).effective_labor_minutes(), 30);
        req.labor_minutes = Some(45);
        assert_eq!(Job::new(req).effective_labor_minutes(), 45);
    }

    #[test]
    fn urgency_multipliers() {
        assert_eq!(Urgency::Flexible.multiplier(), Rate::from_percent(100));
        assert_eq!(Urgency::Normal.multiplier(), Rate::from_percent(100));
        assert_eq!(Urgency::Urgent.multiplier(), Rate::from_percent(150));
        assert_eq!(Urgency::Critical.multiplier(), Rate::from_percent(200));
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&JobStatus::InProgress).expect("serialize");
        assert_eq!(json, "\"in_progress\"");
    }
}
