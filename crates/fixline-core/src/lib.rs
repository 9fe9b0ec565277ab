//! # fixline-core
//!
//! Shared domain model for the Fixline dispatch engine.
//!
//! This crate provides:
//!
//! - Identifier newtypes for jobs, workers, and payment captures
//! - Minor-unit money arithmetic with half-up rate application
//! - Geographic coordinates and great-circle distance
//! - The [`Job`] aggregate with its status machine and offer history
//! - Worker profiles, snapshots, and availability windows

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod geo;
pub mod ids;
pub mod job;
pub mod money;
pub mod worker;

pub use error::CoreError;
pub use geo::GeoPoint;
pub use ids::{JobId, PaymentId, WorkerId};
pub use job::{
    Actor, CancelReason, Complexity, Job, JobCategory, JobRequest, JobStatus, OfferOutcome,
    OfferRecord, QuoteBreakdown, SharedJob, StatusChange, Urgency,
};
pub use money::{Money, Rate};
pub use worker::{AvailabilityWindow, WorkerProfile, WorkerSnapshot};
