//! # fixline-registry
//!
//! The Worker Registry: the single owner of live worker state.
//!
//! This crate provides:
//!
//! - Registration and snapshot reads of worker profiles
//! - Candidate filtering by specialization, radius, capacity, and schedule
//! - Atomic per-worker capacity reservation and idempotent release
//! - Lifetime completion stats per worker
//!
//! Everything else in the engine (in particular the Matcher) sees only
//! read-only snapshots and goes through [`WorkerRegistry::reserve`] /
//! [`WorkerRegistry::release`] to touch capacity.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod registry;

pub use error::RegistryError;
pub use registry::{WorkerRegistry, WorkerStats};
