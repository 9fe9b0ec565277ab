//! # fixline-engine
//!
//! The Dispatch Orchestrator: owns every job's lifecycle and sequences
//! pricing, matching, execution signals, and settlement.
//!
//! This crate provides:
//!
//! - [`DispatchEngine`]: the inbound signal surface (submit, confirm,
//!   worker answers, execution reports, payment captures, cancellation)
//! - The quote-expiry watchdog and the unassigned re-match sweeper
//! - The [`Notifier`] seam channel adapters implement for outbound
//!   messages

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod notify;

pub use config::EngineConfig;
pub use engine::DispatchEngine;
pub use error::DispatchError;
pub use notify::{NoopNotifier, Notifier, NotifierEvent, RecordingNotifier};
