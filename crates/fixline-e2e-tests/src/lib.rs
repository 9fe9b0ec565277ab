//! End-to-end tests for the Fixline dispatch engine.
//!
//! These tests exercise the full stack:
//! - Intake, pricing, and quote confirmation
//! - Matching with offers, declines, timeouts, and escalation
//! - Worker capacity under concurrent jobs
//! - Settlement and its idempotency
//! - Cancellation and the unassigned re-match sweeper

#![cfg(test)]
