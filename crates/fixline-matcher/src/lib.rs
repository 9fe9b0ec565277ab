//! # fixline-matcher
//!
//! The Matcher: produces an assigned worker for a priced job, or
//! determines that none is available.
//!
//! This crate provides:
//!
//! - Candidate scoring (proximity, workload, rating, tools)
//! - The write-once offer board resolving accept/decline/timeout races
//! - The sequential offer/timeout/escalation loop over ranked candidates

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod matcher;
pub mod offers;
pub mod score;

pub use error::MatchError;
pub use matcher::{MatchConfig, Matcher, NoopOfferNotifier, OfferNotifier};
pub use offers::{OfferAnswer, OfferBoard};
pub use score::{ScoredCandidate, rank_candidates, score_candidate};
