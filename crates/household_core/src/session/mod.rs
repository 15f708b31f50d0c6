//! Edit session: working copy plus identity bookkeeping.
//!
//! # Responsibility
//! - Own the mutable household/member model for one editing flow.
//! - Track which members are new, removed or pre-existing.
//!
//! # Invariants
//! - All mutation entry points are synchronous; only saving suspends.

pub mod edit;
pub mod tracker;

pub use edit::{removal_prompt, CommitError, ConfirmRemoval, EditSession, LoadReport};
pub use tracker::IdentityTracker;
