//! Household domain model.
//!
//! # Responsibility
//! - Define the household/member records exchanged with the persistence gateway.
//! - Define the session-side member shape with typed identifiers.
//!
//! # Invariants
//! - An unsaved household has no identifier.
//! - A member identifier class (provisional vs persisted) never changes.
//! - Relationship values are parsed once at the boundary and stored as enum.

pub mod household;
pub mod member;
pub mod relationship;
