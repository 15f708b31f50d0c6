//! Save use-cases over an edit session.
//!
//! # Responsibility
//! - Split a save into a local plan (validation + snapshot) and a remote
//!   dispatch, then adopt the result into the session.
//! - Keep gateway calls out of session mutation code.

pub mod plan;
pub mod save;

pub use plan::{PlannedMember, SavePlan, SaveRejection};
pub use save::{OperationResult, RemoteOperation, SaveOrchestrator, SaveOutcome, SaveReport};
