//! Core domain logic for household editing.
//! This crate owns the edit-session reconciliation rules: member identity
//! tracking, field validation, and the remote operations a save issues.

pub mod config;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod service;
pub mod session;
pub mod validation;

pub use config::{ConfigError, GatewayConfig};
pub use gateway::{
    GatewayCall, GatewayError, GatewayResult, HttpGateway, MemoryGateway, OperationKind,
    PersistenceGateway,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::household::{
    FetchHouseholdsRequest, FetchHouseholdsResponse, Household, HouseholdField, HouseholdFields,
    HouseholdId,
};
pub use model::member::{
    DeleteMemberResponse, Member, MemberField, MemberId, MemberRecord, PersistedMemberId,
};
pub use model::relationship::{Relationship, RelationshipParseError};
pub use service::{
    OperationResult, RemoteOperation, SaveOrchestrator, SaveOutcome, SavePlan, SaveRejection,
    SaveReport,
};
pub use session::{
    removal_prompt, CommitError, ConfirmRemoval, EditSession, IdentityTracker, LoadReport,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
