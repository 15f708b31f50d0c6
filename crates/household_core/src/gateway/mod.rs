//! Persistence gateway contract and adapters.
//!
//! # Responsibility
//! - Define the remote CRUD contract for households and members.
//! - Provide an HTTP adapter and an in-process adapter.
//!
//! # Invariants
//! - Gateway callers never interpret failure kinds; every error is treated
//!   as retryable by resubmitting the whole save.
//! - Members upserted without `uid` are created; with `uid` they are updated.

use crate::model::household::{
    FetchHouseholdsRequest, FetchHouseholdsResponse, Household, HouseholdFields,
};
use crate::model::member::{DeleteMemberResponse, MemberRecord};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod http;
pub mod memory;

pub use http::HttpGateway;
pub use memory::{GatewayCall, MemoryGateway, OperationKind};

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failure reported by a gateway operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Request parameters rejected before or by the server.
    Validation(String),
    /// Referenced household or member does not exist.
    NotFound(String),
    /// Server answered with a non-success status.
    Status { status: u16, body: String },
    /// Connection, timeout or other transport failure.
    Transport(String),
    /// Response body could not be decoded.
    Decode(String),
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "invalid request: {message}"),
            Self::NotFound(what) => write!(f, "not found: {what}"),
            Self::Status { status, body } => write!(f, "server returned {status}: {body}"),
            Self::Transport(message) => write!(f, "transport failure: {message}"),
            Self::Decode(message) => write!(f, "undecodable response: {message}"),
        }
    }
}

impl Error for GatewayError {}

/// Remote household/member persistence.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Searches households by email or phone substring with paging.
    async fn fetch_households(
        &self,
        request: &FetchHouseholdsRequest,
    ) -> GatewayResult<FetchHouseholdsResponse>;
    /// Creates a household; the server assigns `uid` and timestamps.
    async fn create_household(&self, fields: &HouseholdFields) -> GatewayResult<Household>;
    async fn get_household(&self, household_uid: &str) -> GatewayResult<Household>;
    async fn update_household(
        &self,
        household_uid: &str,
        fields: &HouseholdFields,
    ) -> GatewayResult<Household>;
    async fn get_members(&self, household_uid: &str) -> GatewayResult<Vec<MemberRecord>>;
    /// Creates or updates members; the response keeps request order.
    async fn upsert_members(
        &self,
        household_uid: &str,
        members: &[MemberRecord],
    ) -> GatewayResult<Vec<MemberRecord>>;
    async fn delete_member(
        &self,
        household_uid: &str,
        member_uid: &str,
    ) -> GatewayResult<DeleteMemberResponse>;
}
