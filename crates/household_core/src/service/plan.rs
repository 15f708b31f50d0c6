//! Save planning: the local, deterministic half of a save.
//!
//! # Responsibility
//! - Gate a save on household fields, every member, and a household head.
//! - Snapshot the session into the request set a dispatch will send.
//!
//! # Invariants
//! - Building a plan never mutates the session and never touches the network.
//! - Provisional identifiers never appear in a planned request record.
//! - A plan is a snapshot; edits made after it was built are not part of it.

use crate::model::household::{HouseholdField, HouseholdFields, HouseholdId};
use crate::model::member::{Member, MemberField, MemberId, MemberRecord, PersistedMemberId};
use crate::session::EditSession;
use crate::validation::{check_household, check_member};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Reason a save was refused before any remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveRejection {
    /// One or more household fields failed validation.
    InvalidHousehold(Vec<HouseholdField>),
    /// The first member (in collection order) that failed validation.
    InvalidMember {
        id: MemberId,
        fields: Vec<MemberField>,
    },
    /// No member is designated as household head.
    MissingHouseholdHead,
}

impl Display for SaveRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidHousehold(fields) => {
                write!(f, "invalid household fields: {}", household_field_list(fields))
            }
            Self::InvalidMember { id, fields } => write!(
                f,
                "invalid member {id}: {}",
                fields
                    .iter()
                    .map(|field| field.as_str())
                    .collect::<Vec<_>>()
                    .join(",")
            ),
            Self::MissingHouseholdHead => write!(f, "no member is designated as household head"),
        }
    }
}

impl Error for SaveRejection {}

fn household_field_list(fields: &[HouseholdField]) -> String {
    fields
        .iter()
        .map(|field| field.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// One member scheduled for upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMember {
    /// Session identity at plan time.
    pub id: MemberId,
    /// Whether the identifier goes on the wire (update) or not (create).
    pub send_id: bool,
    member: Member,
}

impl PlannedMember {
    pub fn member(&self) -> &Member {
        &self.member
    }
}

/// Validated snapshot of a session, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePlan {
    /// `None` when the household must be created first.
    pub household_id: Option<HouseholdId>,
    pub fields: HouseholdFields,
    pub members: Vec<PlannedMember>,
    /// Persisted members to delete; empty for a new household.
    pub removed: Vec<PersistedMemberId>,
}

impl SavePlan {
    /// Validates `session` and snapshots the operations a save must issue.
    pub fn build(session: &EditSession) -> Result<Self, SaveRejection> {
        let invalid = check_household(session.fields());
        if !invalid.is_empty() {
            return Err(SaveRejection::InvalidHousehold(invalid));
        }

        let mut has_head = false;
        let mut members = Vec::with_capacity(session.members().len());
        for member in session.members() {
            let invalid = check_member(member);
            if !invalid.is_empty() {
                return Err(SaveRejection::InvalidMember {
                    id: member.id.clone(),
                    fields: invalid,
                });
            }
            has_head |= member.relationship.is_some_and(|r| r.is_head());

            let send_id = !session.tracker().is_new(&member.id) && !member.id.is_provisional();
            members.push(PlannedMember {
                id: member.id.clone(),
                send_id,
                member: member.clone(),
            });
        }
        if !has_head {
            return Err(SaveRejection::MissingHouseholdHead);
        }

        let removed = match session.household_id() {
            Some(_) => session.tracker().removed_snapshot().into_iter().collect(),
            None => Vec::new(),
        };

        Ok(Self {
            household_id: session.household_id().map(str::to_string),
            fields: session.fields().clone(),
            members,
            removed,
        })
    }

    pub fn is_new_household(&self) -> bool {
        self.household_id.is_none()
    }

    /// Builds the upsert payload, bound to `household_uid`.
    pub fn records_for(&self, household_uid: &str) -> Vec<MemberRecord> {
        self.members
            .iter()
            .map(|planned| planned.member.to_record(household_uid, planned.send_id))
            .collect()
    }

    /// Identifiers of members the server will create.
    pub fn created_ids(&self) -> impl Iterator<Item = &MemberId> {
        self.members
            .iter()
            .filter(|planned| !planned.send_id)
            .map(|planned| &planned.id)
    }
}
