//! Household member model.
//!
//! # Responsibility
//! - Define the typed member identity used inside an edit session.
//! - Define the wire record exchanged with the persistence gateway.
//! - Convert between the two shapes at the gateway boundary.
//!
//! # Invariants
//! - `MemberId::Provisional` is client-only and is never put on the wire.
//! - `MemberId::Persisted` is always a server-assigned identifier.

use crate::model::household::HouseholdId;
use crate::model::relationship::{self, Relationship};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Server-assigned member identifier.
pub type PersistedMemberId = String;

/// Identity of a member within one edit session.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MemberId {
    /// Generated locally for a member that has never been saved.
    Provisional(Uuid),
    /// Assigned by the server on a prior fetch or upsert.
    Persisted(PersistedMemberId),
}

impl MemberId {
    /// Generates a fresh provisional identifier (UUID v4).
    pub fn provisional() -> Self {
        Self::Provisional(Uuid::new_v4())
    }

    pub fn persisted(id: impl Into<PersistedMemberId>) -> Self {
        Self::Persisted(id.into())
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self, Self::Provisional(_))
    }

    /// Returns the server identifier, if any.
    pub fn as_persisted(&self) -> Option<&str> {
        match self {
            Self::Persisted(id) => Some(id.as_str()),
            Self::Provisional(_) => None,
        }
    }
}

impl Display for MemberId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Provisional(uuid) => write!(f, "provisional:{uuid}"),
            Self::Persisted(id) => f.write_str(id),
        }
    }
}

/// One member as held by an edit session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: MemberId,
    pub family_name: String,
    pub given_name: String,
    /// Raw birthday input; validated at save time.
    pub birthday: String,
    /// `None` until the operator picks a value.
    pub relationship: Option<Relationship>,
}

impl Member {
    /// Creates an empty member with a fresh provisional identifier.
    pub fn empty() -> Self {
        Self::with_id(MemberId::provisional())
    }

    /// Creates an empty member with a caller-provided identifier.
    pub fn with_id(id: MemberId) -> Self {
        Self {
            id,
            family_name: String::new(),
            given_name: String::new(),
            birthday: String::new(),
            relationship: None,
        }
    }

    /// Returns `"family given"` when both names are present.
    pub fn full_name(&self) -> Option<String> {
        if self.family_name.is_empty() || self.given_name.is_empty() {
            return None;
        }
        Some(format!("{} {}", self.family_name, self.given_name))
    }

    /// Converts a wire record into a session member.
    ///
    /// Returns `None` when the record carries no server identifier.
    pub fn from_record(record: MemberRecord) -> Option<Self> {
        let uid = record.uid.filter(|value| !value.is_empty())?;
        Some(Self {
            id: MemberId::Persisted(uid),
            family_name: record.family_name,
            given_name: record.given_name,
            birthday: record.birthday,
            relationship: record.relationship,
        })
    }

    /// Builds the upsert payload for this member.
    ///
    /// `send_id == false` strips the identifier so the server creates a new
    /// row; provisional identifiers are always stripped.
    pub fn to_record(&self, household_uid: &str, send_id: bool) -> MemberRecord {
        let uid = if send_id {
            self.id.as_persisted().map(str::to_string)
        } else {
            None
        };
        MemberRecord {
            uid,
            household_uid: household_uid.to_string(),
            family_name: self.family_name.clone(),
            given_name: self.given_name.clone(),
            birthday: self.birthday.clone(),
            relationship: self.relationship,
            created: None,
            updated: None,
        }
    }
}

/// Addressable member attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MemberField {
    FamilyName,
    GivenName,
    Birthday,
    Relationship,
}

impl MemberField {
    /// All fields in save-time validation order.
    pub const ALL: [MemberField; 4] = [
        MemberField::FamilyName,
        MemberField::GivenName,
        MemberField::Birthday,
        MemberField::Relationship,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FamilyName => "family_name",
            Self::GivenName => "given_name",
            Self::Birthday => "birthday",
            Self::Relationship => "relationship",
        }
    }
}

/// Member record as exchanged with the persistence gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
    /// Absent on create requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<PersistedMemberId>,
    #[serde(default)]
    pub household_uid: HouseholdId,
    pub family_name: String,
    pub given_name: String,
    pub birthday: String,
    #[serde(
        default,
        deserialize_with = "relationship::deserialize_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub relationship: Option<Relationship>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
}

/// Response of a single member delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMemberResponse {
    pub household_uid: HouseholdId,
    pub household_member_uid: PersistedMemberId,
}

#[cfg(test)]
mod tests {
    use super::{Member, MemberId};
    use crate::model::relationship::Relationship;

    #[test]
    fn full_name_requires_both_parts() {
        let mut member = Member::empty();
        member.family_name = "山田".to_string();
        assert_eq!(member.full_name(), None);
        member.given_name = "太郎".to_string();
        assert_eq!(member.full_name().as_deref(), Some("山田 太郎"));
    }

    #[test]
    fn provisional_id_is_never_serialized() {
        let mut member = Member::empty();
        member.relationship = Some(Relationship::Head);
        let record = member.to_record("H1", true);
        assert_eq!(record.uid, None);
        assert_eq!(record.household_uid, "H1");
    }

    #[test]
    fn persisted_id_is_sent_only_when_requested() {
        let member = Member::with_id(MemberId::persisted("M1"));
        assert_eq!(member.to_record("H1", true).uid.as_deref(), Some("M1"));
        assert_eq!(member.to_record("H1", false).uid, None);
    }
}
