//! In-process persistence gateway.
//!
//! # Responsibility
//! - Reproduce the remote API semantics without a network: server-assigned
//!   ids and timestamps, search over email/phone, paging validation.
//! - Journal every call and allow per-operation failure injection, so
//!   callers can observe exactly which remote operations were requested.
//!
//! # Invariants
//! - Every call is journaled, including calls that fail.
//! - An upsert with an unknown member `uid` fails without applying anything.
//! - Member deletes are idempotent; only an unknown household fails.

use crate::gateway::{GatewayError, GatewayResult, PersistenceGateway};
use crate::model::household::{
    FetchHouseholdsRequest, FetchHouseholdsResponse, Household, HouseholdFields, HouseholdId,
};
use crate::model::member::{DeleteMemberResponse, MemberRecord};
use crate::model::relationship::Relationship;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Gateway operation kind, used for journaling and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    FetchHouseholds,
    CreateHousehold,
    GetHousehold,
    UpdateHousehold,
    GetMembers,
    UpsertMembers,
    DeleteMember,
}

/// One journaled gateway call with its request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    FetchHouseholds(FetchHouseholdsRequest),
    CreateHousehold(HouseholdFields),
    GetHousehold(HouseholdId),
    UpdateHousehold {
        household_uid: HouseholdId,
        fields: HouseholdFields,
    },
    GetMembers(HouseholdId),
    UpsertMembers {
        household_uid: HouseholdId,
        members: Vec<MemberRecord>,
    },
    DeleteMember {
        household_uid: HouseholdId,
        member_uid: String,
    },
}

impl GatewayCall {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::FetchHouseholds(_) => OperationKind::FetchHouseholds,
            Self::CreateHousehold(_) => OperationKind::CreateHousehold,
            Self::GetHousehold(_) => OperationKind::GetHousehold,
            Self::UpdateHousehold { .. } => OperationKind::UpdateHousehold,
            Self::GetMembers(_) => OperationKind::GetMembers,
            Self::UpsertMembers { .. } => OperationKind::UpsertMembers,
            Self::DeleteMember { .. } => OperationKind::DeleteMember,
        }
    }
}

#[derive(Default)]
struct MemoryState {
    households: BTreeMap<HouseholdId, Household>,
    members: BTreeMap<HouseholdId, Vec<MemberRecord>>,
    calls: Vec<GatewayCall>,
    failing: HashSet<OperationKind>,
}

/// Gateway backed by in-process maps.
#[derive(Default)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a household under a caller-chosen id without journaling.
    pub fn seed_household(
        &self,
        uid: impl Into<HouseholdId>,
        fields: HouseholdFields,
    ) -> Household {
        let now = timestamp();
        let household = Household {
            uid: uid.into(),
            name: None,
            zip_code: fields.zip_code,
            address: fields.address,
            phone_number: fields.phone_number,
            email: fields.email,
            created: now.clone(),
            updated: now,
        };
        let mut state = self.lock();
        state.members.entry(household.uid.clone()).or_default();
        state
            .households
            .insert(household.uid.clone(), household.clone());
        household
    }

    /// Stores a member under a caller-chosen id without journaling.
    pub fn seed_member(
        &self,
        household_uid: &str,
        member_uid: impl Into<String>,
        mut record: MemberRecord,
    ) -> MemberRecord {
        let now = timestamp();
        record.uid = Some(member_uid.into());
        record.household_uid = household_uid.to_string();
        record.created = Some(now.clone());
        record.updated = Some(now);
        self.lock()
            .members
            .entry(household_uid.to_string())
            .or_default()
            .push(record.clone());
        record
    }

    /// Makes every subsequent call of `kind` fail with a transport error.
    pub fn fail_on(&self, kind: OperationKind) {
        self.lock().failing.insert(kind);
    }

    /// Clears failure injection for `kind`.
    pub fn recover(&self, kind: OperationKind) {
        self.lock().failing.remove(&kind);
    }

    /// Returns the call journal in arrival order.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn household(&self, uid: &str) -> Option<Household> {
        self.lock().households.get(uid).cloned()
    }

    /// Returns stored members of one household.
    pub fn members_of(&self, household_uid: &str) -> Vec<MemberRecord> {
        self.lock()
            .members
            .get(household_uid)
            .cloned()
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, call: GatewayCall) -> GatewayResult<MutexGuard<'_, MemoryState>> {
        let mut state = self.lock();
        let kind = call.kind();
        state.calls.push(call);
        if state.failing.contains(&kind) {
            return Err(GatewayError::Transport(format!("injected failure: {kind:?}")));
        }
        Ok(state)
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn fetch_households(
        &self,
        request: &FetchHouseholdsRequest,
    ) -> GatewayResult<FetchHouseholdsResponse> {
        let state = self.begin(GatewayCall::FetchHouseholds(request.clone()))?;
        request.check_paging().map_err(GatewayError::Validation)?;

        let matches: Vec<Household> = state
            .households
            .values()
            .filter(|household| {
                household.email.contains(request.search.as_str())
                    || household.phone_number.contains(request.search.as_str())
            })
            .map(|household| {
                let mut household = household.clone();
                household.name = head_name(state.members.get(&household.uid));
                household
            })
            .collect();

        let count = matches.len() as u64;
        let households = matches
            .into_iter()
            .skip(request.offset as usize)
            .take(request.limit as usize)
            .collect();
        Ok(FetchHouseholdsResponse { count, households })
    }

    async fn create_household(&self, fields: &HouseholdFields) -> GatewayResult<Household> {
        let mut state = self.begin(GatewayCall::CreateHousehold(fields.clone()))?;
        let now = timestamp();
        let household = Household {
            uid: Uuid::new_v4().to_string(),
            name: None,
            zip_code: fields.zip_code.clone(),
            address: fields.address.clone(),
            phone_number: fields.phone_number.clone(),
            email: fields.email.clone(),
            created: now.clone(),
            updated: now,
        };
        state.members.insert(household.uid.clone(), Vec::new());
        state
            .households
            .insert(household.uid.clone(), household.clone());
        Ok(household)
    }

    async fn get_household(&self, household_uid: &str) -> GatewayResult<Household> {
        let state = self.begin(GatewayCall::GetHousehold(household_uid.to_string()))?;
        state
            .households
            .get(household_uid)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("household {household_uid}")))
    }

    async fn update_household(
        &self,
        household_uid: &str,
        fields: &HouseholdFields,
    ) -> GatewayResult<Household> {
        let mut state = self.begin(GatewayCall::UpdateHousehold {
            household_uid: household_uid.to_string(),
            fields: fields.clone(),
        })?;
        let household = state
            .households
            .get_mut(household_uid)
            .ok_or_else(|| GatewayError::NotFound(format!("household {household_uid}")))?;
        household.zip_code = fields.zip_code.clone();
        household.address = fields.address.clone();
        household.phone_number = fields.phone_number.clone();
        household.email = fields.email.clone();
        household.updated = timestamp();
        Ok(household.clone())
    }

    async fn get_members(&self, household_uid: &str) -> GatewayResult<Vec<MemberRecord>> {
        let state = self.begin(GatewayCall::GetMembers(household_uid.to_string()))?;
        state
            .members
            .get(household_uid)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("household {household_uid}")))
    }

    async fn upsert_members(
        &self,
        household_uid: &str,
        members: &[MemberRecord],
    ) -> GatewayResult<Vec<MemberRecord>> {
        let mut state = self.begin(GatewayCall::UpsertMembers {
            household_uid: household_uid.to_string(),
            members: members.to_vec(),
        })?;
        let stored = state
            .members
            .get_mut(household_uid)
            .ok_or_else(|| GatewayError::NotFound(format!("household {household_uid}")))?;

        for record in members {
            if let Some(uid) = record.uid.as_deref() {
                if !stored.iter().any(|m| m.uid.as_deref() == Some(uid)) {
                    return Err(GatewayError::NotFound(format!("member {uid}")));
                }
            }
        }

        let now = timestamp();
        let mut response = Vec::with_capacity(members.len());
        for record in members {
            let mut saved = record.clone();
            saved.household_uid = household_uid.to_string();
            saved.updated = Some(now.clone());
            match record.uid.as_deref() {
                Some(uid) => {
                    let existing = stored.iter_mut().find(|m| m.uid.as_deref() == Some(uid));
                    if let Some(existing) = existing {
                        saved.created = existing.created.clone();
                        *existing = saved.clone();
                    }
                }
                None => {
                    saved.uid = Some(Uuid::new_v4().to_string());
                    saved.created = Some(now.clone());
                    stored.push(saved.clone());
                }
            }
            response.push(saved);
        }
        Ok(response)
    }

    async fn delete_member(
        &self,
        household_uid: &str,
        member_uid: &str,
    ) -> GatewayResult<DeleteMemberResponse> {
        let mut state = self.begin(GatewayCall::DeleteMember {
            household_uid: household_uid.to_string(),
            member_uid: member_uid.to_string(),
        })?;
        let stored = state
            .members
            .get_mut(household_uid)
            .ok_or_else(|| GatewayError::NotFound(format!("household {household_uid}")))?;
        // Deleting an absent member succeeds so a resubmitted save can repeat it.
        stored.retain(|m| m.uid.as_deref() != Some(member_uid));
        Ok(DeleteMemberResponse {
            household_uid: household_uid.to_string(),
            household_member_uid: member_uid.to_string(),
        })
    }
}

fn head_name(members: Option<&Vec<MemberRecord>>) -> Option<String> {
    members?
        .iter()
        .find(|m| m.relationship == Some(Relationship::Head))
        .map(|m| format!("{} {}", m.family_name, m.given_name))
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::{GatewayCall, MemoryGateway, OperationKind};
    use crate::gateway::{GatewayError, PersistenceGateway};
    use crate::model::household::{FetchHouseholdsRequest, HouseholdFields};
    use crate::model::member::MemberRecord;
    use crate::model::relationship::Relationship;

    fn record(family: &str, relationship: Relationship) -> MemberRecord {
        MemberRecord {
            uid: None,
            household_uid: String::new(),
            family_name: family.to_string(),
            given_name: "太郎".to_string(),
            birthday: "1990-01-21".to_string(),
            relationship: Some(relationship),
            created: None,
            updated: None,
        }
    }

    fn fields(phone: &str, email: &str) -> HouseholdFields {
        HouseholdFields {
            zip_code: "1000001".to_string(),
            address: "Tokyo".to_string(),
            phone_number: phone.to_string(),
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn fetch_filters_by_email_or_phone_and_pages() {
        let gateway = MemoryGateway::new();
        gateway.seed_household("H1", fields("0311111111", "one@example.com"));
        gateway.seed_household("H2", fields("0322222222", "two@example.com"));
        gateway.seed_member("H1", "M1", record("山田", Relationship::Head));

        let all = gateway
            .fetch_households(&FetchHouseholdsRequest::new("example", 0, 1))
            .await
            .unwrap();
        assert_eq!(all.count, 2);
        assert_eq!(all.households.len(), 1);
        assert_eq!(all.households[0].name.as_deref(), Some("山田 太郎"));

        let by_phone = gateway
            .fetch_households(&FetchHouseholdsRequest::new("2222", 0, 10))
            .await
            .unwrap();
        assert_eq!(by_phone.count, 1);
        assert_eq!(by_phone.households[0].uid, "H2");
    }

    #[tokio::test]
    async fn fetch_rejects_invalid_paging() {
        let gateway = MemoryGateway::new();
        let err = gateway
            .fetch_households(&FetchHouseholdsRequest::new("", 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[tokio::test]
    async fn upsert_with_unknown_uid_applies_nothing() {
        let gateway = MemoryGateway::new();
        gateway.seed_household("H1", fields("0311111111", "one@example.com"));
        let mut unknown = record("佐藤", Relationship::Child);
        unknown.uid = Some("missing".to_string());

        let err = gateway
            .upsert_members("H1", &[record("山田", Relationship::Head), unknown])
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::NotFound("member missing".to_string()));
        assert!(gateway.members_of("H1").is_empty());
    }

    #[tokio::test]
    async fn delete_member_is_idempotent_within_known_household() {
        let gateway = MemoryGateway::new();
        gateway.seed_household("H1", fields("0311111111", "one@example.com"));
        gateway.seed_member("H1", "M1", record("山田", Relationship::Head));

        let first = gateway.delete_member("H1", "M1").await.unwrap();
        assert_eq!(first.household_member_uid, "M1");
        let repeated = gateway.delete_member("H1", "M1").await.unwrap();
        assert_eq!(repeated.household_uid, "H1");
        assert!(gateway.members_of("H1").is_empty());

        let err = gateway.delete_member("H9", "M1").await.unwrap_err();
        assert_eq!(err, GatewayError::NotFound("household H9".to_string()));
    }

    #[tokio::test]
    async fn injected_failures_are_still_journaled() {
        let gateway = MemoryGateway::new();
        gateway.fail_on(OperationKind::GetHousehold);
        assert!(gateway.get_household("H1").await.is_err());
        assert_eq!(
            gateway.calls(),
            vec![GatewayCall::GetHousehold("H1".to_string())]
        );
    }
}
