//! Edit session state for one household and its members.
//!
//! # Responsibility
//! - Hold the working copy of household fields and the ordered member list.
//! - Keep the identity tracker consistent with every member mutation.
//! - Load an existing household and adopt the results of a completed save.
//!
//! # Invariants
//! - Setters never validate; validation happens when a save is planned.
//! - Every tracked new id belongs to a member still in the collection.
//! - A session is bound to one household; loading another builds a new
//!   session, so tracker state never leaks across households.

use crate::gateway::{GatewayError, PersistenceGateway};
use crate::model::household::{HouseholdField, HouseholdFields, HouseholdId};
use crate::model::member::{Member, MemberId};
use crate::service::plan::{SavePlan, SaveRejection};
use crate::service::save::SaveReport;
use crate::session::tracker::IdentityTracker;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

const GENERIC_REMOVAL_PROMPT: &str = "Remove this member?";

/// Confirmation step shown before a member is removed.
pub trait ConfirmRemoval {
    /// Returns `true` when the operator accepts `prompt`.
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> ConfirmRemoval for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Per-half result of loading an existing household.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub household_error: Option<GatewayError>,
    pub members_error: Option<GatewayError>,
    /// Member records dropped because they carried no identifier.
    pub skipped_members: usize,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.household_error.is_none() && self.members_error.is_none()
    }
}

/// Failure to adopt a save result into the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitError {
    /// The save report contains failed operations.
    Incomplete,
    /// Upsert response does not line up with the planned members.
    MemberCountMismatch { sent: usize, received: usize },
    /// A created member came back without a server identifier.
    MissingMemberId(MemberId),
}

impl Display for CommitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Incomplete => write!(f, "save did not complete"),
            Self::MemberCountMismatch { sent, received } => write!(
                f,
                "upsert returned {received} members for {sent} sent"
            ),
            Self::MissingMemberId(id) => write!(f, "server returned no id for member {id}"),
        }
    }
}

impl Error for CommitError {}

/// Working copy of one household plus its members.
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    household_id: Option<HouseholdId>,
    fields: HouseholdFields,
    members: Vec<Member>,
    tracker: IdentityTracker,
}

impl EditSession {
    /// Starts a session for a household that does not exist yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session for an existing household from already-fetched parts.
    pub fn existing(
        household_id: impl Into<HouseholdId>,
        fields: HouseholdFields,
        members: Vec<Member>,
    ) -> Self {
        Self {
            household_id: Some(household_id.into()),
            fields,
            members,
            tracker: IdentityTracker::new(),
        }
    }

    /// Loads household fields and members concurrently.
    ///
    /// Each half fails independently and leaves its part empty.
    pub async fn load<G>(gateway: &G, household_uid: &str) -> (Self, LoadReport)
    where
        G: PersistenceGateway + ?Sized,
    {
        let (household, records) = futures::join!(
            gateway.get_household(household_uid),
            gateway.get_members(household_uid)
        );

        let mut report = LoadReport::default();
        let fields = match household {
            Ok(household) => household.fields(),
            Err(err) => {
                warn!(
                    "event=session_load module=session status=error part=household \
                     household={} error={}",
                    household_uid, err
                );
                report.household_error = Some(err);
                HouseholdFields::default()
            }
        };

        let members = match records {
            Ok(records) => {
                let total = records.len();
                let members: Vec<Member> = records
                    .into_iter()
                    .filter_map(Member::from_record)
                    .collect();
                report.skipped_members = total - members.len();
                if report.skipped_members > 0 {
                    warn!(
                        "event=session_load module=session status=partial part=members \
                         household={} skipped={}",
                        household_uid, report.skipped_members
                    );
                }
                members
            }
            Err(err) => {
                warn!(
                    "event=session_load module=session status=error part=members \
                     household={} error={}",
                    household_uid, err
                );
                report.members_error = Some(err);
                Vec::new()
            }
        };

        info!(
            "event=session_load module=session status={} household={} members={}",
            if report.is_complete() { "ok" } else { "partial" },
            household_uid,
            members.len()
        );
        (Self::existing(household_uid, fields, members), report)
    }

    pub fn household_id(&self) -> Option<&str> {
        self.household_id.as_deref()
    }

    pub fn is_new_household(&self) -> bool {
        self.household_id.is_none()
    }

    pub fn fields(&self) -> &HouseholdFields {
        &self.fields
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, id: &MemberId) -> Option<&Member> {
        self.members.iter().find(|member| &member.id == id)
    }

    pub fn tracker(&self) -> &IdentityTracker {
        &self.tracker
    }

    /// Assigns one household field without validation.
    pub fn set_household_field(&mut self, field: HouseholdField, value: impl Into<String>) {
        self.fields.set(field, value);
    }

    /// Appends an empty member with a fresh provisional identifier.
    pub fn add_member(&mut self) -> MemberId {
        let mut member = Member::empty();
        while self.member(&member.id).is_some() || self.tracker.is_new(&member.id) {
            member = Member::empty();
        }
        let id = member.id.clone();
        self.tracker.register_new(id.clone());
        self.members.push(member);
        id
    }

    /// Removes a member after the operator confirms.
    ///
    /// Returns `true` when the member was removed. Unknown ids and declined
    /// confirmations leave the session unchanged.
    pub fn remove_member(&mut self, id: &MemberId, confirm: &mut impl ConfirmRemoval) -> bool {
        let Some(member) = self.member(id) else {
            return false;
        };
        if !confirm.confirm(&removal_prompt(member)) {
            return false;
        }
        self.tracker.register_removed(id);
        self.members.retain(|member| &member.id != id);
        true
    }

    /// Replaces the member with the same identifier.
    ///
    /// Returns `false` (and changes nothing) when no member matches.
    pub fn update_member(&mut self, updated: Member) -> bool {
        match self.members.iter_mut().find(|member| member.id == updated.id) {
            Some(slot) => {
                *slot = updated;
                true
            }
            None => false,
        }
    }

    /// Validates the session and snapshots the operations a save must issue.
    pub fn plan_save(&self) -> Result<SavePlan, SaveRejection> {
        SavePlan::build(self)
    }

    /// Adopts a completed save as the new baseline.
    ///
    /// Created members are rebound to their server identifiers; tracker
    /// entries the plan covered are cleared. Edits made after `plan` was
    /// built are kept and stay pending.
    pub fn commit(&mut self, plan: &SavePlan, report: &SaveReport) -> Result<(), CommitError> {
        if !report.is_success() {
            return Err(CommitError::Incomplete);
        }
        let saved = report.saved_members.as_deref().unwrap_or_default();
        if saved.len() != plan.members.len() {
            return Err(CommitError::MemberCountMismatch {
                sent: plan.members.len(),
                received: saved.len(),
            });
        }
        let mut rebound = Vec::new();
        for (planned, record) in plan.members.iter().zip(saved) {
            if planned.send_id {
                continue;
            }
            let uid = record
                .uid
                .clone()
                .filter(|uid| !uid.is_empty())
                .ok_or_else(|| CommitError::MissingMemberId(planned.id.clone()))?;
            rebound.push((planned.id.clone(), MemberId::Persisted(uid)));
        }

        if self.household_id.is_none() {
            self.household_id = report.household_uid.clone();
        }
        self.tracker.forget(plan.created_ids(), plan.removed.iter());
        for (provisional, persisted) in rebound {
            match self.members.iter_mut().find(|member| member.id == provisional) {
                Some(member) => member.id = persisted,
                // Removed while the save was in flight: now a remote row to delete.
                None => self.tracker.register_removed(&persisted),
            }
        }
        Ok(())
    }
}

/// Builds the confirmation prompt shown before removing `member`.
pub fn removal_prompt(member: &Member) -> String {
    match member.full_name() {
        Some(name) => format!("Remove {name}?"),
        None => GENERIC_REMOVAL_PROMPT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{removal_prompt, EditSession};
    use crate::model::household::HouseholdField;
    use crate::model::member::{Member, MemberId};

    #[test]
    fn prompt_uses_full_name_only_when_complete() {
        let mut member = Member::empty();
        assert_eq!(removal_prompt(&member), "Remove this member?");
        member.family_name = "山田".to_string();
        assert_eq!(removal_prompt(&member), "Remove this member?");
        member.given_name = "太郎".to_string();
        assert_eq!(removal_prompt(&member), "Remove 山田 太郎?");
    }

    #[test]
    fn declined_confirmation_changes_nothing() {
        let mut session = EditSession::existing(
            "H1",
            Default::default(),
            vec![Member::with_id(MemberId::persisted("M1"))],
        );
        let id = MemberId::persisted("M1");
        let mut asked = Vec::new();
        let removed = session.remove_member(&id, &mut |prompt: &str| {
            asked.push(prompt.to_string());
            false
        });
        assert!(!removed);
        assert_eq!(asked, vec!["Remove this member?".to_string()]);
        assert_eq!(session.members().len(), 1);
        assert!(session.tracker().removed_snapshot().is_empty());
    }

    #[test]
    fn removing_unknown_member_does_not_prompt() {
        let mut session = EditSession::new();
        let mut prompted = false;
        let removed = session.remove_member(&MemberId::persisted("nope"), &mut |_: &str| {
            prompted = true;
            true
        });
        assert!(!removed);
        assert!(!prompted);
    }

    #[test]
    fn household_setters_do_not_validate() {
        let mut session = EditSession::new();
        session.set_household_field(HouseholdField::PhoneNumber, "not a phone");
        assert_eq!(session.fields().phone_number, "not a phone");
        assert!(session.is_new_household());
    }
}
