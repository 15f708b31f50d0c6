//! Save orchestration: the remote half of a save.
//!
//! # Responsibility
//! - Issue the remote operations a `SavePlan` calls for, in the right order.
//! - Report every issued operation with its own result.
//! - Drive plan, dispatch and commit for a whole-session save.
//!
//! # Invariants
//! - A new household is created before its members are upserted.
//! - For an existing household, update, upsert and deletes run concurrently
//!   and all of them finish before the report is returned.
//! - No retry, rollback or compensation; a failed save leaves the session
//!   untouched so the caller can resubmit it.

use crate::gateway::{GatewayError, GatewayResult, PersistenceGateway};
use crate::model::household::HouseholdId;
use crate::model::member::{MemberRecord, PersistedMemberId};
use crate::service::plan::{SavePlan, SaveRejection};
use crate::session::{CommitError, EditSession};
use futures::future::join_all;
use log::{error, info, warn};

/// A remote operation issued by a save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOperation {
    CreateHousehold,
    UpdateHousehold {
        household_uid: HouseholdId,
    },
    UpsertMembers {
        household_uid: HouseholdId,
        count: usize,
    },
    DeleteMember {
        household_uid: HouseholdId,
        member_uid: PersistedMemberId,
    },
}

impl RemoteOperation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateHousehold => "create_household",
            Self::UpdateHousehold { .. } => "update_household",
            Self::UpsertMembers { .. } => "upsert_members",
            Self::DeleteMember { .. } => "delete_member",
        }
    }
}

/// Result of one issued remote operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResult {
    pub operation: RemoteOperation,
    pub result: Result<(), GatewayError>,
}

/// Per-operation account of a dispatched save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Target household; set once known (after create for new households).
    pub household_uid: Option<HouseholdId>,
    /// Issued operations in issue order.
    pub operations: Vec<OperationResult>,
    /// Upsert response, present when the upsert succeeded.
    pub saved_members: Option<Vec<MemberRecord>>,
}

impl SaveReport {
    /// `true` when every issued operation succeeded.
    pub fn is_success(&self) -> bool {
        !self.operations.is_empty() && self.operations.iter().all(|op| op.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &OperationResult> {
        self.operations.iter().filter(|op| op.result.is_err())
    }

    fn record<T>(&mut self, operation: RemoteOperation, result: GatewayResult<T>) -> Option<T> {
        match result {
            Ok(value) => {
                self.operations.push(OperationResult {
                    operation,
                    result: Ok(()),
                });
                Some(value)
            }
            Err(err) => {
                warn!(
                    "event=save_operation module=service status=error operation={} error={}",
                    operation.name(),
                    err
                );
                self.operations.push(OperationResult {
                    operation,
                    result: Err(err),
                });
                None
            }
        }
    }
}

/// Outcome of a whole-session save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Local validation failed; nothing was sent.
    Rejected(SaveRejection),
    /// At least one remote operation failed; the session is unchanged.
    Failed(SaveReport),
    /// Every operation succeeded and the session adopted the result.
    Saved(SaveReport),
    /// Every operation succeeded but the response could not be adopted.
    Unreconciled {
        report: SaveReport,
        error: CommitError,
    },
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }

    pub fn report(&self) -> Option<&SaveReport> {
        match self {
            Self::Rejected(_) => None,
            Self::Failed(report) | Self::Saved(report) => Some(report),
            Self::Unreconciled { report, .. } => Some(report),
        }
    }
}

/// Reconciles edit sessions against a persistence gateway.
pub struct SaveOrchestrator<G: PersistenceGateway> {
    gateway: G,
}

impl<G: PersistenceGateway> SaveOrchestrator<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Validates, dispatches and commits `session`.
    ///
    /// Holds the session exclusively for the whole save. Callers that keep
    /// editing while a save is in flight use `plan_save`, `dispatch` and
    /// `commit` separately.
    pub async fn save(&self, session: &mut EditSession) -> SaveOutcome {
        let plan = match session.plan_save() {
            Ok(plan) => plan,
            Err(rejection) => {
                info!(
                    "event=save module=service status=rejected reason={}",
                    rejection
                );
                return SaveOutcome::Rejected(rejection);
            }
        };

        let report = self.dispatch(&plan).await;
        if !report.is_success() {
            info!(
                "event=save module=service status=failed failures={}",
                report.failures().count()
            );
            return SaveOutcome::Failed(report);
        }

        match session.commit(&plan, &report) {
            Ok(()) => {
                info!(
                    "event=save module=service status=ok household={} members={}",
                    report.household_uid.as_deref().unwrap_or("-"),
                    plan.members.len()
                );
                SaveOutcome::Saved(report)
            }
            Err(error) => {
                error!(
                    "event=save module=service status=unreconciled error={}",
                    error
                );
                SaveOutcome::Unreconciled { report, error }
            }
        }
    }

    /// Issues the remote operations of `plan` and reports each result.
    pub async fn dispatch(&self, plan: &SavePlan) -> SaveReport {
        match plan.household_id.as_deref() {
            None => self.dispatch_create(plan).await,
            Some(household_uid) => self.dispatch_update(plan, household_uid).await,
        }
    }

    async fn dispatch_create(&self, plan: &SavePlan) -> SaveReport {
        let mut report = SaveReport::default();
        let created = self.gateway.create_household(&plan.fields).await;
        let Some(household) = report.record(RemoteOperation::CreateHousehold, created) else {
            return report;
        };
        let household_uid = household.uid;
        report.household_uid = Some(household_uid.clone());

        let records = plan.records_for(&household_uid);
        let upserted = self.gateway.upsert_members(&household_uid, &records).await;
        report.saved_members = report.record(
            RemoteOperation::UpsertMembers {
                household_uid,
                count: records.len(),
            },
            upserted,
        );
        report
    }

    async fn dispatch_update(&self, plan: &SavePlan, household_uid: &str) -> SaveReport {
        let gateway = &self.gateway;
        let records = plan.records_for(household_uid);
        let deletes = join_all(plan.removed.iter().map(|member_uid| async move {
            let result = gateway.delete_member(household_uid, member_uid).await;
            (member_uid.clone(), result)
        }));

        let (updated, upserted, deleted) = futures::join!(
            gateway.update_household(household_uid, &plan.fields),
            gateway.upsert_members(household_uid, &records),
            deletes
        );

        let mut report = SaveReport {
            household_uid: Some(household_uid.to_string()),
            ..SaveReport::default()
        };
        report.record(
            RemoteOperation::UpdateHousehold {
                household_uid: household_uid.to_string(),
            },
            updated,
        );
        report.saved_members = report.record(
            RemoteOperation::UpsertMembers {
                household_uid: household_uid.to_string(),
                count: records.len(),
            },
            upserted,
        );
        for (member_uid, result) in deleted {
            report.record(
                RemoteOperation::DeleteMember {
                    household_uid: household_uid.to_string(),
                    member_uid,
                },
                result,
            );
        }
        report
    }
}
