//! Member identity bookkeeping for one edit session.
//!
//! # Invariants
//! - `new_ids` and `removed_ids` are disjoint.
//! - Removing a never-persisted member leaves no trace.
//! - `removed_ids` only ever holds server-assigned identifiers.

use crate::model::member::{MemberId, PersistedMemberId};
use log::debug;
use std::collections::{BTreeSet, HashSet};

/// Tracks locally created and locally removed members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityTracker {
    new_ids: HashSet<MemberId>,
    removed_ids: BTreeSet<PersistedMemberId>,
}

impl IdentityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a member created in this session.
    ///
    /// Returns `false` if the identifier was already registered.
    pub fn register_new(&mut self, id: MemberId) -> bool {
        self.new_ids.insert(id)
    }

    /// Records a member removed in this session.
    pub fn register_removed(&mut self, id: &MemberId) {
        if self.new_ids.remove(id) {
            return;
        }
        match id {
            MemberId::Persisted(uid) => {
                self.removed_ids.insert(uid.clone());
            }
            MemberId::Provisional(_) => {
                debug!("event=tracker_remove module=session status=ignored id={id}");
            }
        }
    }

    pub fn is_new(&self, id: &MemberId) -> bool {
        self.new_ids.contains(id)
    }

    /// Persisted identifiers that must be deleted remotely, sorted.
    pub fn removed_snapshot(&self) -> BTreeSet<PersistedMemberId> {
        self.removed_ids.clone()
    }

    pub fn new_count(&self) -> usize {
        self.new_ids.len()
    }

    pub fn is_clean(&self) -> bool {
        self.new_ids.is_empty() && self.removed_ids.is_empty()
    }

    pub fn reset(&mut self) {
        self.new_ids.clear();
        self.removed_ids.clear();
    }

    /// Clears only the entries a completed save accounted for.
    pub fn forget<'a>(
        &mut self,
        saved_new: impl IntoIterator<Item = &'a MemberId>,
        deleted: impl IntoIterator<Item = &'a PersistedMemberId>,
    ) {
        for id in saved_new {
            self.new_ids.remove(id);
        }
        for uid in deleted {
            self.removed_ids.remove(uid);
        }
    }
}
