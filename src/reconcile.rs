//! Converging a user's role memberships to an admin-selected set.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::{Role, RoleSet},
    repository::{RepositoryError, UserRepository},
};

/// A single membership change issued against the user store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "role", rename_all = "lowercase")]
pub enum RoleChange {
    Remove(Role),
    Add(Role),
}

impl fmt::Display for RoleChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleChange::Remove(role) => write!(f, "remove role {}", role),
            RoleChange::Add(role) => write!(f, "add role {}", role),
        }
    }
}

/// RolePlan
///
/// The minimal difference between two role sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolePlan {
    pub to_remove: RoleSet,
    pub to_add: RoleSet,
}

impl RolePlan {
    /// `to_remove = current - desired`, `to_add = desired - current`.
    pub fn between(current: &RoleSet, desired: &RoleSet) -> Self {
        Self {
            to_remove: current.difference(desired).copied().collect(),
            to_add: desired.difference(current).copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_add.is_empty()
    }

    /// Removals first, then additions, each in role order.
    pub fn changes(&self) -> Vec<RoleChange> {
        self.to_remove
            .iter()
            .map(|role| RoleChange::Remove(*role))
            .chain(self.to_add.iter().map(|role| RoleChange::Add(*role)))
            .collect()
    }
}

/// ReconcileError
///
/// Reconciliation stopped at `failed`. Everything in `applied` has already
/// been written and is not rolled back; nothing after `failed` was attempted.
#[derive(Debug, Error)]
#[error("Failed to {failed}")]
pub struct ReconcileError {
    pub applied: Vec<RoleChange>,
    pub failed: RoleChange,
    #[source]
    pub source: RepositoryError,
}

/// reconcile
///
/// Applies the plan between `current` and `desired` to `user_id`, one store
/// call per change, halting on the first failure. Returns the changes that
/// were applied; an already-converged user issues no store calls at all.
pub async fn reconcile(
    store: &dyn UserRepository,
    user_id: Uuid,
    current: &RoleSet,
    desired: &RoleSet,
) -> Result<Vec<RoleChange>, ReconcileError> {
    let plan = RolePlan::between(current, desired);
    let mut applied = Vec::new();

    for change in plan.changes() {
        let result = match change {
            RoleChange::Remove(role) => store.remove_role(user_id, role).await,
            RoleChange::Add(role) => store.add_role(user_id, role).await,
        };

        if let Err(source) = result {
            tracing::warn!(%user_id, "role reconciliation failed to {}: {}", change, source);
            return Err(ReconcileError {
                applied,
                failed: change,
                source,
            });
        }

        tracing::info!(%user_id, "{}", change);
        applied.push(change);
    }

    Ok(applied)
}
