//! Approval authorization
//!
//! The acting user is always passed explicitly. [`can_approve`] combines the
//! "not your own claim" rule with the admin role and an external approver
//! relationship lookup, failing closed on any lookup error.
//!
//! This check is advisory for the caller; the persistence layer remains the
//! source of truth for what may be written.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use core_kernel::{DomainPort, PortError, UserId};

/// Roles carried by an authenticated session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Approver,
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Approver => "approver",
            Role::Staff => "staff",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" | "super_admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "approver" => Ok(Role::Approver),
            "staff" | "crew" => Ok(Role::Staff),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Identity of the user performing an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActingUser {
    pub id: UserId,
    pub roles: Vec<Role>,
}

impl ActingUser {
    /// A user with no roles
    pub fn new(id: UserId) -> Self {
        Self { id, roles: Vec::new() }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
        self
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Admins, managers and approvers may read claims of other users
    pub fn is_reviewer(&self) -> bool {
        self.is_admin() || self.has_role(Role::Manager) || self.has_role(Role::Approver)
    }
}

/// External lookup of manager/approver relationships between users
#[async_trait]
pub trait ApproverDirectory: DomainPort {
    /// Whether `approver` may decide on claims submitted by `target`
    async fn is_approver(&self, approver: UserId, target: UserId) -> Result<bool, PortError>;
}

/// Decides whether `acting` may approve or reject a claim owned by `claim_owner`
///
/// Returns `false` without a session, for the claim owner, and whenever the
/// directory lookup fails.
pub async fn can_approve(
    directory: &dyn ApproverDirectory,
    acting: Option<&ActingUser>,
    claim_owner: UserId,
) -> bool {
    let Some(acting) = acting else {
        debug!("No session; approval denied");
        return false;
    };
    if acting.id == claim_owner {
        return false;
    }
    if acting.is_admin() {
        return true;
    }

    match directory.is_approver(acting.id, claim_owner).await {
        Ok(allowed) => allowed,
        Err(e) => {
            warn!(
                approver = %acting.id,
                owner = %claim_owner,
                error = %e,
                "Approver lookup failed; denying approval"
            );
            false
        }
    }
}

/// Decides whether `acting` may read a claim owned by `claim_owner`
///
/// Owners and reviewers always may; anyone else needs an approver
/// relationship to the owner. Lookup failures deny access.
pub async fn can_view(
    directory: &dyn ApproverDirectory,
    acting: Option<&ActingUser>,
    claim_owner: UserId,
) -> bool {
    let Some(acting) = acting else {
        return false;
    };
    if acting.id == claim_owner || acting.is_reviewer() {
        return true;
    }

    match directory.is_approver(acting.id, claim_owner).await {
        Ok(allowed) => allowed,
        Err(e) => {
            warn!(
                viewer = %acting.id,
                owner = %claim_owner,
                error = %e,
                "Approver lookup failed; denying read"
            );
            false
        }
    }
}
