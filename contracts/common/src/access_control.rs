//! Access Control Module
//!
//! Role-based access control for the peg stability engine.
//!
//! ## Roles
//!
//! - **Governor**: parameter changes, unpausing, role management
//! - **Guardian**: emergency pausing only
//! - **PcvController**: moving reserves out of the engine
//!
//! Roles are plain grants; the Governor also holds every Governor-gated
//! permission implicitly, nothing is inherited beyond that.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::errors::{PegError, PegResult};
use crate::types::Address;

// ============================================================================
// Types
// ============================================================================

/// Protocol roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum Role {
    /// Can change parameters, unpause and manage roles
    Governor = 0,
    /// Can pause in an emergency
    Guardian = 1,
    /// Can withdraw reserves
    PcvController = 2,
}

impl Role {
    /// Stable name used in error messages and logs
    pub fn name(&self) -> &'static str {
        match self {
            Role::Governor => "GOVERNOR",
            Role::Guardian => "GUARDIAN",
            Role::PcvController => "PCV_CONTROLLER",
        }
    }
}

/// Role assignment for an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct RoleAssignment {
    /// Address with the role
    pub address: Address,
    /// Assigned role
    pub role: Role,
    /// Address that granted the role
    pub granted_by: Address,
    /// Timestamp when the role was granted
    pub granted_at: u64,
}

/// Access control state
#[derive(Debug, Clone, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AccessControlState {
    /// Active role assignments
    pub roles: Vec<RoleAssignment>,
    /// Timestamp of the last change
    pub last_update: u64,
}

impl AccessControlState {
    /// Create new access control state with an initial governor
    pub fn new(governor: Address, timestamp: u64) -> Self {
        Self {
            roles: vec![RoleAssignment {
                address: governor,
                role: Role::Governor,
                granted_by: governor,
                granted_at: timestamp,
            }],
            last_update: timestamp,
        }
    }

    /// Number of accounts holding `role`
    pub fn holders(&self, role: Role) -> usize {
        self.roles.iter().filter(|r| r.role == role).count()
    }
}

// ============================================================================
// Core Access Control Functions
// ============================================================================

/// Check if address has a specific role
pub fn has_role(state: &AccessControlState, address: &Address, role: Role) -> bool {
    state.roles.iter().any(|r| r.address == *address && r.role == role)
}

/// Fail with `Unauthorized` unless `address` holds `role`
pub fn require_role(state: &AccessControlState, address: &Address, role: Role) -> PegResult<()> {
    if has_role(state, address, role) {
        Ok(())
    } else {
        Err(PegError::Unauthorized {
            account: *address,
            required: role.name(),
        })
    }
}

/// Fail with `Unauthorized` unless `address` holds at least one of `roles`
///
/// The error names the first role in the list.
pub fn require_any_role(state: &AccessControlState, address: &Address, roles: &[Role]) -> PegResult<()> {
    if roles.iter().any(|role| has_role(state, address, *role)) {
        return Ok(());
    }
    Err(PegError::Unauthorized {
        account: *address,
        required: roles.first().map(Role::name).unwrap_or("NONE"),
    })
}

/// Grant a role to an address
///
/// Returns `false` if the grantee already held the role.
pub fn grant_role(
    state: &mut AccessControlState,
    granter: Address,
    grantee: Address,
    role: Role,
    timestamp: u64,
) -> PegResult<bool> {
    require_role(state, &granter, Role::Governor)?;

    if has_role(state, &grantee, role) {
        return Ok(false);
    }

    state.roles.push(RoleAssignment {
        address: grantee,
        role,
        granted_by: granter,
        granted_at: timestamp,
    });
    state.last_update = timestamp;
    Ok(true)
}

/// Revoke a role from an address
///
/// Returns `false` if the target did not hold the role. The last governor
/// cannot be removed.
pub fn revoke_role(
    state: &mut AccessControlState,
    revoker: Address,
    target: Address,
    role: Role,
    timestamp: u64,
) -> PegResult<bool> {
    require_role(state, &revoker, Role::Governor)?;

    if !has_role(state, &target, role) {
        return Ok(false);
    }
    if role == Role::Governor && state.holders(Role::Governor) == 1 {
        return Err(PegError::InvalidParameter {
            param: "role",
            reason: "cannot revoke the last governor",
        });
    }

    state.roles.retain(|r| !(r.address == target && r.role == role));
    state.last_update = timestamp;
    Ok(true)
}

/// All roles held by an address
pub fn get_roles(state: &AccessControlState, address: &Address) -> Vec<Role> {
    state
        .roles
        .iter()
        .filter(|r| r.address == *address)
        .map(|r| r.role)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
