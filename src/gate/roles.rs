use std::time::Duration;

use serde::Serialize;

use crate::auth::Credentials;
use crate::authority::{AuthorityError, Role, RoleAuthority};

/// Outcome of a single role query
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleCheck {
    Granted,
    Denied,
    /// The authority errored or did not answer in time
    Unknown,
}

impl RoleCheck {
    pub fn is_granted(self) -> bool {
        matches!(self, RoleCheck::Granted)
    }
}

/// Elevated access held by the current session. Either flag opens privileged routes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PrivilegeFlags {
    pub is_admin: bool,
    pub is_super_admin: bool,
}

impl PrivilegeFlags {
    pub fn from_checks(admin: RoleCheck, super_admin: RoleCheck) -> Self {
        Self {
            is_admin: admin.is_granted(),
            is_super_admin: super_admin.is_granted(),
        }
    }

    pub fn any(&self) -> bool {
        self.is_admin || self.is_super_admin
    }
}

/// Ask the authority for both roles at once and wait for both answers.
pub async fn classify_privileges(
    authority: &dyn RoleAuthority,
    session: &Credentials,
    timeout: Duration,
) -> PrivilegeFlags {
    let (admin, super_admin) = tokio::join!(
        check_role(authority, session, Role::Admin, timeout),
        check_role(authority, session, Role::SuperAdmin, timeout),
    );

    tracing::debug!("Role checks settled: admin={:?} super_admin={:?}", admin, super_admin);
    PrivilegeFlags::from_checks(admin, super_admin)
}

async fn check_role(
    authority: &dyn RoleAuthority,
    session: &Credentials,
    role: Role,
    timeout: Duration,
) -> RoleCheck {
    let result = match tokio::time::timeout(timeout, authority.has_role(session, role)).await {
        Ok(result) => result,
        Err(_) => Err(AuthorityError::Timeout(timeout)),
    };

    match result {
        Ok(true) => RoleCheck::Granted,
        Ok(false) => RoleCheck::Denied,
        Err(e) => {
            tracing::warn!("Role check '{}' failed, treating as not granted: {}", role.rpc_name(), e);
            RoleCheck::Unknown
        }
    }
}
