//! Role authorization queries
//!
//! Exact, case-sensitive string comparison. A single role is a membership
//! test; a list is OR by default and AND with `require_all`. Every
//! degenerate input (no session, no user, no roles, no requested role,
//! empty request) answers `false`.

use navigation::RoleSpec;

use crate::state::AuthState;

pub fn has_role(state: &AuthState, role: Option<&RoleSpec>, require_all: bool) -> bool {
    if !state.is_authenticated {
        return false;
    }
    let Some(user_roles) = state.user.as_ref().and_then(|u| u.roles.as_deref()) else {
        return false;
    };
    let Some(requested) = role.map(RoleSpec::as_slice) else {
        return false;
    };
    if user_roles.is_empty() || requested.is_empty() {
        return false;
    }

    let held = |wanted: &String| user_roles.iter().any(|r| r == wanted);
    if require_all {
        requested.iter().all(held)
    } else {
        requested.iter().any(held)
    }
}
