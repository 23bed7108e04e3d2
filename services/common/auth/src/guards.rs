use tracing::warn;

use crate::error::AuthError;
use crate::extractors::CallerIdentity;

/// Passes when the caller holds any one of `allowed`; an empty list always passes.
pub fn ensure_role(caller: &CallerIdentity, allowed: &[&str]) -> Result<(), AuthError> {
    if allowed.is_empty() || caller.roles.intersects(allowed) {
        return Ok(());
    }

    warn!(
        user_id = %caller.user_id,
        required = ?allowed,
        roles = %caller.roles,
        "role_check_failed"
    );
    Err(AuthError::Forbidden {
        required: allowed.iter().map(|value| value.to_string()).collect(),
        actual: caller.roles.to_vec(),
    })
}
