use uuid::Uuid;

use crate::{auth::AuthUser, error::ApiError, models::Role};

/// Authorization Policy
///
/// Pure decision functions evaluated in front of every mutating operation.
/// Each takes the (possibly absent) authenticated actor plus, where relevant,
/// the user id the request targets — either the path-supplied id or the
/// resolved owner of the resource being acted on.
///
/// Every function checks for an authenticated actor first: absence is always
/// the distinct `AuthenticationRequired` denial, before any role or ownership
/// logic runs. Every denial is terminal; no function has side effects.

/// Allows only an authenticated actor through, returning it for further use.
pub fn require_authenticated(actor: Option<&AuthUser>) -> Result<&AuthUser, ApiError> {
    actor.ok_or_else(|| ApiError::AuthenticationRequired("Authentication required".to_string()))
}

/// require_self
///
/// Allow iff the actor's id equals the target user id, or no target id was
/// supplied at all (the check is not applicable and the request proceeds).
pub fn require_self(actor: Option<&AuthUser>, target: Option<Uuid>) -> Result<(), ApiError> {
    let actor = require_authenticated(actor)?;
    match target {
        None => Ok(()),
        Some(target) if actor.id == target => Ok(()),
        Some(_) => Err(ApiError::Forbidden("Access denied".to_string())),
    }
}

/// require_admin
///
/// Allow iff the actor holds the `admin` role.
pub fn require_admin(actor: Option<&AuthUser>) -> Result<(), ApiError> {
    let actor = require_authenticated(actor)?;
    if actor.role == Role::Admin {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Admin access denied".to_string()))
    }
}

/// require_editor
///
/// Allow iff the actor holds the `editor` role — or `admin`, which supersedes
/// it everywhere.
pub fn require_editor(actor: Option<&AuthUser>) -> Result<(), ApiError> {
    let actor = require_authenticated(actor)?;
    if actor.role == Role::Editor || actor.role == Role::Admin {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Editor access denied".to_string()))
    }
}

/// require_editor_or_admin
///
/// Allow iff the actor holds either privileged role.
pub fn require_editor_or_admin(actor: Option<&AuthUser>) -> Result<(), ApiError> {
    let actor = require_authenticated(actor)?;
    if actor.role.is_privileged() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Access denied".to_string()))
    }
}

/// require_self_or_admin
///
/// Allow iff the actor is an admin, or its id equals the target user id.
pub fn require_self_or_admin(
    actor: Option<&AuthUser>,
    target: Option<Uuid>,
) -> Result<(), ApiError> {
    let actor = require_authenticated(actor)?;
    if actor.role == Role::Admin || target == Some(actor.id) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Access denied".to_string()))
    }
}

/// require_self_or_editor_or_admin
///
/// Allow iff the actor holds a privileged role, or its id equals the target
/// user id.
pub fn require_self_or_editor_or_admin(
    actor: Option<&AuthUser>,
    target: Option<Uuid>,
) -> Result<(), ApiError> {
    let actor = require_authenticated(actor)?;
    if actor.role.is_privileged() || target == Some(actor.id) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Access denied".to_string()))
    }
}
