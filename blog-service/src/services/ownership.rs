//! Who may change what.
//!
//! Posts and comments carry an optional owner. An owned resource may be
//! changed only by its owner; a resource without an owner (created before
//! accounts existed) may be changed by any authenticated caller. Authors have
//! no such fallback: only the author themself may edit or delete their record.

use super::error::ServiceError;

/// The authenticated author making a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub author_id: i64,
}

impl Caller {
    pub fn new(author_id: i64) -> Self {
        Self { author_id }
    }
}

pub fn can_mutate(owner_id: Option<i64>, caller_id: i64) -> bool {
    match owner_id {
        None => true,
        Some(owner) => owner == caller_id,
    }
}

pub fn ensure_can_mutate(
    owner_id: Option<i64>,
    caller: Caller,
    resource: &str,
) -> Result<(), ServiceError> {
    if can_mutate(owner_id, caller.author_id) {
        Ok(())
    } else {
        tracing::warn!(
            caller_id = caller.author_id,
            owner_id = ?owner_id,
            resource,
            "Mutation denied: caller is not the owner"
        );
        Err(ServiceError::Forbidden(format!(
            "You can only modify your own {}",
            resource
        )))
    }
}

pub fn ensure_self(author_id: i64, caller: Caller) -> Result<(), ServiceError> {
    if author_id == caller.author_id {
        Ok(())
    } else {
        tracing::warn!(
            caller_id = caller.author_id,
            target_id = author_id,
            "Author mutation denied: not self"
        );
        Err(ServiceError::Forbidden(
            "You can only modify your own author profile".to_string(),
        ))
    }
}
