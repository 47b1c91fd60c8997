//! Visibility and ownership policy shared by services.
//!
//! # Invariants
//! - Private accounts are visible to themselves and to `Friend` edges only.
//! - The friend check looks up the `requester -> owner` edge by both ids.

use crate::model::friendship::FriendStatus;
use crate::model::user::{User, UserId};
use crate::repo::user_repo::UserRepository;
use crate::service::ServiceError;

/// Loads `owner_id` and checks that `requester` may read its data.
pub fn ensure_visible<U: UserRepository>(
    users: &U,
    requester: UserId,
    owner_id: UserId,
) -> Result<User, ServiceError> {
    let owner = users
        .get_user(owner_id, false)?
        .ok_or(ServiceError::UserNotFound(owner_id))?;
    if !owner.private_account || requester == owner_id {
        return Ok(owner);
    }

    let is_friend = users
        .get_relation(requester, owner_id)?
        .is_some_and(|edge| edge.status == FriendStatus::Friend);
    if is_friend {
        Ok(owner)
    } else {
        Err(ServiceError::Forbidden)
    }
}

/// Rejects mutations by anyone other than `owner_id`.
pub fn ensure_owner(requester: UserId, owner_id: UserId) -> Result<(), ServiceError> {
    if requester == owner_id {
        Ok(())
    } else {
        Err(ServiceError::Forbidden)
    }
}
