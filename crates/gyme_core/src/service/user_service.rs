//! Account and friendship use-case service.
//!
//! # Responsibility
//! - Register accounts and toggle account privacy.
//! - Drive friendship actions through the friendship state machine.
//! - Expose friend lists, user search and friend suggestions.
//!
//! # Invariants
//! - Friendship edges are only ever written as mirrored pairs.
//! - Only valid accounts can be befriended or found.
//! - Both parties of a friend action exist before the state machine runs.

use crate::model::friendship::FriendStatus;
use crate::model::user::{User, UserId};
use crate::repo::user_repo::{CommonFriends, UserRepository};
use crate::repo::{PageRequest, RepoError};
use crate::rules::friendship::{self, FriendAction, FriendshipChange};
use crate::service::{with_conflict_retry, ServiceError};
use log::{error, info};

/// Account as seen by another user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserView {
    pub user: User,
    /// Requester's edge toward `user`, if any.
    pub friend_status: Option<FriendStatus>,
}

/// Account and friendship service facade.
pub struct UserService<U: UserRepository> {
    users: U,
}

impl<U: UserRepository> UserService<U> {
    pub fn new(users: U) -> Self {
        Self { users }
    }

    /// Creates a valid, public account.
    pub fn register_user(
        &self,
        user_name: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Result<User, ServiceError> {
        let user = User::new(user_name, first_name, last_name);
        user.validate()?;
        self.users.create_user(&user).map_err(|err| match err {
            RepoError::Conflict(_) => ServiceError::UserNameTaken,
            other => other.into(),
        })?;
        info!(
            "event=user_register module=service status=ok user_id={}",
            user.id
        );
        Ok(user)
    }

    pub fn set_private_account(
        &self,
        user_id: UserId,
        private_account: bool,
    ) -> Result<(), ServiceError> {
        self.users
            .set_private_account(user_id, private_account)
            .map_err(|err| match err {
                RepoError::NotFound(id) => ServiceError::UserNotFound(id),
                other => other.into(),
            })?;
        info!(
            "event=user_privacy module=service status=ok user_id={user_id} private={private_account}"
        );
        Ok(())
    }

    /// Loads a valid account together with the requester's relation to it.
    pub fn get_user(&self, requester: UserId, user_id: UserId) -> Result<UserView, ServiceError> {
        let user = self
            .users
            .get_user(user_id, true)?
            .ok_or(ServiceError::UserNotFound(user_id))?;
        let friend_status = if requester == user_id {
            None
        } else {
            self.users
                .get_relation(requester, user_id)?
                .map(|edge| edge.status)
        };
        Ok(UserView {
            user,
            friend_status,
        })
    }

    /// Returns ids of valid users whose name or user name contains `key`.
    pub fn find_users(&self, key: &str, page: PageRequest) -> Result<Vec<UserId>, ServiceError> {
        if key.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .users
            .find_users(key, page)?
            .into_iter()
            .map(|user| user.id)
            .collect())
    }

    /// Sends an invite, or accepts one already received from `target`.
    pub fn add_friend(
        &self,
        requester: UserId,
        target: UserId,
    ) -> Result<FriendshipChange, ServiceError> {
        self.run_friend_action(requester, target, FriendAction::Request)
    }

    pub fn accept_friend(
        &self,
        requester: UserId,
        target: UserId,
    ) -> Result<FriendshipChange, ServiceError> {
        self.run_friend_action(requester, target, FriendAction::Accept)
    }

    /// Removes a friend, cancels a sent invite or declines a received one.
    pub fn remove_friend(
        &self,
        requester: UserId,
        target: UserId,
    ) -> Result<FriendshipChange, ServiceError> {
        self.run_friend_action(requester, target, FriendAction::Remove)
    }

    /// Lists users the requester holds a `status` edge toward.
    pub fn list_friends(
        &self,
        requester: UserId,
        status: FriendStatus,
        page: PageRequest,
    ) -> Result<Vec<User>, ServiceError> {
        Ok(self.users.list_related_users(requester, status, page)?)
    }

    /// Suggests non-friends by number of shared friends.
    pub fn common_friends(
        &self,
        requester: UserId,
        page: PageRequest,
    ) -> Result<Vec<CommonFriends>, ServiceError> {
        Ok(self.users.common_friends(requester, page)?)
    }

    fn run_friend_action(
        &self,
        requester: UserId,
        target: UserId,
        action: FriendAction,
    ) -> Result<FriendshipChange, ServiceError> {
        let event = friend_event(action);
        // Removal still works for accounts that were deactivated later.
        let only_valid = action != FriendAction::Remove;
        // Existence is checked before the state machine runs, so a self
        // action by an unknown account is NotFound, not SelfAction.
        if self.users.get_user(requester, only_valid)?.is_none() {
            return Err(ServiceError::UserNotFound(requester));
        }
        if requester != target && self.users.get_user(target, only_valid)?.is_none() {
            return Err(ServiceError::UserNotFound(target));
        }

        let change = with_conflict_retry(event, || {
            let forward = self.users.get_relation(requester, target)?;
            let inverse = self.users.get_relation(target, requester)?;
            let change = friendship::apply(
                requester,
                target,
                forward.as_ref(),
                inverse.as_ref(),
                action,
            )
            .map_err(|rejection| {
                if rejection.is_consistency_fault() {
                    error!(
                        "event={event} module=service status=error error_code=friendship_consistency user_id={requester} friend_id={target}"
                    );
                }
                ServiceError::Friendship(rejection)
            })?;
            self.users.commit_friendship(&change)?;
            Ok(change)
        })?;

        info!(
            "event={event} module=service status=ok user_id={requester} friend_id={target} status_after={}",
            status_after(&change)
        );
        Ok(change)
    }
}

fn friend_event(action: FriendAction) -> &'static str {
    match action {
        FriendAction::Request => "friend_request",
        FriendAction::Accept => "friend_accept",
        FriendAction::Remove => "friend_remove",
    }
}

fn status_after(change: &FriendshipChange) -> &'static str {
    match change {
        FriendshipChange::Delete(_) => "none",
        other => other.pair().forward.status.as_str(),
    }
}
