//! Mutual friendship state machine.
//!
//! # Responsibility
//! - Compute the next pair of directional edges for a friendship action.
//! - Reject invalid transitions with an explicit reason.
//!
//! # Invariants
//! - Output always carries both edges of a pair; a single edge is never
//!   created, updated or deleted alone.
//! - A user can never act on a relationship with itself.
//! - Snapshots with a missing or non-complementary mirror are reported as
//!   consistency faults and never repaired silently.

use crate::model::friendship::{FriendStatus, UserFriendRelation};
use crate::model::user::UserId;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Action requested by the acting user toward the target user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendAction {
    /// Sends an invite, or accepts one already received from the target.
    Request,
    /// Accepts an invite received from the target.
    Accept,
    /// Deletes the relation in any state (unfriend, cancel or decline).
    Remove,
}

/// Both directional edges of one relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgePair {
    /// Acting user's edge toward the target.
    pub forward: UserFriendRelation,
    /// Target's edge toward the acting user.
    pub inverse: UserFriendRelation,
}

impl EdgePair {
    fn from_forward(forward: UserFriendRelation) -> Self {
        Self {
            inverse: forward.mirrored(),
            forward,
        }
    }
}

/// Delta to persist as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendshipChange {
    /// Insert both edges.
    Create(EdgePair),
    /// Overwrite both edges. `previous` is the forward status the update was
    /// computed from; the inverse previously held its mirror.
    Update {
        pair: EdgePair,
        previous: FriendStatus,
    },
    /// Delete both edges.
    Delete(EdgePair),
}

impl FriendshipChange {
    pub fn pair(&self) -> &EdgePair {
        match self {
            Self::Create(pair) | Self::Delete(pair) => pair,
            Self::Update { pair, .. } => pair,
        }
    }
}

/// Reasons a friendship action is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendshipRejection {
    SelfAction,
    NotFriends,
    AlreadyFriends,
    InviteAlreadySent,
    NoPendingInvite,
    /// Edge `user_id -> friend_id` is absent while its mirror exists.
    MissingMirror {
        user_id: UserId,
        friend_id: UserId,
    },
    /// Both edges exist but their statuses are not complementary.
    MismatchedMirror {
        forward: FriendStatus,
        inverse: FriendStatus,
    },
    /// A supplied edge does not connect the acting and target users.
    ForeignEdge,
}

impl FriendshipRejection {
    /// Returns whether the rejection means stored data already broke the
    /// mirror invariant.
    pub fn is_consistency_fault(&self) -> bool {
        matches!(
            self,
            Self::MissingMirror { .. } | Self::MismatchedMirror { .. } | Self::ForeignEdge
        )
    }
}

impl Display for FriendshipRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfAction => write!(f, "you can't be friend with yourself"),
            Self::NotFriends => write!(f, "you don't have this friend"),
            Self::AlreadyFriends => write!(f, "this user is already your friend"),
            Self::InviteAlreadySent => write!(f, "friend invite already sent"),
            Self::NoPendingInvite => write!(f, "no pending friend invite from this user"),
            Self::MissingMirror { user_id, friend_id } => write!(
                f,
                "friendship edge {user_id} -> {friend_id} is missing its mirror"
            ),
            Self::MismatchedMirror { forward, inverse } => write!(
                f,
                "friendship edges are not complementary: {} / {}",
                forward.as_str(),
                inverse.as_str()
            ),
            Self::ForeignEdge => write!(f, "friendship edge does not belong to this pair"),
        }
    }
}

impl Error for FriendshipRejection {}

/// Computes the delta for `action` taken by `user_id` toward `target_id`.
///
/// `forward` is the `user_id -> target_id` edge, `inverse` the
/// `target_id -> user_id` edge, each as loaded from storage.
pub fn apply(
    user_id: UserId,
    target_id: UserId,
    forward: Option<&UserFriendRelation>,
    inverse: Option<&UserFriendRelation>,
    action: FriendAction,
) -> Result<FriendshipChange, FriendshipRejection> {
    if user_id == target_id {
        return Err(FriendshipRejection::SelfAction);
    }
    if forward.is_some_and(|edge| edge.user_id != user_id || edge.friend_id != target_id)
        || inverse.is_some_and(|edge| edge.user_id != target_id || edge.friend_id != user_id)
    {
        return Err(FriendshipRejection::ForeignEdge);
    }

    let (forward, inverse) = match (forward, inverse) {
        (None, None) => {
            return match action {
                FriendAction::Request => Ok(FriendshipChange::Create(EdgePair::from_forward(
                    UserFriendRelation::new(user_id, target_id, FriendStatus::InviteSent),
                ))),
                FriendAction::Accept => Err(FriendshipRejection::NoPendingInvite),
                FriendAction::Remove => Err(FriendshipRejection::NotFriends),
            };
        }
        (Some(_), None) => {
            return Err(FriendshipRejection::MissingMirror {
                user_id: target_id,
                friend_id: user_id,
            });
        }
        (None, Some(_)) => {
            return Err(FriendshipRejection::MissingMirror {
                user_id,
                friend_id: target_id,
            });
        }
        (Some(forward), Some(inverse)) => (*forward, *inverse),
    };

    if !forward.is_mirror_of(&inverse) {
        return Err(FriendshipRejection::MismatchedMirror {
            forward: forward.status,
            inverse: inverse.status,
        });
    }

    match (forward.status, action) {
        (_, FriendAction::Remove) => Ok(FriendshipChange::Delete(EdgePair { forward, inverse })),
        (FriendStatus::InviteReceived, FriendAction::Request | FriendAction::Accept) => {
            Ok(FriendshipChange::Update {
                pair: EdgePair::from_forward(UserFriendRelation::new(
                    user_id,
                    target_id,
                    FriendStatus::Friend,
                )),
                previous: FriendStatus::InviteReceived,
            })
        }
        (FriendStatus::InviteSent, FriendAction::Request) => {
            Err(FriendshipRejection::InviteAlreadySent)
        }
        (FriendStatus::InviteSent, FriendAction::Accept) => {
            Err(FriendshipRejection::NoPendingInvite)
        }
        (FriendStatus::Friend, FriendAction::Request | FriendAction::Accept) => {
            Err(FriendshipRejection::AlreadyFriends)
        }
    }
}
