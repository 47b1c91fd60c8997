//! Directional friendship edge model.
//!
//! # Responsibility
//! - Define one user's view of a relationship with another user.
//!
//! # Invariants
//! - Edges exist in mirrored pairs: `InviteSent` pairs with `InviteReceived`,
//!   `Friend` pairs with `Friend`.
//! - Absence of an edge means no relation; there is no rejected state.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

/// Status of one directional edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendStatus {
    /// Owner of the edge invited the other user.
    InviteSent,
    /// Owner of the edge was invited by the other user.
    InviteReceived,
    Friend,
}

impl FriendStatus {
    /// Status the mirror edge must carry.
    pub fn mirror(self) -> Self {
        match self {
            Self::InviteSent => Self::InviteReceived,
            Self::InviteReceived => Self::InviteSent,
            Self::Friend => Self::Friend,
        }
    }

    /// Stable storage string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InviteSent => "invite_sent",
            Self::InviteReceived => "invite_received",
            Self::Friend => "friend",
        }
    }

    /// Parses the storage string produced by [`FriendStatus::as_str`].
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "invite_sent" => Some(Self::InviteSent),
            "invite_received" => Some(Self::InviteReceived),
            "friend" => Some(Self::Friend),
            _ => None,
        }
    }
}

/// `user_id`'s view of `friend_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFriendRelation {
    pub user_id: UserId,
    pub friend_id: UserId,
    pub status: FriendStatus,
}

impl UserFriendRelation {
    pub fn new(user_id: UserId, friend_id: UserId, status: FriendStatus) -> Self {
        Self {
            user_id,
            friend_id,
            status,
        }
    }

    /// Builds the edge that must accompany this one.
    pub fn mirrored(&self) -> Self {
        Self {
            user_id: self.friend_id,
            friend_id: self.user_id,
            status: self.status.mirror(),
        }
    }

    /// Returns whether `other` is the complementary edge of `self`.
    pub fn is_mirror_of(&self, other: &Self) -> bool {
        *other == self.mirrored()
    }
}

#[cfg(test)]
mod tests {
    use super::{FriendStatus, UserFriendRelation};
    use uuid::Uuid;

    #[test]
    fn mirror_is_an_involution() {
        for status in [
            FriendStatus::InviteSent,
            FriendStatus::InviteReceived,
            FriendStatus::Friend,
        ] {
            assert_eq!(status.mirror().mirror(), status);
            assert_eq!(FriendStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn mirrored_edge_swaps_participants() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let edge = UserFriendRelation::new(a, b, FriendStatus::InviteSent);
        let mirror = edge.mirrored();
        assert_eq!(mirror.user_id, b);
        assert_eq!(mirror.friend_id, a);
        assert_eq!(mirror.status, FriendStatus::InviteReceived);
        assert!(edge.is_mirror_of(&mirror));
        assert!(!edge.is_mirror_of(&edge));
    }
}
