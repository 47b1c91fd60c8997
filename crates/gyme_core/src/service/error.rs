//! Service error taxonomy.
//!
//! # Responsibility
//! - Give every use-case failure one variant and one stable `ErrorKind` tag.
//!
//! # Invariants
//! - `Forbidden` never carries details about the protected resource.
//! - Consistency faults are never folded into `Conflict`.

use crate::model::exercise::{ExerciseId, ExerciseType};
use crate::model::social::{CommentId, CommentValidationError};
use crate::model::user::{UserId, UserValidationError};
use crate::model::workout::{WorkoutId, WorkoutValidationError};
use crate::repo::RepoError;
use crate::rules::friendship::FriendshipRejection;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Coarse classification callers can map onto their own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Forbidden,
    /// Stored data broke an invariant; needs operator attention.
    ConsistencyFault,
    Persistence,
}

/// Errors returned by use-case services.
#[derive(Debug)]
pub enum ServiceError {
    InvalidUser(UserValidationError),
    InvalidWorkout(WorkoutValidationError),
    InvalidComment(CommentValidationError),
    UserNameTaken,
    DuplicateExerciseType(ExerciseType),
    /// Friendship transition refused by the state machine.
    Friendship(FriendshipRejection),
    /// Storage kept changing underneath the write; retries exhausted.
    ConcurrentModification,
    UserNotFound(UserId),
    ExerciseNotFound(ExerciseId),
    WorkoutNotFound(WorkoutId),
    CommentNotFound(CommentId),
    Forbidden,
    /// Stored exercise position lies outside the owner's list.
    PositionOutOfRange {
        exercise_id: ExerciseId,
        position: i64,
        len: usize,
    },
    /// Owner positions are not `0..n-1`.
    PositionsCorrupted { owner_id: UserId },
    Repo(RepoError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUser(_) | Self::InvalidWorkout(_) | Self::InvalidComment(_) => {
                ErrorKind::Validation
            }
            Self::Friendship(FriendshipRejection::SelfAction) => ErrorKind::Validation,
            Self::Friendship(rejection) if rejection.is_consistency_fault() => {
                ErrorKind::ConsistencyFault
            }
            Self::Friendship(_)
            | Self::UserNameTaken
            | Self::DuplicateExerciseType(_)
            | Self::ConcurrentModification => ErrorKind::Conflict,
            Self::UserNotFound(_)
            | Self::ExerciseNotFound(_)
            | Self::WorkoutNotFound(_)
            | Self::CommentNotFound(_) => ErrorKind::NotFound,
            Self::Forbidden => ErrorKind::Forbidden,
            Self::PositionOutOfRange { .. } | Self::PositionsCorrupted { .. } => {
                ErrorKind::ConsistencyFault
            }
            Self::Repo(_) => ErrorKind::Persistence,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUser(err) => write!(f, "{err}"),
            Self::InvalidWorkout(err) => write!(f, "{err}"),
            Self::InvalidComment(err) => write!(f, "{err}"),
            Self::UserNameTaken => write!(f, "user name already taken"),
            Self::DuplicateExerciseType(exercise_type) => write!(
                f,
                "exercise `{}` already exists for this user",
                exercise_type.as_str()
            ),
            Self::Friendship(rejection) => write!(f, "{rejection}"),
            Self::ConcurrentModification => {
                write!(f, "data changed concurrently; please retry")
            }
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::ExerciseNotFound(id) => write!(f, "exercise not found: {id}"),
            Self::WorkoutNotFound(id) => write!(f, "workout not found: {id}"),
            Self::CommentNotFound(id) => write!(f, "comment not found: {id}"),
            Self::Forbidden => write!(f, "access denied"),
            Self::PositionOutOfRange {
                exercise_id,
                position,
                len,
            } => write!(
                f,
                "exercise {exercise_id} stored at position {position} outside list of {len}"
            ),
            Self::PositionsCorrupted { owner_id } => {
                write!(f, "exercise positions of user {owner_id} are not dense")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidUser(err) => Some(err),
            Self::InvalidWorkout(err) => Some(err),
            Self::InvalidComment(err) => Some(err),
            Self::Friendship(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<UserValidationError> for ServiceError {
    fn from(value: UserValidationError) -> Self {
        Self::InvalidUser(value)
    }
}

impl From<WorkoutValidationError> for ServiceError {
    fn from(value: WorkoutValidationError) -> Self {
        Self::InvalidWorkout(value)
    }
}

impl From<CommentValidationError> for ServiceError {
    fn from(value: CommentValidationError) -> Self {
        Self::InvalidComment(value)
    }
}

impl From<FriendshipRejection> for ServiceError {
    fn from(value: FriendshipRejection) -> Self {
        Self::Friendship(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, ServiceError};
    use crate::model::social::CommentValidationError;
    use crate::model::workout::WorkoutValidationError;
    use crate::repo::RepoError;
    use crate::rules::friendship::FriendshipRejection;
    use uuid::Uuid;

    #[test]
    fn friendship_rejections_map_to_distinct_kinds() {
        assert_eq!(
            ServiceError::from(FriendshipRejection::SelfAction).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ServiceError::from(FriendshipRejection::NotFriends).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            ServiceError::from(FriendshipRejection::ForeignEdge).kind(),
            ErrorKind::ConsistencyFault
        );
    }

    #[test]
    fn forbidden_message_leaks_nothing() {
        assert_eq!(ServiceError::Forbidden.to_string(), "access denied");
        assert_eq!(ServiceError::Forbidden.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn remaining_variants_have_expected_kinds() {
        assert_eq!(
            ServiceError::from(WorkoutValidationError::EmptySeries).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ServiceError::from(CommentValidationError::Empty).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ServiceError::UserNotFound(Uuid::new_v4()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ServiceError::CommentNotFound(Uuid::new_v4()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ServiceError::PositionsCorrupted {
                owner_id: Uuid::new_v4()
            }
            .kind(),
            ErrorKind::ConsistencyFault
        );
        assert_eq!(
            ServiceError::from(RepoError::Conflict("x".to_string())).kind(),
            ErrorKind::Persistence
        );
    }
}
