//! Core domain logic for GyMe.
//! Owns exercise ordering and friendship invariants for every caller.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod rules;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::exercise::{Exercise, ExerciseId, ExerciseType};
pub use model::friendship::{FriendStatus, UserFriendRelation};
pub use model::social::{
    Comment, CommentId, CommentValidationError, Reaction, ReactionCount, ReactionTarget,
    ReactionType, WorkoutEngagement,
};
pub use model::user::{User, UserId, UserValidationError};
pub use model::workout::{Series, Workout, WorkoutId, WorkoutSummary, WorkoutValidationError};
pub use repo::exercise_repo::{ExerciseRepository, SqliteExerciseRepository};
pub use repo::social_repo::{SocialRepository, SqliteSocialRepository};
pub use repo::user_repo::{CommonFriends, SqliteUserRepository, UserRepository};
pub use repo::workout_repo::{SqliteWorkoutRepository, WorkoutRepository};
pub use repo::{PageRequest, RepoError, RepoResult};
pub use rules::friendship::{FriendAction, FriendshipChange, FriendshipRejection};
pub use rules::position_ledger::{Placement, PositionShift};
pub use service::exercise_service::{ExerciseDetails, ExerciseService};
pub use service::social_service::{CommentView, SocialService};
pub use service::user_service::{UserService, UserView};
pub use service::workout_service::{WorkoutDetails, WorkoutService};
pub use service::{ErrorKind, ServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
