//! Reactions and comments on logged workouts.
//!
//! # Responsibility
//! - Define the closed reaction vocabulary and its storage strings.
//! - Define comments and the validation applied before they are stored.
//!
//! # Invariants
//! - A user holds at most one reaction per workout or comment.
//! - Comment content is trimmed, non-empty and at most
//!   `MAX_COMMENT_CHARS` characters.

use crate::model::user::UserId;
use crate::model::workout::WorkoutId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Upper bound for one comment's content.
pub const MAX_COMMENT_CHARS: usize = 1000;

/// Number of earliest reactions shown next to a workout.
pub const FIRST_REACTIONS_SHOWN: usize = 3;

/// Stable comment identifier.
pub type CommentId = Uuid;

/// Closed set of reactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionType {
    Like,
    Strong,
    Fire,
    Clap,
    Wow,
}

impl ReactionType {
    pub const ALL: [Self; 5] = [Self::Like, Self::Strong, Self::Fire, Self::Clap, Self::Wow];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Strong => "strong",
            Self::Fire => "fire",
            Self::Clap => "clap",
            Self::Wow => "wow",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|reaction_type| reaction_type.as_str() == value)
    }

    /// Display glyph for clients.
    pub fn emoji(self) -> &'static str {
        match self {
            Self::Like => "\u{1F44D}",
            Self::Strong => "\u{1F4AA}",
            Self::Fire => "\u{1F525}",
            Self::Clap => "\u{1F44F}",
            Self::Wow => "\u{1F62E}",
        }
    }
}

/// Thing a reaction is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionTarget {
    Workout(WorkoutId),
    Comment(CommentId),
}

impl ReactionTarget {
    pub fn id(self) -> Uuid {
        match self {
            Self::Workout(id) | Self::Comment(id) => id,
        }
    }
}

/// One user's reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub user_id: UserId,
    pub reaction_type: ReactionType,
    /// Unix epoch milliseconds of the first reaction; kept when the type
    /// changes.
    pub created_at: i64,
}

/// Number of reactions of one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionCount {
    pub reaction_type: ReactionType,
    pub count: u32,
}

/// Reaction and comment totals shown with a workout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutEngagement {
    pub reactions_count: u32,
    pub comments_count: u32,
    /// Earliest `FIRST_REACTIONS_SHOWN` reactions, oldest first.
    pub first_reactions: Vec<Reaction>,
}

/// Comment left on a workout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub workout_id: WorkoutId,
    /// Author.
    pub user_id: UserId,
    pub content: String,
    /// Unix epoch milliseconds, assigned by storage.
    pub created_at: i64,
}

impl Comment {
    /// Creates an unsaved comment with trimmed content and a generated id.
    pub fn new(workout_id: WorkoutId, user_id: UserId, content: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            workout_id,
            user_id,
            content: content.trim().to_string(),
            created_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), CommentValidationError> {
        if self.content.is_empty() {
            return Err(CommentValidationError::Empty);
        }
        let chars = self.content.chars().count();
        if chars > MAX_COMMENT_CHARS {
            return Err(CommentValidationError::TooLong { chars });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentValidationError {
    Empty,
    TooLong { chars: usize },
}

impl Display for CommentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "comment must not be empty"),
            Self::TooLong { chars } => write!(
                f,
                "comment has {chars} characters; at most {MAX_COMMENT_CHARS} allowed"
            ),
        }
    }
}

impl Error for CommentValidationError {}
