//! Exercise model.
//!
//! # Responsibility
//! - Define one owner-scoped exercise entry and its closed type catalogue.
//!
//! # Invariants
//! - (`owner_id`, `exercise_type`) is unique.
//! - Positions of one owner always form the dense sequence `0..n`.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable exercise identifier.
pub type ExerciseId = Uuid;

/// Exercise catalogue. One owner can track each type at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    BenchPress,
    Squat,
    Deadlift,
    OverheadPress,
    BarbellRow,
    PullUp,
    Dip,
    BicepsCurl,
    LegPress,
    HipThrust,
}

impl ExerciseType {
    /// All catalogue entries in declaration order.
    pub const ALL: [ExerciseType; 10] = [
        Self::BenchPress,
        Self::Squat,
        Self::Deadlift,
        Self::OverheadPress,
        Self::BarbellRow,
        Self::PullUp,
        Self::Dip,
        Self::BicepsCurl,
        Self::LegPress,
        Self::HipThrust,
    ];

    /// Stable storage string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BenchPress => "bench_press",
            Self::Squat => "squat",
            Self::Deadlift => "deadlift",
            Self::OverheadPress => "overhead_press",
            Self::BarbellRow => "barbell_row",
            Self::PullUp => "pull_up",
            Self::Dip => "dip",
            Self::BicepsCurl => "biceps_curl",
            Self::LegPress => "leg_press",
            Self::HipThrust => "hip_thrust",
        }
    }

    /// Parses the storage string produced by [`ExerciseType::as_str`].
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == value)
    }
}

/// One exercise tracked by its owner, ranked by `position`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: ExerciseId,
    pub owner_id: UserId,
    pub exercise_type: ExerciseType,
    /// Zero-based dense rank within the owner's list.
    pub position: i64,
}

impl Exercise {
    /// Creates an exercise with a generated id.
    ///
    /// `position` is the requested rank; the ledger decides the final one.
    pub fn new(owner_id: UserId, exercise_type: ExerciseType, position: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            exercise_type,
            position,
        }
    }
}
