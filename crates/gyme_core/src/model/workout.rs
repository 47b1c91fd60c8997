//! Logged workout model.
//!
//! # Responsibility
//! - Define one logged session of an exercise and its ordered series.
//! - Derive summary statistics from series without storage access.
//!
//! # Invariants
//! - A workout has at least one series.
//! - Every series has `repetitions > 0` and a finite, non-negative weight.

use crate::model::exercise::ExerciseId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Upper bound for one workout's description.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Stable workout identifier.
pub type WorkoutId = Uuid;

/// One set: repetitions at a weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub repetitions: u32,
    pub weight_kg: f64,
}

impl Series {
    pub fn new(repetitions: u32, weight_kg: f64) -> Self {
        Self {
            repetitions,
            weight_kg,
        }
    }

    /// Kilograms moved in this series.
    pub fn volume_kg(&self) -> f64 {
        f64::from(self.repetitions) * self.weight_kg
    }
}

/// One logged session of an exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: WorkoutId,
    pub exercise_id: ExerciseId,
    /// Always the owner of `exercise_id`.
    pub user_id: UserId,
    /// Unix epoch milliseconds.
    pub performed_at: i64,
    pub description: Option<String>,
    pub series: Vec<Series>,
}

impl Workout {
    /// Creates a workout with a generated id.
    pub fn new(
        exercise_id: ExerciseId,
        user_id: UserId,
        performed_at: i64,
        series: Vec<Series>,
        description: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            exercise_id,
            user_id,
            performed_at,
            description,
            series,
        }
    }

    /// Validates series and description before persistence.
    pub fn validate(&self) -> Result<(), WorkoutValidationError> {
        validate_series(&self.series)?;
        if let Some(description) = &self.description {
            if description.chars().count() > MAX_DESCRIPTION_CHARS {
                return Err(WorkoutValidationError::DescriptionTooLong);
            }
        }
        Ok(())
    }

    pub fn summary(&self) -> WorkoutSummary {
        WorkoutSummary::from_series(&self.series)
    }
}

/// Checks the series invariants shared by create and update paths.
pub fn validate_series(series: &[Series]) -> Result<(), WorkoutValidationError> {
    if series.is_empty() {
        return Err(WorkoutValidationError::EmptySeries);
    }
    for (index, item) in series.iter().enumerate() {
        if item.repetitions == 0 {
            return Err(WorkoutValidationError::ZeroRepetitions { index });
        }
        if !item.weight_kg.is_finite() || item.weight_kg < 0.0 {
            return Err(WorkoutValidationError::InvalidWeight { index });
        }
    }
    Ok(())
}

/// Derived statistics for one workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSummary {
    pub number_of_series: usize,
    pub number_of_repetitions: u64,
    /// Sum of `repetitions * weight_kg` over all series.
    pub total_volume_kg: f64,
    pub average_repetitions_per_series: f64,
    pub average_weight_kg: f64,
    /// Heaviest series; more repetitions wins a weight tie.
    pub max_rep: Option<Series>,
}

impl WorkoutSummary {
    pub fn from_series(series: &[Series]) -> Self {
        let number_of_series = series.len();
        let number_of_repetitions = series
            .iter()
            .map(|item| u64::from(item.repetitions))
            .sum::<u64>();
        let total_volume_kg = series.iter().map(Series::volume_kg).sum::<f64>();
        let (average_repetitions_per_series, average_weight_kg) = if number_of_series == 0 {
            (0.0, 0.0)
        } else {
            let count = number_of_series as f64;
            (
                number_of_repetitions as f64 / count,
                series.iter().map(|item| item.weight_kg).sum::<f64>() / count,
            )
        };

        Self {
            number_of_series,
            number_of_repetitions,
            total_volume_kg,
            average_repetitions_per_series,
            average_weight_kg,
            max_rep: heaviest_series(series),
        }
    }
}

/// Picks the heaviest series, preferring more repetitions on equal weight.
pub fn heaviest_series(series: &[Series]) -> Option<Series> {
    series.iter().copied().reduce(|best, candidate| {
        let heavier = candidate.weight_kg > best.weight_kg;
        let same_weight_more_reps =
            candidate.weight_kg == best.weight_kg && candidate.repetitions > best.repetitions;
        if heavier || same_weight_more_reps {
            candidate
        } else {
            best
        }
    })
}

/// Workout validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkoutValidationError {
    EmptySeries,
    ZeroRepetitions { index: usize },
    InvalidWeight { index: usize },
    DescriptionTooLong,
}

impl Display for WorkoutValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySeries => write!(f, "workout must contain at least one series"),
            Self::ZeroRepetitions { index } => {
                write!(f, "series #{index} must have at least one repetition")
            }
            Self::InvalidWeight { index } => {
                write!(f, "series #{index} weight must be a non-negative number")
            }
            Self::DescriptionTooLong => write!(
                f,
                "description must not exceed {MAX_DESCRIPTION_CHARS} characters"
            ),
        }
    }
}

impl Error for WorkoutValidationError {}
