//! Logged workout use-case service.
//!
//! # Responsibility
//! - Log, replace and delete series for the owner's exercises.
//! - Expose workouts with derived summaries and reaction/comment totals
//!   behind the visibility policy.
//!
//! # Invariants
//! - `workout.user_id` always equals the owner of `workout.exercise_id`.
//! - Series are validated before every write.

use crate::model::exercise::ExerciseId;
use crate::model::social::WorkoutEngagement;
use crate::model::user::UserId;
use crate::model::workout::{Series, Workout, WorkoutId, WorkoutSummary};
use crate::repo::user_repo::UserRepository;
use crate::repo::workout_repo::WorkoutRepository;
use crate::repo::{PageRequest, RepoError};
use crate::service::access::{ensure_owner, ensure_visible};
use crate::service::ServiceError;
use log::info;

/// Workout with statistics derived from its series.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutDetails {
    pub workout: Workout,
    pub summary: WorkoutSummary,
    pub engagement: WorkoutEngagement,
}

impl WorkoutDetails {
    pub fn new(workout: Workout, engagement: WorkoutEngagement) -> Self {
        let summary = workout.summary();
        Self {
            workout,
            summary,
            engagement,
        }
    }
}

/// Details of a workout nobody has reacted to or commented on yet.
impl From<Workout> for WorkoutDetails {
    fn from(workout: Workout) -> Self {
        Self::new(workout, WorkoutEngagement::default())
    }
}

/// Workout service facade.
pub struct WorkoutService<W: WorkoutRepository, U: UserRepository> {
    workouts: W,
    users: U,
}

impl<W: WorkoutRepository, U: UserRepository> WorkoutService<W, U> {
    pub fn new(workouts: W, users: U) -> Self {
        Self { workouts, users }
    }

    /// Logs one session of `exercise_id` for its owner.
    pub fn log_workout(
        &self,
        requester: UserId,
        exercise_id: ExerciseId,
        performed_at: i64,
        series: Vec<Series>,
        description: Option<String>,
    ) -> Result<WorkoutDetails, ServiceError> {
        let owner_id = self
            .workouts
            .exercise_owner(exercise_id)?
            .ok_or(ServiceError::ExerciseNotFound(exercise_id))?;
        ensure_owner(requester, owner_id)?;

        let workout = Workout::new(
            exercise_id,
            owner_id,
            performed_at,
            series,
            normalize_description(description),
        );
        workout.validate()?;
        self.workouts.create_workout(&workout)?;

        info!(
            "event=workout_log module=service status=ok workout_id={} exercise_id={exercise_id} series={}",
            workout.id,
            workout.series.len()
        );
        Ok(workout.into())
    }

    /// Replaces series and description of an existing workout.
    pub fn update_workout(
        &self,
        requester: UserId,
        workout_id: WorkoutId,
        series: Vec<Series>,
        description: Option<String>,
    ) -> Result<WorkoutDetails, ServiceError> {
        let mut workout = self.load_workout(workout_id)?;
        ensure_owner(requester, workout.user_id)?;

        workout.series = series;
        workout.description = normalize_description(description);
        workout.validate()?;
        self.workouts
            .update_workout(&workout)
            .map_err(|err| not_found_as_workout(err, workout_id))?;

        info!(
            "event=workout_update module=service status=ok workout_id={workout_id} series={}",
            workout.series.len()
        );
        self.with_engagement(workout)
    }

    pub fn remove_workout(
        &self,
        requester: UserId,
        workout_id: WorkoutId,
    ) -> Result<(), ServiceError> {
        let workout = self.load_workout(workout_id)?;
        ensure_owner(requester, workout.user_id)?;
        self.workouts
            .delete_workout(workout_id)
            .map_err(|err| not_found_as_workout(err, workout_id))?;
        info!("event=workout_remove module=service status=ok workout_id={workout_id}");
        Ok(())
    }

    pub fn get_workout(
        &self,
        requester: UserId,
        workout_id: WorkoutId,
    ) -> Result<WorkoutDetails, ServiceError> {
        let workout = self.load_workout(workout_id)?;
        ensure_visible(&self.users, requester, workout.user_id)?;
        self.with_engagement(workout)
    }

    /// Lists `owner_id`'s workouts newest first.
    pub fn list_workouts(
        &self,
        requester: UserId,
        owner_id: UserId,
        exercise_id: Option<ExerciseId>,
        page: PageRequest,
    ) -> Result<Vec<WorkoutDetails>, ServiceError> {
        ensure_visible(&self.users, requester, owner_id)?;
        let workouts = self.workouts.list_workouts(owner_id, exercise_id, page)?;
        let ids = workouts.iter().map(|workout| workout.id).collect::<Vec<_>>();
        let mut engagement = self.workouts.engagement(&ids)?;
        Ok(workouts
            .into_iter()
            .map(|workout| {
                let totals = engagement.remove(&workout.id).unwrap_or_default();
                WorkoutDetails::new(workout, totals)
            })
            .collect())
    }

    fn with_engagement(&self, workout: Workout) -> Result<WorkoutDetails, ServiceError> {
        let engagement = self
            .workouts
            .engagement(&[workout.id])?
            .remove(&workout.id)
            .unwrap_or_default();
        Ok(WorkoutDetails::new(workout, engagement))
    }

    fn load_workout(&self, workout_id: WorkoutId) -> Result<Workout, ServiceError> {
        self.workouts
            .get_workout(workout_id)?
            .ok_or(ServiceError::WorkoutNotFound(workout_id))
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn not_found_as_workout(err: RepoError, workout_id: WorkoutId) -> ServiceError {
    match err {
        RepoError::NotFound(_) => ServiceError::WorkoutNotFound(workout_id),
        other => other.into(),
    }
}
