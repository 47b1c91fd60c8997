//! Ordered exercise use-case service.
//!
//! # Responsibility
//! - Create, move and remove exercises through the position ledger.
//! - Expose exercises with their heaviest logged series.
//!
//! # Invariants
//! - Every write is computed from a full, dense snapshot of the owner's list
//!   and committed together with all sibling shifts.
//! - Only the owner mutates an exercise; reads pass the visibility policy.

use crate::model::exercise::{Exercise, ExerciseId, ExerciseType};
use crate::model::user::UserId;
use crate::model::workout::Series;
use crate::repo::exercise_repo::ExerciseRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::PageRequest;
use crate::rules::position_ledger;
use crate::service::access::{ensure_owner, ensure_visible};
use crate::service::{with_conflict_retry, ServiceError};
use log::{error, info};

/// Exercise with its best logged series.
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseDetails {
    pub exercise: Exercise,
    /// Heaviest series across all workouts; `None` before the first log.
    pub max_rep: Option<Series>,
}

/// Ordered exercise service facade.
pub struct ExerciseService<E: ExerciseRepository, U: UserRepository> {
    exercises: E,
    users: U,
}

impl<E: ExerciseRepository, U: UserRepository> ExerciseService<E, U> {
    pub fn new(exercises: E, users: U) -> Self {
        Self { exercises, users }
    }

    /// Adds `exercise_type` to the owner's list at `position` (default `0`).
    pub fn create_exercise(
        &self,
        owner_id: UserId,
        exercise_type: ExerciseType,
        position: Option<i64>,
    ) -> Result<Exercise, ServiceError> {
        if self.users.get_user(owner_id, false)?.is_none() {
            return Err(ServiceError::UserNotFound(owner_id));
        }

        let mut exercise = Exercise::new(owner_id, exercise_type, position.unwrap_or(0));
        let desired = exercise.position;
        let shifted = with_conflict_retry("exercise_create", || {
            let siblings = self.load_dense_list(owner_id)?;
            if siblings
                .iter()
                .any(|sibling| sibling.exercise_type == exercise_type)
            {
                return Err(ServiceError::DuplicateExerciseType(exercise_type));
            }

            let placement = position_ledger::insert(desired, &siblings);
            exercise.position = placement.position;
            self.exercises
                .create_exercise(&exercise, &placement.shifts, siblings.len())?;
            Ok(placement.shifts.len())
        })?;

        info!(
            "event=exercise_create module=service status=ok exercise_id={} owner_id={owner_id} position={} shifted={shifted}",
            exercise.id, exercise.position
        );
        Ok(exercise)
    }

    /// Moves one exercise to `position`, clamped into the owner's list.
    pub fn update_exercise_position(
        &self,
        requester: UserId,
        exercise_id: ExerciseId,
        position: i64,
    ) -> Result<Exercise, ServiceError> {
        let (moved, shifted) = with_conflict_retry("exercise_move", || {
            let current = self.load_exercise(exercise_id)?;
            ensure_owner(requester, current.owner_id)?;
            let siblings = self.load_dense_list(current.owner_id)?;

            let placement = position_ledger::move_to(exercise_id, position, &siblings);
            let mut moved = current.clone();
            moved.position = placement.position;
            if moved.position == current.position && placement.shifts.is_empty() {
                return Ok((moved, 0));
            }
            self.exercises.move_exercise(
                &moved,
                current.position,
                &placement.shifts,
                siblings.len(),
            )?;
            Ok((moved, placement.shifts.len()))
        })?;

        info!(
            "event=exercise_move module=service status=ok exercise_id={exercise_id} position={} shifted={shifted}",
            moved.position
        );
        Ok(moved)
    }

    /// Deletes one exercise with its workouts and closes the gap.
    pub fn remove_exercise(
        &self,
        requester: UserId,
        exercise_id: ExerciseId,
    ) -> Result<(), ServiceError> {
        let shifted = with_conflict_retry("exercise_remove", || {
            let current = self.load_exercise(exercise_id)?;
            ensure_owner(requester, current.owner_id)?;
            let siblings = self.exercises.list_exercises(current.owner_id)?;
            if current.position < 0 || current.position >= siblings.len() as i64 {
                error!(
                    "event=exercise_remove module=service status=error error_code=position_out_of_range exercise_id={exercise_id} position={} len={}",
                    current.position,
                    siblings.len()
                );
                return Err(ServiceError::PositionOutOfRange {
                    exercise_id,
                    position: current.position,
                    len: siblings.len(),
                });
            }
            ensure_dense(current.owner_id, &siblings)?;

            let shifts = position_ledger::remove(current.position, &siblings);
            self.exercises
                .delete_exercise(&current, &shifts, siblings.len())?;
            Ok(shifts.len())
        })?;

        info!(
            "event=exercise_remove module=service status=ok exercise_id={exercise_id} shifted={shifted}"
        );
        Ok(())
    }

    pub fn get_exercise(
        &self,
        requester: UserId,
        exercise_id: ExerciseId,
    ) -> Result<ExerciseDetails, ServiceError> {
        let exercise = self.load_exercise(exercise_id)?;
        ensure_visible(&self.users, requester, exercise.owner_id)?;
        let max_rep = self
            .exercises
            .max_reps(&[exercise.id])?
            .remove(&exercise.id);
        Ok(ExerciseDetails { exercise, max_rep })
    }

    /// Lists one page of `owner_id`'s exercises in position order.
    pub fn list_exercises(
        &self,
        requester: UserId,
        owner_id: UserId,
        page: PageRequest,
    ) -> Result<Vec<ExerciseDetails>, ServiceError> {
        ensure_visible(&self.users, requester, owner_id)?;
        let items = self.exercises.list_exercises_page(owner_id, page)?;
        let ids = items.iter().map(|item| item.id).collect::<Vec<_>>();
        let mut max_reps = self.exercises.max_reps(&ids)?;
        Ok(items
            .into_iter()
            .map(|exercise| ExerciseDetails {
                max_rep: max_reps.remove(&exercise.id),
                exercise,
            })
            .collect())
    }

    fn load_exercise(&self, exercise_id: ExerciseId) -> Result<Exercise, ServiceError> {
        self.exercises
            .get_exercise(exercise_id)?
            .ok_or(ServiceError::ExerciseNotFound(exercise_id))
    }

    fn load_dense_list(&self, owner_id: UserId) -> Result<Vec<Exercise>, ServiceError> {
        let siblings = self.exercises.list_exercises(owner_id)?;
        ensure_dense(owner_id, &siblings)?;
        Ok(siblings)
    }
}

fn ensure_dense(owner_id: UserId, siblings: &[Exercise]) -> Result<(), ServiceError> {
    if position_ledger::is_dense(siblings) {
        return Ok(());
    }
    error!(
        "event=exercise_positions module=service status=error error_code=positions_corrupted owner_id={owner_id} len={}",
        siblings.len()
    );
    Err(ServiceError::PositionsCorrupted { owner_id })
}
