//! Exercise repository.
//!
//! # Responsibility
//! - Persist owner-scoped exercises and their positions.
//! - Commit a subject exercise together with its shifted siblings.
//!
//! # Invariants
//! - Listing is deterministic: `position ASC, id ASC`.
//! - Every write re-checks the owner's exercise count and each sibling's
//!   previous position inside the same `IMMEDIATE` transaction; any mismatch
//!   rolls the whole write back as `RepoError::Conflict`.

use crate::model::exercise::{Exercise, ExerciseId, ExerciseType};
use crate::model::user::UserId;
use crate::model::workout::Series;
use crate::repo::{
    conflict_on_constraint, ensure_connection_ready, parse_uuid, PageRequest, RepoError,
    RepoResult,
};
use crate::rules::position_ledger::PositionShift;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::HashMap;

const EXERCISE_SELECT_SQL: &str = "SELECT
    id,
    owner_id,
    exercise_type,
    position
FROM exercises";

/// Repository interface for ordered exercises.
pub trait ExerciseRepository {
    fn get_exercise(&self, id: ExerciseId) -> RepoResult<Option<Exercise>>;
    /// Full position-ordered list of one owner.
    fn list_exercises(&self, owner_id: UserId) -> RepoResult<Vec<Exercise>>;
    fn list_exercises_page(&self, owner_id: UserId, page: PageRequest)
        -> RepoResult<Vec<Exercise>>;
    /// Inserts `exercise` and applies sibling shifts.
    ///
    /// `expected_siblings` is the owner's exercise count the shifts were
    /// computed from, not counting the new exercise.
    fn create_exercise(
        &self,
        exercise: &Exercise,
        shifts: &[PositionShift],
        expected_siblings: usize,
    ) -> RepoResult<()>;
    /// Moves `exercise` from `previous_position` to `exercise.position`.
    fn move_exercise(
        &self,
        exercise: &Exercise,
        previous_position: i64,
        shifts: &[PositionShift],
        expected_siblings: usize,
    ) -> RepoResult<()>;
    /// Deletes `exercise` (and its workouts) and applies sibling shifts.
    fn delete_exercise(
        &self,
        exercise: &Exercise,
        shifts: &[PositionShift],
        expected_siblings: usize,
    ) -> RepoResult<()>;
    /// Heaviest logged series per exercise; exercises without logs are absent.
    fn max_reps(&self, exercise_ids: &[ExerciseId]) -> RepoResult<HashMap<ExerciseId, Series>>;
}

/// SQLite-backed exercise repository.
pub struct SqliteExerciseRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteExerciseRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["exercises", "workouts", "workout_series"])?;
        Ok(Self { conn })
    }
}

impl ExerciseRepository for SqliteExerciseRepository<'_> {
    fn get_exercise(&self, id: ExerciseId) -> RepoResult<Option<Exercise>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EXERCISE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_exercise_row(row)?));
        }
        Ok(None)
    }

    fn list_exercises(&self, owner_id: UserId) -> RepoResult<Vec<Exercise>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EXERCISE_SELECT_SQL}
             WHERE owner_id = ?1
             ORDER BY position ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([owner_id.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_exercise_row(row)?);
        }
        Ok(items)
    }

    fn list_exercises_page(
        &self,
        owner_id: UserId,
        page: PageRequest,
    ) -> RepoResult<Vec<Exercise>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EXERCISE_SELECT_SQL}
             WHERE owner_id = ?1
             ORDER BY position ASC, id ASC
             LIMIT ?2 OFFSET ?3;"
        ))?;
        let mut rows = stmt.query(params![owner_id.to_string(), page.limit(), page.offset()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_exercise_row(row)?);
        }
        Ok(items)
    }

    fn create_exercise(
        &self,
        exercise: &Exercise,
        shifts: &[PositionShift],
        expected_siblings: usize,
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_sibling_count(&tx, exercise.owner_id, expected_siblings)?;
        apply_position_shifts(&tx, exercise.owner_id, shifts)?;
        tx.execute(
            "INSERT INTO exercises (id, owner_id, exercise_type, position)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                exercise.id.to_string(),
                exercise.owner_id.to_string(),
                exercise.exercise_type.as_str(),
                exercise.position,
            ],
        )
        .map_err(|err| conflict_on_constraint(err, "exercise type already tracked by owner"))?;
        tx.commit()?;
        Ok(())
    }

    fn move_exercise(
        &self,
        exercise: &Exercise,
        previous_position: i64,
        shifts: &[PositionShift],
        expected_siblings: usize,
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_sibling_count(&tx, exercise.owner_id, expected_siblings)?;
        apply_position_shifts(&tx, exercise.owner_id, shifts)?;
        let changed = tx.execute(
            "UPDATE exercises
             SET position = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND owner_id = ?2
               AND position = ?4;",
            params![
                exercise.id.to_string(),
                exercise.owner_id.to_string(),
                exercise.position,
                previous_position,
            ],
        )?;
        if changed != 1 {
            return Err(RepoError::Conflict(format!(
                "exercise {} moved concurrently",
                exercise.id
            )));
        }
        tx.commit()?;
        Ok(())
    }

    fn delete_exercise(
        &self,
        exercise: &Exercise,
        shifts: &[PositionShift],
        expected_siblings: usize,
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_sibling_count(&tx, exercise.owner_id, expected_siblings)?;
        let changed = tx.execute(
            "DELETE FROM exercises
             WHERE id = ?1
               AND owner_id = ?2
               AND position = ?3;",
            params![
                exercise.id.to_string(),
                exercise.owner_id.to_string(),
                exercise.position,
            ],
        )?;
        if changed != 1 {
            return Err(RepoError::Conflict(format!(
                "exercise {} changed before delete",
                exercise.id
            )));
        }
        apply_position_shifts(&tx, exercise.owner_id, shifts)?;
        tx.commit()?;
        Ok(())
    }

    fn max_reps(&self, exercise_ids: &[ExerciseId]) -> RepoResult<HashMap<ExerciseId, Series>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.repetitions, s.weight_kg
             FROM workout_series s
             INNER JOIN workouts w ON w.id = s.workout_id
             WHERE w.exercise_id = ?1
             ORDER BY s.weight_kg DESC, s.repetitions DESC
             LIMIT 1;",
        )?;

        let mut result = HashMap::new();
        for exercise_id in exercise_ids {
            let best = stmt
                .query_row([exercise_id.to_string()], |row| {
                    Ok(Series::new(row.get(0)?, row.get(1)?))
                })
                .optional()?;
            if let Some(series) = best {
                result.insert(*exercise_id, series);
            }
        }
        Ok(result)
    }
}

fn ensure_sibling_count(conn: &Connection, owner_id: UserId, expected: usize) -> RepoResult<()> {
    let actual: i64 = conn.query_row(
        "SELECT COUNT(*) FROM exercises WHERE owner_id = ?1;",
        [owner_id.to_string()],
        |row| row.get(0),
    )?;
    if actual != expected as i64 {
        return Err(RepoError::Conflict(format!(
            "owner {owner_id} has {actual} exercises, expected {expected}"
        )));
    }
    Ok(())
}

fn apply_position_shifts(
    conn: &Connection,
    owner_id: UserId,
    shifts: &[PositionShift],
) -> RepoResult<()> {
    for shift in shifts {
        let changed = conn.execute(
            "UPDATE exercises
             SET position = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND owner_id = ?2
               AND position = ?4;",
            params![
                shift.exercise_id.to_string(),
                owner_id.to_string(),
                shift.to,
                shift.from,
            ],
        )?;
        if changed != 1 {
            return Err(RepoError::Conflict(format!(
                "exercise {} is no longer at position {}",
                shift.exercise_id, shift.from
            )));
        }
    }
    Ok(())
}

fn parse_exercise_row(row: &Row<'_>) -> RepoResult<Exercise> {
    let id_text: String = row.get("id")?;
    let owner_text: String = row.get("owner_id")?;
    let type_text: String = row.get("exercise_type")?;
    let exercise_type = ExerciseType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid exercise type `{type_text}` in exercises.exercise_type"
        ))
    })?;

    Ok(Exercise {
        id: parse_uuid(&id_text, "exercises.id")?,
        owner_id: parse_uuid(&owner_text, "exercises.owner_id")?,
        exercise_type,
        position: row.get("position")?,
    })
}
