//! Logged workout repository.
//!
//! # Responsibility
//! - Persist workouts with their ordered series.
//! - Resolve exercise ownership for workout writes.
//! - Attach reaction and comment totals to loaded workouts.
//!
//! # Invariants
//! - A workout row and its series are always written in one transaction.
//! - Series are returned in `ordinal ASC` order.
//! - Lists are sorted by `performed_at DESC, id ASC`.

use crate::model::exercise::ExerciseId;
use crate::model::social::WorkoutEngagement;
use crate::model::user::UserId;
use crate::model::workout::{Series, Workout, WorkoutId};
use crate::repo::social_repo::load_engagement;
use crate::repo::{ensure_connection_ready, parse_uuid, PageRequest, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::HashMap;

const WORKOUT_SELECT_SQL: &str = "SELECT
    id,
    exercise_id,
    user_id,
    performed_at,
    description
FROM workouts";

/// Repository interface for logged workouts.
pub trait WorkoutRepository {
    /// Returns the owner of `exercise_id`, or `None` when it does not exist.
    fn exercise_owner(&self, exercise_id: ExerciseId) -> RepoResult<Option<UserId>>;
    fn create_workout(&self, workout: &Workout) -> RepoResult<()>;
    /// Replaces description and series of an existing workout.
    fn update_workout(&self, workout: &Workout) -> RepoResult<()>;
    fn get_workout(&self, id: WorkoutId) -> RepoResult<Option<Workout>>;
    /// Lists one user's workouts, optionally narrowed to one exercise.
    fn list_workouts(
        &self,
        user_id: UserId,
        exercise_id: Option<ExerciseId>,
        page: PageRequest,
    ) -> RepoResult<Vec<Workout>>;
    /// Deletes a workout with its series, reactions and comments.
    fn delete_workout(&self, id: WorkoutId) -> RepoResult<()>;
    /// Reaction and comment totals per workout; every requested id is present.
    fn engagement(
        &self,
        workout_ids: &[WorkoutId],
    ) -> RepoResult<HashMap<WorkoutId, WorkoutEngagement>>;
}

/// SQLite-backed workout repository.
pub struct SqliteWorkoutRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteWorkoutRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                "exercises",
                "workouts",
                "workout_series",
                "workout_reactions",
                "workout_comments",
            ],
        )?;
        Ok(Self { conn })
    }
}

impl WorkoutRepository for SqliteWorkoutRepository<'_> {
    fn exercise_owner(&self, exercise_id: ExerciseId) -> RepoResult<Option<UserId>> {
        let owner: Option<String> = self
            .conn
            .query_row(
                "SELECT owner_id FROM exercises WHERE id = ?1;",
                [exercise_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        owner
            .map(|value| parse_uuid(&value, "exercises.owner_id"))
            .transpose()
    }

    fn create_workout(&self, workout: &Workout) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO workouts (id, exercise_id, user_id, performed_at, description)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                workout.id.to_string(),
                workout.exercise_id.to_string(),
                workout.user_id.to_string(),
                workout.performed_at,
                workout.description.as_deref(),
            ],
        )?;
        insert_series(&tx, workout.id, &workout.series)?;
        tx.commit()?;
        Ok(())
    }

    fn update_workout(&self, workout: &Workout) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE workouts
             SET description = ?2,
                 performed_at = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                workout.id.to_string(),
                workout.description.as_deref(),
                workout.performed_at,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(workout.id));
        }
        tx.execute(
            "DELETE FROM workout_series WHERE workout_id = ?1;",
            [workout.id.to_string()],
        )?;
        insert_series(&tx, workout.id, &workout.series)?;
        tx.commit()?;
        Ok(())
    }

    fn get_workout(&self, id: WorkoutId) -> RepoResult<Option<Workout>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{WORKOUT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let mut workout = parse_workout_row(row)?;
            workout.series = load_series(self.conn, workout.id)?;
            return Ok(Some(workout));
        }
        Ok(None)
    }

    fn list_workouts(
        &self,
        user_id: UserId,
        exercise_id: Option<ExerciseId>,
        page: PageRequest,
    ) -> RepoResult<Vec<Workout>> {
        let mut stmt = self.conn.prepare(&format!(
            "{WORKOUT_SELECT_SQL}
             WHERE user_id = ?1
               AND (?2 IS NULL OR exercise_id = ?2)
             ORDER BY performed_at DESC, id ASC
             LIMIT ?3 OFFSET ?4;"
        ))?;
        let mut rows = stmt.query(params![
            user_id.to_string(),
            exercise_id.map(|id| id.to_string()),
            page.limit(),
            page.offset()
        ])?;

        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_workout_row(row)?);
        }
        for workout in &mut items {
            workout.series = load_series(self.conn, workout.id)?;
        }
        Ok(items)
    }

    fn delete_workout(&self, id: WorkoutId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM workouts WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn engagement(
        &self,
        workout_ids: &[WorkoutId],
    ) -> RepoResult<HashMap<WorkoutId, WorkoutEngagement>> {
        let mut result = HashMap::with_capacity(workout_ids.len());
        for workout_id in workout_ids {
            result.insert(*workout_id, load_engagement(self.conn, *workout_id)?);
        }
        Ok(result)
    }
}

fn insert_series(tx: &Transaction<'_>, workout_id: WorkoutId, series: &[Series]) -> RepoResult<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO workout_series (workout_id, ordinal, repetitions, weight_kg)
         VALUES (?1, ?2, ?3, ?4);",
    )?;
    for (ordinal, item) in series.iter().enumerate() {
        stmt.execute(params![
            workout_id.to_string(),
            ordinal as i64,
            item.repetitions,
            item.weight_kg,
        ])?;
    }
    Ok(())
}

fn load_series(conn: &Connection, workout_id: WorkoutId) -> RepoResult<Vec<Series>> {
    let mut stmt = conn.prepare(
        "SELECT repetitions, weight_kg
         FROM workout_series
         WHERE workout_id = ?1
         ORDER BY ordinal ASC;",
    )?;
    let mut rows = stmt.query([workout_id.to_string()])?;
    let mut series = Vec::new();
    while let Some(row) = rows.next()? {
        series.push(Series::new(row.get(0)?, row.get(1)?));
    }
    Ok(series)
}

fn parse_workout_row(row: &Row<'_>) -> RepoResult<Workout> {
    let id_text: String = row.get("id")?;
    let exercise_text: String = row.get("exercise_id")?;
    let user_text: String = row.get("user_id")?;
    Ok(Workout {
        id: parse_uuid(&id_text, "workouts.id")?,
        exercise_id: parse_uuid(&exercise_text, "workouts.exercise_id")?,
        user_id: parse_uuid(&user_text, "workouts.user_id")?,
        performed_at: row.get("performed_at")?,
        description: row.get("description")?,
        series: Vec::new(),
    })
}
