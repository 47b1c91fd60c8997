//! Reaction and comment repository.
//!
//! # Responsibility
//! - Persist one reaction per user and target, and comments on workouts.
//! - Aggregate reaction counts per type, per comment and per workout.
//!
//! # Invariants
//! - Setting a reaction twice replaces its type and keeps its `created_at`.
//! - Reaction and comment lists are `created_at ASC, rowid ASC`, so equal
//!   timestamps keep insertion order.

use crate::model::social::{
    Comment, CommentId, Reaction, ReactionCount, ReactionTarget, ReactionType, WorkoutEngagement,
    FIRST_REACTIONS_SHOWN,
};
use crate::model::user::UserId;
use crate::model::workout::WorkoutId;
use crate::repo::{ensure_connection_ready, parse_uuid, PageRequest, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;

const COMMENT_SELECT_SQL: &str = "SELECT
    id,
    workout_id,
    user_id,
    content,
    created_at
FROM workout_comments";

/// Repository interface for reactions and comments.
pub trait SocialRepository {
    /// Returns the owner of `workout_id`, or `None` when it does not exist.
    fn workout_owner(&self, workout_id: WorkoutId) -> RepoResult<Option<UserId>>;
    /// Inserts or replaces `user_id`'s reaction on `target`.
    fn set_reaction(
        &self,
        target: ReactionTarget,
        user_id: UserId,
        reaction_type: ReactionType,
    ) -> RepoResult<()>;
    /// Returns whether a reaction existed.
    fn remove_reaction(&self, target: ReactionTarget, user_id: UserId) -> RepoResult<bool>;
    fn list_reactions(&self, target: ReactionTarget, page: PageRequest)
        -> RepoResult<Vec<Reaction>>;
    /// Counts per reaction type, most used first; unused types are absent.
    fn reaction_counts(&self, target: ReactionTarget) -> RepoResult<Vec<ReactionCount>>;
    /// Stores `comment` and returns it with its storage timestamp.
    fn create_comment(&self, comment: &Comment) -> RepoResult<Comment>;
    fn get_comment(&self, id: CommentId) -> RepoResult<Option<Comment>>;
    fn list_comments(&self, workout_id: WorkoutId, page: PageRequest) -> RepoResult<Vec<Comment>>;
    /// Deletes a comment and its reactions.
    fn delete_comment(&self, id: CommentId) -> RepoResult<()>;
    /// Total reactions per comment; every requested id is present.
    fn comment_reaction_totals(
        &self,
        comment_ids: &[CommentId],
    ) -> RepoResult<HashMap<CommentId, u32>>;
}

/// SQLite-backed reaction and comment repository.
pub struct SqliteSocialRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSocialRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                "workouts",
                "workout_reactions",
                "workout_comments",
                "comment_reactions",
            ],
        )?;
        Ok(Self { conn })
    }
}

impl SocialRepository for SqliteSocialRepository<'_> {
    fn workout_owner(&self, workout_id: WorkoutId) -> RepoResult<Option<UserId>> {
        let owner: Option<String> = self
            .conn
            .query_row(
                "SELECT user_id FROM workouts WHERE id = ?1;",
                [workout_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        owner
            .map(|value| parse_uuid(&value, "workouts.user_id"))
            .transpose()
    }

    fn set_reaction(
        &self,
        target: ReactionTarget,
        user_id: UserId,
        reaction_type: ReactionType,
    ) -> RepoResult<()> {
        let (table, column) = reaction_table(target);
        self.conn.execute(
            &format!(
                "INSERT INTO {table} ({column}, user_id, reaction_type)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT ({column}, user_id)
                 DO UPDATE SET reaction_type = excluded.reaction_type;"
            ),
            params![
                target.id().to_string(),
                user_id.to_string(),
                reaction_type.as_str(),
            ],
        )?;
        Ok(())
    }

    fn remove_reaction(&self, target: ReactionTarget, user_id: UserId) -> RepoResult<bool> {
        let (table, column) = reaction_table(target);
        let changed = self.conn.execute(
            &format!("DELETE FROM {table} WHERE {column} = ?1 AND user_id = ?2;"),
            params![target.id().to_string(), user_id.to_string()],
        )?;
        Ok(changed > 0)
    }

    fn list_reactions(
        &self,
        target: ReactionTarget,
        page: PageRequest,
    ) -> RepoResult<Vec<Reaction>> {
        load_reactions(self.conn, target, page.limit(), page.offset())
    }

    fn reaction_counts(&self, target: ReactionTarget) -> RepoResult<Vec<ReactionCount>> {
        let (table, column) = reaction_table(target);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT reaction_type, COUNT(*) AS total
             FROM {table}
             WHERE {column} = ?1
             GROUP BY reaction_type
             ORDER BY total DESC, reaction_type ASC;"
        ))?;
        let mut rows = stmt.query([target.id().to_string()])?;
        let mut counts = Vec::new();
        while let Some(row) = rows.next()? {
            let type_text: String = row.get(0)?;
            counts.push(ReactionCount {
                reaction_type: parse_reaction_type(&type_text)?,
                count: row.get(1)?,
            });
        }
        Ok(counts)
    }

    fn create_comment(&self, comment: &Comment) -> RepoResult<Comment> {
        self.conn.execute(
            "INSERT INTO workout_comments (id, workout_id, user_id, content)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                comment.id.to_string(),
                comment.workout_id.to_string(),
                comment.user_id.to_string(),
                comment.content.as_str(),
            ],
        )?;
        self.get_comment(comment.id)?
            .ok_or(RepoError::NotFound(comment.id))
    }

    fn get_comment(&self, id: CommentId) -> RepoResult<Option<Comment>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COMMENT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_comment_row(row)?));
        }
        Ok(None)
    }

    fn list_comments(&self, workout_id: WorkoutId, page: PageRequest) -> RepoResult<Vec<Comment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMMENT_SELECT_SQL}
             WHERE workout_id = ?1
             ORDER BY created_at ASC, rowid ASC
             LIMIT ?2 OFFSET ?3;"
        ))?;
        let mut rows = stmt.query(params![
            workout_id.to_string(),
            page.limit(),
            page.offset()
        ])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_comment_row(row)?);
        }
        Ok(items)
    }

    fn delete_comment(&self, id: CommentId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM workout_comments WHERE id = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn comment_reaction_totals(
        &self,
        comment_ids: &[CommentId],
    ) -> RepoResult<HashMap<CommentId, u32>> {
        let mut stmt = self
            .conn
            .prepare("SELECT COUNT(*) FROM comment_reactions WHERE comment_id = ?1;")?;
        let mut totals = HashMap::with_capacity(comment_ids.len());
        for comment_id in comment_ids {
            let total: u32 = stmt.query_row([comment_id.to_string()], |row| row.get(0))?;
            totals.insert(*comment_id, total);
        }
        Ok(totals)
    }
}

/// Loads reaction and comment totals plus the earliest reactions of one
/// workout.
pub(crate) fn load_engagement(
    conn: &Connection,
    workout_id: WorkoutId,
) -> RepoResult<WorkoutEngagement> {
    let (reactions_count, comments_count): (u32, u32) = conn.query_row(
        "SELECT
            (SELECT COUNT(*) FROM workout_reactions WHERE workout_id = ?1),
            (SELECT COUNT(*) FROM workout_comments WHERE workout_id = ?1);",
        [workout_id.to_string()],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    let first_reactions = if reactions_count == 0 {
        Vec::new()
    } else {
        load_reactions(
            conn,
            ReactionTarget::Workout(workout_id),
            FIRST_REACTIONS_SHOWN as i64,
            0,
        )?
    };
    Ok(WorkoutEngagement {
        reactions_count,
        comments_count,
        first_reactions,
    })
}

fn load_reactions(
    conn: &Connection,
    target: ReactionTarget,
    limit: i64,
    offset: i64,
) -> RepoResult<Vec<Reaction>> {
    let (table, column) = reaction_table(target);
    let mut stmt = conn.prepare(&format!(
        "SELECT user_id, reaction_type, created_at
         FROM {table}
         WHERE {column} = ?1
         ORDER BY created_at ASC, rowid ASC
         LIMIT ?2 OFFSET ?3;"
    ))?;
    let mut rows = stmt.query(params![target.id().to_string(), limit, offset])?;
    let mut reactions = Vec::new();
    while let Some(row) = rows.next()? {
        let user_text: String = row.get(0)?;
        let type_text: String = row.get(1)?;
        reactions.push(Reaction {
            user_id: parse_uuid(&user_text, "reactions.user_id")?,
            reaction_type: parse_reaction_type(&type_text)?,
            created_at: row.get(2)?,
        });
    }
    Ok(reactions)
}

fn reaction_table(target: ReactionTarget) -> (&'static str, &'static str) {
    match target {
        ReactionTarget::Workout(_) => ("workout_reactions", "workout_id"),
        ReactionTarget::Comment(_) => ("comment_reactions", "comment_id"),
    }
}

fn parse_reaction_type(value: &str) -> RepoResult<ReactionType> {
    ReactionType::parse(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid reaction_type value: {value}")))
}

fn parse_comment_row(row: &Row<'_>) -> RepoResult<Comment> {
    let id_text: String = row.get("id")?;
    let workout_text: String = row.get("workout_id")?;
    let user_text: String = row.get("user_id")?;
    Ok(Comment {
        id: parse_uuid(&id_text, "workout_comments.id")?,
        workout_id: parse_uuid(&workout_text, "workout_comments.workout_id")?,
        user_id: parse_uuid(&user_text, "workout_comments.user_id")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
    })
}
