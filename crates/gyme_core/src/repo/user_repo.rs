//! Account and friendship repository.
//!
//! # Responsibility
//! - Persist user accounts and directional friendship edges.
//! - Commit friendship deltas as mirrored pairs.
//!
//! # Invariants
//! - Edge lookups always filter by both `user_id` and `friend_id`.
//! - `commit_friendship` writes both edges or neither; each edge write is
//!   guarded by the status it was computed from.

use crate::model::friendship::{FriendStatus, UserFriendRelation};
use crate::model::user::{User, UserId};
use crate::repo::{
    bool_to_int, conflict_on_constraint, ensure_connection_ready, escape_like, parse_bool,
    parse_uuid, PageRequest, RepoError, RepoResult,
};
use crate::rules::friendship::{EdgePair, FriendshipChange};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const USER_SELECT_SQL: &str = "SELECT
    u.id AS id,
    u.user_name AS user_name,
    u.first_name AS first_name,
    u.last_name AS last_name,
    u.private_account AS private_account,
    u.valid AS valid
FROM users u";

/// User suggested through shared friends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonFriends {
    pub user: User,
    /// Friends shared with the requesting user.
    pub common_friends_count: u32,
}

/// Repository interface for accounts and friendship edges.
pub trait UserRepository {
    fn create_user(&self, user: &User) -> RepoResult<()>;
    /// Loads one account; `only_valid` hides accounts pending activation.
    fn get_user(&self, id: UserId, only_valid: bool) -> RepoResult<Option<User>>;
    fn set_private_account(&self, id: UserId, private_account: bool) -> RepoResult<()>;
    /// Case-insensitive search over `first_name || last_name` and `user_name`.
    fn find_users(&self, key: &str, page: PageRequest) -> RepoResult<Vec<User>>;
    /// Loads the `user_id -> friend_id` edge.
    fn get_relation(
        &self,
        user_id: UserId,
        friend_id: UserId,
    ) -> RepoResult<Option<UserFriendRelation>>;
    /// Lists users that `user_id` holds an edge with `status` toward.
    fn list_related_users(
        &self,
        user_id: UserId,
        status: FriendStatus,
        page: PageRequest,
    ) -> RepoResult<Vec<User>>;
    /// Lists friends-of-friends who are not yet friends, most shared first.
    fn common_friends(&self, user_id: UserId, page: PageRequest)
        -> RepoResult<Vec<CommonFriends>>;
    /// Applies one friendship delta atomically.
    fn commit_friendship(&self, change: &FriendshipChange) -> RepoResult<()>;
}

/// SQLite-backed account and friendship repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["users", "user_friends"])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO users (
                    id,
                    user_name,
                    first_name,
                    last_name,
                    private_account,
                    valid
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    user.id.to_string(),
                    user.user_name.as_str(),
                    user.first_name.as_str(),
                    user.last_name.as_str(),
                    bool_to_int(user.private_account),
                    bool_to_int(user.valid),
                ],
            )
            .map_err(|err| conflict_on_constraint(err, "user name already taken"))?;
        Ok(())
    }

    fn get_user(&self, id: UserId, only_valid: bool) -> RepoResult<Option<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL}
             WHERE u.id = ?1
               AND (?2 = 0 OR u.valid = 1);"
        ))?;
        let mut rows = stmt.query(params![id.to_string(), bool_to_int(only_valid)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn set_private_account(&self, id: UserId, private_account: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users
             SET private_account = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), bool_to_int(private_account)],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn find_users(&self, key: &str, page: PageRequest) -> RepoResult<Vec<User>> {
        let pattern = format!("%{}%", escape_like(&key.trim().to_lowercase()));
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL}
             WHERE u.valid = 1
               AND (
                 lower(u.first_name || u.last_name) LIKE ?1 ESCAPE '\\'
                 OR lower(u.user_name) LIKE ?1 ESCAPE '\\'
               )
             ORDER BY u.user_name ASC
             LIMIT ?2 OFFSET ?3;"
        ))?;
        let mut rows = stmt.query(params![pattern, page.limit(), page.offset()])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn get_relation(
        &self,
        user_id: UserId,
        friend_id: UserId,
    ) -> RepoResult<Option<UserFriendRelation>> {
        load_relation(self.conn, user_id, friend_id)
    }

    fn list_related_users(
        &self,
        user_id: UserId,
        status: FriendStatus,
        page: PageRequest,
    ) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL}
             INNER JOIN user_friends f ON f.friend_id = u.id
             WHERE f.user_id = ?1
               AND f.status = ?2
             ORDER BY f.updated_at DESC, u.id ASC
             LIMIT ?3 OFFSET ?4;"
        ))?;
        let mut rows = stmt.query(params![
            user_id.to_string(),
            status.as_str(),
            page.limit(),
            page.offset()
        ])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn common_friends(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> RepoResult<Vec<CommonFriends>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                u.id AS id,
                u.user_name AS user_name,
                u.first_name AS first_name,
                u.last_name AS last_name,
                u.private_account AS private_account,
                u.valid AS valid,
                COUNT(*) AS common_count
             FROM users u
             INNER JOIN user_friends theirs ON theirs.friend_id = u.id
             INNER JOIN user_friends mine ON mine.friend_id = theirs.user_id
             WHERE mine.user_id = ?1
               AND mine.status = 'friend'
               AND theirs.status = 'friend'
               AND u.id <> ?1
               AND u.valid = 1
               AND NOT EXISTS (
                 SELECT 1
                 FROM user_friends direct
                 WHERE direct.user_id = ?1
                   AND direct.friend_id = u.id
                   AND direct.status = 'friend'
               )
             GROUP BY u.id
             ORDER BY common_count DESC, u.id ASC
             LIMIT ?2 OFFSET ?3;",
        )?;
        let mut rows = stmt.query(params![user_id.to_string(), page.limit(), page.offset()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(CommonFriends {
                user: parse_user_row(row)?,
                common_friends_count: row.get("common_count")?,
            });
        }
        Ok(items)
    }

    fn commit_friendship(&self, change: &FriendshipChange) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        match change {
            FriendshipChange::Create(pair) => {
                for edge in [pair.forward, pair.inverse] {
                    insert_edge(&tx, &edge)?;
                }
            }
            FriendshipChange::Update { pair, previous } => {
                update_edge(&tx, &pair.forward, *previous)?;
                update_edge(&tx, &pair.inverse, previous.mirror())?;
            }
            FriendshipChange::Delete(pair) => delete_pair(&tx, pair)?,
        }
        tx.commit()?;
        Ok(())
    }
}

fn load_relation(
    conn: &Connection,
    user_id: UserId,
    friend_id: UserId,
) -> RepoResult<Option<UserFriendRelation>> {
    let status: Option<String> = conn
        .query_row(
            "SELECT status
             FROM user_friends
             WHERE user_id = ?1
               AND friend_id = ?2;",
            params![user_id.to_string(), friend_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;

    status
        .map(|value| {
            let status = FriendStatus::parse(&value).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid friend status `{value}` in user_friends.status"
                ))
            })?;
            Ok(UserFriendRelation::new(user_id, friend_id, status))
        })
        .transpose()
}

fn insert_edge(tx: &Transaction<'_>, edge: &UserFriendRelation) -> RepoResult<()> {
    tx.execute(
        "INSERT INTO user_friends (user_id, friend_id, status)
         VALUES (?1, ?2, ?3);",
        params![
            edge.user_id.to_string(),
            edge.friend_id.to_string(),
            edge.status.as_str(),
        ],
    )
    .map_err(|err| conflict_on_constraint(err, "friendship edge already exists"))?;
    Ok(())
}

fn update_edge(
    tx: &Transaction<'_>,
    edge: &UserFriendRelation,
    previous: FriendStatus,
) -> RepoResult<()> {
    let changed = tx.execute(
        "UPDATE user_friends
         SET status = ?3,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE user_id = ?1
           AND friend_id = ?2
           AND status = ?4;",
        params![
            edge.user_id.to_string(),
            edge.friend_id.to_string(),
            edge.status.as_str(),
            previous.as_str(),
        ],
    )?;
    if changed != 1 {
        return Err(RepoError::Conflict(format!(
            "friendship edge {} -> {} is no longer `{}`",
            edge.user_id,
            edge.friend_id,
            previous.as_str()
        )));
    }
    Ok(())
}

fn delete_pair(tx: &Transaction<'_>, pair: &EdgePair) -> RepoResult<()> {
    for edge in [pair.forward, pair.inverse] {
        let changed = tx.execute(
            "DELETE FROM user_friends
             WHERE user_id = ?1
               AND friend_id = ?2
               AND status = ?3;",
            params![
                edge.user_id.to_string(),
                edge.friend_id.to_string(),
                edge.status.as_str(),
            ],
        )?;
        if changed != 1 {
            return Err(RepoError::Conflict(format!(
                "friendship edge {} -> {} changed before delete",
                edge.user_id, edge.friend_id
            )));
        }
    }
    Ok(())
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id_text: String = row.get("id")?;
    Ok(User {
        id: parse_uuid(&id_text, "users.id")?,
        user_name: row.get("user_name")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        private_account: parse_bool(row.get("private_account")?, "users.private_account")?,
        valid: parse_bool(row.get("valid")?, "users.valid")?,
    })
}
