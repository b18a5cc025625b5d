use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{StoreError, StoreResult, is_constraint_violation};
use crate::models::FollowUserRow;
use crate::{Database, timestamp_now};

impl Database {
    // -- Follow edges --

    /// Creates a follower -> followee edge, resolving the followee by
    /// username. Checks run in fixed precedence: unknown user first, then
    /// self-follow, then an existing edge. A racing duplicate insert trips
    /// the UNIQUE(follower_id, followee_id) index and is reported the same
    /// way as an existing edge, never as two edges.
    pub fn follow(
        &self,
        id: &str,
        follower_id: &str,
        followee_username: &str,
    ) -> StoreResult<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let followee_id = resolve_username(&tx, followee_username)?;
            if followee_id == follower_id {
                return Err(StoreError::SelfFollow);
            }

            let existing: Option<String> = tx
                .query_row(
                    "SELECT id FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
                    params![follower_id, followee_id],
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                return Err(StoreError::AlreadyFollowing {
                    username: followee_username.to_string(),
                });
            }

            let inserted = tx.execute(
                "INSERT INTO follows (id, follower_id, followee_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, follower_id, followee_id, timestamp_now()],
            );
            match inserted {
                Err(e) if is_constraint_violation(&e) => {
                    return Err(StoreError::AlreadyFollowing {
                        username: followee_username.to_string(),
                    });
                }
                other => {
                    other?;
                }
            }

            tx.commit()?;
            Ok(())
        })
    }

    /// Deletes the follower -> followee edge. Same resolution and self
    /// check as `follow`; a missing edge reports not-following.
    pub fn unfollow(&self, follower_id: &str, followee_username: &str) -> StoreResult<()> {
        self.with_conn(|conn| {
            let followee_id = resolve_username(conn, followee_username)?;
            if followee_id == follower_id {
                return Err(StoreError::SelfFollow);
            }

            let deleted = conn.execute(
                "DELETE FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
                params![follower_id, followee_id],
            )?;
            if deleted == 0 {
                return Err(StoreError::NotFollowing {
                    username: followee_username.to_string(),
                });
            }

            Ok(())
        })
    }

    pub fn is_following(&self, follower_id: &str, followee_id: &str) -> StoreResult<bool> {
        self.with_conn(|conn| {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
                    params![follower_id, followee_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(existing.is_some())
        })
    }

    // -- Counts --

    pub fn count_following(&self, user_id: &str) -> StoreResult<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM follows WHERE follower_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
    }

    pub fn count_followers(&self, user_id: &str) -> StoreResult<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM follows WHERE followee_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
    }

    // -- Listings --

    /// Users this user follows, in edge insertion order (stable).
    pub fn list_following(&self, user_id: &str) -> StoreResult<Vec<FollowUserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.username, u.created_at
                 FROM follows f
                 JOIN users u ON f.followee_id = u.id
                 WHERE f.follower_id = ?1
                 ORDER BY f.created_at ASC, f.id ASC",
            )?;
            let rows = stmt
                .query_map([user_id], map_follow_user_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Users following this user, in edge insertion order (stable).
    pub fn list_followers(&self, user_id: &str) -> StoreResult<Vec<FollowUserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.username, u.created_at
                 FROM follows f
                 JOIN users u ON f.follower_id = u.id
                 WHERE f.followee_id = ?1
                 ORDER BY f.created_at ASC, f.id ASC",
            )?;
            let rows = stmt
                .query_map([user_id], map_follow_user_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn resolve_username(conn: &Connection, username: &str) -> Result<String, StoreError> {
    let id: Option<String> = conn
        .query_row("SELECT id FROM users WHERE username = ?1", [username], |row| {
            row.get(0)
        })
        .optional()?;

    id.ok_or_else(|| StoreError::UserNotFound {
        username: username.to_string(),
    })
}

fn map_follow_user_row(row: &rusqlite::Row<'_>) -> Result<FollowUserRow, rusqlite::Error> {
    Ok(FollowUserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        created_at: row.get(2)?,
    })
}
