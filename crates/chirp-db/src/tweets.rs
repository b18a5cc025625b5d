use rusqlite::{OptionalExtension, params};

use crate::error::{StoreError, StoreResult, is_constraint_violation};
use crate::models::TweetRow;
use crate::{Database, timestamp_now};

/// Tweet content bounds, in characters.
pub const CONTENT_MAX_CHARS: usize = 140;

impl Database {
    // -- Tweets --

    /// Persists a tweet with a server-assigned timestamp. Content must be
    /// 1..=140 characters. Returns the stored `created_at`.
    pub fn insert_tweet(&self, id: &str, author_id: &str, content: &str) -> StoreResult<String> {
        let chars = content.chars().count();
        if chars == 0 || chars > CONTENT_MAX_CHARS {
            return Err(StoreError::ContentLength { chars });
        }

        let created_at = timestamp_now();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tweets (id, author_id, content, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![id, author_id, content, created_at],
            )?;
            Ok(())
        })?;

        Ok(created_at)
    }

    pub fn get_tweet(&self, tweet_id: &str) -> StoreResult<Option<TweetRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.id, t.author_id, u.username, t.content, t.created_at
                 FROM tweets t
                 JOIN users u ON t.author_id = u.id
                 WHERE t.id = ?1",
            )?;

            let row = stmt.query_row([tweet_id], map_tweet_row).optional()?;
            Ok(row)
        })
    }

    /// Author-only deletion. Existence is checked before ownership, so an
    /// unknown id reports not-found rather than leaking an authorization
    /// failure. Likes on the tweet go with it (cascade).
    pub fn delete_tweet(&self, tweet_id: &str, acting_user_id: &str) -> StoreResult<()> {
        self.with_conn(|conn| {
            let author: Option<String> = conn
                .query_row(
                    "SELECT author_id FROM tweets WHERE id = ?1",
                    [tweet_id],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(author_id) = author else {
                return Err(StoreError::TweetNotFound {
                    tweet_id: tweet_id.to_string(),
                });
            };
            if author_id != acting_user_id {
                return Err(StoreError::NotTweetAuthor {
                    tweet_id: tweet_id.to_string(),
                });
            }

            conn.execute("DELETE FROM tweets WHERE id = ?1", [tweet_id])?;
            Ok(())
        })
    }

    /// Reverse-chronological listing, ties broken by id so the order is
    /// total. Optionally filtered to one author (profile feed).
    pub fn list_tweets(&self, author_id: Option<&str>) -> StoreResult<Vec<TweetRow>> {
        self.with_conn(|conn| match author_id {
            Some(author_id) => {
                let mut stmt = conn.prepare(
                    "SELECT t.id, t.author_id, u.username, t.content, t.created_at
                     FROM tweets t
                     JOIN users u ON t.author_id = u.id
                     WHERE t.author_id = ?1
                     ORDER BY t.created_at DESC, t.id DESC",
                )?;
                let rows = stmt
                    .query_map([author_id], map_tweet_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT t.id, t.author_id, u.username, t.content, t.created_at
                     FROM tweets t
                     JOIN users u ON t.author_id = u.id
                     ORDER BY t.created_at DESC, t.id DESC",
                )?;
                let rows = stmt
                    .query_map([], map_tweet_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            }
        })
    }

    // -- Likes --

    /// Toggle a like: removes the edge if it exists, inserts it if not.
    /// Returns (liked, like count after the mutation).
    pub fn toggle_like(&self, id: &str, tweet_id: &str, user_id: &str) -> StoreResult<(bool, u64)> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let exists: Option<String> = tx
                .query_row("SELECT id FROM tweets WHERE id = ?1", [tweet_id], |row| {
                    row.get(0)
                })
                .optional()?;
            if exists.is_none() {
                return Err(StoreError::TweetNotFound {
                    tweet_id: tweet_id.to_string(),
                });
            }

            let existing: Option<String> = tx
                .query_row(
                    "SELECT id FROM likes WHERE tweet_id = ?1 AND user_id = ?2",
                    params![tweet_id, user_id],
                    |row| row.get(0),
                )
                .optional()?;

            let liked = match existing {
                Some(existing_id) => {
                    tx.execute("DELETE FROM likes WHERE id = ?1", [&existing_id])?;
                    false
                }
                None => {
                    let inserted = tx.execute(
                        "INSERT INTO likes (id, tweet_id, user_id, created_at)
                         VALUES (?1, ?2, ?3, ?4)",
                        params![id, tweet_id, user_id, timestamp_now()],
                    );
                    match inserted {
                        Err(e) if is_constraint_violation(&e) => {
                            return Err(StoreError::Conflict);
                        }
                        other => {
                            other?;
                        }
                    }
                    true
                }
            };

            let count: i64 = tx.query_row(
                "SELECT COUNT(*) FROM likes WHERE tweet_id = ?1",
                [tweet_id],
                |row| row.get(0),
            )?;

            tx.commit()?;
            Ok((liked, count as u64))
        })
    }

    /// Batch-fetch like counts for a set of tweet ids (one grouped query,
    /// not one query per tweet).
    pub fn like_counts_for_tweets(&self, tweet_ids: &[String]) -> StoreResult<Vec<(String, u64)>> {
        if tweet_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=tweet_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT tweet_id, COUNT(*) FROM likes WHERE tweet_id IN ({}) GROUP BY tweet_id",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = tweet_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// The acting user's full like set, fetched once per request so liked
    /// flags are a membership test rather than a per-tweet query.
    pub fn liked_tweet_ids(&self, user_id: &str) -> StoreResult<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT tweet_id FROM likes WHERE user_id = ?1")?;
            let rows = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn map_tweet_row(row: &rusqlite::Row<'_>) -> Result<TweetRow, rusqlite::Error> {
    Ok(TweetRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        author_username: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
    })
}
