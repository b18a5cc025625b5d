use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{StoreError, StoreResult, is_constraint_violation};
use crate::models::{ProfileRow, UserRow};
use crate::{Database, timestamp_now};

impl Database {
    // -- Users --

    /// Creates the user row and its empty profile row as one transaction.
    /// A user never exists without a profile.
    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> StoreResult<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let inserted = tx.execute(
                "INSERT INTO users (id, username, email, password, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, username, email, password_hash, timestamp_now()],
            );
            match inserted {
                Err(e) if is_constraint_violation(&e) => {
                    return Err(StoreError::UsernameTaken {
                        username: username.to_string(),
                    });
                }
                other => {
                    other?;
                }
            }

            tx.execute("INSERT INTO profiles (user_id) VALUES (?1)", [id])?;

            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> StoreResult<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn get_user_by_id(&self, id: &str) -> StoreResult<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    // -- Profiles --

    pub fn get_profile(&self, user_id: &str) -> StoreResult<Option<ProfileRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT user_id, gender, self_intro FROM profiles WHERE user_id = ?1",
                    [user_id],
                    |row| {
                        Ok(ProfileRow {
                            user_id: row.get(0)?,
                            gender: row.get(1)?,
                            self_intro: row.get(2)?,
                        })
                    },
                )
                .optional()?;

            Ok(row)
        })
    }

    /// Owner check happens at the service layer; the store validates the
    /// self-introduction length bound.
    pub fn update_profile(
        &self,
        user_id: &str,
        gender: u8,
        self_intro: Option<&str>,
    ) -> StoreResult<()> {
        if let Some(intro) = self_intro {
            let chars = intro.chars().count();
            if chars > 252 {
                return Err(StoreError::SelfIntroLength { chars });
            }
        }

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO profiles (user_id, gender, self_intro) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET gender = ?2, self_intro = ?3",
                params![user_id, gender, self_intro],
            )?;
            Ok(())
        })
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> StoreResult<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, email, password, created_at FROM users WHERE username = ?1",
    )?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: &str) -> StoreResult<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, email, password, created_at FROM users WHERE id = ?1")?;

    let row = stmt
        .query_row([id], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}
