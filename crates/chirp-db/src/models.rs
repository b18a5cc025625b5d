/// Database row types — these map directly to SQLite rows.
/// Distinct from the chirp-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

pub struct ProfileRow {
    pub user_id: String,
    pub gender: i64,
    pub self_intro: Option<String>,
}

pub struct TweetRow {
    pub id: String,
    pub author_id: String,
    pub author_username: String,
    pub content: String,
    pub created_at: String,
}

/// A user reached through a follow edge (follower or followee side),
/// in edge insertion order.
pub struct FollowUserRow {
    pub id: String,
    pub username: String,
    pub created_at: String,
}
