//! Typed store errors.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user not found: {username}")]
    UserNotFound { username: String },

    #[error("tweet not found: {tweet_id}")]
    TweetNotFound { tweet_id: String },

    #[error("username already registered: {username}")]
    UsernameTaken { username: String },

    /// Tweet content outside the 1..=140 character range.
    #[error("tweet content length out of range: {chars} characters")]
    ContentLength { chars: usize },

    /// Self-introduction longer than 252 characters.
    #[error("self introduction too long: {chars} characters")]
    SelfIntroLength { chars: usize },

    #[error("you cannot follow yourself")]
    SelfFollow,

    #[error("already following {username}")]
    AlreadyFollowing { username: String },

    #[error("not following {username}")]
    NotFollowing { username: String },

    /// Acting user is not the author of the tweet.
    #[error("tweet {tweet_id} belongs to another user")]
    NotTweetAuthor { tweet_id: String },

    /// A unique constraint fired under a concurrent identical request.
    #[error("conflicting concurrent update")]
    Conflict,

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Db(#[from] rusqlite::Error),
}

/// True when the underlying SQLite error is a UNIQUE/CHECK constraint
/// violation. Used to map a racing duplicate insert to a typed rejection
/// instead of a generic database error.
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
