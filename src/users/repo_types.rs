use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    pub id: i64,                    // store-assigned, never reused
    pub email: String,              // unique, matched exactly
    pub username: Option<String>,   // optional display name
    pub password_hash: String,      // argon2 PHC string, not exposed in responses
    pub created_at: OffsetDateTime, // creation timestamp
}

/// Field-wise patch for `update`. `None` leaves a field untouched; for
/// `username`, `Some(None)` is an explicit clear.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub password: Option<String>,
    pub username: Option<Option<String>>,
}

/// Outcome of a credential check. Unknown email and wrong password are
/// deliberately the same variant, so callers cannot probe which emails exist.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    Authenticated(User),
    Unauthenticated,
}
