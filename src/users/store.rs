use async_trait::async_trait;

use crate::users::error::UserError;
use crate::users::repo_types::User;

/// Port over the persistent record store. The Postgres adapter backs
/// production; the in-memory adapter backs the service tests. Both enforce
/// the same contract: `insert` and `update` fail `DuplicateEmail` when the
/// written email belongs to another row, and `update`/`delete` fail
/// `NotFound` when the target row is gone.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(
        &self,
        email: &str,
        username: Option<&str>,
        password_hash: &str,
    ) -> Result<User, UserError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError>;

    async fn list(&self) -> Result<Vec<User>, UserError>;

    /// Wholesale row update keyed by `user.id`.
    async fn update(&self, user: &User) -> Result<User, UserError>;

    async fn delete(&self, id: i64) -> Result<(), UserError>;
}
