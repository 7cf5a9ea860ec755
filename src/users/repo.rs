use async_trait::async_trait;
use sqlx::PgPool;

use crate::users::error::UserError;
use crate::users::repo_types::User;
use crate::users::store::UserStore;

/// Postgres adapter. The `users.email` UNIQUE index is the authoritative
/// uniqueness check; a write-time violation of it becomes `DuplicateEmail`
/// regardless of what any earlier lookup saw.
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_write_err(e: sqlx::Error) -> UserError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.constraint() == Some("users_email_key") {
            return UserError::DuplicateEmail;
        }
    }
    UserError::Internal(e.into())
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(
        &self,
        email: &str,
        username: Option<&str>,
        password_hash: &str,
    ) -> Result<User, UserError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, username, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, username, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(map_write_err)?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| UserError::Internal(e.into()))?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| UserError::Internal(e.into()))?;
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, UserError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, created_at
            FROM users
            "#,
        )
        .fetch_all(&self.db)
        .await
        .map_err(|e| UserError::Internal(e.into()))?;
        Ok(users)
    }

    async fn update(&self, user: &User) -> Result<User, UserError> {
        // RETURNING + fetch_optional: a row deleted since the caller's read
        // shows up as a clean NotFound instead of a driver error.
        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = $2, username = $3, password_hash = $4
            WHERE id = $1
            RETURNING id, email, username, password_hash, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_optional(&self.db)
        .await
        .map_err(map_write_err)?;
        updated.ok_or(UserError::NotFound)
    }

    async fn delete(&self, id: i64) -> Result<(), UserError> {
        let result = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| UserError::Internal(e.into()))?;
        if result.rows_affected() == 0 {
            return Err(UserError::NotFound);
        }
        Ok(())
    }
}
