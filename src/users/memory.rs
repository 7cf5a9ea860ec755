use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::users::error::UserError;
use crate::users::repo_types::User;
use crate::users::store::UserStore;

/// In-memory adapter used by the service tests. One mutex guards both the id
/// counter and the rows, so every check-then-write here is atomic and the
/// adapter honors the same conflict contract as the Postgres one.
pub struct InMemoryUserStore {
    inner: Mutex<Inner>,
}

struct Inner {
    next_id: i64,
    rows: BTreeMap<i64, User>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                rows: BTreeMap::new(),
            }),
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(
        &self,
        email: &str,
        username: Option<&str>,
        password_hash: &str,
    ) -> Result<User, UserError> {
        let mut inner = self.inner.lock().expect("user store lock poisoned");
        if inner.rows.values().any(|u| u.email == email) {
            return Err(UserError::DuplicateEmail);
        }
        let id = inner.next_id;
        inner.next_id += 1; // ids are never reused, even after delete
        let user = User {
            id,
            email: email.to_string(),
            username: username.map(str::to_string),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        inner.rows.insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserError> {
        let inner = self.inner.lock().expect("user store lock poisoned");
        Ok(inner.rows.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        let inner = self.inner.lock().expect("user store lock poisoned");
        Ok(inner.rows.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, UserError> {
        let inner = self.inner.lock().expect("user store lock poisoned");
        Ok(inner.rows.values().cloned().collect())
    }

    async fn update(&self, user: &User) -> Result<User, UserError> {
        let mut inner = self.inner.lock().expect("user store lock poisoned");
        if inner
            .rows
            .values()
            .any(|u| u.email == user.email && u.id != user.id)
        {
            return Err(UserError::DuplicateEmail);
        }
        let row = inner.rows.get_mut(&user.id).ok_or(UserError::NotFound)?;
        *row = user.clone();
        Ok(row.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), UserError> {
        let mut inner = self.inner.lock().expect("user store lock poisoned");
        inner.rows.remove(&id).map(|_| ()).ok_or(UserError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_rejects_taken_email() {
        let store = InMemoryUserStore::new();
        store
            .insert("a@x.com", None, "hash")
            .await
            .expect("first insert");
        let err = store.insert("a@x.com", Some("bob"), "hash2").await.unwrap_err();
        assert!(matches!(err, UserError::DuplicateEmail));
    }

    #[tokio::test]
    async fn update_rejects_email_of_other_row_but_allows_own() {
        let store = InMemoryUserStore::new();
        let a = store.insert("a@x.com", None, "ha").await.expect("insert a");
        let mut b = store.insert("b@x.com", None, "hb").await.expect("insert b");

        b.email = "a@x.com".into();
        let err = store.update(&b).await.unwrap_err();
        assert!(matches!(err, UserError::DuplicateEmail));

        // rewriting a row with its own email is not a conflict
        let same = store.update(&a).await.expect("self update");
        assert_eq!(same.email, "a@x.com");
    }

    #[tokio::test]
    async fn update_and_delete_miss_on_unknown_id() {
        let store = InMemoryUserStore::new();
        let mut ghost = store.insert("a@x.com", None, "h").await.expect("insert");
        store.delete(ghost.id).await.expect("delete");

        ghost.username = Some("late".into());
        assert!(matches!(
            store.update(&ghost).await.unwrap_err(),
            UserError::NotFound
        ));
        assert!(matches!(
            store.delete(ghost.id).await.unwrap_err(),
            UserError::NotFound
        ));
    }
}
