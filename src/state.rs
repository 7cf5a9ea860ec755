use std::sync::Arc;

use anyhow::Context;

use crate::config::AppConfig;
use crate::users::repo::PgUserStore;
use crate::users::services::UsersService;
use crate::users::store::UserStore;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UsersService>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await?;

        // The unique index on users.email is what makes concurrent
        // registrations safe, so a failed migration aborts startup.
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("running migrations")?;

        let store = Arc::new(PgUserStore::new(db)) as Arc<dyn UserStore>;
        let users = Arc::new(UsersService::new(store));

        Ok(Self { users })
    }
}
