use crate::config::{AppConfig, StorageBackend};
use crate::db;
use crate::gateway::{Gateway, MemoryGateway, PgGateway};
use crate::users::{User, UserService, UserStore};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: UserService,
    db: Option<PgPool>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let (db, gateway) = match config.storage {
            StorageBackend::Postgres => {
                let db = db::connect(&config).await?;
                let gateway = Arc::new(PgGateway::<User>::new(db.clone())) as Arc<dyn Gateway<User>>;
                (Some(db), gateway)
            }
            StorageBackend::Memory => {
                tracing::warn!("using in-memory storage; users are lost on restart");
                let gateway = Arc::new(MemoryGateway::<User>::new()) as Arc<dyn Gateway<User>>;
                (None, gateway)
            }
        };

        Ok(Self::from_parts(config, gateway, db))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        gateway: Arc<dyn Gateway<User>>,
        db: Option<PgPool>,
    ) -> Self {
        Self {
            config,
            users: UserService::new(UserStore::new(gateway)),
            db,
        }
    }

    /// Closes the connection pool, if any. Call once the server has stopped.
    pub async fn shutdown(&self) {
        if let Some(db) = &self.db {
            db.close().await;
            tracing::info!("database pool closed");
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::from_parts(
            Arc::new(AppConfig::memory()),
            Arc::new(MemoryGateway::<User>::new()),
            None,
        )
    }
}
