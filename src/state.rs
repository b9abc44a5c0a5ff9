use crate::auth::repo::UserStore;
use crate::config::AppConfig;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: UserStore,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = UserStore::connect(&config.database_url, config.max_connections).await?;
        store.init().await?;

        Ok(Self::from_parts(store, config))
    }

    pub fn from_parts(store: UserStore, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    /// State backed by a fresh in-memory database, schema applied.
    #[cfg(test)]
    pub async fn in_memory() -> Self {
        let store = UserStore::in_memory().await;
        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            max_connections: 1,
            host: "127.0.0.1".into(),
            port: 0,
        });
        Self::from_parts(store, config)
    }
}
