use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::database::{self, DatabaseError};

/// Application context handed to every handler through axum state.
/// Constructed once at startup; no ambient globals.
#[derive(Clone)]
pub struct AppContext {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
}

impl AppContext {
    pub async fn initialize(config: AppConfig) -> Result<Self, DatabaseError> {
        let pool = database::connect(&config).await?;
        Ok(Self {
            pool,
            config: Arc::new(config),
        })
    }

    pub fn new(pool: PgPool, config: AppConfig) -> Self {
        Self {
            pool,
            config: Arc::new(config),
        }
    }
}
