//! Shared application state

use std::sync::Arc;

use sqlx::PgPool;

use crate::{auth::JwtManager, config::Config};

/// Application state shared across request handlers.
///
/// Everything here is constructed once at startup and passed in explicitly;
/// there is no process-global database handle. The JWT signing secret is
/// immutable after construction, so handlers and middleware share it without
/// locking.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: JwtManager,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        let jwt = JwtManager::new(&config.jwt_secret, config.jwt_expiry_hours);
        Self {
            pool,
            config: Arc::new(config),
            jwt,
        }
    }
}
