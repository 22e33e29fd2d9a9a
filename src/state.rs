use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::auth::{
    jwt::TokenService, password::BcryptHasher, repo::PgUserStore, services::ProfileService,
};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub profiles: ProfileService,
    pub tokens: Arc<TokenService>,
}

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let db = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    Ok(db)
}

impl AppState {
    pub fn init(config: &AppConfig, db: PgPool) -> anyhow::Result<Self> {
        let tokens = Arc::new(TokenService::from_files(
            &config.token.private_key_location,
            &config.token.public_key_location,
            config.token.expiry_hours,
        )?);
        let profiles = ProfileService::new(
            Arc::new(PgUserStore::new(db)),
            Arc::new(BcryptHasher::new(config.hash_cost)),
            tokens.clone(),
        );
        Ok(Self::from_parts(profiles, tokens))
    }

    pub fn from_parts(profiles: ProfileService, tokens: Arc<TokenService>) -> Self {
        Self { profiles, tokens }
    }
}

impl FromRef<AppState> for ProfileService {
    fn from_ref(state: &AppState) -> Self {
        state.profiles.clone()
    }
}

impl FromRef<AppState> for Arc<TokenService> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}
