mod config;
mod csrf;
mod db;
mod entities;
mod error;
mod forms;
mod models;
mod routes;
mod store;
mod templates;
mod upload;

use std::sync::Arc;

use crate::{
    config::Config, csrf::CsrfGuard, error::AppResult, forms::ValidationRules, store::MovieStore,
    upload::PosterStorage,
};

/// Everything a request handler needs, built once at start-up.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: MovieStore,
    pub posters: PosterStorage,
    pub csrf: CsrfGuard,
    pub rules: ValidationRules,
}

impl AppState {
    pub async fn from_config(config: Arc<Config>) -> AppResult<Self> {
        let db = db::connect_and_migrate(&config.database_url).await?;

        Ok(Self {
            store: MovieStore::new(db),
            posters: PosterStorage::new(config.upload_folder.clone()),
            csrf: CsrfGuard::new(config.secret_key.clone(), config.csrf_time_limit_secs),
            rules: ValidationRules {
                title_max_len: config.title_max_len,
                poster_extensions: config.poster_extensions.clone(),
            },
            config,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,marquee=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);
    tokio::fs::create_dir_all(&config.upload_folder).await?;

    let state = Arc::new(AppState::from_config(config.clone()).await?);
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(
        addr = %config.addr,
        uploads = %config.upload_folder.display(),
        csrf = config.csrf_enabled,
        "listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}
