use anyhow::Result;
use std::sync::Arc;

use vibes_backend::auth::TokenKeys;
use vibes_backend::services::RedisCache;
use vibes_backend::store::PostgresStore;
use vibes_backend::{app, config, db, logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = config::Settings::from_env()?;

    // Initialize logging
    logging::init_logging(&settings.env);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        "Starting vibes backend"
    );

    // Create database pool and apply migrations
    let pool = db::create_pool(&settings).await?;
    db::run_migrations(&pool).await?;

    // Create Redis cache
    let cache = RedisCache::new(&settings.redis_url, settings.redis_cache_ttl_seconds).await?;

    // Token signing keys
    let tokens = TokenKeys::from_settings(&settings);

    // Create application state
    let store = Arc::new(PostgresStore::new(pool, cache));
    let state = app::AppState::new(store, settings.clone(), tokens);

    // Build application
    let app = app::create_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
