//! Marketplace verification service

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use verification_server::{
    bootstrap, routes, AppState, Config, InMemorySessionStore, InMemoryVerificationStore,
    SessionStore, SqliteStore, VerificationStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "verification_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(?config, "Loaded configuration");

    match &config.database_path {
        Some(path) => {
            let store = Arc::new(SqliteStore::open(path)?);
            tracing::info!(path = %path, "Using SQLite storage");
            serve(&config, store.clone(), store).await
        }
        None => {
            tracing::warn!("DATABASE_PATH not set, using in-memory storage");
            serve(&config, InMemoryVerificationStore::new(), InMemorySessionStore::new()).await
        }
    }
}

async fn serve<V, S>(config: &Config, store: V, session_store: S) -> Result<()>
where
    V: VerificationStore + 'static,
    S: SessionStore + 'static,
{
    if let Some(admin) = &config.bootstrap_admin {
        bootstrap::ensure_admin(&store, admin)?;
    }
    if config.admin_token.is_none() {
        tracing::info!("ADMIN_API_TOKEN not set, service token access disabled");
    }

    let state = Arc::new(AppState::new(store, session_store, config.admin_token.clone()));
    let app = routes::create_router(state);

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Verification service listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
