use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cineco_feed::{
    config::Config,
    db::{create_pool, create_redis_client, Cache, DecisionStore, MemoryDecisionStore, PgDecisionStore},
    routes::{create_router, AppState},
    services::{
        catalog::{CatalogClient, TmdbCatalog},
        feed::FeedSessions,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("cineco_feed=debug,tower_http=info")
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn DecisionStore> = match config.decision_store.as_str() {
        "memory" => {
            tracing::warn!("Using in-memory decision store; decisions are lost on restart");
            Arc::new(MemoryDecisionStore::new())
        }
        _ => {
            let pool = create_pool(&config.database_url).await?;
            Arc::new(PgDecisionStore::new(pool))
        }
    };

    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, cache_writer) = Cache::new(redis_client);

    let catalog: Arc<dyn CatalogClient> = Arc::new(
        TmdbCatalog::new(
            config.tmdb_access_token.clone(),
            config.tmdb_api_url.clone(),
            config.tmdb_min_vote_count,
        )
        .with_cache(cache, config.catalog_cache_ttl),
    );

    let feed_config = config.feed();
    tracing::info!(
        store = store.name(),
        catalog = catalog.name(),
        initial_pages = feed_config.initial_pages,
        low_water_mark = feed_config.low_water_mark,
        max_empty_pages = feed_config.max_empty_pages,
        "Feed engine configured"
    );

    let state = Arc::new(AppState {
        feeds: FeedSessions::new(Arc::clone(&catalog), Arc::clone(&store), feed_config),
        catalog,
        store,
        image_base_url: config.tmdb_image_url.clone(),
    });

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache_writer.shutdown().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
