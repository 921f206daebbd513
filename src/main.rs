use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;

use sourceit::config::Config;
use sourceit::routes;
use sourceit::store::RedisManager;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Arc::new(Config::load());

    let redis_manager = Arc::new(RedisManager::new_with_config(&config).await?);

    let handlers = sourceit::build_handlers(Arc::clone(&config), redis_manager)?;
    let router = routes::router(handlers);

    let bind: SocketAddr = config
        .server
        .bind
        .parse()
        .expect("Invalid server.bind (expected host:port)");

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(%bind, name = %config.server.name, "Starting sourcing chat server");

    axum::serve(listener, router).await?;
    Ok(())
}
