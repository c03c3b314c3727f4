use std::error::Error;

use tracing::info;
use tracing_subscriber::EnvFilter;

use ride_server::backend::{Backend, BackendClient, BackendConfig, MockBackend};
use ride_server::cache::{CacheConfig, CachedBackend};
use ride_server::config::AppConfig;
use ride_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ride_server=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env();

    let backend = match &config.mock_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "Using mock backend");
            Backend::Mock(MockBackend::load(dir)?)
        }
        None => {
            info!(api = %config.api_url, "Using REST backend");
            Backend::Http(BackendClient::new(
                BackendConfig::new().with_base_url(&config.api_url),
            )?)
        }
    };

    let cache_config = CacheConfig::default().with_ttl(config.cache_ttl);
    let cached = CachedBackend::new(backend, &cache_config);

    let addr = config.bind;
    let static_dir = config.static_dir.clone();
    let state = AppState::new(cached, config);
    let app = create_router(state, &static_dir);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Ride-sharing frontend listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
