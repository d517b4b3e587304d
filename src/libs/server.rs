//! # HTTP Server
//!
//! Axum application around [`Gateway`], plus the process-level serve loop.

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::libs::config::GatewayConfig;
use crate::libs::error::ServeError;
use crate::libs::gateway::Gateway;
use crate::libs::router::dispatch;
use crate::libs::store::{self, Store};

/// Build the application. All paths land on the one dispatcher.
pub fn app(store: Arc<dyn Store>) -> Router {
    Router::new()
        .fallback(dispatch)
        .with_state(Gateway::new(store))
        .layer(TraceLayer::new_for_http())
}

/// Connect, serve until ctrl-c, then close the pool.
pub async fn serve(config: &GatewayConfig) -> Result<(), ServeError> {
    config.validate()?;
    let store = store::connect(&config.database_url, config.max_connections).await?;
    let listener = TcpListener::bind(&config.listen).await?;
    info!(addr = %listener.local_addr()?, "listening");

    let served = axum::serve(listener, app(store.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    info!("shutting down, closing database pool");
    store.close().await;
    served.map_err(ServeError::from)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::store::SqliteStore;

    #[tokio::test]
    async fn test_app_builds() {
        let store = SqliteStore::in_memory().await.unwrap();
        let _router = app(Arc::new(store));
    }

    #[tokio::test]
    async fn test_serve_requires_database_url() {
        let err = serve(&GatewayConfig::default()).await.unwrap_err();
        assert!(matches!(err, ServeError::Config(_)));
    }

    #[tokio::test]
    async fn test_serve_rejects_unknown_scheme() {
        let config = GatewayConfig::with_database_url("oracle://db");
        let err = serve(&config).await.unwrap_err();
        assert!(matches!(err, ServeError::UnsupportedUrl(_)));
    }
}
