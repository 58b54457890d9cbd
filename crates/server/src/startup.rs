use std::sync::Arc;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use configs::AppConfig;
use service::{
    catalog::{LoadState, ProductStore},
    runtime,
};

use crate::errors::StartupError;
use crate::routes::{self, AppState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Resolves once Ctrl+C is received.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!(event = "shutdown_signal", "received Ctrl+C, shutting down"),
        Err(e) => {
            // 无法监听信号时保持运行
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    }
}

/// Open the catalog and wrap it into router state.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<(Arc<ProductStore>, AppState)> {
    runtime::ensure_env(&cfg.storage.data_dir)
        .await
        .map_err(|e| StartupError::Runtime(e.to_string()))?;

    let store = ProductStore::open(cfg.storage.products_path()).await;
    match store.load_state() {
        LoadState::Loaded(count) => info!(count, path = %store.path().display(), "catalog ready"),
        LoadState::Missing => info!(path = %store.path().display(), "catalog ready (new file)"),
        LoadState::Unreadable(reason) => warn!(
            %reason,
            path = %store.path().display(),
            "catalog file could not be used; serving an empty catalog until the next write"
        ),
    }

    let state = AppState::new(Arc::clone(&store) as Arc<dyn service::catalog::ProductRepository>);
    Ok((store, state))
}

/// Public entry: build the app and run the HTTP server until Ctrl+C
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();

    let cfg = AppConfig::load_or_env().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    let (store, state) = build_state(&cfg).await?;

    let app = routes::build_router(state, build_cors());

    // Bind and serve
    let addr = cfg.server.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "starting catalog server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.shutdown().await;
    Ok(())
}
