//! # symbol-board binary
//!
//! The entry point that assembles the application from its adapters.

use std::sync::Arc;

use anyhow::Context;
use api_adapters::{router, AppState, UploadMount};
use configs::{LogSettings, Settings};
use domains::{CategoryRepo, SymbolRepo, ThumbnailStore};
use secrecy::ExposeSecret;
use storage_adapters::{LocalThumbnailStore, SqliteStore};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => tracing::error!(%err, "failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    init_tracing(&settings.log);

    // 1. Initialize Database Implementation
    let store = Arc::new(
        SqliteStore::new(settings.database.url.expose_secret(), settings.database.max_connections)
            .await
            .context("opening database")?,
    );

    // 2. Initialize Thumbnail Storage
    let storage = &settings.storage;
    let thumbs: Arc<dyn ThumbnailStore> = Arc::new(LocalThumbnailStore::new(
        storage.upload_dir.clone(),
        storage.upload_base_url.clone(),
        storage.thumbs_folder.clone(),
        storage.placeholder_url.clone(),
        storage.thumbnail_max_edge,
    ));

    // 3. Register the symbol extension on the content service
    let symbols: Arc<dyn SymbolRepo> = store.clone();
    let categories: Arc<dyn CategoryRepo> = store;
    let content = services::symbol_service(symbols, categories, thumbs);

    let app = router(
        AppState::new(content),
        Some(UploadMount {
            url_prefix: storage.upload_base_url.clone(),
            dir: storage.upload_dir.clone(),
        }),
    );

    let listener = TcpListener::bind(settings.bind_addr())
        .await
        .with_context(|| format!("binding {}", settings.bind_addr()))?;
    tracing::info!(addr = %listener.local_addr()?, "symbol-board listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
