//! Book catalog service.
//!
//! Wires configuration, telemetry, the selected storage backend, and the
//! HTTP layer together.

pub mod cli;
pub mod modules;

use anyhow::Context;
use books_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Run the service until a shutdown signal arrives.
///
/// Storage is opened before anything is served; an unreachable database
/// aborts startup.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        backend = %settings.storage.backend,
        "books-app bootstrap starting"
    );

    let store = books_db::open(&settings.storage, &settings.database)
        .await
        .with_context(|| format!("failed to open {} storage", settings.storage.backend))?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store);

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_modules(&ctx).await?;

    tracing::info!("books-app bootstrap complete");

    let served = books_http::start_server(&registry, &settings, shutdown_signal()).await;
    let stopped = registry.stop_modules().await;

    served?;
    stopped
}

/// Wait for Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
