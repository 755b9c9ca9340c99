//! gradebook-api - Grade tracking service
//!
//! Serves child profiles, grades, averages, AI analyses and the billing
//! bridge over HTTP.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gradebook_api::build_info::BUILD;
use gradebook_api::config::{Args, Config};
use gradebook_api::services::llm::OpenAiBackend;
use gradebook_api::services::AnalysisGateway;
use gradebook_api::{build_router, AppState};
use gradebook_common::api::JwtVerifier;
use gradebook_common::config::{database_path, ensure_directory_exists, load_toml_config};
use gradebook_common::db::init_database;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config file is read before tracing starts so its log level applies
    let toml_config = load_toml_config(args.config.as_deref())
        .context("Failed to load configuration file")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "gradebook_api={level},gradebook_common={level},tower_http={level}",
                    level = toml_config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Gradebook API (gradebook-api) {}", BUILD);

    let config = Config::resolve(&args, &toml_config).context("Invalid configuration")?;
    info!("Root folder: {}", config.root_folder.display());

    ensure_directory_exists(&config.root_folder)
        .context("Failed to create root folder")?;
    let db_path = database_path(&config.root_folder);
    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;
    info!("✓ Database ready: {}", db_path.display());

    let identity = Arc::new(JwtVerifier::new(config.jwt_secret.clone()).context("Invalid JWT secret")?);

    if config.ai.api_key.is_none() {
        warn!("No language-model API key configured; analysis requests may be rejected upstream");
    }
    let backend = OpenAiBackend::new(
        config.ai.base_url.clone(),
        config.ai.model.clone(),
        config.ai.api_key.clone(),
        config.ai.timeout,
    )
    .context("Failed to create language-model client")?;
    let analysis = Arc::new(AnalysisGateway::new(Arc::new(backend), config.ai.timeout));
    info!(
        "Analysis model: {} via {} (timeout {:?})",
        config.ai.model, config.ai.base_url, config.ai.timeout
    );

    if config.webhook_secret.is_none() {
        warn!("No webhook secret configured; billing webhooks are disabled");
    }

    let state = AppState::new(pool, identity, analysis, config.webhook_secret.clone());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .context("Failed to bind to address")?;
    info!("gradebook-api listening on http://{}", config.listen_addr);
    info!("Health check: http://{}/health", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
