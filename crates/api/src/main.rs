use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portal_api::config::ServerConfig;
use portal_api::router::build_app_router;
use portal_api::state::AppState;
use portal_api::storage::AttachmentStore;
use portal_core::navigation::default_tree;
use portal_events::{EmailConfig, LogMailer, Mailer, SmtpMailer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    tracing::info!(host = %config.host, port = config.port, "Loaded server configuration");

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = portal_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    portal_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    portal_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database ready");

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.upload_dir.display()))?;
    tracing::info!(dir = %config.upload_dir.display(), "Attachment store ready");

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        mailer: build_mailer()?,
        attachments: Arc::new(AttachmentStore::new(config.upload_dir.clone())),
        navigation: Arc::new(default_tree()),
    };
    let app = build_app_router(state, &config);

    let ip = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST '{}'", config.host))?;
    let addr = SocketAddr::new(ip, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "Hotel portal listening");

    let drain = Duration::from_secs(config.shutdown_timeout_secs);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(drain))
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// SMTP when `SMTP_HOST` is configured, otherwise mail is only logged.
fn build_mailer() -> anyhow::Result<Arc<dyn Mailer>> {
    match EmailConfig::from_env() {
        Some(email) => {
            tracing::info!(host = %email.smtp_host, "SMTP delivery enabled");
            let mailer = SmtpMailer::new(email).context("Failed to build SMTP transport")?;
            Ok(Arc::new(mailer))
        }
        None => {
            tracing::warn!("SMTP_HOST not set; workflow mail will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

/// Resolves on SIGINT or SIGTERM. In-flight requests then get `drain` to
/// finish before the process exits regardless.
async fn shutdown_signal(drain: Duration) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }

    tokio::spawn(async move {
        tokio::time::sleep(drain).await;
        tracing::warn!(secs = drain.as_secs(), "Shutdown drain timed out; exiting");
        std::process::exit(1);
    });
}
