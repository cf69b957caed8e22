//! Rally Build Notifier binary — `publish` one build or `serve` notifications.

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use rally_notifier::config::{RallyConfig, ServerConfig};
use rally_notifier::services::action_store::ActionStore;
use rally_notifier::services::notifier::Notifier;
use rally_notifier::{metrics, publish, routes};

#[derive(Parser)]
#[command(name = "rally-notifier", about = "Publish CI builds to Rally", version)]
struct Cli {
    #[command(flatten)]
    rally: RallyConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Publish one finished build
    Publish(publish::PublishArgs),
    /// Receive post-build notifications over HTTP
    Serve {
        /// Server port
        #[arg(short, long, env = "RALLY_NOTIFIER_PORT", default_value = "9091")]
        port: u16,
    },
}

fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();

    let Cli { rally, command } = Cli::parse();
    rally.warn_missing();
    let notifier = Notifier::new(rally);

    match command {
        Command::Publish(args) => {
            let published = publish::run(&notifier, &args).await?;
            Ok(if published {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Serve { port } => {
            serve(notifier, port).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn serve(notifier: Notifier, port: u16) -> anyhow::Result<()> {
    let server_config = ServerConfig::from_env();

    if let Some(addr) = server_config.metrics_addr {
        metrics::init_metrics(addr);
        tracing::info!("Prometheus metrics on {}", addr);
    }

    tracing::info!(rally_url = %notifier.config().url, "Starting Rally notifier...");

    let state = routes::NotifierState {
        notifier: Arc::new(notifier),
        store: Arc::new(ActionStore::new()),
        notify_secret: server_config.notify_secret.clone(),
    };

    let app = routes::notifier_router(state)
        .layer(TimeoutLayer::new(Duration::from_secs(server_config.request_timeout_secs)))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Rally notifier listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
