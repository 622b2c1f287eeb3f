use std::process::ExitCode;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use relay_gateway::{AppState, Config, LogFormat, build_router, metrics, utils};

#[tokio::main]
async fn main() -> ExitCode {
    // Configuration decides the log format, so it is loaded before logging
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing("info", LogFormat::Text);
            error!("Configuration error: {e}");
            return ExitCode::from(exitcode::CONFIG as u8);
        }
    };
    init_tracing(&config.log_level, config.log_format);

    info!("Starting Relay Gateway v{}", env!("CARGO_PKG_VERSION"));

    match run(config).await {
        Ok(()) => ExitCode::from(exitcode::OK as u8),
        Err(exit_code) => ExitCode::from(exit_code as u8),
    }
}

/// Install the global subscriber. `RUST_LOG` directives win over `level`.
fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .init(),
    }
}

/// Run the application, returning an exit code on error.
async fn run(config: Config) -> Result<(), exitcode::ExitCode> {
    info!(
        host = %config.host,
        port = %config.port,
        targets = config.target_urls.len(),
        upstream_timeout_secs = config.upstream_timeout.map(|t| t.as_secs()),
        log_format = %config.log_format,
        "Configuration loaded"
    );

    if let Some(metrics_addr) = config.metrics_addr() {
        metrics::try_init_metrics(metrics_addr);
    }

    // Build application state and router
    let addr = config.server_addr();
    let state = AppState::new(config);
    let targets = state.target_list();
    let app = build_router(state);

    // Start server
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        error!("Failed to bind to {addr}: {e}");
        exitcode::UNAVAILABLE
    })?;

    info!("Gateway listening on http://{addr}");
    info!("Targets (round-robin): {}", targets.join(", "));
    info!("Routes:");
    info!("  ANY  /c2/*             - Forwarded with /c2 stripped");
    info!("  ANY  /uploadexe, /uploaddll, /uploadpayload, /uploadloader");
    info!("       /getexe, /getdll, /getpayload");
    info!("                         - Forwarded, path lower-cased");
    info!("  GET  /                 - Landing page");
    info!("  ANY  *                 - 404 Not Found");

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(utils::shutdown_signal())
        .await
        .map_err(|e| {
            error!("Server error: {e}");
            exitcode::SOFTWARE
        })?;

    info!("Server shutdown complete");
    Ok(())
}
