//! Pulse - A minimal HTTP service skeleton
//!
//! Boots the health-probe server and shuts it down gracefully.

use anyhow::Context;
use tracing::{error, info, warn};

use pulse::api::create_router;
use pulse::config::{load_env_files, Config};
use pulse::server::{self, Phase};
use pulse::{CacheClient, Logger, SHUTDOWN_TIMEOUT};

/// Main entry point for the service.
///
/// # Startup Sequence
/// 1. Merge `.env` overrides into the process environment
/// 2. Resolve configuration from environment variables
/// 3. Build the logger (console, plus file if configured)
/// 4. Create the cache client; failure here is fatal
/// 5. Build the router and bind the listener
/// 6. Serve until SIGINT/SIGTERM, then drain and close the cache
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_report = load_env_files();
    let config = Config::from_env();

    let logger = Logger::init(&config.logging).context("failed to install logger")?;
    info!(phase = %Phase::Starting, "service starting");
    env_report.log();
    info!(
        port = config.server.port,
        read_timeout = ?config.server.read_timeout,
        write_timeout = ?config.server.write_timeout,
        log_level = %logger.level(),
        log_file = ?logger.file_path(),
        "configuration loaded"
    );

    let cache = CacheClient::connect(&config.redis)
        .inspect_err(|e| error!(error = %e, "cache client initialization failed"))
        .context("failed to initialize cache client")?;
    info!(
        addr = %cache.addr(),
        key_prefix = %cache.key_prefix(),
        "cache client initialized"
    );

    let app = create_router(&config.server);
    let listener = server::bind(&config.server)
        .await
        .inspect_err(|e| error!(error = %e, "failed to start server"))
        .context("failed to bind listener")?;

    let report = server::serve_until(
        listener,
        app,
        cache,
        server::shutdown_signal(),
        SHUTDOWN_TIMEOUT,
    )
    .await;
    if report.listener.is_err() || report.cache.is_err() {
        warn!("shutdown finished with errors");
    }

    if let Err(e) = logger.sync() {
        eprintln!("failed to flush log file: {e}");
    }
    Ok(())
}
