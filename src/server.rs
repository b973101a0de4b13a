//! Server lifecycle: bind, serve until a shutdown signal, ordered teardown.
//!
//! The process moves through [`Phase`]s exactly once:
//! `Starting → Serving → ShuttingDown → Stopped`. Teardown always stops
//! the listener first (draining in-flight requests under a deadline) and
//! only then closes the cache connection, whatever the drain outcome.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{error, info};

use crate::cache::CacheClient;
use crate::config::ServerConfig;
use crate::error::{CacheError, ServerError};

/// Upper bound for draining in-flight requests at shutdown.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Lifecycle phase of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Starting,
    Serving,
    ShuttingDown,
    Stopped,
}

impl Phase {
    /// The phase that follows this one; `None` once stopped.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Starting => Some(Phase::Serving),
            Phase::Serving => Some(Phase::ShuttingDown),
            Phase::ShuttingDown => Some(Phase::Stopped),
            Phase::Stopped => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Starting => "starting",
            Phase::Serving => "serving",
            Phase::ShuttingDown => "shutting_down",
            Phase::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Outcome of each teardown step, recorded independently.
#[derive(Debug)]
pub struct ShutdownReport {
    pub listener: Result<(), ServerError>,
    pub cache: Result<(), CacheError>,
}

/// Resource released after the listener has stopped.
pub trait Closable: Send {
    fn close(self) -> impl Future<Output = Result<(), CacheError>> + Send;
}

impl Closable for CacheClient {
    fn close(self) -> impl Future<Output = Result<(), CacheError>> + Send {
        CacheClient::close(self)
    }
}

/// Listen address for the given port on all interfaces.
pub fn format_server_addr(port: u16) -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], port))
}

/// Binds the listener for the configured port.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let addr = format_server_addr(config.port);
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Serves `router` on `listener` until `signal` resolves, then tears down.
///
/// Once the signal fires the listener stops accepting and in-flight
/// requests get `drain_timeout` to finish. The cache is closed afterwards
/// even if the drain timed out or the listener had already failed.
pub async fn serve_until<C, F>(
    listener: TcpListener,
    router: Router,
    cache: C,
    signal: F,
    drain_timeout: Duration,
) -> ShutdownReport
where
    C: Closable,
    F: Future<Output = ()> + Send,
{
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let local_addr = listener.local_addr().ok();

    let mut server = tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = stop_rx.await;
        })
        .await
    });
    info!(phase = %Phase::Serving, addr = ?local_addr, "server listening");

    let early_exit = tokio::select! {
        () = signal => None,
        result = &mut server => Some(result),
    };

    let listener = match early_exit {
        Some(result) => {
            info!(phase = %Phase::ShuttingDown, "listener exited before shutdown signal");
            flatten_join(result).and(Err(ServerError::Task(
                "listener exited before shutdown signal".to_string(),
            )))
        }
        None => {
            info!(phase = %Phase::ShuttingDown, "shutdown signal received, shutting down gracefully");
            let _ = stop_tx.send(());
            match tokio::time::timeout(drain_timeout, &mut server).await {
                Ok(result) => flatten_join(result),
                Err(_) => {
                    server.abort();
                    Err(ServerError::DrainTimeout(drain_timeout))
                }
            }
        }
    };
    match &listener {
        Ok(()) => info!("server stopped gracefully"),
        Err(e) => error!(error = %e, "server shutdown failed"),
    }

    let cache_result = cache.close().await;
    match &cache_result {
        Ok(()) => info!("cache connection closed"),
        Err(e) => error!(error = %e, "failed to close cache connection"),
    }

    info!(phase = %Phase::Stopped, "shutdown complete");
    ShutdownReport {
        listener,
        cache: cache_result,
    }
}

fn flatten_join(
    result: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), ServerError> {
    match result {
        Ok(served) => served.map_err(ServerError::Serve),
        Err(join) => Err(ServerError::Task(join.to_string())),
    }
}

/// Waits for Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
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
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C"),
        () = terminate => info!("received SIGTERM"),
    }
}
