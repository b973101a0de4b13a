//! Lifecycle Tests
//!
//! Runs the server on an ephemeral port and drives the shutdown sequence
//! with an in-process signal.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{routing::get, Router};
use pulse::{
    api::{health_routes, with_middleware, API_PREFIX},
    config::{RedisConfig, ServerConfig},
    error::{CacheError, ServerError},
    serve_until, CacheClient, Closable, ShutdownReport,
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

// == Helper Functions ==

async fn slow_handler() -> &'static str {
    tokio::time::sleep(Duration::from_millis(800)).await;
    "done"
}

fn test_router() -> Router {
    let routes = health_routes().route("/slow", get(slow_handler));
    with_middleware(
        Router::new().nest(API_PREFIX, routes),
        &ServerConfig::default(),
    )
}

struct RunningServer {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<ShutdownReport>,
}

/// Records every close call with its time.
#[derive(Clone, Default)]
struct RecordingCache {
    closed_at: Arc<Mutex<Vec<Instant>>>,
}

impl Closable for RecordingCache {
    fn close(self) -> impl Future<Output = Result<(), CacheError>> + Send {
        async move {
            self.closed_at.lock().unwrap().push(Instant::now());
            Ok(())
        }
    }
}

async fn start_server(drain_timeout: Duration) -> RunningServer {
    // nothing needs to listen here; the client connects lazily
    let cache = CacheClient::connect(&RedisConfig::default()).unwrap();
    start_server_with(drain_timeout, cache).await
}

async fn start_server_with<C>(drain_timeout: Duration, cache: C) -> RunningServer
where
    C: Closable + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();

    let handle = tokio::spawn(serve_until(
        listener,
        test_router(),
        cache,
        async {
            let _ = stopped.await;
        },
        drain_timeout,
    ));

    RunningServer { addr, stop, handle }
}

// == Tests ==

#[tokio::test]
async fn test_serves_health_then_shuts_down_cleanly() {
    let server = start_server(Duration::from_secs(10)).await;

    let body: serde_json::Value = reqwest::get(format!("http://{}/api/health/liveness", server.addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "alive");

    server.stop.send(()).unwrap();
    let report = server.handle.await.unwrap();
    assert!(report.listener.is_ok());
    assert!(report.cache.is_ok());
}

#[tokio::test]
async fn test_in_flight_request_completes_during_shutdown() {
    let server = start_server(Duration::from_secs(10)).await;
    let url = format!("http://{}/api/slow", server.addr);

    let in_flight = tokio::spawn(async move { reqwest::get(url).await });
    tokio::time::sleep(Duration::from_millis(200)).await;
    server.stop.send(()).unwrap();

    let response = in_flight.await.unwrap().unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "done");

    let report = server.handle.await.unwrap();
    assert!(report.listener.is_ok());
    assert!(report.cache.is_ok());
}

#[tokio::test]
async fn test_new_connections_refused_after_shutdown() {
    let server = start_server(Duration::from_secs(10)).await;
    let addr = server.addr;

    server.stop.send(()).unwrap();
    server.handle.await.unwrap();

    let result = reqwest::get(format!("http://{addr}/api/health")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_cache_closed_once_after_drain_times_out() {
    let drain_timeout = Duration::from_millis(100);
    let cache = RecordingCache::default();
    let server = start_server_with(drain_timeout, cache.clone()).await;
    let url = format!("http://{}/api/slow", server.addr);

    let _in_flight = tokio::spawn(async move { reqwest::get(url).await });
    tokio::time::sleep(Duration::from_millis(200)).await;
    let stopped_at = Instant::now();
    server.stop.send(()).unwrap();

    let report = server.handle.await.unwrap();
    assert!(matches!(
        report.listener,
        Err(ServerError::DrainTimeout(timeout)) if timeout == drain_timeout
    ));
    assert!(report.cache.is_ok());

    let closed_at = cache.closed_at.lock().unwrap().clone();
    assert_eq!(closed_at.len(), 1);
    assert!(closed_at[0].duration_since(stopped_at) >= drain_timeout);
}

#[tokio::test]
async fn test_cache_closed_once_after_graceful_drain() {
    let cache = RecordingCache::default();
    let server = start_server_with(Duration::from_secs(10), cache.clone()).await;

    server.stop.send(()).unwrap();
    let report = server.handle.await.unwrap();

    assert!(report.listener.is_ok());
    assert_eq!(cache.closed_at.lock().unwrap().len(), 1);
}
