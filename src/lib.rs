//! Pulse - A minimal HTTP service skeleton
//!
//! Serves health probes behind a logging, panic-recovery, error-translation
//! and CORS middleware stack, manages a cache connection, and shuts down in
//! order on SIGINT/SIGTERM.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod server;

pub use cache::CacheClient;
pub use config::Config;
pub use logging::Logger;
pub use server::{serve_until, shutdown_signal, Closable, Phase, ShutdownReport, SHUTDOWN_TIMEOUT};
