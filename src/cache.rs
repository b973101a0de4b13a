//! Cache Client
//!
//! Owns the connection to the remote key-value store. Construction only
//! validates the connection parameters; the network connection is opened
//! on first use, so transport errors surface there and not at startup.

use redis::aio::ConnectionManager;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::config::RedisConfig;
use crate::error::CacheError;

/// Builds a `redis://` URL from the connection settings.
fn connection_url(config: &RedisConfig) -> String {
    let auth = if config.password.is_empty() {
        String::new()
    } else {
        format!(":{}@", urlencoding::encode(&config.password))
    };
    format!("redis://{}{}/{}", auth, config.addr, config.db)
}

/// Handle to the remote cache, shared for the life of the process.
pub struct CacheClient {
    client: redis::Client,
    connection: OnceCell<ConnectionManager>,
    addr: String,
    key_prefix: String,
}

impl std::fmt::Debug for CacheClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheClient")
            .field("addr", &self.addr)
            .field("key_prefix", &self.key_prefix)
            .field("connected", &self.connection.initialized())
            .finish()
    }
}

impl CacheClient {
    // == Constructor ==
    /// Creates a client for the configured store.
    ///
    /// Fails only when the connection parameters are malformed.
    pub fn connect(config: &RedisConfig) -> Result<Self, CacheError> {
        let client = redis::Client::open(connection_url(config)).map_err(CacheError::Connect)?;
        Ok(Self {
            client,
            connection: OnceCell::new(),
            addr: config.addr.clone(),
            key_prefix: config.key_prefix.clone(),
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    // == Keys ==
    /// Prepends the configured namespace: `prefix:key`, or `key` as-is when
    /// no prefix is set.
    pub fn format_key(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.key_prefix, key)
        }
    }

    // == Connection ==
    /// Returns the shared multiplexed connection, opening it on first call.
    pub async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                debug!(addr = %self.addr, "opening cache connection");
                ConnectionManager::new(self.client.clone()).await
            })
            .await
            .map_err(CacheError::Command)?;
        Ok(manager.clone())
    }

    /// Releases the connection. Consumes the handle so it runs once.
    ///
    /// A connection that was never opened needs no teardown.
    pub async fn close(self) -> Result<(), CacheError> {
        let Some(mut manager) = self.connection.into_inner() else {
            return Ok(());
        };
        let _: () = redis::cmd("QUIT")
            .query_async(&mut manager)
            .await
            .map_err(CacheError::Close)?;
        Ok(())
    }
}
