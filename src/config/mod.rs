//! Configuration Module
//!
//! Resolves typed settings from environment variables. Every field has a
//! named key and a hard-coded default, so resolution always produces a
//! complete [`Config`]: absent, empty or unparsable values fall back to the
//! default.
//!
//! Env files are merged into the process environment beforehand by
//! [`load_env_files`].

mod duration;
mod sources;

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub use duration::{parse_duration, DurationError};
pub use sources::{
    default_candidates, load_env_files, load_from, EnvCandidate, EnvOrigin, EnvReport,
    ENV_FILE_NAME,
};

// == Defaults ==
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_REDIS_ADDR: &str = "127.0.0.1:6379";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_MAX_SIZE: u64 = 100;

// == Env Lookup ==
/// Typed accessors over a key lookup function.
///
/// Empty values are treated as absent.
pub struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    pub fn new(lookup: F) -> Self {
        Self { lookup }
    }

    fn raw(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|value| !value.is_empty())
    }

    /// Returns the value verbatim, or the default.
    pub fn string(&self, key: &str, default: &str) -> String {
        self.raw(key).unwrap_or_else(|| default.to_string())
    }

    /// Parses the value, falling back to the default on failure.
    pub fn parse<T: FromStr>(&self, key: &str, default: T) -> T {
        self.raw(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Parses a duration literal such as `30s` or `1m30s`.
    pub fn duration(&self, key: &str, default: Duration) -> Duration {
        self.raw(key)
            .and_then(|v| parse_duration(&v).ok())
            .unwrap_or(default)
    }

    /// `true` only when the value equals "true" ignoring case.
    pub fn bool(&self, key: &str, default: bool) -> bool {
        match self.raw(key) {
            Some(v) => v.eq_ignore_ascii_case("true"),
            None => default,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listen port (`GO_SERVER_PORT`)
    pub port: u16,
    /// Upper bound for reading a request body (`SERVER_READ_TIMEOUT`)
    pub read_timeout: Duration,
    /// Upper bound for producing a response (`SERVER_WRITE_TIMEOUT`)
    pub write_timeout: Duration,
}

impl ServerConfig {
    fn resolve<F: Fn(&str) -> Option<String>>(env: &Env<F>) -> Self {
        Self {
            port: env.parse("GO_SERVER_PORT", DEFAULT_SERVER_PORT),
            read_timeout: env.duration("SERVER_READ_TIMEOUT", DEFAULT_READ_TIMEOUT),
            write_timeout: env.duration("SERVER_WRITE_TIMEOUT", DEFAULT_WRITE_TIMEOUT),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_SERVER_PORT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

/// Cache connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisConfig {
    /// `host:port` of the cache server (`REDIS_ADDR`)
    pub addr: String,
    /// Empty means no authentication (`REDIS_PASSWORD`)
    pub password: String,
    /// Logical database index (`REDIS_DB`)
    pub db: i64,
    /// Namespace prepended to keys (`REDIS_KEY_PREFIX`)
    pub key_prefix: String,
}

impl RedisConfig {
    fn resolve<F: Fn(&str) -> Option<String>>(env: &Env<F>) -> Self {
        Self {
            addr: env.string("REDIS_ADDR", DEFAULT_REDIS_ADDR),
            password: env.string("REDIS_PASSWORD", ""),
            db: env.parse("REDIS_DB", 0),
            key_prefix: env.string("REDIS_KEY_PREFIX", ""),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_REDIS_ADDR.to_string(),
            password: String::new(),
            db: 0,
            key_prefix: String::new(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// One of `debug`, `info`, `warn`, `error` (`LOG_LEVEL`)
    pub level: String,
    /// Optional append-mode log file (`LOG_FILE`)
    pub file: Option<PathBuf>,
    /// Size limit in MB (`LOG_MAX_SIZE`). Accepted but not enforced.
    pub max_size: u64,
}

impl LoggingConfig {
    fn resolve<F: Fn(&str) -> Option<String>>(env: &Env<F>) -> Self {
        let file = env.string("LOG_FILE", "");
        Self {
            level: env.string("LOG_LEVEL", DEFAULT_LOG_LEVEL),
            file: (!file.is_empty()).then(|| PathBuf::from(file)),
            max_size: env.parse("LOG_MAX_SIZE", DEFAULT_LOG_MAX_SIZE),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
            max_size: DEFAULT_LOG_MAX_SIZE,
        }
    }
}

/// Immutable configuration snapshot, built once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub server: ServerConfig,
    pub redis: RedisConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Resolves every field through the given lookup function.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env::new(lookup);
        Self {
            server: ServerConfig::resolve(&env),
            redis: RedisConfig::resolve(&env),
            logging: LoggingConfig::resolve(&env),
        }
    }

    /// Resolves every field from the process environment.
    ///
    /// # Environment Variables
    /// - `GO_SERVER_PORT` - HTTP port (default: 8080)
    /// - `SERVER_READ_TIMEOUT` / `SERVER_WRITE_TIMEOUT` - (default: 30s)
    /// - `REDIS_ADDR` - (default: 127.0.0.1:6379)
    /// - `REDIS_PASSWORD`, `REDIS_KEY_PREFIX` - (default: empty)
    /// - `REDIS_DB` - (default: 0)
    /// - `LOG_LEVEL` - (default: info)
    /// - `LOG_FILE` - (default: console only)
    /// - `LOG_MAX_SIZE` - (default: 100)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}
