//! Server configuration from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DATABASE_URL` | `postgres://localhost/notegraph` |
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `3000` |
//! | `DB_MAX_CONNECTIONS` | `10` |
//! | `LOG_FORMAT` | `text` (`json` for structured output) |
//! | `LOG_FILE` | unset (stdout only) |
//! | `LOG_ANSI` | auto-detected |
//!
//! `RUST_LOG` is read by the tracing `EnvFilter` directly.

use std::net::SocketAddr;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/notegraph";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Log output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub log_format: LogFormat,
    pub log_file: Option<String>,
    /// `None` leaves ANSI detection to the subscriber.
    pub log_ansi: Option<bool>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            log_format: LogFormat::Text,
            log_file: None,
            log_ansi: None,
        }
    }
}

impl ApiConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`. Unparseable numbers fall back to
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.db_max_connections),
            log_format: match lookup("LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
            log_file: lookup("LOG_FILE").filter(|v| !v.is_empty()),
            log_ansi: lookup("LOG_ANSI").map(|v| v == "true" || v == "1"),
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}
