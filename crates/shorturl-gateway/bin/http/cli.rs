use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    Memory,
    Mysql,
}

impl Display for StoreBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackend {
    Memory,
    Redis,
    /// In-process cache in front of Redis.
    Layered,
}

impl Display for CacheBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackend::Memory => write!(f, "memory"),
            CacheBackend::Redis => write!(f, "redis"),
            CacheBackend::Layered => write!(f, "layered"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "shorturl-gateway", version, about = "URL shortener HTTP server")]
pub struct Cli {
    #[arg(long, env = "SHORTURL_LISTEN_ADDR", default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    #[arg(long, env = "SHORTURL_STORE", value_enum, default_value_t = StoreBackend::Memory)]
    pub store: StoreBackend,

    #[arg(long, env = "SHORTURL_MYSQL_DSN", required_if_eq("store", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(long, env = "SHORTURL_MYSQL_MAX_CONNECTIONS", default_value_t = 10)]
    pub mysql_max_connections: u32,

    #[arg(long, env = "SHORTURL_STORE_CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    pub store_connect_timeout_secs: u64,

    #[arg(long, env = "SHORTURL_STORE_OP_TIMEOUT_SECS", default_value_t = 5)]
    pub store_op_timeout_secs: u64,

    #[arg(long, env = "SHORTURL_CACHE", value_enum, default_value_t = CacheBackend::Memory)]
    pub cache: CacheBackend,

    #[arg(
        long,
        env = "SHORTURL_REDIS_URL",
        required_if_eq_any([("cache", "redis"), ("cache", "layered")])
    )]
    pub redis_url: Option<String>,

    /// Entry bound of the in-process cache. Each link takes two entries.
    #[arg(long, env = "SHORTURL_CACHE_CAPACITY", default_value_t = 100_000)]
    pub cache_capacity: u64,

    #[arg(long, env = "SHORTURL_CACHE_TIMEOUT_MS", default_value_t = 500)]
    pub cache_timeout_ms: u64,

    #[arg(long, env = "SHORTURL_CACHE_PING_INTERVAL_SECS", default_value_t = 5)]
    pub cache_ping_interval_secs: u64,

    #[arg(long, env = "SHORTURL_REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,

    #[arg(long, env = "SHORTURL_SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,

    /// Length of generated short identifiers.
    #[arg(
        long,
        env = "SHORTURL_ID_SIZE",
        default_value_t = 21,
        value_parser = clap::value_parser!(u16).range(1..=64)
    )]
    pub id_size: u16,

    #[arg(long, env = "SHORTURL_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    #[arg(long, env = "SHORTURL_LOG_LEVEL", default_value_t = Level::INFO)]
    pub log_level: Level,

    #[arg(long, env = "SHORTURL_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn store_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.store_connect_timeout_secs)
    }

    pub fn store_op_timeout(&self) -> Duration {
        Duration::from_secs(self.store_op_timeout_secs)
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    pub fn cache_ping_interval(&self) -> Duration {
        Duration::from_secs(self.cache_ping_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["shorturl-gateway"]).unwrap();

        assert_eq!(cli.listen_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(cli.store, StoreBackend::Memory);
        assert_eq!(cli.cache, CacheBackend::Memory);
        assert_eq!(cli.cache_capacity, 100_000);
        assert_eq!(cli.cache_timeout(), Duration::from_millis(500));
        assert_eq!(cli.cache_ping_interval(), Duration::from_secs(5));
        assert_eq!(cli.request_timeout(), Duration::from_secs(10));
        assert_eq!(cli.shutdown_timeout(), Duration::from_secs(5));
        assert_eq!(cli.id_size, 21);
        assert_eq!(cli.log_level, Level::INFO);
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn mysql_requires_dsn() {
        assert!(Cli::try_parse_from(["shorturl-gateway", "--store", "mysql"]).is_err());

        let cli = Cli::try_parse_from([
            "shorturl-gateway",
            "--store",
            "mysql",
            "--mysql-dsn",
            "mysql://u:p@localhost/shorturls",
        ])
        .unwrap();
        assert_eq!(cli.store, StoreBackend::Mysql);
    }

    #[test]
    fn remote_caches_require_redis_url() {
        for cache in ["redis", "layered"] {
            assert!(Cli::try_parse_from(["shorturl-gateway", "--cache", cache]).is_err());
        }

        let cli = Cli::try_parse_from([
            "shorturl-gateway",
            "--cache",
            "layered",
            "--redis-url",
            "redis://127.0.0.1:6379",
        ])
        .unwrap();
        assert_eq!(cli.cache, CacheBackend::Layered);
    }

    #[test]
    fn id_size_is_bounded() {
        assert!(Cli::try_parse_from(["shorturl-gateway", "--id-size", "0"]).is_err());
        assert!(Cli::try_parse_from(["shorturl-gateway", "--id-size", "8"]).is_ok());
    }
}
