use serde::{Deserialize, Serialize};
use smart_search::ServiceConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in MB
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory holding the frontend; `index.html` is served at `/`
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Upper bound accepted for `top_k` on search requests
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,

    /// Collection, embedding and backend settings
    #[serde(default)]
    pub service: ServiceConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_mb: default_max_body_size_mb(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            static_dir: default_static_dir(),
            max_top_k: default_max_top_k(),
            service: ServiceConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and config files
    ///
    /// Sources, later ones winning: `.env`, `server.{toml,yaml,json}` in the
    /// working directory, then `SMART_SEARCH__*` variables such as
    /// `SMART_SEARCH__SERVICE__BACKEND__BASE_URL`.
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }

        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("server").required(false))
            // Override with environment variables
            .add_source(config::Environment::with_prefix("SMART_SEARCH").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_top_k == 0 {
            anyhow::bail!("max_top_k must be >= 1");
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be >= 1");
        }
        self.service.validate()?;
        Ok(())
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }

    pub fn index_file(&self) -> PathBuf {
        self.static_dir.join("index.html")
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_body_size_mb() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_max_top_k() -> usize {
    100
}
