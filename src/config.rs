//! Configuration module
//!
//! Layered configuration: optional `config.toml`, `AVATAR`-prefixed
//! environment variables, and built-in defaults (port 8001, bound to all
//! interfaces, artifact at `<parent-of-cwd>/assets/amy.png`).

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::sync::Mutex;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub upload: UploadConfig,
    pub site: SiteConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    pub show_headers: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
    pub max_body_size: u64,
}

/// Avatar upload endpoint configuration
#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    /// Route the upload handler is bound to
    pub route: String,
    /// Directory the artifact is written to; empty means
    /// `<parent-of-cwd>/assets`
    pub assets_dir: String,
    /// Artifact file name
    pub file_name: String,
}

/// Static site configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    /// Directory static files are served from
    pub root: String,
    /// Files tried when a directory is requested
    pub index_files: Vec<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from specified file path (without extension)
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("AVATAR"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8001)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.show_headers", false)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "Avatar-Server/0.1")?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .set_default("upload.route", "/save-amy-avatar")?
            .set_default("upload.assets_dir", "")?
            .set_default("upload.file_name", "amy.png")?
            .set_default("site.root", ".")?
            .set_default(
                "site.index_files",
                vec!["index.html".to_string(), "index.htm".to_string()],
            )?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Resolve the artifact target path. When no assets directory is
    /// configured, it sits one level above the working directory.
    pub fn resolve_target_path(&self) -> std::io::Result<PathBuf> {
        let assets_dir = if self.upload.assets_dir.is_empty() {
            let cwd = std::env::current_dir()?;
            cwd.parent().unwrap_or(&cwd).join("assets")
        } else {
            PathBuf::from(&self.upload.assets_dir)
        };
        Ok(assets_dir.join(&self.upload.file_name))
    }
}

/// Shared application state
///
/// The artifact target path is injected at construction so tests can point
/// the handler at a temporary directory.
pub struct AppState {
    pub config: Config,
    pub target_path: PathBuf,
    /// Serializes artifact writes. Connections run concurrently, so without
    /// this two uploads could interleave partial writes.
    pub write_lock: Mutex<()>,
}

impl AppState {
    pub fn new(config: Config, target_path: PathBuf) -> Self {
        Self {
            config,
            target_path,
            write_lock: Mutex::new(()),
        }
    }
}
