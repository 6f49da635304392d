use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::auth::Privilege;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub database: DatabaseConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub board: BoardConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub messages: Messages,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Surface underlying store errors to the caller instead of a generic message.
    pub debug: bool,

    /// First-run setup wizard is active (datastore -> settings -> account).
    pub setup_mode: bool,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Upper bound for a single action handler, including its store calls.
    pub store_timeout_seconds: u64,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            debug: false,
            setup_mode: false,
            worker_threads: 2,
            store_timeout_seconds: 15,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

/// Connection parameters of the relational store.
///
/// `host` is either a `sqlite:` URL (in which case `base`, `user` and `pass`
/// are ignored) or a `host[:port]` of a MySQL server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,

    pub base: String,

    pub user: String,

    pub pass: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "sqlite:data/subplan.db".to_string(),
            base: String::new(),
            user: String::new(),
            pass: String::new(),
        }
    }
}

impl DatabaseConfig {
    #[must_use]
    pub fn is_sqlite(&self) -> bool {
        self.host.starts_with("sqlite:")
    }

    /// URL of the server without a database selected.
    #[must_use]
    pub fn server_url(&self) -> String {
        if self.is_sqlite() {
            return self.host.clone();
        }
        format!(
            "mysql://{}:{}@{}",
            urlencoding::encode(&self.user),
            urlencoding::encode(&self.pass),
            self.host
        )
    }

    /// URL including the database name, used for the long-lived pool.
    #[must_use]
    pub fn database_url(&self) -> String {
        if self.is_sqlite() || self.base.is_empty() {
            return self.server_url();
        }
        format!("{}/{}", self.server_url(), urlencoding::encode(&self.base))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on session cookies.
    /// Default: true for production safety. Set to false for local development without HTTPS.
    pub secure_cookies: bool,

    /// Session cookie lifetime after the last request.
    pub session_inactivity_minutes: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8080,
            cors_allowed_origins: vec![
                "http://localhost:8080".to_string(),
                "http://127.0.0.1:8080".to_string(),
            ],
            secure_cookies: true,
            session_inactivity_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations) - higher = more CPU work
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// Password of the `admin` account seeded into an empty user table.
    pub bootstrap_admin_password: String,

    /// Trusted proxy IP addresses allowed to provide forwarded client IP headers.
    ///
    /// When empty, forwarded headers are ignored and the socket peer address
    /// is the address a session gets bound to.
    pub trusted_proxy_ips: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            bootstrap_admin_password: "admin".to_string(),
            trusted_proxy_ips: Vec::new(),
        }
    }
}

/// Board-level settings edited through the `settings` action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Entries older than this many days are considered stale by housekeeping.
    pub delete_older_than_days: u32,

    pub skip_weekends: bool,

    /// Privilege granted to visitors that are not logged in.
    pub default_privilege: Privilege,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            delete_older_than_days: 14,
            skip_weekends: true,
            default_privilege: Privilege::ViewBasic,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "subplan".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

/// Human-readable failure messages returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub invalid_request: String,
    pub forbidden: String,
    pub incomplete_data: String,
    pub missing_id: String,
    pub invalid_id: String,
    pub invalid_credentials: String,
    pub wrong_password: String,
    pub duplicate_name: String,
    pub invalid_value: String,
    pub add_failed: String,
    pub update_failed: String,
    pub password_failed: String,
    pub store_error: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            invalid_request: "Ungültige Anfrage".to_string(),
            forbidden: "Zugriff verweigert".to_string(),
            incomplete_data: "Daten unvollständig".to_string(),
            missing_id: "ID fehlt".to_string(),
            invalid_id: "ID ungültig".to_string(),
            invalid_credentials: "Anmeldung fehlgeschlagen".to_string(),
            wrong_password: "Altes Passwort inkorrekt".to_string(),
            duplicate_name: "Name bereits vergeben".to_string(),
            invalid_value: "Ungültiger Wert".to_string(),
            add_failed: "Hinzufügen gescheitert".to_string(),
            update_failed: "Änderung gescheitert".to_string(),
            password_failed: "Passwort ändern gescheitert".to_string(),
            store_error: "Datenbankfehler".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            database: DatabaseConfig::default(),
            server: ServerConfig::default(),
            security: SecurityConfig::default(),
            board: BoardConfig::default(),
            observability: ObservabilityConfig::default(),
            messages: Messages::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<(Self, PathBuf)> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Ok((Self::load_from_path(path)?, path.clone()));
            }
        }

        info!("No config file found, using defaults");
        Ok((Self::default(), Self::default_config_path()))
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("subplan").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".subplan").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.host.is_empty() {
            anyhow::bail!("database.host cannot be empty");
        }

        if self.general.store_timeout_seconds == 0 {
            anyhow::bail!("general.store_timeout_seconds must be > 0");
        }

        if self.security.bootstrap_admin_password.is_empty() {
            anyhow::bail!("security.bootstrap_admin_password cannot be empty");
        }

        for ip in &self.security.trusted_proxy_ips {
            ip.parse::<std::net::IpAddr>()
                .with_context(|| format!("Invalid trusted proxy address: {ip}"))?;
        }

        Ok(())
    }
}
