//! Configuration management
//!
//! This module handles loading and parsing configuration for the Gabi club backend.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Uploaded media configuration
    #[serde(default)]
    pub media: MediaConfig,
    /// Lead notification relay
    #[serde(default)]
    pub telegram: TelegramConfig,
    /// Bootstrap administrator account
    #[serde(default)]
    pub admin: AdminConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (for cookie-based auth)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`.
    /// Enable only behind a reverse proxy that sets these headers.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            trust_proxy_headers: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path or URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/gabi.db".to_string()
}

/// Media configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Directory holding uploaded files
    #[serde(default = "default_media_root")]
    pub root: PathBuf,
    /// URL path the media root is served under
    #[serde(default = "default_media_url_prefix")]
    pub url_prefix: String,
    /// Scheme and host prepended to media URLs, e.g. `https://gabi.club`
    #[serde(default)]
    pub public_base_url: String,
    /// Maximum file size in bytes (default: 10MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Allowed MIME types
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: default_media_root(),
            url_prefix: default_media_url_prefix(),
            public_base_url: String::new(),
            max_file_size: default_max_file_size(),
            allowed_types: default_allowed_types(),
        }
    }
}

fn default_media_root() -> PathBuf {
    PathBuf::from("media")
}

fn default_media_url_prefix() -> String {
    "/media/".to_string()
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_allowed_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/gif".to_string(),
        "image/webp".to_string(),
        "image/svg+xml".to_string(),
        "application/pdf".to_string(),
    ]
}

impl MediaConfig {
    /// Check if a MIME type is allowed
    pub fn is_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == mime_type)
    }

    /// Get file extension for a MIME type
    pub fn get_extension(&self, mime_type: &str) -> &'static str {
        match mime_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/svg+xml" => "svg",
            "application/pdf" => "pdf",
            _ => "bin",
        }
    }

    /// Public URL for a stored media path.
    ///
    /// Empty paths have no URL. Values that are already absolute URLs are
    /// returned unchanged.
    pub fn url_for(&self, path: &str) -> Option<String> {
        let path = path.trim();
        if path.is_empty() {
            return None;
        }
        if path.starts_with("http://") || path.starts_with("https://") {
            return Some(path.to_string());
        }

        let prefix = format!("/{}/", self.url_prefix.trim_matches('/'));
        let prefix = if prefix == "//" { "/media/".to_string() } else { prefix };
        let base = self.public_base_url.trim_end_matches('/');
        Some(format!("{}{}{}", base, prefix, path.trim_start_matches('/')))
    }
}

/// Telegram relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather
    #[serde(default)]
    pub bot_token: String,
    /// Chat receiving lead notifications
    #[serde(default)]
    pub chat_id: String,
    /// Bot API base URL
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
    /// Per-attempt timeout in seconds
    #[serde(default = "default_telegram_timeout")]
    pub timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: default_telegram_api_base(),
            timeout_secs: default_telegram_timeout(),
        }
    }
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_telegram_timeout() -> u64 {
    4
}

impl TelegramConfig {
    /// Notifications are sent only when both token and chat are set
    pub fn is_enabled(&self) -> bool {
        !self.bot_token.trim().is_empty() && !self.chat_id.trim().is_empty()
    }
}

/// Administrator created on first start when the users table is empty
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,
    #[serde(default = "default_admin_email")]
    pub email: String,
    /// Empty disables bootstrapping
    #[serde(default)]
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            email: default_admin_email(),
            password: String::new(),
        }
    }
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_email() -> String {
    "admin@gabi.club".to_string()
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: format_yaml_error(&e),
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern `GABI_<SECTION>_<KEY>`:
    /// - GABI_SERVER_HOST, GABI_SERVER_PORT, GABI_SERVER_CORS_ORIGIN,
    ///   GABI_SERVER_TRUST_PROXY_HEADERS
    /// - GABI_DATABASE_URL
    /// - GABI_MEDIA_ROOT, GABI_MEDIA_URL_PREFIX, GABI_MEDIA_PUBLIC_BASE_URL
    /// - GABI_TELEGRAM_BOT_TOKEN, GABI_TELEGRAM_CHAT_ID, GABI_TELEGRAM_API_BASE,
    ///   GABI_TELEGRAM_TIMEOUT_SECS
    /// - GABI_ADMIN_USERNAME, GABI_ADMIN_EMAIL, GABI_ADMIN_PASSWORD
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        // Server configuration
        if let Ok(host) = std::env::var("GABI_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("GABI_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("GABI_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }
        if let Ok(trust) = std::env::var("GABI_SERVER_TRUST_PROXY_HEADERS") {
            if let Ok(trust) = trust.trim().to_lowercase().parse::<bool>() {
                self.server.trust_proxy_headers = trust;
            }
        }

        // Database configuration
        if let Ok(url) = std::env::var("GABI_DATABASE_URL") {
            self.database.url = url;
        }

        // Media configuration
        if let Ok(root) = std::env::var("GABI_MEDIA_ROOT") {
            self.media.root = PathBuf::from(root);
        }
        if let Ok(prefix) = std::env::var("GABI_MEDIA_URL_PREFIX") {
            self.media.url_prefix = prefix;
        }
        if let Ok(base) = std::env::var("GABI_MEDIA_PUBLIC_BASE_URL") {
            self.media.public_base_url = base;
        }

        // Telegram configuration
        if let Ok(token) = std::env::var("GABI_TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Ok(chat_id) = std::env::var("GABI_TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = chat_id;
        }
        if let Ok(api_base) = std::env::var("GABI_TELEGRAM_API_BASE") {
            self.telegram.api_base = api_base;
        }
        if let Ok(timeout) = std::env::var("GABI_TELEGRAM_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                self.telegram.timeout_secs = timeout;
            }
        }

        // Admin bootstrap
        if let Ok(username) = std::env::var("GABI_ADMIN_USERNAME") {
            self.admin.username = username;
        }
        if let Ok(email) = std::env::var("GABI_ADMIN_EMAIL") {
            self.admin.email = email;
        }
        if let Ok(password) = std::env::var("GABI_ADMIN_PASSWORD") {
            self.admin.password = password;
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_KEYS: &[&str] = &[
    "GABI_SERVER_HOST",
    "GABI_SERVER_PORT",
    "GABI_SERVER_CORS_ORIGIN",
    "GABI_SERVER_TRUST_PROXY_HEADERS",
    "GABI_DATABASE_URL",
    "GABI_MEDIA_ROOT",
    "GABI_MEDIA_URL_PREFIX",
    "GABI_MEDIA_PUBLIC_BASE_URL",
    "GABI_TELEGRAM_BOT_TOKEN",
    "GABI_TELEGRAM_CHAT_ID",
    "GABI_TELEGRAM_API_BASE",
    "GABI_TELEGRAM_TIMEOUT_SECS",
    "GABI_ADMIN_USERNAME",
    "GABI_ADMIN_EMAIL",
    "GABI_ADMIN_PASSWORD",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        let guard = super::CONFIG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        for key in super::ENV_KEYS {
            std::env::remove_var(key);
        }
        guard
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = std::path::Path::new("nonexistent_config.yml");
        let config = Config::load(path).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert!(!config.server.trust_proxy_headers);
        assert_eq!(config.database.url, "data/gabi.db");
        assert_eq!(config.media.root, PathBuf::from("media"));
        assert_eq!(config.media.url_prefix, "/media/");
        assert_eq!(config.telegram.api_base, "https://api.telegram.org");
        assert_eq!(config.telegram.timeout_secs, 4);
        assert!(!config.telegram.is_enabled());
        assert!(config.admin.password.is_empty());
    }

    #[test]
    fn test_load_empty_file_returns_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 3000\ntelegram:\n  chat_id: \"-100\"\n").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.telegram.chat_id, "-100");
        assert_eq!(config.telegram.timeout_secs, 4);
        assert!(!config.telegram.is_enabled());
    }

    #[test]
    fn test_load_full_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
server:
  host: "127.0.0.1"
  port: 9000
  cors_origin: "https://gabi.club"
database:
  url: "/var/lib/gabi/gabi.db"
media:
  root: "/var/lib/gabi/media"
  url_prefix: "/files/"
  public_base_url: "https://api.gabi.club"
  max_file_size: 1024
telegram:
  bot_token: "123:abc"
  chat_id: "-100500"
  timeout_secs: 10
admin:
  username: "coach"
  password: "secret"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.cors_origin, "https://gabi.club");
        assert_eq!(config.database.url, "/var/lib/gabi/gabi.db");
        assert_eq!(config.media.root, PathBuf::from("/var/lib/gabi/media"));
        assert_eq!(config.media.max_file_size, 1024);
        assert!(config.telegram.is_enabled());
        assert_eq!(config.telegram.timeout_secs, 10);
        assert_eq!(config.admin.username, "coach");
        assert_eq!(config.admin.email, "admin@gabi.club");
        assert_eq!(config.admin.password, "secret");
    }

    #[test]
    fn test_load_invalid_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: not_a_number\n").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        let err_msg = err.to_string();
        assert!(err_msg.contains("parse"));
    }

    #[test]
    fn test_load_malformed_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  host: [invalid yaml").unwrap();

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_env_override_server_and_database() {
        let _guard = lock_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  host: \"0.0.0.0\"\n  port: 8000\n").unwrap();

        std::env::set_var("GABI_SERVER_HOST", "192.168.1.1");
        std::env::set_var("GABI_SERVER_PORT", "4000");
        std::env::set_var("GABI_DATABASE_URL", ":memory:");
        std::env::set_var("GABI_SERVER_TRUST_PROXY_HEADERS", "TRUE");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.server.host, "192.168.1.1");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.database.url, ":memory:");
        assert!(config.server.trust_proxy_headers);

        for key in super::ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_env_override_telegram() {
        let _guard = lock_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "").unwrap();

        std::env::set_var("GABI_TELEGRAM_BOT_TOKEN", "42:token");
        std::env::set_var("GABI_TELEGRAM_CHAT_ID", "777");
        std::env::set_var("GABI_TELEGRAM_TIMEOUT_SECS", "9");

        let config = Config::load_with_env(file.path()).unwrap();

        assert!(config.telegram.is_enabled());
        assert_eq!(config.telegram.bot_token, "42:token");
        assert_eq!(config.telegram.timeout_secs, 9);

        for key in super::ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_env_override_invalid_numbers_ignored() {
        let _guard = lock_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 8080\n").unwrap();

        std::env::set_var("GABI_SERVER_PORT", "not_a_number");
        std::env::set_var("GABI_TELEGRAM_TIMEOUT_SECS", "soon");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.telegram.timeout_secs, 4);

        for key in super::ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_media_url_for() {
        let media = MediaConfig::default();
        assert_eq!(media.url_for(""), None);
        assert_eq!(
            media.url_for("articles/covers/a.jpg").as_deref(),
            Some("/media/articles/covers/a.jpg")
        );
        assert_eq!(
            media.url_for("https://cdn.example.com/x.png").as_deref(),
            Some("https://cdn.example.com/x.png")
        );

        let media = MediaConfig {
            url_prefix: "files".to_string(),
            public_base_url: "https://api.gabi.club/".to_string(),
            ..MediaConfig::default()
        };
        assert_eq!(
            media.url_for("/hero/1.webp").as_deref(),
            Some("https://api.gabi.club/files/hero/1.webp")
        );
    }

    #[test]
    fn test_telegram_enabled_requires_token_and_chat() {
        let mut telegram = TelegramConfig::default();
        assert!(!telegram.is_enabled());
        telegram.bot_token = "123:abc".to_string();
        assert!(!telegram.is_enabled());
        telegram.chat_id = "  ".to_string();
        assert!(!telegram.is_enabled());
        telegram.chat_id = "-100".to_string();
        assert!(telegram.is_enabled());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn valid_host_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            (0u8..=255, 0u8..=255, 0u8..=255, 0u8..=255)
                .prop_map(|(a, b, c, d)| format!("{}.{}.{}.{}", a, b, c, d)),
            Just("localhost".to_string()),
            "[a-z][a-z0-9]{0,10}".prop_map(|s| s),
        ]
    }

    fn valid_config_strategy() -> impl Strategy<Value = Config> {
        (
            valid_host_strategy(),
            1u16..=65535,
            "[a-z][a-z0-9_/]{0,20}\\.db",
            "[a-z][a-z0-9_]{0,10}",
            1u64..=60,
        )
            .prop_map(|(host, port, url, media_root, timeout_secs)| Config {
                server: ServerConfig {
                    host,
                    port,
                    cors_origin: default_cors_origin(),
                    trust_proxy_headers: false,
                },
                database: DatabaseConfig { url },
                media: MediaConfig {
                    root: PathBuf::from(media_root),
                    ..MediaConfig::default()
                },
                telegram: TelegramConfig {
                    timeout_secs,
                    ..TelegramConfig::default()
                },
                admin: AdminConfig::default(),
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Serializing a config to YAML and loading it back yields the same values
        #[test]
        fn config_yaml_roundtrip(config in valid_config_strategy()) {
            let yaml = serde_yaml::to_string(&config).expect("Failed to serialize config");

            let mut file = NamedTempFile::new().expect("Failed to create temp file");
            write!(file, "{}", yaml).expect("Failed to write config");

            let parsed = Config::load(file.path()).expect("Failed to parse config");

            prop_assert_eq!(config.server.host, parsed.server.host);
            prop_assert_eq!(config.server.port, parsed.server.port);
            prop_assert_eq!(config.database.url, parsed.database.url);
            prop_assert_eq!(config.media.root, parsed.media.root);
            prop_assert_eq!(config.telegram.timeout_secs, parsed.telegram.timeout_secs);
        }

        /// Any port given through the environment wins over the file
        #[test]
        fn env_port_override(port in 1u16..=65535) {
            let _guard = super::CONFIG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

            let mut file = NamedTempFile::new().expect("Failed to create temp file");
            write!(file, "server:\n  port: 8000\n").expect("Failed to write config");

            std::env::set_var("GABI_SERVER_PORT", port.to_string());
            let config = Config::load_with_env(file.path()).expect("Failed to load config");
            std::env::remove_var("GABI_SERVER_PORT");

            prop_assert_eq!(config.server.port, port);
        }
    }
}
