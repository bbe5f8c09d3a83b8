//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::obj::PolygonMode;
use crate::util::rate_limit::PARSE_RATE_LIMIT;

const DEFAULT_ADDR: &str = "0.0.0.0:5002";

const DEFAULT_MAX_MODEL_BYTES: u64 = 32 * 1024 * 1024;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,

    /// Directory holding `.obj` models and other static assets
    pub asset_dir: PathBuf,
    /// Allowed client origins for CORS, `*` for any
    pub client_origin: String,

    /// Largest model file the server will parse
    pub max_model_bytes: u64,
    /// Triangulation of faces with more than three vertices
    pub polygon_mode: PolygonMode,
    /// Model requests allowed per second across all clients
    pub parse_rate_limit: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = match lookup("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => lookup("SERVER_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string()),
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_json: lookup("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),

            asset_dir: lookup("ASSET_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("assets")),
            client_origin: lookup("CLIENT_ORIGIN").unwrap_or_else(|| "*".to_string()),

            max_model_bytes: match lookup("MAX_MODEL_BYTES") {
                Some(v) => v
                    .parse()
                    .map_err(|_| ConfigError::Invalid("MAX_MODEL_BYTES", v))?,
                None => DEFAULT_MAX_MODEL_BYTES,
            },
            polygon_mode: match lookup("POLYGON_MODE") {
                Some(v) => v.parse().map_err(|_| ConfigError::Invalid("POLYGON_MODE", v))?,
                None => PolygonMode::default(),
            },
            parse_rate_limit: match lookup("PARSE_RATE_LIMIT") {
                Some(v) => v
                    .parse()
                    .map_err(|_| ConfigError::Invalid("PARSE_RATE_LIMIT", v))?,
                None => PARSE_RATE_LIMIT,
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: '{1}'")]
    Invalid(&'static str, String),

    #[error("Invalid server address format")]
    InvalidAddress,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.server_addr.port(), 5002);
        assert_eq!(config.log_level, "info");
        assert!(!config.log_json);
        assert_eq!(config.asset_dir, PathBuf::from("assets"));
        assert_eq!(config.client_origin, "*");
        assert_eq!(config.max_model_bytes, DEFAULT_MAX_MODEL_BYTES);
        assert_eq!(config.polygon_mode, PolygonMode::Quad);
        assert_eq!(config.parse_rate_limit, PARSE_RATE_LIMIT);
    }

    #[test]
    fn test_port_wins_over_server_addr() {
        let config = config_from(&[("PORT", "9000"), ("SERVER_ADDR", "127.0.0.1:1234")]).unwrap();
        assert_eq!(config.server_addr.port(), 9000);

        let config = config_from(&[("SERVER_ADDR", "127.0.0.1:1234")]).unwrap();
        assert_eq!(config.server_addr.to_string(), "127.0.0.1:1234");
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("ASSET_DIR", "/srv/models"),
            ("POLYGON_MODE", "fan"),
            ("MAX_MODEL_BYTES", "1024"),
            ("PARSE_RATE_LIMIT", "5"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();
        assert_eq!(config.asset_dir, PathBuf::from("/srv/models"));
        assert_eq!(config.polygon_mode, PolygonMode::Fan);
        assert_eq!(config.max_model_bytes, 1024);
        assert_eq!(config.parse_rate_limit, 5);
        assert!(config.log_json);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config_from(&[("SERVER_ADDR", "not an address")]),
            Err(ConfigError::InvalidAddress)
        ));
        assert!(matches!(
            config_from(&[("POLYGON_MODE", "strip")]),
            Err(ConfigError::Invalid("POLYGON_MODE", _))
        ));
        assert!(matches!(
            config_from(&[("MAX_MODEL_BYTES", "lots")]),
            Err(ConfigError::Invalid("MAX_MODEL_BYTES", _))
        ));
    }
}
