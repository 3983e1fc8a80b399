use crate::error::ConfigError;
use std::{env, path::PathBuf, str::FromStr};
use tracing::Level;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    pub database_url: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_kiosk_per_min: u32,
    pub rate_login_per_min: u32,

    pub cors_permissive: bool,

    /// SQL dump replayed once at startup
    pub import_sql_path: Option<PathBuf>,

    pub log_level: Level,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            server_addr: lookup("SERVER_ADDR").ok_or(ConfigError::Missing("SERVER_ADDR"))?,
            database_url: get("DATABASE_URL", "sqlite://attendance.db"),
            api_prefix: get("API_PREFIX", "/api"),

            rate_kiosk_per_min: parse_value("RATE_KIOSK_PER_MIN", &get("RATE_KIOSK_PER_MIN", "120"))?,
            rate_login_per_min: parse_value("RATE_LOGIN_PER_MIN", &get("RATE_LOGIN_PER_MIN", "60"))?,

            cors_permissive: parse_value("CORS_PERMISSIVE", &get("CORS_PERMISSIVE", "true"))?,

            import_sql_path: lookup("IMPORT_SQL_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),

            log_level: parse_value("LOG_LEVEL", &get("LOG_LEVEL", "debug"))?,
            log_dir: get("LOG_DIR", "logs"),
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            server_addr: "127.0.0.1:0".to_string(),
            database_url: "sqlite::memory:".to_string(),
            api_prefix: "/api".to_string(),
            rate_kiosk_per_min: 1000,
            rate_login_per_min: 1000,
            cors_permissive: false,
            import_sql_path: None,
            log_level: Level::DEBUG,
            log_dir: "logs".to_string(),
        }
    }
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}
