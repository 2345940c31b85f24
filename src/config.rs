//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honored for local development.

use chrono_tz::Tz;
use std::env;
use std::str::FromStr;

/// Where durable state lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Firestore,
    /// In-process only; state is lost on restart
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StorageBackend::Firestore),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(ConfigError::Invalid("STORAGE_BACKEND", other.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Allowed CORS origin for the report frontend
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    pub storage: StorageBackend,
    /// Civil time zone for calendar report windows
    pub timezone: Tz,
    /// JSON activity catalog; the built-in catalog is used when unset
    pub catalog_path: Option<String>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            storage: StorageBackend::Memory,
            timezone: Tz::UTC,
            catalog_path: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", raw))?,
            Err(_) => 8080,
        };

        let storage = match env::var("STORAGE_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => StorageBackend::Firestore,
        };

        let timezone = match env::var("TRACKER_TIMEZONE") {
            Ok(raw) => raw
                .trim()
                .parse::<Tz>()
                .map_err(|_| ConfigError::Invalid("TRACKER_TIMEZONE", raw))?,
            Err(_) => Tz::UTC,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port,
            storage,
            timezone,
            catalog_path: env::var("ACTIVITY_CATALOG_PATH")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment mutation is process-wide; keep all env-driven checks in
    // one test so they cannot interleave.
    #[test]
    fn test_config_from_env() {
        env::set_var("PORT", "9090");
        env::set_var("STORAGE_BACKEND", "memory");
        env::set_var("TRACKER_TIMEZONE", "Asia/Taipei");
        env::set_var("ACTIVITY_CATALOG_PATH", "catalog.json");

        let config = Config::from_env().expect("Config should load");
        assert_eq!(config.port, 9090);
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.timezone, chrono_tz::Asia::Taipei);
        assert_eq!(config.catalog_path.as_deref(), Some("catalog.json"));

        env::set_var("TRACKER_TIMEZONE", "Mars/Olympus_Mons");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid("TRACKER_TIMEZONE", _))
        ));

        env::remove_var("TRACKER_TIMEZONE");
        env::set_var("STORAGE_BACKEND", "postgres");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid("STORAGE_BACKEND", _))
        ));

        for key in ["PORT", "STORAGE_BACKEND", "ACTIVITY_CATALOG_PATH"] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_storage_backend_parse() {
        assert_eq!(
            " Firestore ".parse::<StorageBackend>().unwrap(),
            StorageBackend::Firestore
        );
        assert_eq!(
            "memory".parse::<StorageBackend>().unwrap(),
            StorageBackend::Memory
        );
    }
}
