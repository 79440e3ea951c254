//! API configuration.

use std::time::Duration;

use huriwake_models::FolderLayout;

use crate::error::{ApiError, ApiResult};

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second
    pub rate_limit_rps: u32,
    /// Rate limit burst
    pub rate_limit_burst: u32,
    /// Request timeout
    pub request_timeout: Duration,
    /// Max request body size (screenshots arrive base64-encoded)
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Serve Prometheus metrics at /metrics
    pub metrics_enabled: bool,
    /// Classification folder settings
    pub folders: FolderSettings,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            rate_limit_burst: 20,
            request_timeout: Duration::from_secs(60),
            max_body_size: 20 * 1024 * 1024, // 20MB
            environment: "development".to_string(),
            metrics_enabled: true,
            folders: FolderSettings::default(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: env_parse("RATE_LIMIT_RPS").unwrap_or(defaults.rate_limit_rps),
            rate_limit_burst: env_parse("RATE_LIMIT_BURST").unwrap_or(defaults.rate_limit_burst),
            request_timeout: env_parse("REQUEST_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
            folders: FolderSettings::from_env(),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

/// Where classified screenshots live and what their folders are called.
#[derive(Debug, Clone, Default)]
pub struct FolderSettings {
    /// Folder holding the bucket folders
    pub root_folder_id: Option<String>,
    /// Bucket and verdict folder names
    pub layout: FolderLayout,
    /// Create missing bucket folders instead of filing into the root
    pub auto_create: bool,
}

impl FolderSettings {
    pub fn from_env() -> Self {
        let locale = std::env::var("FOLDER_LOCALE").unwrap_or_else(|_| "en".to_string());
        let mut layout = FolderLayout::for_locale(&locale);

        if let Some(name) = env_non_empty("APPROVED_FOLDER_NAME") {
            layout.approved = name;
        }
        if let Some(name) = env_non_empty("REJECTED_FOLDER_NAME") {
            layout.rejected = name;
        }

        Self {
            root_folder_id: env_non_empty("DRIVE_FOLDER_ID"),
            layout,
            auto_create: std::env::var("AUTO_CREATE_BUCKET_FOLDERS")
                .map(|v| !matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "no"))
                .unwrap_or(true),
        }
    }

    /// Root folder id, or a configuration error when unset.
    pub fn root(&self) -> ApiResult<&str> {
        self.root_folder_id
            .as_deref()
            .ok_or_else(|| ApiError::config("DRIVE_FOLDER_ID is not set"))
    }
}

pub(crate) fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const FOLDER_VARS: [&str; 5] = [
        "FOLDER_LOCALE",
        "APPROVED_FOLDER_NAME",
        "REJECTED_FOLDER_NAME",
        "AUTO_CREATE_BUCKET_FOLDERS",
        "DRIVE_FOLDER_ID",
    ];

    fn clear_folder_env() {
        for key in FOLDER_VARS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_folder_settings_defaults() {
        clear_folder_env();
        let settings = FolderSettings::from_env();
        assert!(settings.auto_create);
        assert_eq!(settings.layout, FolderLayout::english());
        assert!(matches!(settings.root(), Err(ApiError::Config(_))));
    }

    #[test]
    #[serial]
    fn test_japanese_layout_with_override() {
        clear_folder_env();
        std::env::set_var("FOLDER_LOCALE", "ja");
        std::env::set_var("REJECTED_FOLDER_NAME", "NG");
        std::env::set_var("AUTO_CREATE_BUCKET_FOLDERS", "false");
        std::env::set_var("DRIVE_FOLDER_ID", "root-9");

        let settings = FolderSettings::from_env();
        assert_eq!(settings.layout.approved, "納品可能");
        assert_eq!(settings.layout.rejected, "NG");
        assert!(!settings.auto_create);
        assert_eq!(settings.root().unwrap(), "root-9");

        clear_folder_env();
    }

    #[test]
    #[serial]
    fn test_api_config_defaults() {
        for key in ["API_PORT", "MAX_BODY_SIZE", "CORS_ORIGINS", "ENVIRONMENT"] {
            std::env::remove_var(key);
        }
        let config = ApiConfig::from_env();
        assert_eq!(config.port, 8000);
        assert_eq!(config.max_body_size, 20 * 1024 * 1024);
        assert_eq!(config.cors_origins, vec!["*".to_string()]);
        assert!(!config.is_production());
    }
}
