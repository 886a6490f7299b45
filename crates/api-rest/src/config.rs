//! API configuration.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host to bind to
    pub host: String,

    /// Server port to bind to
    pub port: u16,

    /// Application name, used as the service name in logs and docs
    pub app_name: String,

    /// Prefix prepended to every API route
    pub root_url: String,

    /// Path of the plain health check route
    pub health_check_url: String,

    /// Base path of the API documentation
    pub api_doc_url: String,

    /// Serve the OpenAPI document and Swagger UI
    pub enable_swagger: bool,

    /// Maximum request body size in bytes
    pub max_body_size: usize,

    /// Request timeout in seconds
    pub request_timeout_seconds: u64,

    /// CORS allowed origins
    pub cors_allowed_origins: Vec<String>,

    /// Log level
    pub log_level: String,

    /// Emit logs as JSON
    pub log_json: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            app_name: "articles-api".to_string(),
            root_url: String::new(),
            health_check_url: "/health_check".to_string(),
            api_doc_url: "/api_doc".to_string(),
            enable_swagger: true,
            max_body_size: 10 * 1024 * 1024, // 10 MB
            request_timeout_seconds: 30,
            cors_allowed_origins: vec!["*".to_string()],
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl ApiConfig {
    /// Load configuration from files and environment variables.
    ///
    /// Later sources override earlier ones:
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. Environment variables (prefixed with APP_), e.g. `APP_PORT=8080`
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let api_config: ApiConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        api_config.validate()?;

        Ok(api_config)
    }

    /// Validate the configuration
    fn validate(&self) -> anyhow::Result<()> {
        if self.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.max_body_size == 0 {
            anyhow::bail!("Maximum body size must be greater than 0");
        }

        for (name, url) in [
            ("health_check_url", &self.health_check_url),
            ("api_doc_url", &self.api_doc_url),
        ] {
            if !url.starts_with('/') {
                anyhow::bail!("{name} must start with '/', got {url:?}");
            }
        }

        if !self.root_url.is_empty() && !self.root_url.starts_with('/') {
            anyhow::bail!("root_url must be empty or start with '/'");
        }

        Ok(())
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Get server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Join an API path onto the configured root url
    pub fn api_path(&self, path: &str) -> String {
        format!("{}{}", self.root_url.trim_end_matches('/'), path)
    }

    /// Path the OpenAPI document is served from
    pub fn openapi_json_path(&self) -> String {
        format!("{}/openapi.json", self.api_doc_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ApiConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server_address(), "0.0.0.0:5000");
    }

    #[test]
    fn test_api_path_with_root_url() {
        let mut config = ApiConfig::default();
        assert_eq!(config.api_path("/create_article"), "/create_article");

        config.root_url = "/api/".to_string();
        assert_eq!(config.api_path("/create_article"), "/api/create_article");
    }

    #[test]
    fn test_openapi_json_path() {
        let config = ApiConfig::default();
        assert_eq!(config.openapi_json_path(), "/api_doc/openapi.json");
    }

    #[test]
    fn test_relative_health_check_url_rejected() {
        let config = ApiConfig {
            health_check_url: "health_check".to_string(),
            ..ApiConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
