//! Runtime configuration
//!
//! Configuration is read once at startup (usually from the process
//! environment) and then passed by value or `Arc` into the n8n client, the
//! tool set and both front ends. Nothing mutates it afterwards.

use std::time::Duration;

use serde::Serialize;

use crate::error::ConfigError;

/// Log levels accepted in `LOG_LEVEL`
pub const LOG_LEVELS: [&str; 5] = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line
    Json,
    /// Human readable
    Console,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "console" => Some(LogFormat::Console),
            _ => None,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the n8n instance, without trailing slash
    pub n8n_url: String,
    /// API key sent as `X-N8N-API-KEY`
    pub n8n_api_key: String,
    /// Per-request timeout in seconds
    pub n8n_timeout_secs: u64,
    /// Attempts per request when the network fails
    pub n8n_max_retries: u32,
    /// Bind host for the MCP HTTP front end
    pub mcp_server_host: String,
    /// Port for the MCP HTTP front end
    pub mcp_server_port: u16,
    /// Port for the management API
    pub management_api_port: u16,
    /// Upper-case log level name
    pub log_level: String,
    pub log_format: LogFormat,
    /// Optional token for MCP callers
    pub mcp_auth_token: Option<String>,
    /// Operator portal base URL, added to the CORS allow list
    pub portal_url: Option<String>,
    pub portal_webhook_token: Option<String>,
}

impl Config {
    /// Start building a configuration from the two required values
    pub fn builder(n8n_url: impl Into<String>, n8n_api_key: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder {
            n8n_url: n8n_url.into(),
            n8n_api_key: n8n_api_key.into(),
            ..ConfigBuilder::default()
        }
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let n8n_url = get("N8N_URL").ok_or(ConfigError::Missing { name: "N8N_URL" })?;
        let n8n_api_key = get("N8N_API_KEY").ok_or(ConfigError::Missing { name: "N8N_API_KEY" })?;

        let mut builder = Config::builder(n8n_url, n8n_api_key);

        if let Some(v) = get("N8N_TIMEOUT") {
            builder = builder.timeout_secs(parse_number("N8N_TIMEOUT", &v)?);
        }
        if let Some(v) = get("N8N_MAX_RETRIES") {
            builder = builder.max_retries(parse_number("N8N_MAX_RETRIES", &v)?);
        }
        if let Some(v) = get("MCP_SERVER_HOST") {
            builder = builder.mcp_host(v);
        }
        if let Some(v) = get("MCP_SERVER_PORT") {
            builder = builder.mcp_port(parse_number("MCP_SERVER_PORT", &v)?);
        }
        if let Some(v) = get("MANAGEMENT_API_PORT") {
            builder = builder.management_port(parse_number("MANAGEMENT_API_PORT", &v)?);
        }
        if let Some(v) = get("LOG_LEVEL") {
            builder = builder.log_level(v);
        }
        if let Some(v) = get("LOG_FORMAT") {
            let format = LogFormat::parse(&v).ok_or_else(|| ConfigError::Invalid {
                name: "LOG_FORMAT",
                value: v.clone(),
                reason: "expected json or console".to_string(),
            })?;
            builder = builder.log_format(format);
        }
        if let Some(v) = get("MCP_AUTH_TOKEN") {
            builder = builder.mcp_auth_token(v);
        }
        if let Some(v) = get("DJANGO_PORTAL_URL") {
            builder = builder.portal_url(v);
        }
        if let Some(v) = get("DJANGO_WEBHOOK_TOKEN") {
            builder = builder.portal_webhook_token(v);
        }

        builder.build()
    }

    /// Base URL of the n8n public API
    pub fn api_base_url(&self) -> String {
        format!("{}/api/v1", self.n8n_url)
    }

    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.n8n_timeout_secs)
    }

    /// Both portal URL and webhook token are configured
    pub fn portal_integration_enabled(&self) -> bool {
        self.portal_url.is_some() && self.portal_webhook_token.is_some()
    }

    /// A view safe to hand out over the management API
    pub fn redacted(&self) -> RedactedConfig {
        RedactedConfig {
            n8n_url: self.n8n_url.clone(),
            n8n_api_key_set: !self.n8n_api_key.is_empty(),
            mcp_server_port: self.mcp_server_port,
            management_api_port: self.management_api_port,
            log_level: self.log_level.clone(),
        }
    }
}

/// Configuration with secrets removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedactedConfig {
    pub n8n_url: String,
    pub n8n_api_key_set: bool,
    pub mcp_server_port: u16,
    pub management_api_port: u16,
    pub log_level: String,
}

/// Builder for [`Config`]
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    n8n_url: String,
    n8n_api_key: String,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    mcp_host: Option<String>,
    mcp_port: Option<u16>,
    management_port: Option<u16>,
    log_level: Option<String>,
    log_format: Option<LogFormat>,
    mcp_auth_token: Option<String>,
    portal_url: Option<String>,
    portal_webhook_token: Option<String>,
}

impl ConfigBuilder {
    /// Set the request timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Set the attempt count for network failures
    pub fn max_retries(mut self, attempts: u32) -> Self {
        self.max_retries = Some(attempts);
        self
    }

    pub fn mcp_host(mut self, host: impl Into<String>) -> Self {
        self.mcp_host = Some(host.into());
        self
    }

    pub fn mcp_port(mut self, port: u16) -> Self {
        self.mcp_port = Some(port);
        self
    }

    pub fn management_port(mut self, port: u16) -> Self {
        self.management_port = Some(port);
        self
    }

    /// Set the log level (validated in `build`)
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.log_format = Some(format);
        self
    }

    pub fn mcp_auth_token(mut self, token: impl Into<String>) -> Self {
        self.mcp_auth_token = Some(token.into());
        self
    }

    pub fn portal_url(mut self, url: impl Into<String>) -> Self {
        self.portal_url = Some(url.into());
        self
    }

    pub fn portal_webhook_token(mut self, token: impl Into<String>) -> Self {
        self.portal_webhook_token = Some(token.into());
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> Result<Config, ConfigError> {
        if self.n8n_url.trim().is_empty() {
            return Err(ConfigError::Missing { name: "N8N_URL" });
        }
        if self.n8n_api_key.trim().is_empty() {
            return Err(ConfigError::Missing { name: "N8N_API_KEY" });
        }

        let log_level = self
            .log_level
            .unwrap_or_else(|| "INFO".to_string())
            .to_ascii_uppercase();
        if !LOG_LEVELS.contains(&log_level.as_str()) {
            return Err(ConfigError::Invalid {
                name: "LOG_LEVEL",
                value: log_level,
                reason: format!("expected one of {}", LOG_LEVELS.join(", ")),
            });
        }

        Ok(Config {
            n8n_url: self.n8n_url.trim_end_matches('/').to_string(),
            n8n_api_key: self.n8n_api_key,
            n8n_timeout_secs: self.timeout_secs.unwrap_or(30),
            n8n_max_retries: self.max_retries.unwrap_or(3),
            mcp_server_host: self.mcp_host.unwrap_or_else(|| "0.0.0.0".to_string()),
            mcp_server_port: self.mcp_port.unwrap_or(8001),
            management_api_port: self.management_port.unwrap_or(8002),
            log_level,
            log_format: self.log_format.unwrap_or(LogFormat::Json),
            mcp_auth_token: self.mcp_auth_token,
            portal_url: self.portal_url,
            portal_webhook_token: self.portal_webhook_token,
        })
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: "expected a non-negative integer".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("N8N_URL", "http://n8n:5678/"),
            ("N8N_API_KEY", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.n8n_url, "http://n8n:5678");
        assert_eq!(config.api_base_url(), "http://n8n:5678/api/v1");
        assert_eq!(config.n8n_timeout_secs, 30);
        assert_eq!(config.n8n_max_retries, 3);
        assert_eq!(config.mcp_server_host, "0.0.0.0");
        assert_eq!(config.mcp_server_port, 8001);
        assert_eq!(config.management_api_port, 8002);
        assert_eq!(config.log_level, "INFO");
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(!config.portal_integration_enabled());
    }

    #[test]
    fn test_missing_required() {
        let err = Config::from_lookup(lookup(&[("N8N_API_KEY", "secret")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing { name: "N8N_URL" });

        let err = Config::from_lookup(lookup(&[("N8N_URL", "http://n8n"), ("N8N_API_KEY", "  ")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing { name: "N8N_API_KEY" });
    }

    #[test]
    fn test_log_level_normalized_and_validated() {
        let config = Config::builder("http://n8n", "k").log_level("warning").build().unwrap();
        assert_eq!(config.log_level, "WARNING");

        let err = Config::builder("http://n8n", "k").log_level("verbose").build().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "LOG_LEVEL", .. }));
    }

    #[test]
    fn test_invalid_numbers_and_format() {
        let err = Config::from_lookup(lookup(&[
            ("N8N_URL", "http://n8n"),
            ("N8N_API_KEY", "k"),
            ("MCP_SERVER_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "MCP_SERVER_PORT", .. }));

        let err = Config::from_lookup(lookup(&[
            ("N8N_URL", "http://n8n"),
            ("N8N_API_KEY", "k"),
            ("LOG_FORMAT", "xml"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "LOG_FORMAT", .. }));
    }

    #[test]
    fn test_overrides_and_redaction() {
        let config = Config::from_lookup(lookup(&[
            ("N8N_URL", "https://automation.example.com"),
            ("N8N_API_KEY", "super-secret"),
            ("N8N_TIMEOUT", "5"),
            ("MANAGEMENT_API_PORT", "9000"),
            ("LOG_FORMAT", "Console"),
            ("DJANGO_PORTAL_URL", "https://portal.example.com"),
            ("DJANGO_WEBHOOK_TOKEN", "hook"),
        ]))
        .unwrap();

        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.log_format, LogFormat::Console);
        assert!(config.portal_integration_enabled());

        let redacted = config.redacted();
        assert!(redacted.n8n_api_key_set);
        assert_eq!(redacted.management_api_port, 9000);
        let json = serde_json::to_string(&redacted).unwrap();
        assert!(!json.contains("super-secret"));
    }
}
