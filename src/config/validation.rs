//! Configuration validation
//!
//! Validates StarCache configuration for correctness:
//! - Non-zero port and timeout
//! - http(s) URLs for the upstream API and raw-content base
//! - A non-empty token variable name

use super::app_config::AppConfig;
use crate::StarCacheError;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Validate a StarCache configuration
pub fn validate_config(config: &AppConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if config.server.port == 0 {
        errors.push(ValidationError::new(
            "server.port",
            "Port must be greater than 0",
        ));
    }

    if config.github.timeout_secs == 0 {
        errors.push(ValidationError::new(
            "github.timeout_secs",
            "Timeout must be greater than 0",
        ));
    }

    for (field, url) in [
        ("github.api_url", &config.github.api_url),
        ("github.raw_base_url", &config.github.raw_base_url),
    ] {
        if !is_http_url(url) {
            errors.push(ValidationError::new(
                field,
                format!("Invalid URL (expected http:// or https://): {}", url),
            ));
        }
    }

    if config.github.token_env.trim().is_empty() {
        errors.push(ValidationError::new(
            "github.token_env",
            "Token environment variable name cannot be empty",
        ));
    }

    if config.github.token().is_none() {
        tracing::warn!(
            env_var = %config.github.token_env,
            "GitHub token not set; unauthenticated requests are heavily rate limited"
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate and convert the error list into a single StarCacheError
pub fn validate_config_result(config: &AppConfig) -> crate::Result<()> {
    validate_config(config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        StarCacheError::Config(format!(
            "Configuration validation failed:\n  - {}",
            messages.join("\n  - ")
        ))
    })
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
