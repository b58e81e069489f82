//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::DevServerConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::routing::{ProxySpec, RouteConfigError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("package.json parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Route(#[from] RouteConfigError),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<DevServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: DevServerConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Read the `proxy` field of a `package.json`.
///
/// A missing field disables proxying.
pub fn load_package_proxy(path: &Path) -> Result<Option<ProxySpec>, ConfigError> {
    let content = fs::read_to_string(path)?;
    let manifest: serde_json::Value = serde_json::from_str(&content)?;

    match manifest.get("proxy") {
        Some(value) => Ok(ProxySpec::from_json(value)?),
        None => Ok(None),
    }
}

/// The typed proxy setting of a loaded configuration.
pub fn proxy_spec(config: &DevServerConfig) -> Result<Option<ProxySpec>, RouteConfigError> {
    match &config.proxy {
        Some(value) => ProxySpec::from_toml(value),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_config() {
        let result = load_config(Path::new("/nonexistent/dev-proxy.toml"));
        assert!(matches!(result.unwrap_err(), ConfigError::Io(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev-proxy.toml");
        fs::write(&path, "proxy = [").unwrap();

        assert!(matches!(load_config(&path).unwrap_err(), ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_rejects_semantic_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev-proxy.toml");
        fs::write(&path, "sidecar_prefix = \"ws\"\n[timeouts]\nconnect_secs = 0\n").unwrap();

        let err = load_config(&path).unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 2));
        assert!(message.contains("sidecar_prefix"));
        assert!(message.contains("timeouts.connect_secs"));
    }

    #[test]
    fn test_load_valid_config_with_proxy_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev-proxy.toml");
        fs::write(
            &path,
            r#"
public_dir = "build"

[listener]
bind_address = "127.0.0.1:3100"

[proxy]
"/api" = "http://localhost:4000"
"/api/v2" = "http://localhost:4002"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:3100");
        let spec = proxy_spec(&config).unwrap().unwrap();
        assert_eq!(
            spec.entries(),
            vec![
                ("/api", "http://localhost:4000"),
                ("/api/v2", "http://localhost:4002")
            ]
        );
    }

    #[test]
    fn test_proxy_of_wrong_type_is_route_error() {
        let config: DevServerConfig = toml::from_str("proxy = 42").unwrap();
        assert!(matches!(
            proxy_spec(&config).unwrap_err(),
            RouteConfigError::InvalidType { found: "integer" }
        ));
    }

    #[test]
    fn test_package_json_proxy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");

        fs::write(&path, r#"{"name": "app", "proxy": "http://localhost:4000"}"#).unwrap();
        assert_eq!(
            load_package_proxy(&path).unwrap(),
            Some(ProxySpec::Single("http://localhost:4000".into()))
        );

        fs::write(&path, r#"{"name": "app"}"#).unwrap();
        assert_eq!(load_package_proxy(&path).unwrap(), None);

        fs::write(&path, r#"{"name": "app", "proxy": 42}"#).unwrap();
        assert!(matches!(
            load_package_proxy(&path).unwrap_err(),
            ConfigError::Route(RouteConfigError::InvalidType { found: "number" })
        ));
    }
}
