use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "TOPICFORGE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/topicforge.toml";
const ENV_PREFIX: &str = "TOPICFORGE";
const ENV_SEPARATOR: &str = "__";
const API_TOKEN_ENV_VAR: &str = "TOPICFORGE_API_TOKEN";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    load_with(None)
}

/// Same as [`load`], with an explicit file taking precedence over `TOPICFORGE_CONFIG`
pub fn load_with(config_path: Option<PathBuf>) -> Result<Config, ConfigError> {
    let _ = dotenvy::dotenv();

    let config_path = config_path.unwrap_or_else(|| {
        env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    });

    let mut config = load_from_sources(config_path)?;

    load_secrets(&mut config);

    Ok(config)
}

/// Secrets are never read from TOML files, only from the environment
fn load_secrets(config: &mut Config) {
    if let Ok(token) = env::var(API_TOKEN_ENV_VAR) {
        if !token.trim().is_empty() {
            config.client.api_token = Some(token);
        }
    }
}

/// Load configuration from a specific path and environment
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::debug!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // TOPICFORGE__CLIENT__BASE_URL -> client.base_url
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.client.base_url, "http://localhost:3001/api");
        assert_eq!(config.ingest.default_batch_size, 3);
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[client]
base_url = "https://content.example.com/api"
request_timeout = "45s"

[ingest]
default_batch_size = 5

[polling]
interval = "1s"
status_timeout = 4000
max_wait = "10m"

[fanout]
stream_path = "/events"
reconnect_delay = "250ms"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.client.base_url, "https://content.example.com/api");
        assert_eq!(config.client.request_timeout.as_duration(), Duration::from_secs(45));
        assert_eq!(config.ingest.default_batch_size, 5);
        assert_eq!(config.polling.interval.as_duration(), Duration::from_secs(1));
        assert_eq!(config.polling.status_timeout.as_duration(), Duration::from_secs(4));
        assert_eq!(
            config.polling.max_wait.map(|d| d.as_duration()),
            Some(Duration::from_secs(600))
        );
        assert_eq!(config.fanout.stream_path, "/events");
        assert_eq!(config.fanout.reconnect_delay.as_duration(), Duration::from_millis(250));
        // Untouched sections keep their defaults
        assert_eq!(config.fanout.event_name, "status_update");
        assert_eq!(config.telemetry.log_level, "info");
    }

    // Environment overrides are not exercised here: env::set_var is unsafe in edition 2024
}
