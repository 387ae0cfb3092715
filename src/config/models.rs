use crate::humanize::HumanDuration;
use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub fanout: FanoutConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Connection settings for the content-generation service
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Fixed base path every endpoint is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: HumanDuration,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: HumanDuration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Bearer token (loaded from environment, not from config file)
    #[serde(skip)]
    pub api_token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
            api_token: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3001/api".to_string()
}

fn default_connect_timeout() -> HumanDuration {
    HumanDuration::from_secs(10)
}

fn default_request_timeout() -> HumanDuration {
    HumanDuration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("topicforge/{}", env!("CARGO_PKG_VERSION"))
}

/// Bulk topic submission settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    #[serde(default = "default_batch_size")]
    pub default_batch_size: usize,
    #[serde(default = "default_max_topics_per_submit")]
    pub max_topics_per_submit: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            default_batch_size: default_batch_size(),
            max_topics_per_submit: default_max_topics_per_submit(),
        }
    }
}

fn default_batch_size() -> usize {
    3
}

fn default_max_topics_per_submit() -> usize {
    500
}

/// Job status polling policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollingConfig {
    #[serde(default = "default_poll_interval")]
    pub interval: HumanDuration,
    /// Upper bound for a single status check; exceeding it counts as transient
    #[serde(default = "default_status_timeout")]
    pub status_timeout: HumanDuration,
    #[serde(default = "default_max_transient_failures")]
    pub max_transient_failures: u32,
    /// Overall wait budget; unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_wait: Option<HumanDuration>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: default_poll_interval(),
            status_timeout: default_status_timeout(),
            max_transient_failures: default_max_transient_failures(),
            max_wait: None,
        }
    }
}

fn default_poll_interval() -> HumanDuration {
    HumanDuration::from_secs(2)
}

fn default_status_timeout() -> HumanDuration {
    HumanDuration::from_secs(10)
}

fn default_max_transient_failures() -> u32 {
    5
}

/// Live status channel settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FanoutConfig {
    #[serde(default = "default_stream_path")]
    pub stream_path: String,
    #[serde(default = "default_event_name")]
    pub event_name: String,
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay: HumanDuration,
    /// Interval used when the channel is driven by `GET /status` instead of push
    #[serde(default = "default_poll_interval")]
    pub poll_interval: HumanDuration,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            stream_path: default_stream_path(),
            event_name: default_event_name(),
            reconnect_delay: default_reconnect_delay(),
            poll_interval: default_poll_interval(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_stream_path() -> String {
    "/status/stream".to_string()
}

fn default_event_name() -> String {
    "status_update".to_string()
}

fn default_reconnect_delay() -> HumanDuration {
    HumanDuration::from_secs(3)
}

fn default_channel_capacity() -> usize {
    64
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.client.base_url, "http://localhost:3001/api");
        assert_eq!(config.client.request_timeout.as_duration(), Duration::from_secs(30));
        assert_eq!(config.ingest.default_batch_size, 3);
        assert_eq!(config.polling.interval.as_duration(), Duration::from_secs(2));
        assert!(config.polling.max_wait.is_none());
        assert_eq!(config.fanout.event_name, "status_update");
        assert!(config.client.user_agent.starts_with("topicforge/"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
[polling]
interval = "500ms"
        "#,
        )
        .unwrap();

        assert_eq!(config.polling.interval.as_duration(), Duration::from_millis(500));
        assert_eq!(config.polling.max_transient_failures, 5);
        assert_eq!(config.fanout.channel_capacity, 64);
    }
}
