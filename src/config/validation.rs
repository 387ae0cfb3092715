use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid base_url scheme '{url}', expected 'http://' or 'https://'")]
    InvalidBaseUrl { url: String },

    #[error("{field} must be positive")]
    ZeroValue { field: &'static str },

    #[error("default_batch_size ({batch_size}) exceeds max_topics_per_submit ({max})")]
    BatchSizeExceedsLimit { batch_size: usize, max: usize },

    #[error("fanout.stream_path must start with '/': {path}")]
    InvalidStreamPath { path: String },

    #[error("fanout.event_name must not be blank")]
    BlankEventName,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_client(config)?;
    validate_ingest(config)?;
    validate_polling(config)?;
    validate_fanout(config)?;
    Ok(())
}

fn validate_client(config: &Config) -> Result<(), ValidationError> {
    let url = config.client.base_url.trim();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ValidationError::InvalidBaseUrl {
            url: config.client.base_url.clone(),
        });
    }

    if config.client.request_timeout.is_zero() {
        return Err(ValidationError::ZeroValue {
            field: "client.request_timeout",
        });
    }

    Ok(())
}

fn validate_ingest(config: &Config) -> Result<(), ValidationError> {
    if config.ingest.default_batch_size == 0 {
        return Err(ValidationError::ZeroValue {
            field: "ingest.default_batch_size",
        });
    }

    if config.ingest.max_topics_per_submit == 0 {
        return Err(ValidationError::ZeroValue {
            field: "ingest.max_topics_per_submit",
        });
    }

    if config.ingest.default_batch_size > config.ingest.max_topics_per_submit {
        return Err(ValidationError::BatchSizeExceedsLimit {
            batch_size: config.ingest.default_batch_size,
            max: config.ingest.max_topics_per_submit,
        });
    }

    Ok(())
}

fn validate_polling(config: &Config) -> Result<(), ValidationError> {
    if config.polling.interval.is_zero() {
        return Err(ValidationError::ZeroValue {
            field: "polling.interval",
        });
    }

    if config.polling.status_timeout.is_zero() {
        return Err(ValidationError::ZeroValue {
            field: "polling.status_timeout",
        });
    }

    Ok(())
}

fn validate_fanout(config: &Config) -> Result<(), ValidationError> {
    if !config.fanout.stream_path.starts_with('/') {
        return Err(ValidationError::InvalidStreamPath {
            path: config.fanout.stream_path.clone(),
        });
    }

    if config.fanout.event_name.trim().is_empty() {
        return Err(ValidationError::BlankEventName);
    }

    if config.fanout.channel_capacity == 0 {
        return Err(ValidationError::ZeroValue {
            field: "fanout.channel_capacity",
        });
    }

    if config.fanout.poll_interval.is_zero() {
        return Err(ValidationError::ZeroValue {
            field: "fanout.poll_interval",
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanize::HumanDuration;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = Config::default();
        config.client.base_url = "ftp://content.example.com".to_string();

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::InvalidBaseUrl { .. })));
    }

    #[test]
    fn test_zero_batch_size() {
        let mut config = Config::default();
        config.ingest.default_batch_size = 0;

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::ZeroValue {
                field: "ingest.default_batch_size"
            })
        ));
    }

    #[test]
    fn test_batch_size_above_submit_limit() {
        let mut config = Config::default();
        config.ingest.default_batch_size = 10;
        config.ingest.max_topics_per_submit = 5;

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::BatchSizeExceedsLimit { batch_size: 10, max: 5 })
        ));
    }

    #[test]
    fn test_zero_poll_interval() {
        let mut config = Config::default();
        config.polling.interval = HumanDuration::from_millis(0);

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::ZeroValue { field: "polling.interval" })
        ));
    }

    #[test]
    fn test_stream_path_requires_leading_slash() {
        let mut config = Config::default();
        config.fanout.stream_path = "status/stream".to_string();

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::InvalidStreamPath { .. })));
    }

    #[test]
    fn test_blank_event_name() {
        let mut config = Config::default();
        config.fanout.event_name = "  ".to_string();

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::BlankEventName)));
    }
}
