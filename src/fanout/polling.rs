use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use std::time::Duration;
use tracing::debug;

use super::{FanoutError, StatusSource, StatusStream};
use crate::models::ProcessingStatus;
use crate::transport::ApiClient;

/// Pull source: `GET /status` every `interval`.
///
/// Only snapshots that differ from the previous one are emitted; the first
/// snapshot after opening is always emitted.
pub struct PollingStatusSource {
    api: ApiClient,
    interval: Duration,
}

impl PollingStatusSource {
    pub fn new(api: ApiClient, interval: Duration) -> Self {
        Self { api, interval }
    }
}

#[async_trait]
impl StatusSource for PollingStatusSource {
    async fn open(&self) -> Result<StatusStream, FanoutError> {
        let first: ProcessingStatus = self.api.get("/status").await?;

        let api = self.api.clone();
        let interval = self.interval;
        let rest = stream::unfold(first.clone(), move |previous| {
            let api = api.clone();
            async move {
                loop {
                    tokio::time::sleep(interval).await;
                    match api.get::<ProcessingStatus>("/status").await {
                        Ok(status) if status == previous => {
                            debug!("Status unchanged");
                        }
                        Ok(status) => return Some((Ok(status.clone()), status)),
                        Err(e) => return Some((Err(FanoutError::from(e)), previous)),
                    }
                }
            }
        });

        Ok(stream::once(async move { Ok::<_, FanoutError>(first) }).chain(rest).boxed())
    }

    fn name(&self) -> &'static str {
        "polling"
    }
}
