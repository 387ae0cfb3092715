//! Live bulk-processing status channel.
//!
//! A [`StatusFanout`] owns one reader task that pulls snapshots from a
//! [`StatusSource`] and broadcasts them, in arrival order, to every
//! [`StatusSubscription`]. Snapshots are complete states: each one replaces
//! the subscriber's previous snapshot and nothing is merged. After a
//! disconnect the reader waits `reconnect_delay` and opens the source
//! again; snapshots missed in between are not replayed.

pub mod polling;
pub mod sse;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::FanoutConfig;
use crate::jobs::CancellationToken;
use crate::models::ProcessingStatus;
use crate::observability::Metrics;
use crate::transport::{ApiClient, RequestError};

pub use polling::PollingStatusSource;
pub use sse::{SseDecoder, SseEvent, SseStatusSource};

#[derive(Debug, Error)]
pub enum FanoutError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("Status stream interrupted: {0}")]
    Stream(String),
}

/// Snapshots from one connection; an error item or the end of the stream
/// means the connection is gone
pub type StatusStream = BoxStream<'static, Result<ProcessingStatus, FanoutError>>;

#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn open(&self) -> Result<StatusStream, FanoutError>;

    /// Short label for logs
    fn name(&self) -> &'static str;
}

/// A snapshot as delivered to subscribers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusUpdate {
    /// Arrival order across the fan-out's lifetime, starting at 1
    pub sequence: u64,
    pub received_at: DateTime<Utc>,
    pub snapshot: ProcessingStatus,
}

struct Reader {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Shared status channel with explicit connect/disconnect
pub struct StatusFanout {
    source: Arc<dyn StatusSource>,
    reconnect_delay: Duration,
    sender: broadcast::Sender<Arc<StatusUpdate>>,
    latest: Arc<watch::Sender<Option<Arc<StatusUpdate>>>>,
    reader: Mutex<Option<Reader>>,
    metrics: Arc<Metrics>,
}

impl StatusFanout {
    pub fn new(source: Arc<dyn StatusSource>, config: &FanoutConfig, metrics: Arc<Metrics>) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        let (latest, _) = watch::channel(None);
        Self {
            source,
            reconnect_delay: config.reconnect_delay.as_duration(),
            sender,
            latest: Arc::new(latest),
            reader: Mutex::new(None),
            metrics,
        }
    }

    /// Fan-out driven by the server's event stream
    pub fn sse(api: ApiClient, config: &FanoutConfig) -> Self {
        let metrics = api.metrics().clone();
        let source = SseStatusSource::new(api, config.stream_path.clone(), config.event_name.clone());
        Self::new(Arc::new(source), config, metrics)
    }

    /// Fan-out driven by periodic `GET /status`
    pub fn polling(api: ApiClient, config: &FanoutConfig) -> Self {
        let metrics = api.metrics().clone();
        let source = PollingStatusSource::new(api, config.poll_interval.as_duration());
        Self::new(Arc::new(source), config, metrics)
    }

    /// Start the reader task. Returns false if it was already running.
    pub fn connect(&self) -> bool {
        let mut reader = self.reader_slot();
        if reader.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            return false;
        }

        let cancel = CancellationToken::new();
        let task = ReaderTask {
            source: self.source.clone(),
            sender: self.sender.clone(),
            latest: self.latest.clone(),
            reconnect_delay: self.reconnect_delay,
            metrics: self.metrics.clone(),
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(task.run());
        info!(source = self.source.name(), "Status fan-out connected");

        *reader = Some(Reader { cancel, handle });
        true
    }

    /// Stop the reader task and wait for it to exit
    pub async fn disconnect(&self) {
        let reader = self.reader_slot().take();
        if let Some(reader) = reader {
            reader.cancel.cancel();
            if let Err(e) = reader.handle.await {
                warn!(error = %e, "Status reader task ended abnormally");
            }
            info!(source = self.source.name(), "Status fan-out disconnected");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.reader_slot()
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }

    /// New subscriber; it receives snapshots that arrive from now on
    pub fn subscribe(&self) -> StatusSubscription {
        StatusSubscription {
            receiver: self.sender.subscribe(),
            latest: self.latest.borrow().clone(),
            skipped: 0,
        }
    }

    /// Most recent snapshot seen by the fan-out
    pub fn latest(&self) -> Option<Arc<StatusUpdate>> {
        self.latest.borrow().clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    fn reader_slot(&self) -> MutexGuard<'_, Option<Reader>> {
        self.reader.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for StatusFanout {
    fn drop(&mut self) {
        if let Some(reader) = self.reader_slot().take() {
            reader.cancel.cancel();
        }
    }
}

struct ReaderTask {
    source: Arc<dyn StatusSource>,
    sender: broadcast::Sender<Arc<StatusUpdate>>,
    latest: Arc<watch::Sender<Option<Arc<StatusUpdate>>>>,
    reconnect_delay: Duration,
    metrics: Arc<Metrics>,
    cancel: CancellationToken,
}

impl ReaderTask {
    async fn run(self) {
        let mut sequence = 0u64;
        let mut connections = 0u64;

        loop {
            if connections > 0 {
                self.metrics.fanout_reconnected();
                debug!(source = self.source.name(), attempt = connections + 1, "Reconnecting status source");
            }
            connections += 1;

            let opened = tokio::select! {
                _ = self.cancel.cancelled() => return,
                opened = self.source.open() => opened,
            };

            match opened {
                Ok(mut stream) => loop {
                    let item = tokio::select! {
                        _ = self.cancel.cancelled() => return,
                        item = stream.next() => item,
                    };
                    match item {
                        Some(Ok(snapshot)) => {
                            sequence += 1;
                            self.publish(sequence, snapshot);
                        }
                        Some(Err(e)) => {
                            warn!(source = self.source.name(), error = %e, "Status source disconnected");
                            break;
                        }
                        None => {
                            info!(source = self.source.name(), "Status source closed");
                            break;
                        }
                    }
                },
                Err(e) => {
                    warn!(source = self.source.name(), error = %e, "Failed to open status source");
                }
            }

            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }
    }

    fn publish(&self, sequence: u64, snapshot: ProcessingStatus) {
        self.metrics.snapshot_received();
        let update = Arc::new(StatusUpdate {
            sequence,
            received_at: Utc::now(),
            snapshot,
        });
        debug!(
            sequence,
            processed = update.snapshot.processed_topics,
            total = update.snapshot.total_topics,
            "Status snapshot"
        );

        self.latest.send_replace(Some(update.clone()));
        // No subscribers is fine; the snapshot is still kept as latest
        let _ = self.sender.send(update);
    }
}

/// One consumer's view of the channel
pub struct StatusSubscription {
    receiver: broadcast::Receiver<Arc<StatusUpdate>>,
    latest: Option<Arc<StatusUpdate>>,
    skipped: u64,
}

impl StatusSubscription {
    /// Wait for the next snapshot; `None` once the fan-out is gone.
    ///
    /// A subscriber that fell behind skips to the oldest snapshot still
    /// buffered.
    pub async fn next(&mut self) -> Option<Arc<StatusUpdate>> {
        loop {
            match self.receiver.recv().await {
                Ok(update) => {
                    self.latest = Some(update.clone());
                    return Some(update);
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    self.skipped += missed;
                    debug!(missed, "Subscriber lagged, skipping ahead");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Most recent snapshot this subscriber has seen
    pub fn latest(&self) -> Option<&StatusUpdate> {
        self.latest.as_deref()
    }

    /// Snapshots dropped because this subscriber lagged
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}
