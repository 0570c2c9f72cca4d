//! Connection supervision: connect, read, frame, dispatch, retry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::{error, info, warn};

use crate::error::{Result, StreamError};
use crate::event::EventRecord;
use crate::framer::EventFramer;

/// Incremental body chunks from one open connection.
pub type ChunkStream = BoxStream<'static, Result<Bytes>>;

/// Capability to open the alert stream.
///
/// The supervisor depends only on this trait, not on a concrete HTTP client,
/// so tests can script connection outcomes and chunk sequences.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Open a fresh connection and hand back its chunk stream.
    async fn connect(&self) -> Result<ChunkStream>;
}

/// Capability to consume parsed event records.
///
/// Handlers are invoked synchronously and in order, one record at a time,
/// before the next chunk is read. A slow handler therefore backpressures the
/// connection read loop.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Process one record. Handlers own their error handling; a record that
    /// cannot be acted on is simply dropped.
    async fn handle_event(&self, event: EventRecord);
}

/// Default connection attempt budget.
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Fixed spacing between reconnection attempts. Failures are expected to be
/// transient link drops, so there is no backoff escalation.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Owns the alert-stream connection lifecycle.
///
/// [`StreamSupervisor::run`] connects, frames records out of the body, and
/// dispatches each one to the registered handler. Any failure (connect error,
/// non-200 status, mid-stream error) consumes one attempt from the retry
/// budget and reconnects after a fixed one-second delay; a stream that ends
/// cleanly refills the budget before reconnecting. When the budget is spent
/// the supervisor stops for good.
pub struct StreamSupervisor {
    source: Arc<dyn EventSource>,
    handler: Arc<dyn EventHandler>,
    max_retries: u32,
}

impl StreamSupervisor {
    /// Create a supervisor with the default retry budget.
    pub fn new(source: Arc<dyn EventSource>, handler: Arc<dyn EventHandler>) -> Self {
        Self {
            source,
            handler,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Override the consecutive-failure budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Drive the stream until the retry budget is exhausted.
    ///
    /// Blocks the calling task for the lifetime of the stream; under normal
    /// operation it never returns. On exhaustion it emits a terminal log and
    /// returns [`StreamError::RetriesExhausted`] — the process is otherwise
    /// alive but inert, so the caller must treat this as a dead end.
    pub async fn run(&self) -> Result<()> {
        let mut retries = self.max_retries;
        loop {
            match self.stream_once().await {
                Ok(()) => {
                    // The camera closed the stream after a healthy reading
                    // period; reconnect with a refilled budget.
                    info!("event stream ended cleanly, reconnecting");
                    retries = self.max_retries;
                }
                Err(e) => {
                    warn!("event stream failed: {e}");
                    retries = retries.saturating_sub(1);
                    if retries == 0 {
                        error!(
                            "giving up on the event stream after {} consecutive failures; \
                             no further events will be handled",
                            self.max_retries
                        );
                        return Err(StreamError::RetriesExhausted {
                            attempts: self.max_retries,
                        });
                    }
                    info!("retrying in {RETRY_DELAY:?} ({retries} retries left)");
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }

    /// One connect-and-read cycle. Returns `Ok(())` only when the stream
    /// ends without error.
    async fn stream_once(&self) -> Result<()> {
        let mut chunks = self.source.connect().await?;
        info!("connected to the event stream");

        let mut framer = EventFramer::new();
        while let Some(chunk) = chunks.next().await {
            for record in framer.push(&chunk?) {
                match EventRecord::from_xml(&record) {
                    Ok(event) => self.handler.handle_event(event).await,
                    // A malformed record is local damage; keep reading.
                    Err(e) => warn!("dropping malformed event record: {e}"),
                }
            }
        }
        Ok(())
    }
}
