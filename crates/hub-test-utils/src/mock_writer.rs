//! `Writer` mocks.
//!
//! - [`MockWriter`] forwards every payload to a channel read through
//!   [`WrittenMessages`]; an optional per-write delay simulates a slow peer.
//! - [`FailingWriter`] rejects writes, optionally after accepting a few.

use bytes::Bytes;
use signaling_hub::message::Message;
use signaling_hub::writer::{WriteError, Writer};
use std::time::Duration;
use tokio::sync::mpsc;

/// Default time to wait for an expected message.
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Writer that records every payload it is given.
#[derive(Debug)]
pub struct MockWriter {
    sender: mpsc::UnboundedSender<Bytes>,
    delay: Option<Duration>,
}

impl MockWriter {
    /// Create a writer and the handle reading what it receives.
    #[must_use]
    pub fn new() -> (Self, WrittenMessages) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender,
                delay: None,
            },
            WrittenMessages { receiver },
        )
    }

    /// Sleep for `delay` before accepting each payload.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait::async_trait]
impl Writer for MockWriter {
    async fn write(&mut self, payload: Bytes) -> Result<(), WriteError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.sender.send(payload).map_err(|_| WriteError::Closed)
    }
}

/// Reading side of a [`MockWriter`].
#[derive(Debug)]
pub struct WrittenMessages {
    receiver: mpsc::UnboundedReceiver<Bytes>,
}

impl WrittenMessages {
    /// Next raw payload, panicking if none arrives within [`DEFAULT_RECV_TIMEOUT`].
    pub async fn next_bytes(&mut self) -> Bytes {
        tokio::time::timeout(DEFAULT_RECV_TIMEOUT, self.receiver.recv())
            .await
            .expect("timed out waiting for a written message")
            .expect("writer dropped before writing")
    }

    /// Next decoded message, panicking on timeout or on undecodable bytes.
    pub async fn next(&mut self) -> Message {
        let bytes = self.next_bytes().await;
        Message::from_slice(&bytes).expect("writer received an invalid message")
    }

    /// Every message already written, without waiting.
    pub fn drain(&mut self) -> Vec<Message> {
        let mut messages = Vec::new();
        while let Ok(bytes) = self.receiver.try_recv() {
            messages.push(Message::from_slice(&bytes).expect("writer received an invalid message"));
        }
        messages
    }

    /// Panic if anything has been written and not yet read.
    pub fn assert_empty(&mut self) {
        let pending = self.drain();
        assert!(pending.is_empty(), "unexpected writes: {pending:?}");
    }
}

/// Writer that fails with a fixed error.
#[derive(Debug, Clone)]
pub struct FailingWriter {
    error: WriteError,
    accept: usize,
}

impl FailingWriter {
    /// Fail every write with `WriteError::Closed`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            error: WriteError::Closed,
            accept: 0,
        }
    }

    /// Fail with `error` instead.
    #[must_use]
    pub fn with_error(mut self, error: WriteError) -> Self {
        self.error = error;
        self
    }

    /// Accept the first `count` writes before failing.
    #[must_use]
    pub fn after(mut self, count: usize) -> Self {
        self.accept = count;
        self
    }
}

impl Default for FailingWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Writer for FailingWriter {
    async fn write(&mut self, _payload: Bytes) -> Result<(), WriteError> {
        if self.accept > 0 {
            self.accept -= 1;
            return Ok(());
        }
        Err(self.error.clone())
    }
}
