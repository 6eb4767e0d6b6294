//! Outbound transport seam.
//!
//! A `Writer` is the sink behind one client (a WebSocket sink in production).
//! The hub only ever hands it fully serialized messages and treats any error
//! as "this client has failed".

use bytes::Bytes;
use thiserror::Error;

/// Transport failure reported by a `Writer`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    /// The underlying connection is gone.
    #[error("Writer closed")]
    Closed,

    /// Any other transport failure.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Sink for one client's serialized messages.
///
/// Each writer is owned by exactly one `Client`, which serializes access to it.
///
/// If a `write` future is dropped before it completes, the client writes the
/// same payload again on its next flush. Implementations must therefore not
/// commit a payload before the future resolves.
#[async_trait::async_trait]
pub trait Writer: Send {
    /// Write one serialized message.
    async fn write(&mut self, payload: Bytes) -> Result<(), WriteError>;
}
