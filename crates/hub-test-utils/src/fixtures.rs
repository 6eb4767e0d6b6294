//! Test clients and canned messages.

use crate::mock_writer::{MockWriter, WrittenMessages};
use common::types::RoomId;
use signaling_hub::client::Client;
use signaling_hub::message::{Message, Ready, RoomJoin};
use std::sync::Arc;
use std::time::Duration;

/// Builder for a client backed by a [`MockWriter`].
#[derive(Debug, Default, Clone)]
pub struct TestClient {
    metadata: Option<String>,
    delay: Option<Duration>,
}

impl TestClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the client's metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }

    /// Delay every write by `delay`.
    #[must_use]
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Build the client and the handle reading its writer.
    #[must_use]
    pub fn build(self) -> (Arc<Client>, WrittenMessages) {
        let (mut writer, written) = MockWriter::new();
        if let Some(delay) = self.delay {
            writer = writer.with_delay(delay);
        }

        let client = Client::new(writer);
        if let Some(metadata) = self.metadata {
            client.set_metadata(metadata);
        }
        (client, written)
    }
}

/// The join announcement the hub sends when `client` joins `room`.
#[must_use]
pub fn room_join(room: &str, client: &Client) -> Message {
    Message::room_join(
        RoomId::from(room),
        RoomJoin {
            client_id: client.id(),
            metadata: client.metadata(),
        },
    )
}

/// A ready event for `room`.
#[must_use]
pub fn ready(room: &str, nickname: &str) -> Message {
    Message::ready(
        RoomId::from(room),
        Ready {
            nickname: nickname.to_string(),
        },
    )
}

/// Canonical serialized form of `message`.
#[must_use]
pub fn serialize(message: &Message) -> Vec<u8> {
    message
        .to_bytes()
        .expect("message should serialize")
        .to_vec()
}
