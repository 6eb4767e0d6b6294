//! Room-scoped message envelope and its canonical wire form.
//!
//! Every message serializes to a JSON document with a fixed field order:
//!
//! ```text
//! {"room":"<room id>","type":"<discriminator>","payload":{...}}
//! ```
//!
//! The same bytes are produced regardless of whether the message is
//! delivered as a join announcement, an `emit` or a `broadcast`.

use bytes::Bytes;
use common::types::{ClientId, RoomId};
use serde::de::{self, Deserializer};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Discriminator of the room-join announcement.
pub const TYPE_ROOM_JOIN: &str = "room-join";

/// Discriminator of the ready event.
pub const TYPE_READY: &str = "ready";

/// Wire encoding errors.
#[derive(Debug, Error)]
pub enum MessageError {
    /// The message could not be encoded.
    #[error("Failed to encode message: {0}")]
    Encode(String),

    /// The bytes are not a valid message.
    #[error("Failed to decode message: {0}")]
    Decode(String),
}

/// Announcement that a client joined the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomJoin {
    pub client_id: ClientId,
    pub metadata: String,
}

/// Peer is ready to start negotiating media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ready {
    pub nickname: String,
}

/// Type-specific message payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    RoomJoin(RoomJoin),
    Ready(Ready),
}

/// Immutable, room-scoped event envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    room: RoomId,
    payload: Payload,
}

impl Message {
    /// Build a room-join announcement for `room`.
    #[must_use]
    pub fn room_join(room: RoomId, join: RoomJoin) -> Self {
        Self {
            room,
            payload: Payload::RoomJoin(join),
        }
    }

    /// Build a ready event for `room`.
    #[must_use]
    pub fn ready(room: RoomId, ready: Ready) -> Self {
        Self {
            room,
            payload: Payload::Ready(ready),
        }
    }

    /// Room this message belongs to.
    #[must_use]
    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// Type-specific payload.
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Discriminator written to the `type` field.
    ///
    /// Bounded set of values, safe to use as a metric label.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self.payload {
            Payload::RoomJoin(_) => TYPE_ROOM_JOIN,
            Payload::Ready(_) => TYPE_READY,
        }
    }

    /// Encode into the canonical wire form handed to a `Writer`.
    ///
    /// # Errors
    ///
    /// Returns `MessageError::Encode` if serialization fails.
    pub fn to_bytes(&self) -> Result<Bytes, MessageError> {
        serde_json::to_vec(self)
            .map(Bytes::from)
            .map_err(|e| MessageError::Encode(e.to_string()))
    }

    /// Decode a message previously produced by [`Message::to_bytes`].
    ///
    /// # Errors
    ///
    /// Returns `MessageError::Decode` if `bytes` are not a message with a
    /// known type and a matching payload.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, MessageError> {
        serde_json::from_slice(bytes).map_err(|e| MessageError::Decode(e.to_string()))
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Message", 3)?;
        state.serialize_field("room", &self.room)?;
        state.serialize_field("type", self.type_name())?;
        match &self.payload {
            Payload::RoomJoin(join) => state.serialize_field("payload", join)?,
            Payload::Ready(ready) => state.serialize_field("payload", ready)?,
        }
        state.end()
    }
}

/// Untyped view of the envelope used while decoding.
#[derive(Deserialize)]
struct RawMessage {
    room: RoomId,
    #[serde(rename = "type")]
    kind: String,
    payload: serde_json::Value,
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawMessage::deserialize(deserializer)?;
        let payload = match raw.kind.as_str() {
            TYPE_ROOM_JOIN => {
                Payload::RoomJoin(serde_json::from_value(raw.payload).map_err(de::Error::custom)?)
            }
            TYPE_READY => {
                Payload::Ready(serde_json::from_value(raw.payload).map_err(de::Error::custom)?)
            }
            other => {
                return Err(de::Error::unknown_variant(
                    other,
                    &[TYPE_ROOM_JOIN, TYPE_READY],
                ))
            }
        };

        Ok(Self {
            room: raw.room,
            payload,
        })
    }
}
