//! Common error types for the signaling hub.
//!
//! Only membership-structural failures live here. Per-client delivery
//! failures are recorded on the client itself and never surface as a
//! `HubError`.

use crate::types::{ClientId, RoomId};
use thiserror::Error;

/// Errors returned by room adapters and the room registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HubError {
    /// A client with the same ID is already a member of the room
    #[error("Client already exists: {0}")]
    ClientAlreadyExists(ClientId),

    /// The client is not a member of the room
    #[error("Client not found: {0}")]
    ClientNotFound(ClientId),

    /// The room reached its configured member limit
    #[error("Room {room} is full (max {max} clients)")]
    RoomFull {
        /// Room that rejected the client
        room: RoomId,
        /// Configured limit
        max: usize,
    },

    /// The registry reached its configured room limit
    #[error("Room capacity exceeded (max {0} rooms)")]
    CapacityExceeded(usize),

    /// Failure inside an adapter implementation (e.g. a remote backend)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HubError {
    /// Returns the signaling error code for this error.
    ///
    /// Codes match the ones session layers already send to clients:
    /// 4 = not found, 5 = conflict, 6 = internal, 7 = capacity exceeded.
    #[must_use]
    pub fn error_code(&self) -> i32 {
        match self {
            HubError::ClientNotFound(_) => 4,
            HubError::ClientAlreadyExists(_) => 5,
            HubError::Internal(_) => 6,
            HubError::RoomFull { .. } | HubError::CapacityExceeded(_) => 7,
        }
    }
}
