//! Room adapter contract.
//!
//! A room adapter is the broker for one room: it owns the room's membership
//! and dispatches messages to members. Callers only depend on
//! [`RoomAdapter`], so a distributed implementation can replace the
//! in-memory one without changing them.
//!
//! # Guarantees every implementation must keep
//!
//! - A client ID is registered at most once (`add` fails with
//!   `HubError::ClientAlreadyExists` otherwise)
//! - `add` announces the new member to every member, itself included
//! - For any single client, messages arrive in the order the corresponding
//!   `add`/`emit`/`broadcast` calls were issued
//! - Per-client delivery failures never surface from these methods
//! - Dropping a call's future before it completes neither loses nor
//!   duplicates a message: undelivered messages stay queued on the member
//!   and are delivered, in order, by the next flush of that member
//!
//! # Modules
//!
//! - [`memory`] - `MemoryAdapter`, the in-process implementation

pub mod memory;

pub use memory::MemoryAdapter;

use crate::client::Client;
use crate::message::Message;

use common::error::HubError;
use common::types::{ClientId, RoomId};
use std::collections::HashMap;
use std::sync::Arc;

/// Broker owning one room's membership and dispatch.
#[async_trait::async_trait]
pub trait RoomAdapter: Send + Sync {
    /// Room this adapter is scoped to.
    fn room(&self) -> &RoomId;

    /// Register `client` and announce it to the room (itself included).
    ///
    /// # Errors
    ///
    /// `HubError::ClientAlreadyExists` if the ID is already a member,
    /// `HubError::RoomFull` if the room is at its member limit. Room state
    /// is unchanged on error.
    async fn add(&self, client: Arc<Client>) -> Result<(), HubError>;

    /// Deregister the client with this ID. No announcement is sent.
    ///
    /// # Errors
    ///
    /// `HubError::ClientNotFound` if the ID is not a member.
    async fn remove(&self, client_id: ClientId) -> Result<(), HubError>;

    /// Snapshot of the members and their metadata.
    ///
    /// # Errors
    ///
    /// Implementation-specific (`HubError::Internal`); never fails in memory.
    async fn clients(&self) -> Result<HashMap<ClientId, String>, HubError>;

    /// Number of members.
    ///
    /// # Errors
    ///
    /// Implementation-specific (`HubError::Internal`); never fails in memory.
    async fn size(&self) -> Result<usize, HubError>;

    /// Deliver `message` to one member. Best effort: unknown IDs are ignored.
    ///
    /// # Errors
    ///
    /// Implementation-specific (`HubError::Internal`); never fails in memory.
    async fn emit(&self, client_id: ClientId, message: Message) -> Result<(), HubError>;

    /// Deliver `message` to every member.
    ///
    /// # Errors
    ///
    /// Implementation-specific (`HubError::Internal`); never fails in memory.
    async fn broadcast(&self, message: Message) -> Result<(), HubError>;
}
