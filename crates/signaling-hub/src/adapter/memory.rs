//! `MemoryAdapter` - in-process room adapter.
//!
//! Membership is a `ClientId -> Client` map behind a reader/writer lock.
//! Operations that change membership or dispatch messages take the write
//! lock just long enough to:
//!
//! 1. Apply the membership change (if any)
//! 2. Snapshot the target clients
//! 3. Append the message to each target's outbox
//!
//! The lock is released before any writer I/O. Because outboxes are FIFO and
//! appends happen under the room-wide lock, every client sees messages in the
//! order the adapter calls were serialized, while a slow writer only delays
//! callers flushing that particular client.
//!
//! Targets are flushed concurrently. If an `add`/`emit`/`broadcast` future is
//! dropped early (e.g. by `tokio::time::timeout`), members whose writes had
//! not finished keep the message queued; it is delivered before anything
//! else by the next call reaching that member, or by [`Client::flush`].

use super::RoomAdapter;
use crate::client::Client;
use crate::message::{Message, RoomJoin};
use crate::observability::metrics;

use common::error::HubError;
use futures::future::join_all;
use common::types::{ClientId, RoomId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// In-memory broker for one room.
#[derive(Debug)]
pub struct MemoryAdapter {
    room: RoomId,
    max_clients: Option<usize>,
    clients: RwLock<HashMap<ClientId, Arc<Client>>>,
}

impl MemoryAdapter {
    /// Create an adapter for `room` with no member limit.
    #[must_use]
    pub fn new(room: impl Into<RoomId>) -> Self {
        Self {
            room: room.into(),
            max_clients: None,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Create an adapter for `room` that rejects joins beyond `max_clients`.
    #[must_use]
    pub fn with_max_clients(room: impl Into<RoomId>, max_clients: usize) -> Self {
        Self {
            max_clients: Some(max_clients),
            ..Self::new(room)
        }
    }

    /// Look up a member.
    #[must_use]
    pub fn get(&self, client_id: ClientId) -> Option<Arc<Client>> {
        self.clients.read().get(&client_id).cloned()
    }

    /// Whether the room has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }

    /// Append `message` to every member's outbox and return the members.
    ///
    /// Must be called with the write lock held.
    fn enqueue_all(clients: &HashMap<ClientId, Arc<Client>>, message: &Message) -> Vec<Arc<Client>> {
        clients
            .values()
            .map(|client| {
                client.enqueue(message.clone());
                Arc::clone(client)
            })
            .collect()
    }

    /// Flush every target concurrently so one slow writer cannot hold back
    /// delivery to the others.
    async fn flush_all(targets: Vec<Arc<Client>>) {
        join_all(targets.iter().map(|client| client.flush())).await;
    }

    fn is_foreign(&self, message: &Message) -> bool {
        if message.room() == &self.room {
            return false;
        }

        warn!(
            target: "hub.adapter",
            room = %self.room,
            message_room = %message.room(),
            message_type = message.type_name(),
            "Dropping message addressed to another room"
        );
        true
    }
}

#[async_trait::async_trait]
impl RoomAdapter for MemoryAdapter {
    fn room(&self) -> &RoomId {
        &self.room
    }

    #[instrument(skip_all, name = "hub.adapter.add", fields(room = %self.room, client_id = %client.id()))]
    async fn add(&self, client: Arc<Client>) -> Result<(), HubError> {
        let client_id = client.id();

        let (targets, members) = {
            let mut clients = self.clients.write();

            if clients.contains_key(&client_id) {
                return Err(HubError::ClientAlreadyExists(client_id));
            }

            if let Some(max) = self.max_clients {
                if clients.len() >= max {
                    return Err(HubError::RoomFull {
                        room: self.room.clone(),
                        max,
                    });
                }
            }

            clients.insert(client_id, Arc::clone(&client));

            let announcement = Message::room_join(
                self.room.clone(),
                RoomJoin {
                    client_id,
                    metadata: client.metadata(),
                },
            );

            (Self::enqueue_all(&clients, &announcement), clients.len())
        };

        metrics::record_client_joined();
        info!(
            target: "hub.adapter",
            room = %self.room,
            client_id = %client_id,
            members,
            "Client joined room"
        );

        Self::flush_all(targets).await;
        Ok(())
    }

    #[instrument(skip_all, name = "hub.adapter.remove", fields(room = %self.room, client_id = %client_id))]
    async fn remove(&self, client_id: ClientId) -> Result<(), HubError> {
        let (removed, members) = {
            let mut clients = self.clients.write();
            let removed = clients.remove(&client_id);
            (removed, clients.len())
        };

        if removed.is_none() {
            debug!(
                target: "hub.adapter",
                room = %self.room,
                client_id = %client_id,
                "Remove of unknown client"
            );
            return Err(HubError::ClientNotFound(client_id));
        }

        info!(
            target: "hub.adapter",
            room = %self.room,
            client_id = %client_id,
            members,
            "Client left room"
        );
        Ok(())
    }

    async fn clients(&self) -> Result<HashMap<ClientId, String>, HubError> {
        let clients = self.clients.read();
        Ok(clients
            .iter()
            .map(|(id, client)| (*id, client.metadata()))
            .collect())
    }

    async fn size(&self) -> Result<usize, HubError> {
        Ok(self.clients.read().len())
    }

    #[instrument(
        skip_all,
        name = "hub.adapter.emit",
        fields(room = %self.room, client_id = %client_id, message_type = message.type_name())
    )]
    async fn emit(&self, client_id: ClientId, message: Message) -> Result<(), HubError> {
        if self.is_foreign(&message) {
            return Ok(());
        }

        let target = {
            let clients = self.clients.write();
            clients.get(&client_id).map(|client| {
                client.enqueue(message);
                Arc::clone(client)
            })
        };

        match target {
            Some(client) => client.flush().await,
            None => {
                debug!(
                    target: "hub.adapter",
                    room = %self.room,
                    client_id = %client_id,
                    "Emit to client not in room, ignoring"
                );
            }
        }

        Ok(())
    }

    #[instrument(
        skip_all,
        name = "hub.adapter.broadcast",
        fields(room = %self.room, message_type = message.type_name())
    )]
    async fn broadcast(&self, message: Message) -> Result<(), HubError> {
        if self.is_foreign(&message) {
            return Ok(());
        }

        let targets = {
            let clients = self.clients.write();
            Self::enqueue_all(&clients, &message)
        };

        debug!(
            target: "hub.adapter",
            room = %self.room,
            message_type = message.type_name(),
            recipients = targets.len(),
            "Broadcasting message"
        );

        Self::flush_all(targets).await;
        Ok(())
    }
}
