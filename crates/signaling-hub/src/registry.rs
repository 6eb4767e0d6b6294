//! `RoomRegistry` - hands out one adapter per active room.
//!
//! Session layers ask the registry for the room named in a join request and
//! release it when their client leaves. A room's adapter is dropped once it
//! is released with no members and no session holding a handle to it, so
//! idle rooms do not accumulate.

use crate::adapter::{MemoryAdapter, RoomAdapter};
use crate::config::Config;
use crate::observability::metrics;

use common::error::HubError;
use common::types::RoomId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Registry of the rooms currently held by this process.
pub struct RoomRegistry {
    max_rooms: usize,
    max_clients_per_room: Option<usize>,
    rooms: Mutex<HashMap<RoomId, Arc<MemoryAdapter>>>,
}

impl RoomRegistry {
    /// Create a registry using the limits from `config`.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            max_rooms: config.max_rooms,
            max_clients_per_room: config.max_clients_per_room,
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Get the adapter for `room`, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns `HubError::CapacityExceeded` if `room` is new and the registry
    /// already holds `max_rooms` rooms.
    pub fn get_or_create(&self, room: &RoomId) -> Result<Arc<dyn RoomAdapter>, HubError> {
        let mut rooms = self.rooms.lock();

        if let Some(adapter) = rooms.get(room) {
            return Ok(Arc::clone(adapter) as Arc<dyn RoomAdapter>);
        }

        if rooms.len() >= self.max_rooms {
            warn!(
                target: "hub.registry",
                room = %room,
                max_rooms = self.max_rooms,
                "Rejecting room creation, registry at capacity"
            );
            return Err(HubError::CapacityExceeded(self.max_rooms));
        }

        let adapter = Arc::new(match self.max_clients_per_room {
            Some(max) => MemoryAdapter::with_max_clients(room.clone(), max),
            None => MemoryAdapter::new(room.clone()),
        });
        rooms.insert(room.clone(), Arc::clone(&adapter));
        metrics::set_rooms_active(rooms.len());

        info!(
            target: "hub.registry",
            room = %room,
            rooms = rooms.len(),
            "Room created"
        );

        Ok(adapter as Arc<dyn RoomAdapter>)
    }

    /// Drop the adapter for `room` if it has no members and no outstanding handles.
    ///
    /// Callers drop their own `Arc<dyn RoomAdapter>` before releasing.
    /// Returns `true` if the room was dropped.
    pub fn release(&self, room: &RoomId) -> bool {
        let mut rooms = self.rooms.lock();

        let idle = rooms
            .get(room)
            .is_some_and(|adapter| Arc::strong_count(adapter) == 1 && adapter.is_empty());
        if !idle {
            debug!(
                target: "hub.registry",
                room = %room,
                "Room unknown or still in use, keeping it"
            );
            return false;
        }

        rooms.remove(room);
        metrics::set_rooms_active(rooms.len());

        info!(
            target: "hub.registry",
            room = %room,
            rooms = rooms.len(),
            "Room dropped"
        );
        true
    }

    /// Names of the rooms currently held.
    #[must_use]
    pub fn rooms(&self) -> Vec<RoomId> {
        self.rooms.lock().keys().cloned().collect()
    }

    /// Number of rooms currently held.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.lock().len()
    }
}
