//! Signaling Hub
//!
//! In-memory broker for signaling rooms. Session layers (WebSocket handlers,
//! test harnesses) hand the hub one [`Client`] per connection; the hub keeps
//! room membership and delivers room-scoped [`Message`]s to members in a
//! well-defined order.
//!
//! # Architecture
//!
//! ```text
//! RoomRegistry
//!     └── RoomAdapter (one per room, MemoryAdapter in-process)
//!             └── Client (one per session)
//!                     ├── Writer (owned transport sink)
//!                     └── Subscription (cancellable local feed)
//! ```
//!
//! # Ordering
//!
//! For any single client, messages arrive in the order the adapter calls
//! that produced them were issued. Adapters append to each member's outbox
//! under the room lock and write after releasing it, so one slow member
//! never stalls membership changes.
//!
//! # Modules
//!
//! - [`adapter`] - `RoomAdapter` contract and `MemoryAdapter`
//! - [`client`] - `Client`, `Subscription`, terminal client errors
//! - [`config`] - Environment-driven configuration
//! - [`message`] - Message envelope and wire format
//! - [`observability`] - Metric recording
//! - [`registry`] - Room registry
//! - [`writer`] - Outbound transport sink trait

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod adapter;
pub mod client;
pub mod config;
pub mod message;
pub mod observability;
pub mod registry;
pub mod writer;

pub use adapter::{MemoryAdapter, RoomAdapter};
pub use client::{Client, ClientError, Subscription};
pub use config::{Config, ConfigError};
pub use message::{Message, MessageError, Payload, Ready, RoomJoin};
pub use registry::RoomRegistry;
pub use writer::{WriteError, Writer};
