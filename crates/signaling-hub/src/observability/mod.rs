//! Observability for the signaling hub.
//!
//! # Privacy by Default
//!
//! Adapter operations use `#[instrument(skip_all)]` with explicit safe fields
//! (room, client ID, message type). Message payloads and metadata are never
//! logged. Metric labels are bounded:
//! - `message_type`: bounded by the message discriminators
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Purpose |
//! |--------|------|--------|---------|
//! | `hub_rooms_active` | Gauge | none | Rooms held by the registry |
//! | `hub_clients_joined_total` | Counter | none | Successful room joins |
//! | `hub_messages_delivered_total` | Counter | `message_type` | Messages accepted by writers |
//! | `hub_write_failures_total` | Counter | none | Writer failures |
//! | `hub_subscriptions_cancelled_total` | Counter | none | Subscriptions ended by cancellation |

pub mod metrics;

pub use metrics::{
    record_client_joined, record_message_delivered, record_subscription_cancelled,
    record_write_failure, set_rooms_active,
};
