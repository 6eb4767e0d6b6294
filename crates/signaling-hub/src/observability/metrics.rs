//! Metrics definitions for the signaling hub.
//!
//! All metrics follow Prometheus naming conventions:
//! - `hub_` prefix
//! - `_total` suffix for counters
//!
//! Recording is a no-op until the embedding process installs a recorder.

use metrics::{counter, gauge};

/// Set the number of rooms held by the registry.
///
/// Metric: `hub_rooms_active`
/// Labels: none
pub fn set_rooms_active(count: usize) {
    // usize to f64 conversion is safe for realistic room counts (< 2^53)
    #[allow(clippy::cast_precision_loss)]
    gauge!("hub_rooms_active").set(count as f64);
}

/// Record a successful room join.
///
/// Metric: `hub_clients_joined_total`
/// Labels: none
pub fn record_client_joined() {
    counter!("hub_clients_joined_total").increment(1);
}

/// Record a message accepted by a client's writer.
///
/// Metric: `hub_messages_delivered_total`
/// Labels: `message_type`
///
/// Cardinality: bounded by the message discriminators
pub fn record_message_delivered(message_type: &'static str) {
    counter!("hub_messages_delivered_total", "message_type" => message_type).increment(1);
}

/// Record a writer failure.
///
/// Metric: `hub_write_failures_total`
/// Labels: none
pub fn record_write_failure() {
    counter!("hub_write_failures_total").increment(1);
}

/// Record a subscription ended by its cancellation token.
///
/// Metric: `hub_subscriptions_cancelled_total`
/// Labels: none
pub fn record_subscription_cancelled() {
    counter!("hub_subscriptions_cancelled_total").increment(1);
}
