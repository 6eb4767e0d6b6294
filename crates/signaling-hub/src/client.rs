//! `Client` - one connected session as seen by the hub.
//!
//! Each `Client`:
//! - Owns exactly one [`Writer`] (never shared with another client)
//! - Carries mutable metadata (e.g. a display name) read by join announcements
//! - Fans every delivered message out to its live [`Subscription`]s
//! - Records a terminal error at most once
//!
//! # Delivery ordering
//!
//! Messages are first appended to a per-client FIFO outbox and then flushed.
//! Whoever holds the writer lock drains the outbox, so a message is always
//! written after every message enqueued before it, no matter which caller
//! ends up performing the I/O. Enqueueing never blocks on the transport,
//! which lets room adapters enqueue while holding their membership lock and
//! perform the (possibly slow) writes after releasing it.
//!
//! Dropping a flush mid-write loses nothing: the message stays queued at the
//! front of the outbox and is delivered, exactly once and still in order, by
//! the next flush of the same client.
//!
//! # Subscriptions
//!
//! A subscription is bound to a `CancellationToken`. Once the token fires the
//! subscription yields no further messages, its registration is released and
//! `ClientError::Cancelled` becomes the client's terminal error (unless one is
//! already recorded). No task is spawned per subscription.

use crate::message::Message;
use crate::observability::metrics;
use crate::writer::Writer;

use common::types::ClientId;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Terminal error of a client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The writer rejected a message.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A message could not be encoded for the writer.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A subscription's cancellation token fired.
    #[error("Subscription cancelled")]
    Cancelled,
}

/// Live subscription registration.
struct SubscriptionEntry {
    token: CancellationToken,
    sender: mpsc::UnboundedSender<Message>,
}

#[derive(Default)]
struct Subscriptions {
    next_id: u64,
    entries: HashMap<u64, SubscriptionEntry>,
}

/// A connected session wrapping one outbound [`Writer`].
pub struct Client {
    id: ClientId,
    metadata: RwLock<String>,
    writer: tokio::sync::Mutex<Box<dyn Writer>>,
    outbox: Mutex<VecDeque<Message>>,
    subscriptions: Mutex<Subscriptions>,
    error: OnceLock<ClientError>,
}

impl Client {
    /// Create a detached client (not yet in any room) over `writer`.
    pub fn new(writer: impl Writer + 'static) -> Arc<Self> {
        Self::from_boxed(Box::new(writer))
    }

    /// Create a client over an already boxed writer.
    #[must_use]
    pub fn from_boxed(writer: Box<dyn Writer>) -> Arc<Self> {
        let client = Arc::new(Self {
            id: ClientId::new(),
            metadata: RwLock::new(String::new()),
            writer: tokio::sync::Mutex::new(writer),
            outbox: Mutex::new(VecDeque::new()),
            subscriptions: Mutex::new(Subscriptions::default()),
            error: OnceLock::new(),
        });

        debug!(target: "hub.client", client_id = %client.id, "Client created");
        client
    }

    /// Client ID, fixed for the lifetime of the client.
    #[must_use]
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Current metadata.
    #[must_use]
    pub fn metadata(&self) -> String {
        self.metadata.read().clone()
    }

    /// Replace the metadata. Last write wins.
    pub fn set_metadata(&self, metadata: impl Into<String>) {
        *self.metadata.write() = metadata.into();
    }

    /// Terminal error, if the client failed or one of its subscriptions was cancelled.
    #[must_use]
    pub fn err(&self) -> Option<ClientError> {
        self.release_cancelled();
        self.error.get().cloned()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.release_cancelled();
        self.subscriptions.lock().entries.len()
    }

    /// Deliver `message` to the writer and then to every live subscription.
    ///
    /// Returns once the message has been handed to the writer. Transport
    /// failures are recorded as the terminal error and never returned.
    pub async fn write(&self, message: Message) {
        self.enqueue(message);
        self.flush().await;
    }

    /// Register a new subscription that ends when `token` is cancelled.
    #[must_use]
    pub fn subscribe(self: &Arc<Self>, token: CancellationToken) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();

        let id = {
            let mut subscriptions = self.subscriptions.lock();
            let id = subscriptions.next_id;
            subscriptions.next_id += 1;
            subscriptions.entries.insert(
                id,
                SubscriptionEntry {
                    token: token.clone(),
                    sender,
                },
            );
            id
        };

        debug!(
            target: "hub.client",
            client_id = %self.id,
            subscription_id = id,
            "Subscription registered"
        );

        Subscription {
            id,
            token,
            receiver,
            client: Arc::clone(self),
        }
    }

    /// Append `message` to the outbox without performing any I/O.
    pub(crate) fn enqueue(&self, message: Message) {
        self.outbox.lock().push_back(message);
    }

    /// Drain the outbox in FIFO order.
    ///
    /// When this returns, every message enqueued before the call has been
    /// delivered, either by this caller or by a concurrent flusher.
    ///
    /// Cancel safe: a message leaves the outbox only after the writer and the
    /// subscriptions have seen it, so dropping this future mid-write leaves
    /// the message at the front for the next flusher.
    pub async fn flush(&self) {
        let mut writer = self.writer.lock().await;

        loop {
            // Only the writer lock holder pops, so the front is stable until
            // the pop below.
            let next = self.outbox.lock().front().cloned();
            let Some(message) = next else {
                break;
            };

            self.deliver(writer.as_mut(), &message).await;
            self.outbox.lock().pop_front();
        }
    }

    /// Number of messages enqueued but not yet delivered.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.outbox.lock().len()
    }

    async fn deliver(&self, writer: &mut dyn Writer, message: &Message) {
        match message.to_bytes() {
            Ok(bytes) => {
                if let Err(e) = writer.write(bytes).await {
                    warn!(
                        target: "hub.client",
                        client_id = %self.id,
                        message_type = message.type_name(),
                        error = %e,
                        "Writer failed"
                    );
                    metrics::record_write_failure();
                    self.record_error(ClientError::Transport(e.to_string()));
                } else {
                    metrics::record_message_delivered(message.type_name());
                }
            }
            Err(e) => {
                warn!(
                    target: "hub.client",
                    client_id = %self.id,
                    message_type = message.type_name(),
                    error = %e,
                    "Failed to serialize message"
                );
                self.record_error(ClientError::Serialization(e.to_string()));
            }
        }

        self.fan_out(message);
    }

    fn fan_out(&self, message: &Message) {
        let mut subscriptions = self.subscriptions.lock();
        subscriptions.entries.retain(|id, entry| {
            if entry.token.is_cancelled() {
                self.on_cancelled(*id);
                return false;
            }
            // A closed receiver means the subscription is being dropped.
            entry.sender.send(message.clone()).is_ok()
        });
    }

    /// Release every registration whose token has fired.
    fn release_cancelled(&self) {
        let mut subscriptions = self.subscriptions.lock();
        subscriptions.entries.retain(|id, entry| {
            if entry.token.is_cancelled() {
                self.on_cancelled(*id);
                false
            } else {
                true
            }
        });
    }

    /// Release one registration. Idempotent.
    fn release(&self, id: u64, cancelled: bool) {
        let removed = self.subscriptions.lock().entries.remove(&id).is_some();

        if removed && cancelled {
            self.on_cancelled(id);
        } else if removed {
            debug!(
                target: "hub.client",
                client_id = %self.id,
                subscription_id = id,
                "Subscription dropped"
            );
        }
    }

    fn on_cancelled(&self, id: u64) {
        debug!(
            target: "hub.client",
            client_id = %self.id,
            subscription_id = id,
            "Subscription cancelled"
        );
        metrics::record_subscription_cancelled();
        self.record_error(ClientError::Cancelled);
    }

    /// First recorded error wins.
    fn record_error(&self, error: ClientError) {
        let _ = self.error.set(error);
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.id)
            .field("metadata", &*self.metadata.read())
            .field("error", &self.error.get())
            .finish_non_exhaustive()
    }
}

/// Cancellable local feed of the messages delivered to one client.
///
/// Independent of every other subscription of the same client: each one
/// receives every message published after it was registered.
pub struct Subscription {
    id: u64,
    token: CancellationToken,
    receiver: mpsc::UnboundedReceiver<Message>,
    client: Arc<Client>,
}

impl Subscription {
    /// Wait for the next message.
    ///
    /// Returns `None` once the token is cancelled; buffered messages are not
    /// yielded after that point.
    pub async fn recv(&mut self) -> Option<Message> {
        if self.token.is_cancelled() {
            self.close();
            return None;
        }

        tokio::select! {
            biased;

            () = self.token.cancelled() => {
                self.close();
                None
            }

            message = self.receiver.recv() => message,
        }
    }

    /// Whether the subscription's token has fired.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// ID of the client this subscription belongs to.
    #[must_use]
    pub fn client_id(&self) -> ClientId {
        self.client.id
    }

    fn close(&mut self) {
        self.receiver.close();
        self.client.release(self.id, self.token.is_cancelled());
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.client.release(self.id, self.token.is_cancelled());
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("client_id", &self.client.id)
            .field("cancelled", &self.token.is_cancelled())
            .finish_non_exhaustive()
    }
}
