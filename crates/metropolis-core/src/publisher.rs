//! Engine notifications and their subscribers.
//!
//! The engine owns a [`Publisher`]; callers register an [`EngineSubscriber`]
//! and get back a [`SubscriberId`] to unregister it later. Delivery is
//! synchronous and in registration order. [`BroadcastSubscriber`] hands
//! notifications to a tokio broadcast channel for a transport layer.

use metropolis_types::EngineNotification;
use tokio::sync::broadcast;

/// Receives engine notifications.
pub trait EngineSubscriber: Send {
    /// Called once per notification, from inside the tick.
    fn notify(&mut self, notification: &EngineNotification);
}

/// Handle returned by [`Publisher::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

/// Ordered list of subscribers.
#[derive(Default)]
pub struct Publisher {
    next_id: u64,
    subscribers: Vec<(SubscriberId, Box<dyn EngineSubscriber>)>,
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl Publisher {
    /// An empty publisher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber.
    pub fn register(&mut self, subscriber: Box<dyn EngineSubscriber>) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.subscribers.push((id, subscriber));
        id
    }

    /// Remove a subscriber. Returns `false` if it was not registered.
    pub fn unregister(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Whether no subscriber is registered.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Deliver a notification to every subscriber.
    pub fn publish(&mut self, notification: &EngineNotification) {
        for (_, subscriber) in &mut self.subscribers {
            subscriber.notify(notification);
        }
    }
}

/// Forwards notifications into a tokio broadcast channel.
///
/// Sending with no live receivers is not an error; the notification is
/// simply dropped.
#[derive(Debug, Clone)]
pub struct BroadcastSubscriber {
    tx: broadcast::Sender<EngineNotification>,
}

impl BroadcastSubscriber {
    /// Create a subscriber and its first receiver.
    pub fn channel(capacity: usize) -> (Self, broadcast::Receiver<EngineNotification>) {
        let (tx, rx) = broadcast::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Open another receiver on the same channel.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineNotification> {
        self.tx.subscribe()
    }
}

impl EngineSubscriber for BroadcastSubscriber {
    fn notify(&mut self, notification: &EngineNotification) {
        if self.tx.send(notification.clone()).is_err() {
            tracing::trace!("no live receivers for engine notification");
        }
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Clone, Default)]
pub struct CollectingSubscriber {
    received: std::sync::Arc<std::sync::Mutex<Vec<EngineNotification>>>,
}

impl CollectingSubscriber {
    /// An empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything received so far, in delivery order.
    pub fn received(&self) -> Vec<EngineNotification> {
        self.received
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl EngineSubscriber for CollectingSubscriber {
    fn notify(&mut self, notification: &EngineNotification) {
        if let Ok(mut guard) = self.received.lock() {
            guard.push(notification.clone());
        }
    }
}
