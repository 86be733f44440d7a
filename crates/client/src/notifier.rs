//! Identity-transition broadcast.
//!
//! The session publishes here after a sign-in or registration succeeds. Each
//! state container subscribes on its own and reacts by refetching; the event
//! carries no data, so no container ever depends on another's state shape.

use tokio::sync::broadcast;
use tracing::debug;

/// Buffered transitions before a slow subscriber lags.
///
/// A lagged subscriber still refetches, so the value only bounds memory.
const CHANNEL_CAPACITY: usize = 16;

/// "The shopper's identity changed; go re-read the server."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityTransition;

/// Typed publish/subscribe channel for [`IdentityTransition`]s.
///
/// A subscription lives exactly as long as its receiver.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<IdentityTransition>,
}

impl Notifier {
    /// Create a notifier with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Announce a transition to every current subscriber.
    ///
    /// Returns how many subscribers were notified.
    pub fn publish(&self) -> usize {
        let delivered = self.sender.send(IdentityTransition).unwrap_or(0);
        debug!(subscribers = delivered, "Published identity transition");
        delivered
    }

    /// Start receiving transitions published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<IdentityTransition> {
        self.sender.subscribe()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        assert_eq!(Notifier::new().publish(), 0);
    }

    #[test]
    fn test_each_subscriber_receives_transition() {
        let notifier = Notifier::new();
        let mut cart = notifier.subscribe();
        let mut wishlist = notifier.subscribe();

        assert_eq!(notifier.publish(), 2);
        assert_eq!(cart.try_recv().unwrap(), IdentityTransition);
        assert_eq!(wishlist.try_recv().unwrap(), IdentityTransition);
    }

    #[test]
    fn test_dropping_receiver_unsubscribes() {
        let notifier = Notifier::new();
        let rx = notifier.subscribe();
        assert_eq!(notifier.subscriber_count(), 1);
        drop(rx);
        assert_eq!(notifier.subscriber_count(), 0);
        assert_eq!(notifier.publish(), 0);
    }
}
