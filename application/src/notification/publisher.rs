//! Progress event fan-out with a latest-event cache.
//!
//! The cache is updated before any subscriber sees an event, so a poller
//! calling [`NotificationPublisher::latest`] and a subscriber draining its
//! queue observe the same history. Events projected from an older session
//! version than the cached one are dropped. Delivery is best-effort: a subscriber
//! whose receiver was dropped is pruned on the next publish and never
//! affects the publisher or other subscribers.

use archmesh_domain::{ProgressEvent, SessionId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::debug;

/// Identifies one subscription for [`NotificationPublisher::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

/// A live subscription: events for one session, in publish order.
pub struct Subscription {
    pub handle: SubscriptionHandle,
    pub receiver: mpsc::UnboundedReceiver<ProgressEvent>,
}

struct Subscriber {
    handle: SubscriptionHandle,
    sender: mpsc::UnboundedSender<ProgressEvent>,
}

#[derive(Default)]
struct PublisherState {
    latest: HashMap<SessionId, ProgressEvent>,
    subscribers: HashMap<SessionId, Vec<Subscriber>>,
}

#[derive(Default)]
pub struct NotificationPublisher {
    state: Mutex<PublisherState>,
    next_handle: AtomicU64,
}

impl NotificationPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, PublisherState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cache `event` as the latest for its session, then deliver it to every
    /// subscriber of that session.
    ///
    /// Returns `false` without delivering anything when the cache already
    /// holds an event from a newer session version.
    pub fn publish(&self, event: ProgressEvent) -> bool {
        let mut state = self.state();
        if let Some(cached) = state.latest.get(&event.session_id) {
            if event.version < cached.version {
                debug!(
                    session_id = %event.session_id,
                    version = event.version,
                    cached_version = cached.version,
                    "Dropping stale progress event"
                );
                return false;
            }
        }
        state.latest.insert(event.session_id.clone(), event.clone());

        if let Some(subscribers) = state.subscribers.get_mut(&event.session_id) {
            subscribers.retain(|subscriber| {
                let delivered = subscriber.sender.send(event.clone()).is_ok();
                if !delivered {
                    debug!(
                        session_id = %event.session_id,
                        handle = subscriber.handle.0,
                        "Pruning closed subscriber"
                    );
                }
                delivered
            });
            if subscribers.is_empty() {
                state.subscribers.remove(&event.session_id);
            }
        }
        true
    }

    /// Subscribe to events for `session_id`. Past events are not replayed;
    /// use [`latest`](Self::latest) for the current state.
    pub fn subscribe(&self, session_id: &SessionId) -> Subscription {
        let handle = SubscriptionHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::unbounded_channel();
        self.state()
            .subscribers
            .entry(session_id.clone())
            .or_default()
            .push(Subscriber { handle, sender });
        Subscription { handle, receiver }
    }

    /// Remove a subscription. Unknown or already removed handles are ignored.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) {
        let mut state = self.state();
        state.subscribers.retain(|_, subscribers| {
            subscribers.retain(|s| s.handle != handle);
            !subscribers.is_empty()
        });
    }

    /// Most recent event published for `session_id`.
    pub fn latest(&self, session_id: &SessionId) -> Option<ProgressEvent> {
        self.state().latest.get(session_id).cloned()
    }

    pub fn subscriber_count(&self, session_id: &SessionId) -> usize {
        self.state()
            .subscribers
            .get(session_id)
            .map(|s| s.iter().filter(|s| !s.sender.is_closed()).count())
            .unwrap_or(0)
    }

    /// Drop the cache entry and subscribers of a deleted session.
    pub fn forget(&self, session_id: &SessionId) {
        let mut state = self.state();
        state.latest.remove(session_id);
        state.subscribers.remove(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archmesh_domain::{ProgressStatus, StageName};
    use chrono::Utc;

    fn event(session: &str, message: &str, progress: f64) -> ProgressEvent {
        versioned(session, message, progress, 1)
    }

    fn versioned(session: &str, message: &str, progress: f64, version: u64) -> ProgressEvent {
        ProgressEvent {
            session_id: SessionId::new(session),
            stage: StageName::ParseRequirements,
            progress,
            message: message.to_string(),
            status: ProgressStatus::Running,
            timestamp: Utc::now(),
            version,
        }
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let publisher = NotificationPublisher::new();
        let mut sub = publisher.subscribe(&SessionId::new("s1"));

        publisher.publish(event("s1", "one", 0.1));
        publisher.publish(event("s1", "two", 0.2));
        publisher.publish(event("s2", "other", 0.5));

        assert_eq!(sub.receiver.recv().await.unwrap().message, "one");
        assert_eq!(sub.receiver.recv().await.unwrap().message, "two");
        assert!(sub.receiver.try_recv().is_err());
    }

    #[test]
    fn test_latest_is_updated_without_subscribers() {
        let publisher = NotificationPublisher::new();
        assert!(publisher.latest(&SessionId::new("s1")).is_none());

        publisher.publish(event("s1", "one", 0.1));
        publisher.publish(event("s1", "two", 0.2));

        assert_eq!(publisher.latest(&SessionId::new("s1")).unwrap().message, "two");
    }

    #[test]
    fn test_closed_subscriber_is_pruned_and_others_still_receive() {
        let publisher = NotificationPublisher::new();
        let session = SessionId::new("s1");
        let dropped = publisher.subscribe(&session);
        let mut alive = publisher.subscribe(&session);
        drop(dropped);

        publisher.publish(event("s1", "one", 0.1));

        assert_eq!(alive.receiver.try_recv().unwrap().message, "one");
        assert_eq!(publisher.subscriber_count(&session), 1);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let publisher = NotificationPublisher::new();
        let session = SessionId::new("s1");
        let mut sub = publisher.subscribe(&session);

        publisher.unsubscribe(sub.handle);
        publisher.unsubscribe(sub.handle);
        publisher.publish(event("s1", "one", 0.1));

        assert_eq!(publisher.subscriber_count(&session), 0);
        // sender dropped on unsubscribe, so the channel is closed and empty
        assert!(sub.receiver.try_recv().is_err());
        assert!(publisher.latest(&session).is_some());
    }

    #[test]
    fn test_forget_drops_cache() {
        let publisher = NotificationPublisher::new();
        let session = SessionId::new("s1");
        let _sub = publisher.subscribe(&session);
        publisher.publish(event("s1", "one", 0.1));

        publisher.forget(&session);

        assert!(publisher.latest(&session).is_none());
        assert_eq!(publisher.subscriber_count(&session), 0);
    }

    #[test]
    fn test_older_version_does_not_replace_latest() {
        let publisher = NotificationPublisher::new();
        let session = SessionId::new("s1");
        let mut sub = publisher.subscribe(&session);

        let mut cancelled = versioned("s1", "cancelled", 0.5, 4);
        cancelled.status = ProgressStatus::Failed;
        assert!(publisher.publish(cancelled));
        // projected before the cancel landed, published after it
        assert!(!publisher.publish(versioned("s1", "running next stage", 0.5, 3)));

        let latest = publisher.latest(&session).unwrap();
        assert_eq!(latest.status, ProgressStatus::Failed);
        assert_eq!(latest.version, 4);
        assert_eq!(sub.receiver.try_recv().unwrap().message, "cancelled");
        assert!(sub.receiver.try_recv().is_err());
    }

    #[test]
    fn test_same_version_events_are_all_delivered() {
        let publisher = NotificationPublisher::new();
        let session = SessionId::new("s1");
        let mut sub = publisher.subscribe(&session);

        assert!(publisher.publish(versioned("s1", "one", 0.2, 2)));
        assert!(publisher.publish(versioned("s1", "two", 0.2, 2)));

        assert_eq!(publisher.latest(&session).unwrap().message, "two");
        assert_eq!(sub.receiver.try_recv().unwrap().message, "one");
        assert_eq!(sub.receiver.try_recv().unwrap().message, "two");
    }
}
