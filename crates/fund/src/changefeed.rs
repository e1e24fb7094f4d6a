//! Invalidation signals for contribution changes
//!
//! The core publishes an event after every contribution insert/update/
//! delete; read-models subscribe and re-derive their aggregates. The feed
//! carries invalidation only, never authoritative balances, so subscribers
//! are eventually consistent with the store within the re-read delay.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

const FEED_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
}

/// One change to the contribution set.
#[derive(Debug, Clone, Serialize)]
pub struct ContributionEvent {
    pub kind: ChangeKind,
    pub user_id: Uuid,
}

/// Broadcast fan-out for contribution changes.
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ContributionEvent>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ContributionEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. A feed with no subscribers is not an error.
    pub fn publish(&self, kind: ChangeKind, user_id: Uuid) {
        let event = ContributionEvent { kind, user_id };
        if self.tx.send(event).is_err() {
            tracing::debug!("Contribution change published with no subscribers");
        }
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_published_events() {
        let feed = ChangeFeed::new();
        let mut rx = feed.subscribe();
        let user_id = Uuid::new_v4();

        feed.publish(ChangeKind::Inserted, user_id);
        feed.publish(ChangeKind::Updated, user_id);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.kind, ChangeKind::Inserted);
        assert_eq!(first.user_id, user_id);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.kind, ChangeKind::Updated);
    }

    #[test]
    fn test_publish_without_subscribers_does_not_panic() {
        let feed = ChangeFeed::new();
        feed.publish(ChangeKind::Deleted, Uuid::new_v4());
    }
}
