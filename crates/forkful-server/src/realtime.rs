//! Change notification for the single-restaurant view.
//!
//! Writers publish a [`RestaurantEvent`] after every successful mutation;
//! subscribers receive only events for the record they watch and respond by
//! reloading it. Events carry no payload beyond what changed.

use futures::Stream;
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    LabelsUpdated,
    ImageAdded,
    Deleted,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::LabelsUpdated => "labels_updated",
            ChangeKind::ImageAdded => "image_added",
            ChangeKind::Deleted => "deleted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RestaurantEvent {
    pub restaurant_id: Uuid,
    pub kind: ChangeKind,
}

#[derive(Clone)]
pub struct RealtimeHub {
    tx: broadcast::Sender<RestaurantEvent>,
}

impl RealtimeHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, restaurant_id: Uuid, kind: ChangeKind) {
        let event = RestaurantEvent { restaurant_id, kind };
        // Err only means nobody is watching
        let receivers = self.tx.send(event).unwrap_or(0);
        debug!(restaurant = %restaurant_id, kind = kind.as_str(), receivers, "Published change");
    }

    /// Stream of events for one restaurant, starting now.
    pub fn subscribe(&self, restaurant_id: Uuid) -> impl Stream<Item = RestaurantEvent> {
        let rx = self.tx.subscribe();
        futures::stream::unfold(rx, move |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(event) if event.restaurant_id == restaurant_id => return Some((event, rx)),
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(restaurant = %restaurant_id, skipped, "Subscriber lagged");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    #[tokio::test]
    async fn test_only_matching_events_delivered() {
        let hub = RealtimeHub::new(16);
        let watched = Uuid::new_v4();
        let other = Uuid::new_v4();

        let mut stream = Box::pin(hub.subscribe(watched));
        hub.publish(other, ChangeKind::LabelsUpdated);
        hub.publish(watched, ChangeKind::ImageAdded);

        let event = stream.next().await.unwrap();
        assert_eq!(
            event,
            RestaurantEvent {
                restaurant_id: watched,
                kind: ChangeKind::ImageAdded
            }
        );
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let hub = RealtimeHub::new(4);
        hub.publish(Uuid::new_v4(), ChangeKind::Deleted);
    }

    #[tokio::test]
    async fn test_stream_ends_when_hub_dropped() {
        let hub = RealtimeHub::new(4);
        let mut stream = Box::pin(hub.subscribe(Uuid::new_v4()));
        drop(hub);
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn test_event_json() {
        let id = Uuid::nil();
        let json = serde_json::to_value(RestaurantEvent {
            restaurant_id: id,
            kind: ChangeKind::LabelsUpdated,
        })
        .unwrap();
        assert_eq!(json["kind"], "labels_updated");
    }
}
