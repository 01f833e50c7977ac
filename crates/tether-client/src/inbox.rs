//! Single-consumer delivery queue
//!
//! Moves feed items arriving on the IPC callback context onto the consumer's
//! own context, preserving arrival order. The queue is deliberately
//! unbounded: the remote side is trusted and low-rate, and `post` must never
//! block the transport's callback thread. Backpressure is a non-goal here.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use tether_core::types::FeedItem;

/// Consumer half of the inbox. Lives on the consumer's own context.
pub struct EventInbox {
    rx: mpsc::UnboundedReceiver<FeedItem>,
}

/// Posting half of the inbox. Cheap to clone; callable from the IPC callback
/// context.
#[derive(Clone)]
pub struct InboxPoster {
    tx: mpsc::UnboundedSender<FeedItem>,
}

impl EventInbox {
    /// Create a connected inbox/poster pair
    pub fn channel() -> (EventInbox, InboxPoster) {
        let (tx, rx) = mpsc::unbounded_channel();
        (EventInbox { rx }, InboxPoster { tx })
    }

    /// Next item in arrival order.
    ///
    /// Returns `None` once every poster is gone and the queue has drained,
    /// i.e. the feed ended.
    pub async fn recv(&mut self) -> Option<FeedItem> {
        self.rx.recv().await
    }

    /// Next item if one is queued right now
    pub fn try_recv(&mut self) -> Option<FeedItem> {
        match self.rx.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Everything queued at this moment, in arrival order, without waiting
    pub fn drain(&mut self) -> Vec<FeedItem> {
        let mut items = Vec::new();
        while let Some(item) = self.try_recv() {
            items.push(item);
        }
        items
    }
}

impl InboxPoster {
    /// Enqueue an item for the consumer.
    ///
    /// Never blocks and never panics; posting after the consumer went away
    /// quietly drops the item.
    pub fn post(&self, item: FeedItem) {
        if self.tx.send(item).is_err() {
            tracing::debug!("inbox consumer gone, dropping item");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::types::Event;

    fn event(tag: &str) -> FeedItem {
        FeedItem::Event(Event::new(tag.as_bytes().to_vec()))
    }

    #[tokio::test]
    async fn test_items_drain_in_post_order() {
        let (mut inbox, poster) = EventInbox::channel();

        poster.post(FeedItem::Ready);
        poster.post(event("one"));
        poster.post(event("two"));

        assert_eq!(inbox.recv().await, Some(FeedItem::Ready));
        assert_eq!(inbox.recv().await, Some(event("one")));
        assert_eq!(inbox.recv().await, Some(event("two")));
    }

    #[tokio::test]
    async fn test_order_survives_posting_from_another_task() {
        let (mut inbox, poster) = EventInbox::channel();

        let producer = tokio::spawn(async move {
            for i in 0..100u32 {
                poster.post(FeedItem::Event(Event::new(i.to_be_bytes().to_vec())));
            }
        });

        let mut seen = Vec::new();
        while let Some(FeedItem::Event(event)) = inbox.recv().await {
            seen.push(u32::from_be_bytes(event.payload[..4].try_into().unwrap()));
        }
        producer.await.unwrap();

        assert_eq!(seen, (0..100).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_queued_items_survive_poster_drop() {
        let (mut inbox, poster) = EventInbox::channel();

        poster.post(event("left-behind"));
        drop(poster);

        assert_eq!(inbox.recv().await, Some(event("left-behind")));
        assert_eq!(inbox.recv().await, None);
    }

    #[tokio::test]
    async fn test_post_after_consumer_drop_is_a_no_op() {
        let (inbox, poster) = EventInbox::channel();
        drop(inbox);

        // must not panic
        poster.post(FeedItem::Ready);
    }

    #[tokio::test]
    async fn test_drain_takes_only_whats_queued() {
        let (mut inbox, poster) = EventInbox::channel();

        poster.post(event("a"));
        poster.post(event("b"));

        assert_eq!(inbox.drain(), vec![event("a"), event("b")]);
        assert!(inbox.drain().is_empty());
    }
}
