use tokio::sync::broadcast;

/// Notification published once per reconciliation cycle.
///
/// Carries no payload; subscribers re-fetch through the store lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexEvent {
    Refresh,
}

#[derive(Clone)]
pub struct Bus {
    sender: broadcast::Sender<IndexEvent>,
}

impl Bus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<IndexEvent> {
        self.sender.subscribe()
    }

    /// Publishes to all current subscribers, returning how many received it.
    /// A signal with no subscribers is simply dropped.
    pub fn publish(&self, event: IndexEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn publish_and_receive_event() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();

        bus.publish(IndexEvent::Refresh);

        let received = timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("timeout")
            .expect("recv");
        assert_eq!(received, IndexEvent::Refresh);
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_event() {
        let bus = Bus::new(8);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.publish(IndexEvent::Refresh), 2);

        assert_eq!(rx1.recv().await.expect("recv1"), IndexEvent::Refresh);
        assert_eq!(rx2.recv().await.expect("recv2"), IndexEvent::Refresh);
    }

    #[test]
    fn publish_without_subscribers_is_dropped() {
        let bus = Bus::new(8);
        assert_eq!(bus.publish(IndexEvent::Refresh), 0);
    }
}
