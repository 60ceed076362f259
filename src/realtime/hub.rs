use super::events::{ChangeKind, ServerMessage, Topic};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::broadcast;

/// In-process fan-out of change events, one broadcast channel per topic.
///
/// Delivery is best effort: a receiver that falls more than `capacity` messages
/// behind skips what it missed.
pub struct RealtimeHub {
    capacity: usize,
    topics: RwLock<HashMap<String, broadcast::Sender<ServerMessage>>>,
}

impl RealtimeHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            topics: RwLock::new(HashMap::new()),
        }
    }

    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<ServerMessage> {
        if let Some(sender) = self
            .topics
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(topic)
        {
            return sender.subscribe();
        }

        let mut topics = self.topics.write().unwrap_or_else(|e| e.into_inner());
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Send to every subscriber of the message's topic. Returns how many received it.
    /// Topics nobody listens to any more are dropped.
    pub fn publish(&self, message: ServerMessage) -> usize {
        let Some(topic) = message.topic().map(str::to_string) else {
            return 0;
        };

        let delivered = {
            let topics = self.topics.read().unwrap_or_else(|e| e.into_inner());
            match topics.get(&topic) {
                Some(sender) => sender.send(message).ok(),
                None => return 0,
            }
        };

        match delivered {
            Some(count) => count,
            None => {
                let mut topics = self.topics.write().unwrap_or_else(|e| e.into_inner());
                if topics
                    .get(&topic)
                    .is_some_and(|sender| sender.receiver_count() == 0)
                {
                    topics.remove(&topic);
                    tracing::debug!("pruned realtime topic {}", topic);
                }
                0
            }
        }
    }

    /// Publish a row change. Serialization failures are logged and dropped.
    pub fn publish_change<T: Serialize>(
        &self,
        topic: Topic,
        table: &str,
        kind: ChangeKind,
        record: &T,
    ) -> usize {
        let record = match serde_json::to_value(record) {
            Ok(record) => record,
            Err(err) => {
                tracing::error!("Failed to serialize {} change: {:?}", table, err);
                return 0;
            }
        };
        self.publish(ServerMessage::PostgresChanges {
            topic: topic.to_string(),
            table: table.to_string(),
            event_type: kind,
            record,
        })
    }

    pub fn topic_count(&self) -> usize {
        self.topics.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}
