use crate::domain::ports::{MessageBus, Subscription, SubscriptionBox};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

const TOPIC_CAPACITY: usize = 16;

type Topics = Arc<Mutex<HashMap<String, broadcast::Sender<Vec<u8>>>>>;

/// An in-process, non-durable topic bus.
///
/// Each topic is a `broadcast` channel that only exists while someone is subscribed.
/// Publishing to a topic with no subscribers drops the message.
#[derive(Default, Clone)]
pub struct InMemoryBus {
    topics: Topics,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .lock()
            .map(|topics| topics.get(topic).map_or(0, |tx| tx.receiver_count()))
            .unwrap_or(0)
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        let topics = self
            .topics
            .lock()
            .map_err(|_| PaymentError::internal("Bus topic table poisoned"))?;
        if let Some(sender) = topics.get(topic) {
            // An error here only means every receiver went away; the message is dropped.
            let _ = sender.send(payload);
        }
        Ok(())
    }

    async fn subscribe_once(&self, topic: &str) -> Result<SubscriptionBox> {
        let mut topics = self
            .topics
            .lock()
            .map_err(|_| PaymentError::internal("Bus topic table poisoned"))?;
        let receiver = topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .subscribe();

        Ok(Box::new(InMemorySubscription {
            topic: topic.to_string(),
            receiver,
            topics: self.topics.clone(),
        }))
    }
}

pub struct InMemorySubscription {
    topic: String,
    receiver: broadcast::Receiver<Vec<u8>>,
    topics: Topics,
}

#[async_trait]
impl Subscription for InMemorySubscription {
    async fn next_message(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        let receive = async {
            loop {
                match self.receiver.recv().await {
                    Ok(payload) => return Ok(payload),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => {
                        return Err(PaymentError::internal(format!(
                            "Topic {} closed",
                            self.topic
                        )));
                    }
                }
            }
        };

        tokio::time::timeout(timeout, receive)
            .await
            .map_err(|_| PaymentError::TimeoutError(timeout))?
    }
}

impl Drop for InMemorySubscription {
    fn drop(&mut self) {
        if let Ok(mut topics) = self.topics.lock()
            && let Some(sender) = topics.get(&self.topic)
            // Our own receiver is still alive at this point.
            && sender.receiver_count() <= 1
        {
            topics.remove(&self.topic);
        }
    }
}
