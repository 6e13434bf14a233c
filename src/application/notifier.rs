use crate::domain::ports::MessageBusBox;
use crate::domain::role::Role;
use crate::domain::transaction::Transaction;
use crate::error::{PaymentError, Result};
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

const TOPIC_PREFIX: &str = "pay";

/// Outcome of the publish that follows a committed transition.
#[derive(Debug)]
pub enum Notification {
    Published { topic: String },
    /// The new status has no audience.
    NotNeeded,
    /// The transition stands; only the event was lost.
    Failed(PaymentError),
}

impl Notification {
    pub fn is_published(&self) -> bool {
        matches!(self, Notification::Published { .. })
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Published { topic } => write!(f, "published to {}", topic),
            Notification::NotNeeded => f.write_str("no notification needed"),
            Notification::Failed(err) => write!(f, "notification failed: {}", err),
        }
    }
}

/// The topic a party listens on.
pub fn topic_for(role: Role, id: &str) -> String {
    format!("{}::{}::{}", TOPIC_PREFIX, role, id)
}

/// Publishes transaction snapshots to the counterpart's topic and provides the
/// matching long-poll wait.
///
/// Delivery is at-most-once: an event published while nobody waits is gone.
pub struct Notifier {
    bus: MessageBusBox,
    wait_timeout: Duration,
}

impl Notifier {
    pub fn new(bus: MessageBusBox, wait_timeout: Duration) -> Self {
        Self { bus, wait_timeout }
    }

    /// Serializes `tx` and publishes it to the party addressed by its status.
    pub async fn notify(&self, tx: &Transaction) -> Result<Notification> {
        let Some((role, party)) = tx.counterpart() else {
            return Ok(Notification::NotNeeded);
        };
        let topic = topic_for(role, party);
        let payload = serde_json::to_vec(tx)?;
        self.bus.publish(&topic, payload).await?;
        debug!(transaction = %tx.id, %topic, "Published transaction snapshot");
        Ok(Notification::Published { topic })
    }

    /// Like [`Notifier::notify`], but folds a failure into the outcome.
    pub async fn publish(&self, tx: &Transaction) -> Notification {
        match self.notify(tx).await {
            Ok(notification) => notification,
            Err(err) => {
                error!(transaction = %tx.id, error = %err, "Failed to publish transaction snapshot");
                Notification::Failed(err)
            }
        }
    }

    /// Blocks until one snapshot addressed to `subscriber_id` arrives, the
    /// configured timeout elapses, or `cancel` fires.
    pub async fn wait(
        &self,
        subscriber_id: &str,
        role: Role,
        cancel: &CancellationToken,
    ) -> Result<Transaction> {
        self.wait_for(subscriber_id, role, self.wait_timeout, cancel)
            .await
    }

    pub async fn wait_for(
        &self,
        subscriber_id: &str,
        role: Role,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Transaction> {
        let topic = topic_for(role, subscriber_id);
        let mut subscription = self.bus.subscribe_once(&topic).await?;

        // The subscription is dropped, and so detached, on every path out.
        let payload = tokio::select! {
            _ = cancel.cancelled() => {
                debug!(%topic, "Wait cancelled");
                return Err(PaymentError::Cancelled);
            }
            received = subscription.next_message(timeout) => received,
        };

        let payload = match payload {
            Ok(payload) => payload,
            Err(PaymentError::TimeoutError(elapsed)) => {
                debug!(%topic, ?elapsed, "Wait timed out");
                return Err(PaymentError::TimeoutError(elapsed));
            }
            Err(err) => return Err(err),
        };

        Ok(serde_json::from_slice(&payload)?)
    }
}
