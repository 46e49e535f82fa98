//! In-memory notification transport.
//!
//! Deliveries are made inline from `publish`: every registered handler is
//! awaited in turn and its acknowledgment outcome recorded, which is what the
//! tests assert against. There is no queueing or redelivery; a rejected
//! delivery is simply recorded as rejected.

use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use uuid::Uuid;

use crate::topic::{MessageHandler, NotificationTransport, TopicHandle, TransportError};

/// Outcome of a single delivery attempt.
#[derive(Clone, Debug)]
pub struct DeliveryRecord {
    pub delivery_id: Uuid,
    pub subscription: String,
    pub acked: bool,
    pub error: Option<String>,
}

struct SubscriptionEntry {
    name: String,
    on_message: Arc<MessageHandler>,
}

#[derive(Default)]
pub struct MemoryTransport {
    subscriptions: DashMap<String, Vec<SubscriptionEntry>>,
    deliveries: Mutex<Vec<DeliveryRecord>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every delivery attempt so far.
    pub fn deliveries(&self) -> Vec<DeliveryRecord> {
        self.deliveries.lock().expect("deliveries lock").clone()
    }

    /// Names of the subscriptions registered against `handle`.
    pub fn subscription_names(&self, handle: &TopicHandle) -> Vec<String> {
        self.subscriptions
            .get(&handle.0)
            .map(|subs| subs.iter().map(|s| s.name.clone()).collect())
            .unwrap_or_default()
    }

    fn record(&self, record: DeliveryRecord) {
        self.deliveries.lock().expect("deliveries lock").push(record);
    }
}

#[async_trait::async_trait]
impl NotificationTransport for MemoryTransport {
    async fn create_topic(&self, name: &str) -> Result<TopicHandle, TransportError> {
        let handle = TopicHandle(format!("memory:{name}"));
        self.subscriptions.entry(handle.0.clone()).or_default();
        tracing::debug!(topic = name, handle = %handle.0, "memory.create_topic");
        Ok(handle)
    }

    async fn publish(&self, handle: &TopicHandle, message: String) -> Result<(), TransportError> {
        // Clone the handler list so no map guard is held across awaits.
        let targets: Vec<(String, Arc<MessageHandler>)> = self
            .subscriptions
            .get(&handle.0)
            .ok_or_else(|| TransportError::TopicNotFound(handle.0.clone()))?
            .iter()
            .map(|s| (s.name.clone(), s.on_message.clone()))
            .collect();

        tracing::debug!(
            handle = %handle.0,
            subscribers = targets.len(),
            body_len = message.len(),
            "memory.publish"
        );

        for (subscription, on_message) in targets {
            let delivery_id = Uuid::new_v4();
            let outcome = on_message(message.clone()).await;
            let record = match outcome {
                Ok(()) => DeliveryRecord {
                    delivery_id,
                    subscription,
                    acked: true,
                    error: None,
                },
                Err(err) => {
                    tracing::warn!(
                        %delivery_id,
                        error = ?err,
                        "memory.delivery_rejected"
                    );
                    DeliveryRecord {
                        delivery_id,
                        subscription,
                        acked: false,
                        error: Some(err.to_string()),
                    }
                }
            };
            self.record(record);
        }
        Ok(())
    }

    async fn create_subscription(
        &self,
        name: &str,
        handle: &TopicHandle,
        on_message: MessageHandler,
    ) -> Result<(), TransportError> {
        let mut subs = self
            .subscriptions
            .get_mut(&handle.0)
            .ok_or_else(|| TransportError::TopicNotFound(handle.0.clone()))?;
        subs.push(SubscriptionEntry {
            name: name.to_string(),
            on_message: Arc::new(on_message),
        });
        tracing::debug!(subscription = name, handle = %handle.0, "memory.create_subscription");
        Ok(())
    }
}
