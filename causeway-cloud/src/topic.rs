//! Typed publish/subscribe channel over an untyped notification transport.
//!
//! The wire envelope is the JSON serialization of the published item; the
//! transport only ever sees strings. Whatever at-least-once or ordering
//! semantics exist come from the transport, not from here.

use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Opaque identity handed out by the transport when a topic is created.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TopicHandle(pub String);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("topic not found: {0}")]
    TopicNotFound(String),
    #[error("transport rejected the call: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum TopicError {
    #[error("failed to serialize message envelope: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Delivery callback a transport invokes with the raw message body.
///
/// Returning `Err` rejects the delivery on the transport's acknowledgment
/// path; whether that means redelivery or a drop is the transport's policy.
pub type MessageHandler =
    Box<dyn Fn(String) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Seam to the managed notification service. Implementations are injected
/// into [`Topic::new`]; nothing in this crate holds one globally.
#[async_trait::async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn create_topic(&self, name: &str) -> Result<TopicHandle, TransportError>;

    async fn publish(&self, handle: &TopicHandle, message: String) -> Result<(), TransportError>;

    async fn create_subscription(
        &self,
        name: &str,
        handle: &TopicHandle,
        on_message: MessageHandler,
    ) -> Result<(), TransportError>;
}

/// Named publish/subscribe channel carrying values of type `T`.
///
/// Identity is fixed at construction: the underlying topic is created once
/// and the handle never changes afterwards.
pub struct Topic<T> {
    name: String,
    handle: TopicHandle,
    transport: Arc<dyn NotificationTransport>,
    _payload: PhantomData<fn(T) -> T>,
}

impl<T> Topic<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    pub async fn new(
        name: impl Into<String>,
        transport: Arc<dyn NotificationTransport>,
    ) -> Result<Self, TopicError> {
        let name = name.into();
        let handle = transport.create_topic(&name).await?;
        Ok(Self {
            name,
            handle,
            transport,
            _payload: PhantomData,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> &TopicHandle {
        &self.handle
    }

    /// Serialize `item` to its JSON envelope and hand it to the transport.
    ///
    /// Fails if serialization fails or the transport call fails; no retry is
    /// performed here.
    pub async fn publish(&self, item: &T) -> Result<(), TopicError> {
        let envelope = serde_json::to_string(item)?;
        self.transport.publish(&self.handle, envelope).await?;
        Ok(())
    }

    /// Register a subscription named `<topic-name>_<name>`.
    ///
    /// Each delivery deserializes the body as JSON and awaits `handler`
    /// before completion is signalled to the transport. A handler error (or a
    /// body that fails to deserialize) rejects the delivery acknowledgment.
    pub async fn subscribe<F, Fut>(&self, name: &str, handler: F) -> Result<(), TopicError>
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let subscription = format!("{}_{}", self.name, name);
        let handler = Arc::new(handler);
        let on_message: MessageHandler = Box::new(move |body: String| {
            let handler = handler.clone();
            Box::pin(async move {
                let item: T = serde_json::from_str(&body)?;
                handler(item).await
            })
        });
        self.transport
            .create_subscription(&subscription, &self.handle, on_message)
            .await?;
        Ok(())
    }
}
