use std::sync::{Arc, Mutex};

use causeway_cloud::{MemoryTransport, NotificationTransport, Topic};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Order {
    id: String,
    quantity: u32,
    note: Option<String>,
}

fn sample_order() -> Order {
    Order {
        id: "ord-7".into(),
        quantity: 3,
        note: Some("déjà vu".into()),
    }
}

#[tokio::test]
async fn published_items_round_trip_through_the_envelope() {
    let transport = Arc::new(MemoryTransport::new());
    let topic: Topic<Order> = Topic::new("orders", transport.clone()).await.unwrap();

    let seen: Arc<Mutex<Vec<Order>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    topic
        .subscribe("audit", move |order| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(order);
                Ok(())
            }
        })
        .await
        .unwrap();

    let order = sample_order();
    topic.publish(&order).await.unwrap();

    let received = seen.lock().unwrap().clone();
    assert_eq!(received, vec![order]);

    let deliveries = transport.deliveries();
    assert_eq!(deliveries.len(), 1);
    assert!(deliveries[0].acked);
    assert!(deliveries[0].error.is_none());
}

#[tokio::test]
async fn subscription_names_concatenate_topic_and_name() {
    let transport = Arc::new(MemoryTransport::new());
    let topic: Topic<Order> = Topic::new("t", transport.clone()).await.unwrap();

    topic.subscribe("a", |_order| async { Ok(()) }).await.unwrap();
    topic.subscribe("b", |_order| async { Ok(()) }).await.unwrap();

    let names = transport.subscription_names(topic.handle());
    assert_eq!(names, vec!["t_a".to_string(), "t_b".to_string()]);
}

#[tokio::test]
async fn rejecting_handler_rejects_the_delivery_acknowledgment() {
    let transport = Arc::new(MemoryTransport::new());
    let topic: Topic<Order> = Topic::new("orders", transport.clone()).await.unwrap();

    topic
        .subscribe("flaky", |_order| async { Err(anyhow::anyhow!("boom")) })
        .await
        .unwrap();

    // Publish itself succeeds; the rejection lives on the ack path.
    topic.publish(&sample_order()).await.unwrap();

    let deliveries = transport.deliveries();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].subscription, "orders_flaky");
    assert!(!deliveries[0].acked);
    assert!(deliveries[0].error.as_deref().unwrap().contains("boom"));
}

#[tokio::test]
async fn malformed_envelope_rejects_the_delivery() {
    let transport = Arc::new(MemoryTransport::new());
    let topic: Topic<Order> = Topic::new("orders", transport.clone()).await.unwrap();

    topic.subscribe("audit", |_order| async { Ok(()) }).await.unwrap();

    transport
        .publish(topic.handle(), "not json".to_string())
        .await
        .unwrap();

    let deliveries = transport.deliveries();
    assert_eq!(deliveries.len(), 1);
    assert!(!deliveries[0].acked);
}

#[tokio::test]
async fn every_subscriber_sees_every_message() {
    let transport = Arc::new(MemoryTransport::new());
    let topic: Topic<Order> = Topic::new("orders", transport.clone()).await.unwrap();

    let counter = Arc::new(Mutex::new(0u32));
    for name in ["first", "second"] {
        let counter = counter.clone();
        topic
            .subscribe(name, move |_order| {
                let counter = counter.clone();
                async move {
                    *counter.lock().unwrap() += 1;
                    Ok(())
                }
            })
            .await
            .unwrap();
    }

    topic.publish(&sample_order()).await.unwrap();
    topic.publish(&sample_order()).await.unwrap();

    assert_eq!(*counter.lock().unwrap(), 4);
}

#[tokio::test]
async fn publishing_to_a_foreign_handle_errors() {
    let transport = Arc::new(MemoryTransport::new());
    let _topic: Topic<Order> = Topic::new("orders", transport.clone()).await.unwrap();

    let bogus = causeway_cloud::TopicHandle("memory:never-created".into());
    let err = transport.publish(&bogus, "{}".into()).await.unwrap_err();
    assert!(err.to_string().contains("never-created"));
}
