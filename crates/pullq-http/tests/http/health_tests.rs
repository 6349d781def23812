use super::test_utilities::{TestBroker, start};
use pullq_http::PullqClient;

#[tokio::test]
async fn test_heartbeat() {
    let (_broker, helper) = start().await;

    let response = helper.get("/heartbeat").await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "heartbeat");

    assert!(helper.pullq.heartbeat().await);
}

#[tokio::test]
async fn test_heartbeat_unreachable_broker() {
    let broker = TestBroker::start().await.unwrap();
    let url = broker.base_url();
    drop(broker);
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let client = PullqClient::new(url).unwrap();
    assert!(!client.heartbeat().await);
}

#[tokio::test]
async fn test_metrics() {
    let (_broker, helper) = start().await;
    let client = &helper.pullq;

    client
        .create_topic("orders", &Default::default())
        .await
        .unwrap();
    client
        .create_subscription("billing", &pullq::SubscriptionCreateConfig::new("orders"))
        .await
        .unwrap();
    client
        .publish_batch("orders", ["a", "b", "c"])
        .await
        .unwrap();
    let pulled = client.pull("billing", 2).await.unwrap();
    client.ack("billing", pulled[0].id).await.unwrap();

    let metrics = client.metrics().await.unwrap();
    assert_eq!(metrics.topics.len(), 1);
    assert_eq!(metrics.subscriptions.len(), 1);
    assert_eq!(metrics.topics_all_time, 1);
    assert_eq!(metrics.messages_published, 3);
    assert_eq!(metrics.messages_pulled, 2);
    assert_eq!(metrics.messages_acked, 1);

    let topic = &metrics.topics["orders"];
    assert_eq!(topic.messages, 3);
    assert_eq!(topic.messages_all_time, 3);
    assert_eq!(topic.subscriptions, 1);
    let subscription = &metrics.subscriptions["billing"];
    assert_eq!(subscription.topic, "orders");
    assert_eq!(subscription.pending, 2);
    assert_eq!(subscription.reserved, 1);
    assert_eq!(subscription.pulled_all_time, 2);
    assert_eq!(subscription.acks_all_time, 1);
    assert_eq!(subscription.acked_all_time, 1);

    let raw: serde_json::Value = helper.get("/metrics").await.unwrap().json().await.unwrap();
    assert!(raw["start_time"].is_string());
    assert_eq!(raw["subscriptions"]["billing"]["pending"], 2);
}
