use super::test_utilities::{TestBroker, TestClient, start};
use pullq::{BrokerConfig, SubscriptionCreateConfig, TopicCreateConfig};
use pullq_http::limits;
use std::time::Duration;

#[tokio::test]
async fn test_unknown_endpoint() {
    let (_broker, helper) = start().await;
    let response = helper.get("/nonexistent-endpoint").await.unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_malformed_requests() {
    let (_broker, helper) = start().await;
    helper
        .pullq
        .create_topic("orders", &TopicCreateConfig::new())
        .await
        .unwrap();
    let url = format!("{}/topics/orders/publish", helper.base_url);

    let response = helper
        .client
        .post(&url)
        .body("invalid json")
        .header("content-type", "application/json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = helper.client.post(&url).send().await.unwrap();
    assert_eq!(response.status(), 415);

    let response = helper
        .post_json("/topics/orders/publish", serde_json::json!({ "invalid": "request" }))
        .await
        .unwrap();
    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn test_invalid_names_rejected() {
    let (_broker, helper) = start().await;

    let response = helper
        .put_json("/topics/bad*name", serde_json::json!({}))
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "invalid_parameter");
    assert_eq!(body["details"]["parameter"], "topic");

    let err = helper
        .pullq
        .create_subscription("has space", &SubscriptionCreateConfig::new("orders"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), pullq::ErrorKind::InvalidConfig);
}

#[tokio::test]
async fn test_names_may_start_with_any_allowed_character() {
    let (_broker, helper) = start().await;
    let client = &helper.pullq;

    for name in ["-orders", ".orders", "_orders", "9orders"] {
        let topic = client
            .create_topic(name, &TopicCreateConfig::new())
            .await
            .unwrap();
        assert_eq!(topic.name, name);
    }
    client
        .create_subscription("-billing", &SubscriptionCreateConfig::new("-orders"))
        .await
        .unwrap();
    assert_eq!(
        client.topic_subscriptions("-orders").await.unwrap(),
        vec!["-billing"]
    );
}

#[tokio::test]
async fn test_publish_validation() {
    let (_broker, helper) = start().await;
    helper
        .pullq
        .create_topic("orders", &TopicCreateConfig::new())
        .await
        .unwrap();

    let response = helper
        .post_json("/topics/orders/publish", serde_json::json!({ "raw_messages": [] }))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "message_ids": [] }));
    assert!(
        helper
            .pullq
            .publish_batch("orders", Vec::<String>::new())
            .await
            .unwrap()
            .is_empty()
    );

    let oversized = "x".repeat(limits::MAX_DATA_SIZE + 1);
    let response = helper
        .post_json(
            "/topics/orders/publish",
            serde_json::json!({ "raw_messages": [{ "data": oversized }] }),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let err = helper
        .pullq
        .publish("orders", oversized)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), pullq::ErrorKind::InvalidConfig);
}

#[tokio::test]
async fn test_pull_max_messages_bounds() {
    let (_broker, helper) = start().await;
    let client = &helper.pullq;
    client
        .create_topic("orders", &TopicCreateConfig::new())
        .await
        .unwrap();
    client
        .create_subscription("billing", &SubscriptionCreateConfig::new("orders"))
        .await
        .unwrap();
    client.publish("orders", "only").await.unwrap();

    assert!(client.pull("billing", 0).await.unwrap().is_empty());

    let pulled = client.pull("billing", 5000).await.unwrap();
    assert_eq!(pulled.len(), 1);
    assert_eq!(pulled[0].data, "only");

    for batch in 0..2 {
        let data: Vec<String> = (0..limits::MAX_BATCH_SIZE)
            .map(|i| format!("{batch}-{i}"))
            .collect();
        client.publish_batch("orders", data).await.unwrap();
    }
    let response = helper
        .post_json(
            "/subscriptions/billing/pull",
            serde_json::json!({ "max_messages": limits::MAX_PULL_MESSAGES * 10 }),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["messages"].as_array().unwrap().len(),
        limits::MAX_PULL_MESSAGES
    );
}

#[tokio::test]
async fn test_sweeper_reclaims_idle_resources() {
    let broker = TestBroker::start_with_config(BrokerConfig {
        sweep_interval: Duration::from_millis(50),
        ..BrokerConfig::default()
    })
    .await
    .unwrap();
    let helper = TestClient::new(&broker);
    let client = &helper.pullq;

    client
        .create_topic("short-lived", &TopicCreateConfig::new().with_ttl(1))
        .await
        .unwrap();
    client
        .create_topic("durable", &TopicCreateConfig::new())
        .await
        .unwrap();
    client
        .create_subscription("gone-with-topic", &SubscriptionCreateConfig::new("short-lived"))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(1500)).await;

    let names: Vec<String> = client
        .list_topics()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, vec!["durable"]);
    assert!(client
        .get_subscription("gone-with-topic")
        .await
        .unwrap_err()
        .is_not_found());
}
