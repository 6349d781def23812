use super::test_utilities::{TestBroker, start};
use pullq::{ErrorKind, TopicCreateConfig};
use pullq_http::{ClientConfig, PullqClient};
use std::time::Duration;

#[tokio::test]
async fn test_connection_refused_is_transport_failure() {
    let broker = TestBroker::start().await.unwrap();
    let url = broker.base_url();
    drop(broker);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = PullqClient::with_config(
        ClientConfig::new(url).with_timeout(Duration::from_secs(2)),
    )
    .unwrap();
    let err = client.list_topics().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportFailure);
    assert!(!err.is_client_error());
}

#[tokio::test]
async fn test_names_are_url_encoded() {
    let (_broker, helper) = start().await;

    // Encoded slash reaches the broker as part of the name and fails validation
    let err = helper
        .pullq
        .create_topic("a/b", &TopicCreateConfig::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);

    let topic = helper
        .pullq
        .create_topic("dotted.name_1-x", &TopicCreateConfig::new())
        .await
        .unwrap();
    assert_eq!(topic.name, "dotted.name_1-x");
}

#[tokio::test]
async fn test_custom_api_prefix_must_match_broker() {
    let (broker, _helper) = start().await;

    let client = PullqClient::with_config(
        ClientConfig::new(broker.base_url()).with_api_prefix("/api/v1"),
    )
    .unwrap();
    assert!(!client.heartbeat().await);
    assert_eq!(
        client.metrics().await.unwrap_err().kind(),
        ErrorKind::TransportFailure
    );
}
