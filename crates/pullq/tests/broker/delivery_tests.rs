use super::test_utilities::*;
use pullq::{Broker, SubscriptionCreateConfig};
use std::collections::HashSet;
use test_log::test;

#[test]
fn test_publish_returns_ids_in_order() {
    let broker = broker_with_subscription("orders", "billing", 60);
    let ids = broker.publish("orders", payloads(&["a", "b", "c"])).unwrap();

    assert_eq!(ids.len(), 3);
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 3);

    let messages = broker.pull("billing", Some(10)).unwrap();
    let pulled: Vec<_> = messages.iter().map(|m| m.id).collect();
    assert_eq!(pulled, ids);
    assert!(messages.iter().all(|m| m.tries == 1));
}

#[test]
fn test_publish_to_missing_topic() {
    let broker = broker_with_topic("orders");
    assert!(broker
        .publish("missing", payloads(&["x"]))
        .unwrap_err()
        .is_not_found());
}

#[test]
fn test_publish_without_subscriptions_is_accepted() {
    let broker = broker_with_topic("orders");
    let ids = broker.publish("orders", payloads(&["lost"])).unwrap();
    assert_eq!(ids.len(), 1);

    broker
        .create_subscription("late", &SubscriptionCreateConfig::new("orders"))
        .unwrap();
    assert!(broker.pull("late", Some(10)).unwrap().is_empty());
}

#[test]
fn test_pull_uses_default_max_messages() {
    let broker = broker_with_subscription("orders", "billing", 60);
    broker.publish("orders", payloads(&["a", "b"])).unwrap();

    let messages = broker.pull("billing", None).unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].data, "a");
}

#[test]
fn test_pull_zero_max_messages() {
    let broker = broker_with_subscription("orders", "billing", 60);
    broker.publish("orders", payloads(&["a"])).unwrap();

    assert!(broker.pull("billing", Some(0)).unwrap().is_empty());
    assert_eq!(broker.pull("billing", Some(1)).unwrap().len(), 1);
}

#[test]
fn test_pull_missing_subscription() {
    let broker = broker_with_topic("orders");
    assert!(broker.pull("missing", Some(1)).unwrap_err().is_not_found());
    assert!(broker.ack("missing", &[]).unwrap_err().is_not_found());
}

#[test]
fn test_reserved_message_not_pulled_again_before_deadline() {
    let broker = broker_with_subscription("orders", "billing", 60);
    broker.publish("orders", payloads(&["a"])).unwrap();

    assert_eq!(broker.pull("billing", Some(1)).unwrap().len(), 1);
    assert!(broker.pull("billing", Some(1)).unwrap().is_empty());
}

#[test]
fn test_fan_out_to_every_subscription() {
    let broker = broker_with_subscription("orders", "billing", 60);
    broker
        .create_subscription("audit", &SubscriptionCreateConfig::new("orders"))
        .unwrap();
    let ids = broker.publish("orders", payloads(&["a"])).unwrap();

    let billing = broker.pull("billing", Some(10)).unwrap();
    let audit = broker.pull("audit", Some(10)).unwrap();
    assert_eq!(billing[0].id, ids[0]);
    assert_eq!(audit[0].id, ids[0]);

    // Acking on one subscription leaves the other untouched
    assert_eq!(broker.ack("billing", &ids).unwrap(), ids);
    assert!(broker.pull("billing", Some(10)).unwrap().is_empty());
    assert_eq!(broker.ack("audit", &ids).unwrap(), ids);
}

#[test]
fn test_ack_returns_accepted_subset() {
    let broker = broker_with_subscription("orders", "billing", 60);
    broker.publish("orders", payloads(&["a", "b", "c"])).unwrap();
    let pulled = broker.pull("billing", Some(2)).unwrap();

    let unknown = uuid::Uuid::new_v4();
    let acked = broker
        .ack("billing", &[pulled[0].id, unknown, pulled[1].id])
        .unwrap();
    assert_eq!(acked, vec![pulled[0].id, pulled[1].id]);

    // Already acknowledged ids are not accepted twice
    assert!(broker.ack("billing", &[pulled[0].id]).unwrap().is_empty());

    let rest = broker.pull("billing", Some(10)).unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].data, "c");
}

#[test]
fn test_ack_of_never_pulled_message_is_ignored() {
    let broker = broker_with_subscription("orders", "billing", 60);
    let ids = broker.publish("orders", payloads(&["a"])).unwrap();

    assert!(broker.ack("billing", &ids).unwrap().is_empty());
    assert_eq!(broker.pull("billing", Some(1)).unwrap()[0].id, ids[0]);
}

#[test]
fn test_zero_ack_deadline_redelivers_immediately() {
    let broker = broker_with_subscription("orders", "billing", 0);
    let ids = broker.publish("orders", payloads(&["a"])).unwrap();

    let first = broker.pull("billing", Some(1)).unwrap();
    let second = broker.pull("billing", Some(1)).unwrap();

    assert_eq!(first[0].id, ids[0]);
    assert_eq!(second[0].id, ids[0]);
    assert_eq!(first[0].tries, 1);
    assert_eq!(second[0].tries, 2);
    // The reservation is already past its deadline, so the ack is dropped
    assert!(broker.ack("billing", &ids).unwrap().is_empty());
}

#[test]
fn test_redelivery_precedes_new_messages() {
    let broker = broker_with_subscription("orders", "billing", 0);
    broker.publish("orders", payloads(&["first"])).unwrap();
    broker.pull("billing", Some(1)).unwrap();
    broker.publish("orders", payloads(&["second"])).unwrap();

    let messages = broker.pull("billing", Some(2)).unwrap();
    let data: Vec<&str> = messages.iter().map(|m| m.data.as_str()).collect();
    assert_eq!(data, vec!["first", "second"]);
    assert_eq!(messages[0].tries, 2);
    assert_eq!(messages[1].tries, 1);
}

#[test]
fn test_historical_subscription_sees_backlog() {
    let broker = broker_with_topic("orders");
    broker.publish("orders", payloads(&["a", "b"])).unwrap();

    broker
        .create_subscription(
            "replay",
            &SubscriptionCreateConfig::new("orders").with_historical(true),
        )
        .unwrap();
    broker
        .create_subscription("live", &SubscriptionCreateConfig::new("orders"))
        .unwrap();
    broker.publish("orders", payloads(&["c"])).unwrap();

    let replay: Vec<String> = broker
        .pull("replay", Some(10))
        .unwrap()
        .into_iter()
        .map(|m| m.data)
        .collect();
    let live: Vec<String> = broker
        .pull("live", Some(10))
        .unwrap()
        .into_iter()
        .map(|m| m.data)
        .collect();
    assert_eq!(replay, vec!["a", "b", "c"]);
    assert_eq!(live, vec!["c"]);
}

#[test]
fn test_message_carries_publish_time() {
    let broker = broker_with_subscription("orders", "billing", 60);
    let before = chrono::Utc::now();
    broker.publish("orders", payloads(&["a"])).unwrap();
    let after = chrono::Utc::now();

    let message = broker.pull("billing", Some(1)).unwrap().remove(0);
    assert!(message.time >= before && message.time <= after);
}

#[test]
fn test_end_to_end_queue_scenario() {
    let broker = broker_with_topic("t1");
    broker
        .create_subscription(
            "s1",
            &SubscriptionCreateConfig::new("t1").with_ack_deadline(1),
        )
        .unwrap();

    let ids = broker.publish("t1", payloads(&["hello"])).unwrap();
    let pulled = broker.pull("s1", Some(1)).unwrap();
    assert_eq!(pulled.len(), 1);
    assert_eq!(pulled[0].id, ids[0]);
    assert_eq!(pulled[0].data, "hello");

    assert_eq!(broker.ack("s1", &[pulled[0].id]).unwrap(), vec![pulled[0].id]);

    std::thread::sleep(std::time::Duration::from_millis(1100));
    assert!(broker.pull("s1", Some(1)).unwrap().is_empty());
}
