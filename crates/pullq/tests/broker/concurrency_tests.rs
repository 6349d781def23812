use super::test_utilities::*;
use pullq::{Broker, InMemoryBroker, SubscriptionCreateConfig, TopicCreateConfig};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use test_log::test;

#[test]
fn test_concurrent_pulls_never_share_a_message() {
    let broker = Arc::new(broker_with_subscription("orders", "billing", 60));
    let data: Vec<String> = (0..500).map(|i| format!("m{i}")).collect();
    let ids: HashSet<_> = broker.publish("orders", data).unwrap().into_iter().collect();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let broker = Arc::clone(&broker);
            thread::spawn(move || {
                let mut seen = Vec::new();
                loop {
                    let batch = broker.pull("billing", Some(7)).unwrap();
                    if batch.is_empty() {
                        break;
                    }
                    seen.extend(batch.into_iter().map(|m| m.id));
                }
                seen
            })
        })
        .collect();

    let mut delivered = Vec::new();
    for handle in handles {
        delivered.extend(handle.join().unwrap());
    }

    let unique: HashSet<_> = delivered.iter().copied().collect();
    assert_eq!(delivered.len(), 500);
    assert_eq!(unique, ids);
}

#[test]
fn test_concurrent_publishers_and_consumers() {
    let broker = Arc::new(broker_with_subscription("orders", "billing", 60));

    let publishers: Vec<_> = (0..4)
        .map(|p| {
            let broker = Arc::clone(&broker);
            thread::spawn(move || {
                for i in 0..50 {
                    broker
                        .publish("orders", vec![format!("p{p}-{i}")])
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in publishers {
        handle.join().unwrap();
    }

    let consumers: Vec<_> = (0..4)
        .map(|_| {
            let broker = Arc::clone(&broker);
            thread::spawn(move || {
                let mut acked = 0;
                loop {
                    let batch = broker.pull("billing", Some(10)).unwrap();
                    if batch.is_empty() {
                        break;
                    }
                    let ids: Vec<_> = batch.iter().map(|m| m.id).collect();
                    acked += broker.ack("billing", &ids).unwrap().len();
                }
                acked
            })
        })
        .collect();

    let total: usize = consumers.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(total, 200);
    assert_eq!(broker.metrics().messages_acked, 200);
}

#[test]
fn test_concurrent_creates_of_same_name_yield_one_winner() {
    let broker = Arc::new(InMemoryBroker::new());

    let topic_results: Vec<_> = (0..16)
        .map(|_| {
            let broker = Arc::clone(&broker);
            thread::spawn(move || broker.create_topic("same", &TopicCreateConfig::new()))
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|h| h.join().unwrap())
        .collect();

    assert_eq!(topic_results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        topic_results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| e.is_conflict())
    );

    let subscription_results: Vec<_> = (0..16)
        .map(|_| {
            let broker = Arc::clone(&broker);
            thread::spawn(move || {
                broker.create_subscription("same-sub", &SubscriptionCreateConfig::new("same"))
            })
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|h| h.join().unwrap())
        .collect();

    assert_eq!(subscription_results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        subscription_results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| e.is_conflict())
    );
    assert_eq!(broker.list_topics().len(), 1);
    assert_eq!(broker.topic_subscriptions("same").unwrap(), vec!["same-sub"]);
    assert_eq!(broker.metrics().topics_all_time, 1);
    assert_eq!(broker.metrics().subscriptions_all_time, 1);
}
