//! Tests for the interval-driven scheduler.

mod common;

use std::sync::Arc;
use std::time::Duration;

use bitclock_client::queue::Pending;
use bitclock_client::scheduler::Scheduler;
use bitclock_client::sender::Sender;
use bitclock_core::ConfigStore;
use common::{event, test_config, wait_for, RecordingTransport};
use tokio::runtime::Handle;

fn scheduler(interval_ms: u64) -> (Arc<Scheduler>, Arc<RecordingTransport>, ConfigStore) {
    let store = ConfigStore::new(test_config(interval_ms)).unwrap();
    let transport = RecordingTransport::new();
    let sender = Arc::new(Sender::new(store.clone(), transport.clone()));
    let scheduler = Arc::new(Scheduler::new(store.clone(), sender, Handle::current()));
    (scheduler, transport, store)
}

#[tokio::test]
async fn test_enqueue_does_not_send_inline() {
    let (scheduler, transport, _) = scheduler(50);
    scheduler.enqueue(Pending::Value(event(1.0)));
    // Nothing runs until the caller yields.
    assert_eq!(transport.request_count(), 0);
    assert!(scheduler.is_armed());
    assert_eq!(scheduler.pending(), 1);

    assert!(wait_for(Duration::from_secs(2), || transport.request_count() == 1).await);
}

#[tokio::test]
async fn test_burst_is_delivered_in_one_request() {
    let (scheduler, transport, _) = scheduler(50);
    for i in 0..100 {
        scheduler.enqueue(Pending::Value(event(i as f64)));
    }
    assert!(wait_for(Duration::from_secs(2), || transport.request_count() == 1).await);
    let values: Vec<f64> = transport
        .events()
        .iter()
        .map(|e| e["value"].as_f64().unwrap())
        .collect();
    assert_eq!(values, (0..100).map(|i| i as f64).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_goes_idle_after_draining() {
    let (scheduler, transport, _) = scheduler(50);
    scheduler.enqueue(Pending::Value(event(1.0)));
    assert!(wait_for(Duration::from_secs(2), || !scheduler.is_armed()).await);
    assert_eq!(transport.request_count(), 1);
    assert_eq!(scheduler.pending(), 0);

    // A later enqueue re-arms.
    scheduler.enqueue(Pending::Value(event(2.0)));
    assert!(scheduler.is_armed());
    assert!(wait_for(Duration::from_secs(2), || transport.request_count() == 2).await);
}

#[tokio::test]
async fn test_reporting_interval_spaces_sends() {
    let (scheduler, transport, _) = scheduler(400);
    scheduler.enqueue(Pending::Value(event(1.0)));
    assert!(wait_for(Duration::from_secs(1), || transport.request_count() == 1).await);

    scheduler.enqueue(Pending::Value(event(2.0)));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(transport.request_count(), 1);
    assert!(scheduler.is_armed());

    assert!(wait_for(Duration::from_secs(2), || transport.request_count() == 2).await);
}

#[tokio::test]
async fn test_backlog_split_into_chunks() {
    let (scheduler, transport, store) = scheduler(50);
    store.set_max_chunk_size(10).unwrap();
    for i in 0..25 {
        scheduler.enqueue(Pending::Value(event(i as f64)));
    }
    assert!(wait_for(Duration::from_secs(2), || transport.request_count() == 3).await);

    let mut sizes = transport.batch_sizes();
    sizes.sort_unstable();
    assert_eq!(sizes, vec![5, 10, 10]);
    assert_eq!(transport.events().len(), 25);
}

#[tokio::test]
async fn test_flush_sends_immediately_and_in_order() {
    let (scheduler, transport, store) = scheduler(60_000);
    store.set_max_chunk_size(2).unwrap();
    scheduler.enqueue(Pending::Value(event(0.0)));
    assert!(wait_for(Duration::from_secs(1), || transport.request_count() == 1).await);

    for i in 1..=5 {
        scheduler.enqueue(Pending::Value(event(i as f64)));
    }
    scheduler.flush().await;
    assert_eq!(transport.batch_sizes(), vec![1, 2, 2, 1]);
    let values: Vec<f64> = transport
        .events()
        .iter()
        .map(|e| e["value"].as_f64().unwrap())
        .collect();
    assert_eq!(values, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    assert_eq!(scheduler.pending(), 0);
}

#[tokio::test]
async fn test_disabled_enqueue_is_a_no_op() {
    let (scheduler, transport, store) = scheduler(50);
    store.set_enable(false);
    scheduler.enqueue(Pending::Value(event(1.0)));
    assert_eq!(scheduler.pending(), 0);
    assert!(!scheduler.is_armed());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_flush_with_nothing_queued() {
    let (scheduler, transport, _) = scheduler(50);
    scheduler.flush().await;
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_flush_waits_for_sends_already_started() {
    let store = ConfigStore::new(test_config(50)).unwrap();
    let transport = RecordingTransport::slow(Duration::from_millis(100));
    let sender = Arc::new(Sender::new(store.clone(), transport.clone()));
    let scheduler = Arc::new(Scheduler::new(store, sender, Handle::current()));

    scheduler.enqueue(Pending::Value(event(1.0)));
    assert!(wait_for(Duration::from_secs(1), || transport.request_count() == 1).await);
    assert_eq!(scheduler.pending(), 0);
    assert_eq!(transport.completed(), 0);

    scheduler.flush().await;
    assert_eq!(transport.completed(), 1);
    assert_eq!(scheduler.in_flight(), 0);
}
