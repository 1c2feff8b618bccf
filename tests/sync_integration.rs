mod common;

use common::{engine_at, id, temp_dir, RecordingRemote};
use offline_ledger::application::services::{DrainOutcome, SyncState, SyncTrigger};
use offline_ledger::domain::entities::{Employee, PayType};
use offline_ledger::domain::value_objects::{EntityKind, EntityPayload};
use offline_ledger::LedgerEngine;
use serde_json::json;
use std::time::Duration;
use tokio::sync::watch;

async fn enqueue_employees(engine: &LedgerEngine, count: usize) {
    for index in 0..count {
        let employee = Employee::new(
            id(&format!("emp-{index}")),
            format!("Employee {index}"),
            PayType::Hourly { rate: 15.0 },
        );
        engine.ledger.save_employee(&employee).await.expect("save");
    }
}

#[tokio::test]
async fn offline_writes_never_reach_the_remote() {
    let dir = temp_dir();
    let remote = RecordingRemote::new();
    let engine = engine_at(dir.path(), remote.clone(), false).await;

    enqueue_employees(&engine, 3).await;

    assert_eq!(remote.call_count().await, 0);
    assert_eq!(engine.queue.pending_count().await.unwrap(), 3);
    assert_eq!(engine.ledger.employees().await.unwrap().len(), 3);
}

#[tokio::test]
async fn successful_drain_empties_queue_in_fifo_order() {
    let dir = temp_dir();
    let remote = RecordingRemote::new();
    let engine = engine_at(dir.path(), remote.clone(), false).await;
    enqueue_employees(&engine, 4).await;
    let queued: Vec<_> = engine
        .queue
        .list_pending()
        .await
        .unwrap()
        .into_iter()
        .map(|mutation| mutation.id)
        .collect();

    let report = engine.sync.drain(SyncTrigger::Manual).await.unwrap();

    assert_eq!(report.outcome, DrainOutcome::Completed);
    assert_eq!(report.acknowledged, 4);
    assert_eq!(engine.queue.pending_count().await.unwrap(), 0);
    assert_eq!(remote.submitted_mutation_ids().await, queued);
    assert!(engine.sync.last_sync().await.unwrap().is_some());
}

#[tokio::test]
async fn empty_queue_drain_still_records_last_sync() {
    let dir = temp_dir();
    let engine = engine_at(dir.path(), RecordingRemote::new(), true).await;

    let report = engine.sync.drain(SyncTrigger::Manual).await.unwrap();

    assert_eq!(report.submitted, 0);
    assert!(report.is_completed());
    let status = engine.sync.status().await.unwrap();
    assert!(status.last_sync.is_some());
    assert_eq!(status.state, SyncState::Idle);
    assert_eq!(status.pending_count, 0);
}

#[tokio::test]
async fn failure_keeps_failed_mutation_and_successors_queued() {
    let dir = temp_dir();
    let remote = RecordingRemote::failing_on(3);
    let engine = engine_at(dir.path(), remote.clone(), false).await;
    enqueue_employees(&engine, 5).await;

    let report = engine.sync.drain(SyncTrigger::Manual).await.unwrap();

    assert!(matches!(report.outcome, DrainOutcome::Aborted { .. }));
    assert_eq!(report.acknowledged, 2);
    let remaining: Vec<String> = engine
        .queue
        .list_pending()
        .await
        .unwrap()
        .into_iter()
        .map(|mutation| mutation.entity_id.to_string())
        .collect();
    assert_eq!(remaining, vec!["emp-2", "emp-3", "emp-4"]);
    assert!(engine.sync.last_sync().await.unwrap().is_none());
    assert_eq!(engine.sync.metrics().consecutive_failed_passes, 1);
}

#[tokio::test]
async fn rerun_after_failure_does_not_resubmit_acknowledged_mutations() {
    let dir = temp_dir();
    let remote = RecordingRemote::failing_on(2);
    let engine = engine_at(dir.path(), remote.clone(), false).await;
    enqueue_employees(&engine, 3).await;

    engine.sync.drain(SyncTrigger::Manual).await.unwrap();
    let second = engine.sync.drain(SyncTrigger::Manual).await.unwrap();

    assert!(second.is_completed());
    assert_eq!(
        remote.submitted_entity_ids().await,
        vec!["emp-0", "emp-1", "emp-1", "emp-2"]
    );
    assert_eq!(engine.queue.pending_count().await.unwrap(), 0);
}

#[tokio::test]
async fn reconnect_triggers_a_drain() {
    let dir = temp_dir();
    let remote = RecordingRemote::new();
    let engine = engine_at(dir.path(), remote.clone(), false).await;
    enqueue_employees(&engine, 2).await;

    let event = engine.connectivity.report(true).await.expect("transition");

    assert!(event.is_reconnect());
    assert_eq!(remote.call_count().await, 2);
    assert_eq!(engine.queue.pending_count().await.unwrap(), 0);
    assert_eq!(
        engine.sync.metrics().last_trigger.as_deref(),
        Some("reconnect")
    );
}

#[tokio::test]
async fn going_offline_does_not_drain() {
    let dir = temp_dir();
    let remote = RecordingRemote::new();
    let engine = engine_at(dir.path(), remote.clone(), true).await;
    engine.connectivity.report(false).await;
    enqueue_employees(&engine, 1).await;

    assert!(engine.connectivity.report(false).await.is_none());
    assert_eq!(remote.call_count().await, 0);
}

#[tokio::test]
async fn attached_signal_drives_reconnect_drain() {
    let dir = temp_dir();
    let remote = RecordingRemote::new();
    let engine = engine_at(dir.path(), remote.clone(), false).await;
    enqueue_employees(&engine, 2).await;
    let mut events = engine.connectivity.subscribe();
    let (tx, signal) = watch::channel(false);
    engine.attach_connectivity(signal);

    tx.send(true).expect("send");
    events.recv().await.expect("event");

    // Listeners run after the broadcast, so wait for the pass to land.
    for _ in 0..50 {
        if engine.queue.pending_count().await.unwrap() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(engine.queue.pending_count().await.unwrap(), 0);
    assert_eq!(remote.call_count().await, 2);
    engine.shutdown();
}

#[tokio::test]
async fn online_write_requests_background_drain() {
    let dir = temp_dir();
    let remote = RecordingRemote::new();
    let engine = engine_at(dir.path(), remote.clone(), true).await;

    let payload = EntityPayload::new(json!({
        "id": "emp-9",
        "name": "Ana",
        "payType": {"type": "hourly", "rate": 12.0}
    }))
    .unwrap();
    engine
        .ledger
        .create(EntityKind::Employee, payload)
        .await
        .unwrap();

    for _ in 0..50 {
        if engine.queue.pending_count().await.unwrap() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(engine.queue.pending_count().await.unwrap(), 0);
    assert_eq!(remote.submitted_entity_ids().await, vec!["emp-9"]);
}
