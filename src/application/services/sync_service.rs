use super::connectivity_monitor::ConnectivityMonitor;
use super::mutation_queue::MutationQueue;
use crate::application::ports::connectivity::{ConnectivityEvent, ConnectivityListener};
use crate::application::ports::local_store::LedgerStore;
use crate::application::ports::remote_api::RemoteApi;
use crate::domain::entities::{Entity, SyncMetadata};
use crate::domain::value_objects::{Collection, EntityId, MutationId};
use crate::infrastructure::metrics::{PassOutcomeStatus, SyncMetrics, SyncMetricsSnapshot};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Idle,
    Draining,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTrigger {
    Reconnect,
    Manual,
    Enqueue,
    Scheduled,
    Startup,
}

impl SyncTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncTrigger::Reconnect => "reconnect",
            SyncTrigger::Manual => "manual",
            SyncTrigger::Enqueue => "enqueue",
            SyncTrigger::Scheduled => "scheduled",
            SyncTrigger::Startup => "startup",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DrainOutcome {
    /// Every mutation in the snapshot was acknowledged and removed.
    Completed,
    /// Stopped at the first failure; that mutation and everything after it
    /// stay queued.
    Aborted {
        mutation_id: MutationId,
        error: String,
    },
    /// Another pass was already running.
    Coalesced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrainReport {
    pub trigger: SyncTrigger,
    pub outcome: DrainOutcome,
    pub submitted: u32,
    pub acknowledged: u32,
    pub remaining: u64,
    pub duration_ms: u64,
}

impl DrainReport {
    pub fn is_completed(&self) -> bool {
        self.outcome == DrainOutcome::Completed
    }

    fn coalesced(trigger: SyncTrigger) -> Self {
        Self {
            trigger,
            outcome: DrainOutcome::Coalesced,
            submitted: 0,
            acknowledged: 0,
            remaining: 0,
            duration_ms: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub state: SyncState,
    pub pending_count: u64,
    pub last_sync: Option<DateTime<Utc>>,
    pub sync_errors: u64,
    pub divergences: u64,
}

struct DrainGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Replays the mutation queue against the remote API in FIFO order.
///
/// At most one pass runs at a time; a trigger that arrives mid-pass gets a
/// [`DrainOutcome::Coalesced`] report instead of starting a second one.
pub struct SyncOrchestrator {
    store: Arc<dyn LedgerStore>,
    queue: Arc<MutationQueue>,
    remote: Arc<dyn RemoteApi>,
    draining: AtomicBool,
    metrics: SyncMetrics,
}

impl SyncOrchestrator {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        queue: Arc<MutationQueue>,
        remote: Arc<dyn RemoteApi>,
    ) -> Self {
        Self {
            store,
            queue,
            remote,
            draining: AtomicBool::new(false),
            metrics: SyncMetrics::new(),
        }
    }

    pub fn state(&self) -> SyncState {
        if self.draining.load(Ordering::Acquire) {
            SyncState::Draining
        } else {
            SyncState::Idle
        }
    }

    pub async fn drain(&self, trigger: SyncTrigger) -> Result<DrainReport, AppError> {
        if self
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(
                target: "ledger::sync",
                trigger = trigger.as_str(),
                "drain already running; trigger coalesced"
            );
            return Ok(DrainReport::coalesced(trigger));
        }
        let _guard = DrainGuard {
            flag: &self.draining,
        };

        let started = Instant::now();
        // Snapshot: mutations enqueued from here on wait for the next pass.
        let snapshot = self.queue.list_pending().await?;
        tracing::info!(
            target: "ledger::sync",
            trigger = trigger.as_str(),
            pending = snapshot.len(),
            "drain pass started"
        );

        let mut submitted = 0u32;
        let mut acknowledged = 0u32;
        let mut outcome = DrainOutcome::Completed;

        for mutation in snapshot {
            submitted += 1;
            if let Err(err) = self.remote.submit(&mutation).await {
                tracing::warn!(
                    target: "ledger::sync",
                    mutation_id = %mutation.id,
                    entity_kind = %mutation.entity_kind,
                    entity_id = %mutation.entity_id,
                    error = %err,
                    "remote rejected mutation; pass aborted"
                );
                outcome = DrainOutcome::Aborted {
                    mutation_id: mutation.id,
                    error: err.to_string(),
                };
                break;
            }

            if let Err(err) = self.queue.remove(mutation.id).await {
                // Acknowledged remotely but still queued: it will be resubmitted.
                tracing::error!(
                    target: "ledger::sync",
                    mutation_id = %mutation.id,
                    error = %err,
                    "failed to remove acknowledged mutation"
                );
                outcome = DrainOutcome::Aborted {
                    mutation_id: mutation.id,
                    error: err.to_string(),
                };
                break;
            }
            acknowledged += 1;
        }

        if outcome == DrainOutcome::Completed {
            if let Err(err) = self.record_last_sync(Utc::now()).await {
                tracing::warn!(
                    target: "ledger::sync",
                    error = %err,
                    "failed to persist last sync timestamp"
                );
            }
        }

        let remaining = match self.queue.pending_count().await {
            Ok(count) => count,
            Err(err) => {
                tracing::warn!(target: "ledger::sync", error = %err, "failed to count pending mutations");
                0
            }
        };
        let duration_ms = started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64;
        let status = if outcome == DrainOutcome::Completed {
            PassOutcomeStatus::Completed
        } else {
            PassOutcomeStatus::Aborted
        };
        self.metrics
            .record_pass(status, trigger.as_str(), acknowledged, duration_ms);

        tracing::info!(
            target: "ledger::sync",
            trigger = trigger.as_str(),
            submitted,
            acknowledged,
            remaining,
            duration_ms,
            completed = outcome == DrainOutcome::Completed,
            "drain pass finished"
        );

        Ok(DrainReport {
            trigger,
            outcome,
            submitted,
            acknowledged,
            remaining,
            duration_ms,
        })
    }

    /// Runs a pass in the background.
    pub fn request_drain(self: &Arc<Self>, trigger: SyncTrigger) -> JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = orchestrator.drain(trigger).await {
                tracing::error!(
                    target: "ledger::sync",
                    trigger = trigger.as_str(),
                    error = %err,
                    "drain pass failed"
                );
            }
        })
    }

    /// Periodic passes, skipped while `connectivity` reports offline.
    pub fn schedule(
        self: &Arc<Self>,
        connectivity: Arc<ConnectivityMonitor>,
        period: Duration,
    ) -> JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick fires immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !connectivity.is_online() {
                    continue;
                }
                if let Err(err) = orchestrator.drain(SyncTrigger::Scheduled).await {
                    tracing::error!(target: "ledger::sync", error = %err, "scheduled drain failed");
                }
            }
        })
    }

    pub async fn last_sync(&self) -> Result<Option<DateTime<Utc>>, AppError> {
        let id = EntityId::new(SyncMetadata::ENTITY_ID.to_string())
            .map_err(AppError::ValidationError)?;
        let Some(entity) = self.store.get(Collection::Metadata, &id).await? else {
            return Ok(None);
        };
        let metadata: SyncMetadata = entity.decode().map_err(AppError::DeserializationError)?;
        Ok(metadata.last_sync_timestamp)
    }

    async fn record_last_sync(&self, at: DateTime<Utc>) -> Result<(), AppError> {
        let entity = Entity::from_record(Collection::Metadata, &SyncMetadata::synced_at(at))
            .map_err(AppError::SerializationError)?;
        self.store.put(entity).await
    }

    pub async fn status(&self) -> Result<SyncStatus, AppError> {
        Ok(SyncStatus {
            state: self.state(),
            pending_count: self.queue.pending_count().await?,
            last_sync: self.last_sync().await?,
            sync_errors: self.metrics.failures(),
            divergences: self.metrics.divergences(),
        })
    }

    pub fn metrics(&self) -> SyncMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn record_divergence(&self) {
        self.metrics.record_divergence();
    }
}

#[async_trait]
impl ConnectivityListener for SyncOrchestrator {
    async fn on_transition(&self, event: ConnectivityEvent) {
        if !event.is_reconnect() {
            return;
        }
        if let Err(err) = self.drain(SyncTrigger::Reconnect).await {
            tracing::error!(target: "ledger::sync", error = %err, "reconnect drain failed");
        }
    }
}
