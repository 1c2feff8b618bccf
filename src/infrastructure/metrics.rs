use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PassOutcomeStatus {
    Completed,
    Aborted,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetricsSnapshot {
    pub total_acknowledged: u64,
    pub total_failures: u64,
    pub total_divergences: u64,
    pub consecutive_failed_passes: u64,
    pub last_success_ms: Option<u64>,
    pub last_failure_ms: Option<u64>,
    pub last_outcome: Option<PassOutcomeStatus>,
    pub last_trigger: Option<String>,
    pub last_duration_ms: Option<u64>,
    pub last_acknowledged: Option<u32>,
}

#[derive(Default, Clone)]
struct LastPass {
    outcome: Option<PassOutcomeStatus>,
    trigger: Option<String>,
    duration_ms: Option<u64>,
    acknowledged: Option<u32>,
}

/// Counters for drain passes, owned by one orchestrator.
#[derive(Default)]
pub struct SyncMetrics {
    acknowledged: AtomicU64,
    failures: AtomicU64,
    divergences: AtomicU64,
    consecutive_failed_passes: AtomicU64,
    last_success_ms: AtomicU64,
    last_failure_ms: AtomicU64,
    last_pass: Mutex<LastPass>,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_pass(
        &self,
        outcome: PassOutcomeStatus,
        trigger: &str,
        acknowledged: u32,
        duration_ms: u64,
    ) {
        let now = now_ms();
        self.acknowledged
            .fetch_add(u64::from(acknowledged), Ordering::Relaxed);
        match outcome {
            PassOutcomeStatus::Completed => {
                self.consecutive_failed_passes.store(0, Ordering::Relaxed);
                self.last_success_ms.store(now, Ordering::Relaxed);
            }
            PassOutcomeStatus::Aborted => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                self.consecutive_failed_passes
                    .fetch_add(1, Ordering::Relaxed);
                self.last_failure_ms.store(now, Ordering::Relaxed);
            }
        }

        if let Ok(mut last) = self.last_pass.lock() {
            *last = LastPass {
                outcome: Some(outcome),
                trigger: Some(trigger.to_string()),
                duration_ms: Some(duration_ms),
                acknowledged: Some(acknowledged),
            };
        }
    }

    pub fn record_divergence(&self) {
        self.divergences.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn divergences(&self) -> u64 {
        self.divergences.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> SyncMetricsSnapshot {
        let last = self
            .last_pass
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default();
        SyncMetricsSnapshot {
            total_acknowledged: self.acknowledged.load(Ordering::Relaxed),
            total_failures: self.failures.load(Ordering::Relaxed),
            total_divergences: self.divergences.load(Ordering::Relaxed),
            consecutive_failed_passes: self.consecutive_failed_passes.load(Ordering::Relaxed),
            last_success_ms: non_zero(self.last_success_ms.load(Ordering::Relaxed)),
            last_failure_ms: non_zero(self.last_failure_ms.load(Ordering::Relaxed)),
            last_outcome: last.outcome,
            last_trigger: last.trigger,
            last_duration_ms: last.duration_ms,
            last_acknowledged: last.acknowledged,
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis().min(u128::from(u64::MAX)) as u64)
        .unwrap_or(0)
}

fn non_zero(value: u64) -> Option<u64> {
    if value == 0 {
        None
    } else {
        Some(value)
    }
}
