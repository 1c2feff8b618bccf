use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use offline_ledger::application::ports::remote_api::{RemoteAck, RemoteApi};
use offline_ledger::domain::entities::PendingMutation;
use offline_ledger::domain::value_objects::{EntityId, MutationId};
use offline_ledger::shared::error::AppError;
use offline_ledger::{AppConfig, LedgerEngine};
use tempfile::TempDir;
use tokio::sync::Mutex;

/// Remote stub that records every submission in order. When `fail_on_call`
/// is set, that call (1-based) is rejected and every other call succeeds.
#[derive(Default)]
pub struct RecordingRemote {
    fail_on_call: Option<usize>,
    calls: Mutex<Vec<PendingMutation>>,
}

#[allow(dead_code)]
impl RecordingRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_on(call: usize) -> Arc<Self> {
        Arc::new(Self {
            fail_on_call: Some(call),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    pub async fn submitted_entity_ids(&self) -> Vec<String> {
        self.calls
            .lock()
            .await
            .iter()
            .map(|mutation| mutation.entity_id.to_string())
            .collect()
    }

    pub async fn submitted_mutation_ids(&self) -> Vec<MutationId> {
        self.calls
            .lock()
            .await
            .iter()
            .map(|mutation| mutation.id)
            .collect()
    }
}

#[async_trait]
impl RemoteApi for RecordingRemote {
    async fn submit(&self, mutation: &PendingMutation) -> Result<RemoteAck, AppError> {
        let mut calls = self.calls.lock().await;
        calls.push(mutation.clone());
        if Some(calls.len()) == self.fail_on_call {
            return Err(AppError::RemoteSubmitFailed(format!(
                "rejected {}",
                mutation.entity_id
            )));
        }
        Ok(RemoteAck {
            remote_id: Some(format!("remote-{}", mutation.id)),
        })
    }
}

#[allow(dead_code)]
pub fn id(value: &str) -> EntityId {
    EntityId::new(value.to_string()).expect("entity id")
}

#[allow(dead_code)]
/// Config backed by a SQLite file inside `dir`, with periodic sync off.
pub fn file_config(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = format!("sqlite://{}?mode=rwc", dir.join("ledger.db").display());
    config.sync.auto_sync = false;
    config
}

#[allow(dead_code)]
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("temp dir")
}

#[allow(dead_code)]
pub async fn engine_at(dir: &Path, remote: Arc<dyn RemoteApi>, online: bool) -> LedgerEngine {
    LedgerEngine::initialize(file_config(dir), remote, online)
        .await
        .expect("engine")
}
