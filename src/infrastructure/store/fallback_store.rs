use super::memory_store::MemoryLedgerStore;
use crate::application::ports::local_store::{LedgerStore, LocalStore, MutationLog};
use crate::domain::entities::{Entity, MutationDraft, PendingMutation};
use crate::domain::value_objects::{Collection, EntityId, MutationId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Routes to a durable primary store until it reports `StorageUnavailable`,
/// then serves the rest of the session from memory.
pub struct FallbackLedgerStore {
    primary: Option<Arc<dyn LedgerStore>>,
    memory: MemoryLedgerStore,
    degraded: AtomicBool,
}

impl FallbackLedgerStore {
    pub fn new(primary: Arc<dyn LedgerStore>) -> Self {
        Self {
            primary: Some(primary),
            memory: MemoryLedgerStore::new(),
            degraded: AtomicBool::new(false),
        }
    }

    pub fn memory_only() -> Self {
        Self {
            primary: None,
            memory: MemoryLedgerStore::new(),
            degraded: AtomicBool::new(true),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    fn active_primary(&self) -> Option<&Arc<dyn LedgerStore>> {
        if self.is_degraded() {
            None
        } else {
            self.primary.as_ref()
        }
    }

    fn degrade(&self, operation: &str, err: &AppError) {
        if !self.degraded.swap(true, Ordering::AcqRel) {
            tracing::warn!(
                target: "ledger::store",
                operation,
                error = %err,
                "durable storage unavailable; continuing in memory for this session"
            );
        }
    }
}

#[async_trait]
impl LocalStore for FallbackLedgerStore {
    async fn initialize(&self) -> Result<(), AppError> {
        if let Some(primary) = self.active_primary() {
            if let Err(err) = primary.initialize().await {
                if !err.is_storage_unavailable() {
                    return Err(err);
                }
                self.degrade("initialize", &err);
            }
        }
        self.memory.initialize().await
    }

    async fn get(&self, collection: Collection, id: &EntityId) -> Result<Option<Entity>, AppError> {
        if let Some(primary) = self.active_primary() {
            match primary.get(collection, id).await {
                Err(err) if err.is_storage_unavailable() => self.degrade("get", &err),
                other => return other,
            }
        }
        self.memory.get(collection, id).await
    }

    async fn get_all(&self, collection: Collection) -> Result<Vec<Entity>, AppError> {
        if let Some(primary) = self.active_primary() {
            match primary.get_all(collection).await {
                Err(err) if err.is_storage_unavailable() => self.degrade("get_all", &err),
                other => return other,
            }
        }
        self.memory.get_all(collection).await
    }

    async fn put(&self, entity: Entity) -> Result<(), AppError> {
        if let Some(primary) = self.active_primary() {
            match primary.put(entity.clone()).await {
                Err(err) if err.is_storage_unavailable() => self.degrade("put", &err),
                other => return other,
            }
        }
        self.memory.put(entity).await
    }

    async fn delete(&self, collection: Collection, id: &EntityId) -> Result<bool, AppError> {
        if let Some(primary) = self.active_primary() {
            match primary.delete(collection, id).await {
                Err(err) if err.is_storage_unavailable() => self.degrade("delete", &err),
                other => return other,
            }
        }
        self.memory.delete(collection, id).await
    }

    async fn clear_and_replace(
        &self,
        collection: Collection,
        entities: Vec<Entity>,
    ) -> Result<(), AppError> {
        if let Some(primary) = self.active_primary() {
            match primary.clear_and_replace(collection, entities.clone()).await {
                Err(err) if err.is_storage_unavailable() => {
                    self.degrade("clear_and_replace", &err)
                }
                other => return other,
            }
        }
        self.memory.clear_and_replace(collection, entities).await
    }
}

#[async_trait]
impl MutationLog for FallbackLedgerStore {
    async fn append_mutation(&self, draft: MutationDraft) -> Result<PendingMutation, AppError> {
        if let Some(primary) = self.active_primary() {
            match primary.append_mutation(draft.clone()).await {
                Err(err) if err.is_storage_unavailable() => self.degrade("append_mutation", &err),
                other => return other,
            }
        }
        self.memory.append_mutation(draft).await
    }

    async fn list_mutations(&self) -> Result<Vec<PendingMutation>, AppError> {
        if let Some(primary) = self.active_primary() {
            match primary.list_mutations().await {
                Err(err) if err.is_storage_unavailable() => self.degrade("list_mutations", &err),
                other => return other,
            }
        }
        self.memory.list_mutations().await
    }

    async fn remove_mutation(&self, id: MutationId) -> Result<bool, AppError> {
        if let Some(primary) = self.active_primary() {
            match primary.remove_mutation(id).await {
                Err(err) if err.is_storage_unavailable() => self.degrade("remove_mutation", &err),
                other => return other,
            }
        }
        self.memory.remove_mutation(id).await
    }

    async fn count_mutations(&self) -> Result<u64, AppError> {
        if let Some(primary) = self.active_primary() {
            match primary.count_mutations().await {
                Err(err) if err.is_storage_unavailable() => self.degrade("count_mutations", &err),
                other => return other,
            }
        }
        self.memory.count_mutations().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{EntityKind, EntityPayload, MutationKind};
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    /// Primary that works for `healthy_calls` operations and then reports the
    /// platform storage as gone.
    struct FlakyStore {
        inner: MemoryLedgerStore,
        healthy_calls: usize,
        calls: AtomicUsize,
    }

    impl FlakyStore {
        fn new(healthy_calls: usize) -> Self {
            Self {
                inner: MemoryLedgerStore::new(),
                healthy_calls,
                calls: AtomicUsize::new(0),
            }
        }

        fn check(&self) -> Result<(), AppError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) >= self.healthy_calls {
                return Err(AppError::StorageUnavailable("quota exceeded".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl LocalStore for FlakyStore {
        async fn initialize(&self) -> Result<(), AppError> {
            self.check()?;
            self.inner.initialize().await
        }
        async fn get(&self, c: Collection, id: &EntityId) -> Result<Option<Entity>, AppError> {
            self.check()?;
            self.inner.get(c, id).await
        }
        async fn get_all(&self, c: Collection) -> Result<Vec<Entity>, AppError> {
            self.check()?;
            self.inner.get_all(c).await
        }
        async fn put(&self, entity: Entity) -> Result<(), AppError> {
            self.check()?;
            self.inner.put(entity).await
        }
        async fn delete(&self, c: Collection, id: &EntityId) -> Result<bool, AppError> {
            self.check()?;
            self.inner.delete(c, id).await
        }
        async fn clear_and_replace(&self, c: Collection, e: Vec<Entity>) -> Result<(), AppError> {
            self.check()?;
            self.inner.clear_and_replace(c, e).await
        }
    }

    #[async_trait]
    impl MutationLog for FlakyStore {
        async fn append_mutation(&self, d: MutationDraft) -> Result<PendingMutation, AppError> {
            self.check()?;
            self.inner.append_mutation(d).await
        }
        async fn list_mutations(&self) -> Result<Vec<PendingMutation>, AppError> {
            self.check()?;
            self.inner.list_mutations().await
        }
        async fn remove_mutation(&self, id: MutationId) -> Result<bool, AppError> {
            self.check()?;
            self.inner.remove_mutation(id).await
        }
        async fn count_mutations(&self) -> Result<u64, AppError> {
            self.check()?;
            self.inner.count_mutations().await
        }
    }

    fn draft(id: &str) -> MutationDraft {
        MutationDraft::new(
            MutationKind::Create,
            EntityKind::Employee,
            EntityPayload::new(json!({"id": id})).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_degrades_to_memory_instead_of_failing() {
        let store = FallbackLedgerStore::new(Arc::new(FlakyStore::new(1)));
        store.initialize().await.unwrap();
        assert!(!store.is_degraded());

        let mutation = store.append_mutation(draft("emp-1")).await.unwrap();
        assert!(store.is_degraded());
        assert_eq!(mutation.entity_id.as_str(), "emp-1");
        assert_eq!(store.count_mutations().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_memory_only_session_works() {
        let store = FallbackLedgerStore::memory_only();
        store.initialize().await.unwrap();
        assert!(store.is_degraded());
        store.append_mutation(draft("emp-1")).await.unwrap();
        assert_eq!(store.list_mutations().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_non_storage_errors_are_returned() {
        let store = FallbackLedgerStore::new(Arc::new(MemoryLedgerStore::new()));
        let stray = Entity::from_payload(
            Collection::Metadata,
            EntityPayload::new(json!({"id": "sync"})).unwrap(),
        )
        .unwrap();
        let result = store
            .clear_and_replace(Collection::Employees, vec![stray])
            .await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
        assert!(!store.is_degraded());
    }
}
