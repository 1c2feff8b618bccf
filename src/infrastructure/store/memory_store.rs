use crate::application::ports::local_store::{LocalStore, MutationLog};
use crate::domain::entities::{Entity, MutationDraft, PendingMutation};
use crate::domain::value_objects::{Collection, EntityId, MutationId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct MemoryState {
    collections: HashMap<Collection, BTreeMap<EntityId, Entity>>,
    mutations: BTreeMap<MutationId, PendingMutation>,
    last_mutation_id: i64,
}

/// Session-only ledger store. Contents are lost with the process.
#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalStore for MemoryLedgerStore {
    async fn initialize(&self) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        for collection in Collection::ALL {
            state.collections.entry(collection).or_default();
        }
        Ok(())
    }

    async fn get(&self, collection: Collection, id: &EntityId) -> Result<Option<Entity>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .collections
            .get(&collection)
            .and_then(|entities| entities.get(id))
            .cloned())
    }

    async fn get_all(&self, collection: Collection) -> Result<Vec<Entity>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .collections
            .get(&collection)
            .map(|entities| entities.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn put(&self, entity: Entity) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        state
            .collections
            .entry(entity.collection)
            .or_default()
            .insert(entity.id.clone(), entity);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &EntityId) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        Ok(state
            .collections
            .get_mut(&collection)
            .map(|entities| entities.remove(id).is_some())
            .unwrap_or(false))
    }

    async fn clear_and_replace(
        &self,
        collection: Collection,
        entities: Vec<Entity>,
    ) -> Result<(), AppError> {
        let mut replacement = BTreeMap::new();
        for entity in entities {
            if entity.collection != collection {
                return Err(AppError::ValidationError(format!(
                    "entity {} belongs to {}, not {collection}",
                    entity.id, entity.collection
                )));
            }
            replacement.insert(entity.id.clone(), entity);
        }

        let mut state = self.state.write().await;
        state.collections.insert(collection, replacement);
        Ok(())
    }
}

#[async_trait]
impl MutationLog for MemoryLedgerStore {
    async fn append_mutation(&self, draft: MutationDraft) -> Result<PendingMutation, AppError> {
        let mut state = self.state.write().await;
        state.last_mutation_id += 1;
        let id = MutationId::new(state.last_mutation_id).map_err(AppError::Internal)?;
        let mutation = PendingMutation::new(id, draft, Utc::now());
        state.mutations.insert(id, mutation.clone());
        Ok(mutation)
    }

    async fn list_mutations(&self) -> Result<Vec<PendingMutation>, AppError> {
        let state = self.state.read().await;
        Ok(state.mutations.values().cloned().collect())
    }

    async fn remove_mutation(&self, id: MutationId) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        Ok(state.mutations.remove(&id).is_some())
    }

    async fn count_mutations(&self) -> Result<u64, AppError> {
        let state = self.state.read().await;
        Ok(state.mutations.len() as u64)
    }
}
