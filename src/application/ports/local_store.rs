use crate::domain::entities::{Entity, MutationDraft, PendingMutation};
use crate::domain::value_objects::{Collection, EntityId, MutationId};
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Durable key/object storage for business collections.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Creates missing collections. Safe to call on every startup.
    async fn initialize(&self) -> Result<(), AppError>;
    async fn get(&self, collection: Collection, id: &EntityId) -> Result<Option<Entity>, AppError>;
    async fn get_all(&self, collection: Collection) -> Result<Vec<Entity>, AppError>;
    /// Upsert by id.
    async fn put(&self, entity: Entity) -> Result<(), AppError>;
    async fn delete(&self, collection: Collection, id: &EntityId) -> Result<bool, AppError>;
    /// Atomically swaps the whole collection for `entities`.
    async fn clear_and_replace(
        &self,
        collection: Collection,
        entities: Vec<Entity>,
    ) -> Result<(), AppError>;
}

/// Durable FIFO of mutations awaiting remote acknowledgement.
#[async_trait]
pub trait MutationLog: Send + Sync {
    async fn append_mutation(&self, draft: MutationDraft) -> Result<PendingMutation, AppError>;
    /// All queued mutations, oldest first.
    async fn list_mutations(&self) -> Result<Vec<PendingMutation>, AppError>;
    async fn remove_mutation(&self, id: MutationId) -> Result<bool, AppError>;
    async fn count_mutations(&self) -> Result<u64, AppError>;
}

pub trait LedgerStore: LocalStore + MutationLog {}

impl<T> LedgerStore for T where T: LocalStore + MutationLog {}
