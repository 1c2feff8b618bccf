use crate::application::ports::local_store::LedgerStore;
use crate::domain::entities::{MutationDraft, PendingMutation};
use crate::domain::value_objects::{EntityKind, EntityPayload, MutationId, MutationKind};
use crate::shared::error::AppError;
use std::sync::Arc;

/// Ordered, durable log of mutations the remote side has not acknowledged.
pub struct MutationQueue {
    store: Arc<dyn LedgerStore>,
}

impl MutationQueue {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Appends durably and returns without touching the network.
    pub async fn enqueue(
        &self,
        kind: MutationKind,
        entity_kind: EntityKind,
        payload: EntityPayload,
    ) -> Result<PendingMutation, AppError> {
        let draft =
            MutationDraft::new(kind, entity_kind, payload).map_err(AppError::ValidationError)?;
        let mutation = self.store.append_mutation(draft).await?;
        tracing::debug!(
            target: "ledger::queue",
            mutation_id = %mutation.id,
            kind = %mutation.kind,
            entity_kind = %mutation.entity_kind,
            entity_id = %mutation.entity_id,
            "mutation enqueued"
        );
        Ok(mutation)
    }

    pub async fn list_pending(&self) -> Result<Vec<PendingMutation>, AppError> {
        self.store.list_mutations().await
    }

    /// Drops an acknowledged mutation. Removing an unknown id is a no-op.
    pub async fn remove(&self, id: MutationId) -> Result<bool, AppError> {
        let removed = self.store.remove_mutation(id).await?;
        if !removed {
            tracing::debug!(target: "ledger::queue", mutation_id = %id, "mutation already removed");
        }
        Ok(removed)
    }

    pub async fn pending_count(&self) -> Result<u64, AppError> {
        self.store.count_mutations().await
    }
}
