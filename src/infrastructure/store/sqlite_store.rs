use super::mappers::{entity_from_row, pending_mutation_from_row};
use super::rows::{EntityRow, PendingMutationRow};
use crate::application::ports::local_store::{LocalStore, MutationLog};
use crate::domain::entities::{Entity, MutationDraft, PendingMutation};
use crate::domain::value_objects::{Collection, EntityId, MutationId};
use crate::infrastructure::database::ConnectionPool;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Serializes writers per collection; SQLite alone would interleave
/// statements from concurrent pool connections.
struct WriteLocks {
    collections: HashMap<Collection, Mutex<()>>,
    queue: Mutex<()>,
}

impl WriteLocks {
    fn new() -> Self {
        Self {
            collections: Collection::ALL
                .into_iter()
                .map(|collection| (collection, Mutex::new(())))
                .collect(),
            queue: Mutex::new(()),
        }
    }

    fn collection(&self, collection: Collection) -> Result<&Mutex<()>, AppError> {
        self.collections
            .get(&collection)
            .ok_or_else(|| AppError::Internal(format!("no write lock for {collection}")))
    }
}

pub struct SqliteLedgerStore {
    pool: SqlitePool,
    locks: WriteLocks,
}

impl SqliteLedgerStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            locks: WriteLocks::new(),
        }
    }

    pub fn from_connection(connection: &ConnectionPool) -> Self {
        Self::new(connection.get_pool().clone())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn ensure_collection(entity: &Entity, collection: Collection) -> Result<(), AppError> {
        if entity.collection != collection {
            return Err(AppError::ValidationError(format!(
                "entity {} belongs to {}, not {collection}",
                entity.id, entity.collection
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl LocalStore for SqliteLedgerStore {
    async fn initialize(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn get(&self, collection: Collection, id: &EntityId) -> Result<Option<Entity>, AppError> {
        let row = sqlx::query_as::<_, EntityRow>(
            r#"
            SELECT collection, entity_id, payload, updated_at
            FROM ledger_entities
            WHERE collection = ?1 AND entity_id = ?2
            "#,
        )
        .bind(collection.as_str())
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(entity_from_row).transpose()
    }

    async fn get_all(&self, collection: Collection) -> Result<Vec<Entity>, AppError> {
        let rows = sqlx::query_as::<_, EntityRow>(
            r#"
            SELECT collection, entity_id, payload, updated_at
            FROM ledger_entities
            WHERE collection = ?1
            ORDER BY entity_id ASC
            "#,
        )
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(entity_from_row).collect()
    }

    async fn put(&self, entity: Entity) -> Result<(), AppError> {
        let payload = entity.payload.to_json_string()?;
        let _guard = self.locks.collection(entity.collection)?.lock().await;

        sqlx::query(
            r#"
            INSERT INTO ledger_entities (collection, entity_id, payload, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(collection, entity_id) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(entity.collection.as_str())
        .bind(entity.id.as_str())
        .bind(&payload)
        .bind(entity.updated_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &EntityId) -> Result<bool, AppError> {
        let _guard = self.locks.collection(collection)?.lock().await;

        let result =
            sqlx::query("DELETE FROM ledger_entities WHERE collection = ?1 AND entity_id = ?2")
                .bind(collection.as_str())
                .bind(id.as_str())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_and_replace(
        &self,
        collection: Collection,
        entities: Vec<Entity>,
    ) -> Result<(), AppError> {
        let mut prepared = Vec::with_capacity(entities.len());
        for entity in &entities {
            Self::ensure_collection(entity, collection)?;
            prepared.push((
                entity.id.as_str(),
                entity.payload.to_json_string()?,
                entity.updated_at.timestamp_millis(),
            ));
        }

        let _guard = self.locks.collection(collection)?.lock().await;
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM ledger_entities WHERE collection = ?1")
            .bind(collection.as_str())
            .execute(&mut *tx)
            .await?;

        for (entity_id, payload, updated_at) in prepared {
            sqlx::query(
                r#"
                INSERT INTO ledger_entities (collection, entity_id, payload, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(collection, entity_id) DO UPDATE SET
                    payload = excluded.payload,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(collection.as_str())
            .bind(entity_id)
            .bind(payload)
            .bind(updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl MutationLog for SqliteLedgerStore {
    async fn append_mutation(&self, draft: MutationDraft) -> Result<PendingMutation, AppError> {
        let payload = draft.payload.to_json_string()?;
        let enqueued_at = Utc::now();
        let _guard = self.locks.queue.lock().await;

        let result = sqlx::query(
            r#"
            INSERT INTO pending_mutations (kind, entity_kind, entity_id, payload, enqueued_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(draft.kind.as_str())
        .bind(draft.entity_kind.as_str())
        .bind(draft.entity_id.as_str())
        .bind(&payload)
        .bind(enqueued_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        let id = MutationId::new(result.last_insert_rowid()).map_err(AppError::Internal)?;
        Ok(PendingMutation::new(id, draft, enqueued_at))
    }

    async fn list_mutations(&self) -> Result<Vec<PendingMutation>, AppError> {
        let rows = sqlx::query_as::<_, PendingMutationRow>(
            r#"
            SELECT id, kind, entity_kind, entity_id, payload, enqueued_at
            FROM pending_mutations
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(pending_mutation_from_row).collect()
    }

    async fn remove_mutation(&self, id: MutationId) -> Result<bool, AppError> {
        let _guard = self.locks.queue.lock().await;

        let result = sqlx::query("DELETE FROM pending_mutations WHERE id = ?1")
            .bind(id.value())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_mutations(&self) -> Result<u64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pending_mutations")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}
