use super::connectivity_monitor::ConnectivityMonitor;
use super::mutation_queue::MutationQueue;
use super::sync_service::{SyncOrchestrator, SyncTrigger};
use crate::application::ports::local_store::LedgerStore;
use crate::domain::entities::{
    Employee, Entity, PayrollCalculation, PayrollPolicy, PendingMutation, TimeEntry,
};
use crate::domain::value_objects::{Collection, EntityId, EntityKind, EntityPayload, MutationKind};
use crate::shared::error::AppError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Result of a business write. The mutation is durably queued even when
/// `divergence` is set.
#[derive(Debug, Clone)]
pub struct LedgerWrite {
    pub mutation: PendingMutation,
    pub divergence: Option<AppError>,
}

impl LedgerWrite {
    pub fn is_diverged(&self) -> bool {
        self.divergence.is_some()
    }
}

/// Entry point for every business create/update/delete.
///
/// Each write is queued first, then applied to the local store, then
/// handed to the orchestrator when online. Callers never wait on the
/// network.
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    queue: Arc<MutationQueue>,
    connectivity: Arc<ConnectivityMonitor>,
    sync: Arc<SyncOrchestrator>,
    standard_shift_hours: f64,
}

impl LedgerService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        queue: Arc<MutationQueue>,
        connectivity: Arc<ConnectivityMonitor>,
        sync: Arc<SyncOrchestrator>,
    ) -> Self {
        Self {
            store,
            queue,
            connectivity,
            sync,
            standard_shift_hours: PayrollPolicy::default().standard_shift_hours,
        }
    }

    /// Shift length used when re-deriving time-entry hours on write.
    pub fn with_standard_shift_hours(mut self, hours: f64) -> Self {
        self.standard_shift_hours = hours;
        self
    }

    pub async fn create(
        &self,
        entity_kind: EntityKind,
        payload: EntityPayload,
    ) -> Result<LedgerWrite, AppError> {
        self.write(MutationKind::Create, entity_kind, payload).await
    }

    pub async fn update(
        &self,
        entity_kind: EntityKind,
        payload: EntityPayload,
    ) -> Result<LedgerWrite, AppError> {
        self.write(MutationKind::Update, entity_kind, payload).await
    }

    pub async fn delete(
        &self,
        entity_kind: EntityKind,
        id: &EntityId,
    ) -> Result<LedgerWrite, AppError> {
        self.write(
            MutationKind::Delete,
            entity_kind,
            EntityPayload::id_only(id.as_str()),
        )
        .await
    }

    pub async fn save_record<T: Serialize>(
        &self,
        kind: MutationKind,
        entity_kind: EntityKind,
        record: &T,
    ) -> Result<LedgerWrite, AppError> {
        let payload =
            EntityPayload::from_serializable(record).map_err(AppError::SerializationError)?;
        self.write(kind, entity_kind, payload).await
    }

    /// Creates the employee, or updates it when it is already stored.
    pub async fn save_employee(&self, employee: &Employee) -> Result<LedgerWrite, AppError> {
        let exists = self
            .store
            .get(Collection::Employees, &employee.id)
            .await?
            .is_some();
        let kind = if exists {
            MutationKind::Update
        } else {
            MutationKind::Create
        };
        self.save_record(kind, EntityKind::Employee, employee).await
    }

    pub async fn employee(&self, id: &EntityId) -> Result<Option<Employee>, AppError> {
        self.load(Collection::Employees, id).await
    }

    pub async fn employees(&self) -> Result<Vec<Employee>, AppError> {
        self.load_all(Collection::Employees).await
    }

    pub async fn get(
        &self,
        collection: Collection,
        id: &EntityId,
    ) -> Result<Option<Entity>, AppError> {
        self.store.get(collection, id).await
    }

    pub async fn list(&self, collection: Collection) -> Result<Vec<Entity>, AppError> {
        self.store.get_all(collection).await
    }

    pub async fn load<T: DeserializeOwned>(
        &self,
        collection: Collection,
        id: &EntityId,
    ) -> Result<Option<T>, AppError> {
        match self.store.get(collection, id).await? {
            Some(entity) => entity
                .decode()
                .map(Some)
                .map_err(AppError::DeserializationError),
            None => Ok(None),
        }
    }

    pub async fn load_all<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> Result<Vec<T>, AppError> {
        self.store
            .get_all(collection)
            .await?
            .iter()
            .map(|entity| entity.decode().map_err(AppError::DeserializationError))
            .collect()
    }

    /// Decodes every record of `collection`, skipping rows that no longer
    /// match their schema so one bad row cannot block the rest.
    pub async fn load_valid<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> Result<Vec<T>, AppError> {
        let entities = self.store.get_all(collection).await?;
        let mut records = Vec::with_capacity(entities.len());
        for entity in entities {
            match entity.decode() {
                Ok(record) => records.push(record),
                Err(err) => tracing::warn!(
                    target: "ledger::store",
                    %collection,
                    entity_id = %entity.id,
                    error = %err,
                    "skipping malformed entity"
                ),
            }
        }
        Ok(records)
    }

    /// Checks a create/update payload against its entity schema. Time
    /// entries get their hours re-derived from the clock times, so stored
    /// totals always agree with them.
    fn normalize(
        &self,
        kind: MutationKind,
        entity_kind: EntityKind,
        payload: EntityPayload,
    ) -> Result<EntityPayload, AppError> {
        if kind == MutationKind::Delete {
            return Ok(payload);
        }
        let invalid = |err: serde_json::Error| {
            AppError::ValidationError(format!("Invalid {entity_kind} payload: {err}"))
        };
        match entity_kind {
            EntityKind::TimeEntry => {
                let mut entry: TimeEntry = payload.deserialize_into().map_err(invalid)?;
                entry.recompute_hours(self.standard_shift_hours);
                EntityPayload::from_serializable(&entry).map_err(AppError::SerializationError)
            }
            EntityKind::Employee => {
                payload.deserialize_into::<Employee>().map_err(invalid)?;
                Ok(payload)
            }
            EntityKind::PayrollCalculation => {
                payload
                    .deserialize_into::<PayrollCalculation>()
                    .map_err(invalid)?;
                Ok(payload)
            }
        }
    }

    /// Applies an already queued mutation to the local store.
    pub async fn apply_locally(&self, mutation: &PendingMutation) -> Result<(), AppError> {
        let collection = mutation.entity_kind.collection();
        match mutation.kind {
            MutationKind::Create | MutationKind::Update => {
                let entity = Entity::new(
                    collection,
                    mutation.entity_id.clone(),
                    mutation.payload.clone(),
                );
                self.store.put(entity).await
            }
            MutationKind::Delete => {
                self.store.delete(collection, &mutation.entity_id).await?;
                Ok(())
            }
        }
    }

    async fn write(
        &self,
        kind: MutationKind,
        entity_kind: EntityKind,
        payload: EntityPayload,
    ) -> Result<LedgerWrite, AppError> {
        let payload = self.normalize(kind, entity_kind, payload)?;
        let mutation = self.queue.enqueue(kind, entity_kind, payload).await?;

        let divergence = match self.apply_locally(&mutation).await {
            Ok(()) => None,
            Err(err) => {
                // The queued mutation still reaches the remote side; only the
                // local view is behind until the entity is written again.
                tracing::warn!(
                    target: "ledger::divergence",
                    mutation_id = %mutation.id,
                    kind = %mutation.kind,
                    entity_kind = %mutation.entity_kind,
                    entity_id = %mutation.entity_id,
                    error = %err,
                    "local apply failed after enqueue"
                );
                self.sync.record_divergence();
                Some(AppError::DivergenceWarning(format!(
                    "{} {} queued as mutation {} but not applied locally: {err}",
                    mutation.entity_kind, mutation.entity_id, mutation.id
                )))
            }
        };

        if self.connectivity.is_online() {
            self.sync.request_drain(SyncTrigger::Enqueue);
        }

        Ok(LedgerWrite {
            mutation,
            divergence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::remote_api::{RemoteAck, RemoteApi};
    use crate::domain::entities::PayType;
    use crate::infrastructure::store::MemoryLedgerStore;
    use async_trait::async_trait;
    use serde_json::json;

    struct NeverCalledRemote;

    #[async_trait]
    impl RemoteApi for NeverCalledRemote {
        async fn submit(&self, _mutation: &PendingMutation) -> Result<RemoteAck, AppError> {
            Err(AppError::RemoteSubmitFailed("offline".to_string()))
        }
    }

    fn offline_service() -> (Arc<MutationQueue>, LedgerService) {
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryLedgerStore::new());
        let queue = Arc::new(MutationQueue::new(Arc::clone(&store)));
        let sync = Arc::new(SyncOrchestrator::new(
            Arc::clone(&store),
            Arc::clone(&queue),
            Arc::new(NeverCalledRemote),
        ));
        let connectivity = Arc::new(ConnectivityMonitor::new(false));
        let service = LedgerService::new(store, Arc::clone(&queue), connectivity, sync);
        (queue, service)
    }

    #[tokio::test]
    async fn test_offline_write_is_queued_and_visible_locally() {
        let (queue, service) = offline_service();
        let payload = EntityPayload::new(json!({
            "id": "emp-1",
            "name": "Ana",
            "payType": {"type": "hourly", "rate": 12.0}
        }))
        .unwrap();

        let write = service.create(EntityKind::Employee, payload).await.unwrap();

        assert!(!write.is_diverged());
        assert_eq!(queue.pending_count().await.unwrap(), 1);
        let id = EntityId::new("emp-1".to_string()).unwrap();
        let stored = service.get(Collection::Employees, &id).await.unwrap().unwrap();
        assert_eq!(stored.payload.as_json()["name"], "Ana");
    }

    #[tokio::test]
    async fn test_delete_removes_locally_and_queues_tombstone() {
        let (queue, service) = offline_service();
        let employee = Employee::new(
            EntityId::new("emp-1".to_string()).unwrap(),
            "Ana",
            PayType::Hourly { rate: 12.0 },
        );
        service.save_employee(&employee).await.unwrap();
        let write = service
            .delete(EntityKind::Employee, &employee.id)
            .await
            .unwrap();

        assert_eq!(write.mutation.kind, MutationKind::Delete);
        assert!(service.employee(&employee.id).await.unwrap().is_none());
        let kinds: Vec<MutationKind> = queue
            .list_pending()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.kind)
            .collect();
        assert_eq!(kinds, vec![MutationKind::Create, MutationKind::Delete]);
    }

    #[tokio::test]
    async fn test_save_employee_switches_to_update_once_stored() {
        let (_queue, service) = offline_service();
        let mut employee = Employee::new(
            EntityId::new("emp-2".to_string()).unwrap(),
            "Bo",
            PayType::Salaried { base: 2500.0 },
        );
        let first = service.save_employee(&employee).await.unwrap();
        employee.name = "Bo R.".to_string();
        let second = service.save_employee(&employee).await.unwrap();

        assert_eq!(first.mutation.kind, MutationKind::Create);
        assert_eq!(second.mutation.kind, MutationKind::Update);
        assert_eq!(service.employees().await.unwrap(), vec![employee]);
    }

    #[tokio::test]
    async fn test_time_entry_hours_are_rederived_on_write() {
        let (queue, service) = offline_service();
        let payload = EntityPayload::new(json!({
            "id": "te-1",
            "employeeId": "emp-1",
            "date": "2024-03-04",
            "clockIn": "08:00",
            "clockOut": "18:00",
            "lunchStart": "12:00",
            "lunchEnd": "13:00",
            "totalHours": 100.0,
            "overtimeHours": 92.0,
            "status": "clocked_out"
        }))
        .unwrap();

        let write = service.create(EntityKind::TimeEntry, payload).await.unwrap();

        assert_eq!(write.mutation.payload.as_json()["totalHours"], 9.0);
        assert_eq!(write.mutation.payload.as_json()["overtimeHours"], 1.0);
        let stored: TimeEntry = service
            .load(Collection::TimeEntries, &EntityId::new("te-1".to_string()).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.total_hours, 9.0);
        assert_eq!(queue.pending_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_schema_violations_are_rejected_before_queueing() {
        let (queue, service) = offline_service();
        let junk = EntityPayload::new(json!({"id": "te-junk", "note": "x"})).unwrap();

        let result = service.create(EntityKind::TimeEntry, junk).await;

        assert!(matches!(result, Err(AppError::ValidationError(_))));
        assert_eq!(queue.pending_count().await.unwrap(), 0);
        assert!(service
            .list(Collection::TimeEntries)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_load_valid_skips_malformed_rows() {
        let (_queue, service) = offline_service();
        let employee = Employee::new(
            EntityId::new("emp-3".to_string()).unwrap(),
            "Cy",
            PayType::Hourly { rate: 9.0 },
        );
        service.save_employee(&employee).await.unwrap();
        service
            .store
            .put(
                Entity::from_payload(
                    Collection::Employees,
                    EntityPayload::new(json!({"id": "emp-junk"})).unwrap(),
                )
                .unwrap(),
            )
            .await
            .unwrap();

        assert!(service.employees().await.is_err());
        assert_eq!(
            service.load_valid::<Employee>(Collection::Employees).await.unwrap(),
            vec![employee]
        );
    }
}
