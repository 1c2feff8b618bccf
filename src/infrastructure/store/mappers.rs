use super::rows::{EntityRow, PendingMutationRow};
use crate::domain::entities::{Entity, PendingMutation};
use crate::domain::value_objects::{
    Collection, EntityId, EntityKind, EntityPayload, MutationId, MutationKind,
};
use crate::shared::error::AppError;
use chrono::{DateTime, TimeZone, Utc};

pub(crate) fn timestamp_to_datetime(millis: i64) -> Result<DateTime<Utc>, AppError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| AppError::DeserializationError(format!("Invalid timestamp: {millis}")))
}

pub fn entity_from_row(row: EntityRow) -> Result<Entity, AppError> {
    let collection =
        Collection::try_from(row.collection.as_str()).map_err(AppError::DeserializationError)?;
    let id = EntityId::new(row.entity_id).map_err(AppError::DeserializationError)?;
    let payload =
        EntityPayload::from_json_str(&row.payload).map_err(AppError::DeserializationError)?;

    Ok(Entity {
        id,
        collection,
        payload,
        updated_at: timestamp_to_datetime(row.updated_at)?,
    })
}

pub fn pending_mutation_from_row(row: PendingMutationRow) -> Result<PendingMutation, AppError> {
    Ok(PendingMutation {
        id: MutationId::new(row.id).map_err(AppError::DeserializationError)?,
        kind: MutationKind::try_from(row.kind.as_str()).map_err(AppError::DeserializationError)?,
        entity_kind: EntityKind::try_from(row.entity_kind.as_str())
            .map_err(AppError::DeserializationError)?,
        entity_id: EntityId::new(row.entity_id).map_err(AppError::DeserializationError)?,
        payload: EntityPayload::from_json_str(&row.payload)
            .map_err(AppError::DeserializationError)?,
        enqueued_at: timestamp_to_datetime(row.enqueued_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_rows_are_deserialization_errors() {
        let row = PendingMutationRow {
            id: 1,
            kind: "upsert".into(),
            entity_kind: "employee".into(),
            entity_id: "emp-1".into(),
            payload: "{}".into(),
            enqueued_at: 0,
        };
        assert!(matches!(
            pending_mutation_from_row(row),
            Err(AppError::DeserializationError(_))
        ));

        let row = EntityRow {
            collection: "employees".into(),
            entity_id: "emp-1".into(),
            payload: "[1]".into(),
            updated_at: 0,
        };
        assert!(matches!(
            entity_from_row(row),
            Err(AppError::DeserializationError(_))
        ));
    }
}
