use crate::domain::value_objects::{EntityId, EntityKind, EntityPayload, MutationId, MutationKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A mutation that has not been appended to the log yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MutationDraft {
    pub kind: MutationKind,
    pub entity_kind: EntityKind,
    pub entity_id: EntityId,
    pub payload: EntityPayload,
}

impl MutationDraft {
    pub fn new(
        kind: MutationKind,
        entity_kind: EntityKind,
        payload: EntityPayload,
    ) -> Result<Self, String> {
        let entity_id = payload
            .id()
            .ok_or_else(|| format!("{entity_kind} {kind} payload must carry an id"))?
            .to_string();
        Ok(Self {
            kind,
            entity_kind,
            entity_id: EntityId::new(entity_id)?,
            payload,
        })
    }
}

/// Queued, not-yet-acknowledged mutation. Never changed after it is appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingMutation {
    pub id: MutationId,
    pub kind: MutationKind,
    pub entity_kind: EntityKind,
    pub entity_id: EntityId,
    pub payload: EntityPayload,
    pub enqueued_at: DateTime<Utc>,
}

impl PendingMutation {
    pub fn new(id: MutationId, draft: MutationDraft, enqueued_at: DateTime<Utc>) -> Self {
        let MutationDraft {
            kind,
            entity_kind,
            entity_id,
            payload,
        } = draft;
        Self {
            id,
            kind,
            entity_kind,
            entity_id,
            payload,
            enqueued_at,
        }
    }
}
