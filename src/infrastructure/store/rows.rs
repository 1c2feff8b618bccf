use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EntityRow {
    pub collection: String,
    pub entity_id: String,
    pub payload: String,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PendingMutationRow {
    pub id: i64,
    pub kind: String,
    pub entity_kind: String,
    pub entity_id: String,
    pub payload: String,
    pub enqueued_at: i64,
}
