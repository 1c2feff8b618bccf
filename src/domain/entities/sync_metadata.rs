use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Process-wide sync bookkeeping, stored as a single row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetadata {
    pub id: String,
    pub last_sync_timestamp: Option<DateTime<Utc>>,
}

impl SyncMetadata {
    pub const ENTITY_ID: &'static str = "sync";

    pub fn synced_at(at: DateTime<Utc>) -> Self {
        Self {
            id: Self::ENTITY_ID.to_string(),
            last_sync_timestamp: Some(at),
        }
    }
}
