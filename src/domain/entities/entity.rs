use crate::domain::value_objects::{Collection, EntityId, EntityPayload};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Generic business record as held by the local store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub collection: Collection,
    pub payload: EntityPayload,
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    pub fn new(collection: Collection, id: EntityId, payload: EntityPayload) -> Self {
        Self {
            id,
            collection,
            payload,
            updated_at: Utc::now(),
        }
    }

    /// Builds an entity whose id is read from the payload's `id` field.
    pub fn from_payload(collection: Collection, payload: EntityPayload) -> Result<Self, String> {
        let id = payload
            .id()
            .ok_or_else(|| format!("{collection} payload is missing an id"))?
            .to_string();
        Ok(Self::new(collection, EntityId::new(id)?, payload))
    }

    pub fn from_record<T: Serialize>(
        collection: Collection,
        record: &T,
    ) -> Result<Self, String> {
        Self::from_payload(collection, EntityPayload::from_serializable(record)?)
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, String> {
        self.payload
            .deserialize_into()
            .map_err(|err| format!("Malformed {} entity {}: {err}", self.collection, self.id))
    }
}
