use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Schema-free entity body. Always a JSON object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityPayload(Value);

impl EntityPayload {
    pub fn new(value: Value) -> Result<Self, String> {
        Self::validate(&value)?;
        Ok(Self(value))
    }

    pub fn from_json_str(json: &str) -> Result<Self, String> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| format!("Invalid JSON payload: {e}"))?;
        Self::new(value)
    }

    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self, String> {
        let value =
            serde_json::to_value(value).map_err(|e| format!("Unserializable payload: {e}"))?;
        Self::new(value)
    }

    /// Payload carrying only the entity id, used for deletes.
    pub fn id_only(id: &str) -> Self {
        let mut map = Map::new();
        map.insert("id".to_string(), Value::String(id.to_string()));
        Self(Value::Object(map))
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }

    pub fn id(&self) -> Option<&str> {
        self.0
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.trim().is_empty())
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }

    pub fn deserialize_into<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.0)
    }

    fn validate(value: &Value) -> Result<(), String> {
        if !value.is_object() {
            return Err("Entity payload must be a JSON object".to_string());
        }
        Ok(())
    }
}

impl From<EntityPayload> for Value {
    fn from(payload: EntityPayload) -> Self {
        payload.0
    }
}
