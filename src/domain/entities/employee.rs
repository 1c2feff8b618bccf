use crate::domain::value_objects::EntityId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PayType {
    Hourly { rate: f64 },
    Salaried { base: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EntityId,
    pub name: String,
    pub pay_type: PayType,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Employee {
    pub fn new(id: EntityId, name: impl Into<String>, pay_type: PayType) -> Self {
        Self {
            id,
            name: name.into(),
            pay_type,
            active: true,
        }
    }
}
