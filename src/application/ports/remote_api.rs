use crate::domain::entities::PendingMutation;
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAck {
    pub remote_id: Option<String>,
}

/// System of record the queue is replayed against. Each submission is
/// independently atomic; `Err` means the mutation was not applied.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn submit(&self, mutation: &PendingMutation) -> Result<RemoteAck, AppError>;
}
