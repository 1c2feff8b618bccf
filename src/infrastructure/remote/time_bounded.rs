use crate::application::ports::remote_api::{RemoteAck, RemoteApi};
use crate::domain::entities::PendingMutation;
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Caps each submission; a hang is reported like any other rejection.
pub struct TimeBoundedRemote {
    inner: Arc<dyn RemoteApi>,
    timeout: Duration,
}

impl TimeBoundedRemote {
    pub fn new(inner: Arc<dyn RemoteApi>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl RemoteApi for TimeBoundedRemote {
    async fn submit(&self, mutation: &PendingMutation) -> Result<RemoteAck, AppError> {
        match tokio::time::timeout(self.timeout, self.inner.submit(mutation)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::RemoteSubmitFailed(format!(
                "mutation {} timed out after {}ms",
                mutation.id,
                self.timeout.as_millis()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::MutationDraft;
    use crate::domain::value_objects::{EntityKind, EntityPayload, MutationId, MutationKind};
    use chrono::Utc;
    use serde_json::json;

    struct HangingRemote;

    #[async_trait]
    impl RemoteApi for HangingRemote {
        async fn submit(&self, _mutation: &PendingMutation) -> Result<RemoteAck, AppError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(RemoteAck::default())
        }
    }

    fn mutation() -> PendingMutation {
        let draft = MutationDraft::new(
            MutationKind::Create,
            EntityKind::Employee,
            EntityPayload::new(json!({"id": "emp-1"})).unwrap(),
        )
        .unwrap();
        PendingMutation::new(MutationId::new(1).unwrap(), draft, Utc::now())
    }

    #[tokio::test]
    async fn test_hang_becomes_remote_failure() {
        let remote = TimeBoundedRemote::new(Arc::new(HangingRemote), Duration::from_millis(50));
        let result = remote.submit(&mutation()).await;
        assert!(matches!(result, Err(AppError::RemoteSubmitFailed(_))));
    }
}
