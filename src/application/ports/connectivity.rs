use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityState {
    Online,
    Offline,
}

impl ConnectivityState {
    pub fn from_online(online: bool) -> Self {
        if online {
            ConnectivityState::Online
        } else {
            ConnectivityState::Offline
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, ConnectivityState::Online)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityEvent {
    pub previous: ConnectivityState,
    pub current: ConnectivityState,
    pub at: DateTime<Utc>,
}

impl ConnectivityEvent {
    pub fn is_reconnect(&self) -> bool {
        !self.previous.is_online() && self.current.is_online()
    }
}

#[async_trait]
pub trait ConnectivityListener: Send + Sync {
    async fn on_transition(&self, event: ConnectivityEvent);
}
