use crate::application::ports::connectivity::{
    ConnectivityEvent, ConnectivityListener, ConnectivityState,
};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Turns platform reachability readings into one event per transition.
pub struct ConnectivityMonitor {
    online: AtomicBool,
    listeners: RwLock<Vec<(ListenerId, Arc<dyn ConnectivityListener>)>>,
    next_listener_id: AtomicU64,
    events: broadcast::Sender<ConnectivityEvent>,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            online: AtomicBool::new(initially_online),
            listeners: RwLock::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
            events,
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    pub fn state(&self) -> ConnectivityState {
        ConnectivityState::from_online(self.is_online())
    }

    pub fn register(&self, listener: Arc<dyn ConnectivityListener>) -> ListenerId {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut listeners) = self.listeners.write() {
            listeners.push((id, listener));
        }
        id
    }

    pub fn unregister(&self, id: ListenerId) -> bool {
        match self.listeners.write() {
            Ok(mut listeners) => {
                let before = listeners.len();
                listeners.retain(|(listener_id, _)| *listener_id != id);
                listeners.len() != before
            }
            Err(_) => false,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.events.subscribe()
    }

    /// Records a reading. Returns the event when the state actually changed;
    /// listeners run before this returns.
    pub async fn report(&self, online: bool) -> Option<ConnectivityEvent> {
        let was_online = self.online.swap(online, Ordering::AcqRel);
        if was_online == online {
            return None;
        }

        let event = ConnectivityEvent {
            previous: ConnectivityState::from_online(was_online),
            current: ConnectivityState::from_online(online),
            at: Utc::now(),
        };
        tracing::info!(
            target: "ledger::connectivity",
            previous = ?event.previous,
            current = ?event.current,
            "connectivity changed"
        );

        // No receivers is fine.
        let _ = self.events.send(event);

        let listeners: Vec<Arc<dyn ConnectivityListener>> = match self.listeners.read() {
            Ok(listeners) => listeners.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(_) => Vec::new(),
        };
        for listener in listeners {
            listener.on_transition(event).await;
        }

        Some(event)
    }

    /// Follows a platform reachability signal until its sender goes away.
    pub fn attach(self: &Arc<Self>, mut signal: watch::Receiver<bool>) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            let initial = *signal.borrow_and_update();
            monitor.report(initial).await;
            while signal.changed().await.is_ok() {
                let online = *signal.borrow_and_update();
                monitor.report(online).await;
            }
            tracing::debug!(target: "ledger::connectivity", "connectivity signal closed");
        })
    }
}
