pub mod connectivity;
pub mod local_store;
pub mod remote_api;

pub use connectivity::{ConnectivityEvent, ConnectivityListener, ConnectivityState};
pub use local_store::{LedgerStore, LocalStore, MutationLog};
pub use remote_api::{RemoteAck, RemoteApi};
