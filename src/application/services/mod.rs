pub mod connectivity_monitor;
pub mod ledger_service;
pub mod mutation_queue;
pub mod payroll_service;
pub mod sync_service;
pub mod time_clock_service;

pub use connectivity_monitor::{ConnectivityMonitor, ListenerId};
pub use ledger_service::{LedgerService, LedgerWrite};
pub use mutation_queue::MutationQueue;
pub use payroll_service::PayrollService;
pub use sync_service::{
    DrainOutcome, DrainReport, SyncOrchestrator, SyncState, SyncStatus, SyncTrigger,
};
pub use time_clock_service::TimeClockService;
