pub mod fallback_store;
mod mappers;
pub mod memory_store;
mod rows;
pub mod sqlite_store;

pub use fallback_store::FallbackLedgerStore;
pub use memory_store::MemoryLedgerStore;
pub use sqlite_store::SqliteLedgerStore;
