pub mod database;
pub mod metrics;
pub mod remote;
pub mod store;
