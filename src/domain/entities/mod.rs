pub mod employee;
pub mod entity;
pub mod payroll;
pub mod pending_mutation;
pub mod sync_metadata;
pub mod time_entry;

pub use employee::{Employee, PayType};
pub use entity::Entity;
pub use payroll::{PayrollCalculation, PayrollPolicy, SalaryProjection};
pub use pending_mutation::{MutationDraft, PendingMutation};
pub use sync_metadata::SyncMetadata;
pub use time_entry::{TimeEntry, TimeEntryStatus};
