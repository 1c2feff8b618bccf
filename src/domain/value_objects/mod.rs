pub mod collection;
pub mod entity_id;
pub mod entity_kind;
pub mod mutation_id;
pub mod mutation_kind;
pub mod payload;
pub mod period;

pub use collection::Collection;
pub use entity_id::EntityId;
pub use entity_kind::EntityKind;
pub use mutation_id::MutationId;
pub use mutation_kind::MutationKind;
pub use payload::EntityPayload;
pub use period::PayPeriod;
