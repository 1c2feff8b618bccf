pub mod time_bounded;

pub use time_bounded::TimeBoundedRemote;
