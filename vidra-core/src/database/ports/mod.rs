//! Repository traits consumed by the application services.
//!
//! Implementations live under [`crate::database::infrastructure`]; tests
//! substitute mocks.

pub mod families;
pub mod users;
pub mod watch_records;

pub use families::{FamiliesRepository, NewInvite, SlotUsage};
pub use users::UsersRepository;
pub use watch_records::WatchRecordsRepository;
