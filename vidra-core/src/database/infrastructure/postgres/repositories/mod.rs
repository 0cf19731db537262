pub mod families;
pub mod users;
pub mod watch_records;

pub use families::PostgresFamiliesRepository;
pub use users::PostgresUsersRepository;
pub use watch_records::PostgresWatchRecordsRepository;
