pub mod repositories;

pub use repositories::{
    PostgresFamiliesRepository, PostgresUsersRepository, PostgresWatchRecordsRepository,
};
