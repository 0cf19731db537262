use std::any::type_name_of_val;
use std::fmt;
use std::sync::Arc;

use crate::database::{
    infrastructure::postgres::{
        PostgresFamiliesRepository, PostgresUsersRepository, PostgresWatchRecordsRepository,
    },
    ports::{
        families::FamiliesRepository, users::UsersRepository,
        watch_records::WatchRecordsRepository,
    },
    postgres::PostgresDatabase,
};

/// Aggregates the repository ports used by application services.
///
/// Handlers and services depend on this façade instead of concrete
/// database types, which keeps construction and testing straightforward.
#[derive(Clone)]
pub struct AppUnitOfWork {
    pub users: Arc<dyn UsersRepository>,
    pub families: Arc<dyn FamiliesRepository>,
    pub watch_records: Arc<dyn WatchRecordsRepository>,
}

impl fmt::Debug for AppUnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppUnitOfWork")
            .field("users", &type_name_of_val(self.users.as_ref()))
            .field("families", &type_name_of_val(self.families.as_ref()))
            .field(
                "watch_records",
                &type_name_of_val(self.watch_records.as_ref()),
            )
            .finish()
    }
}

impl AppUnitOfWork {
    /// Compose all Postgres-backed repositories into a unit of work
    pub fn from_postgres(db: &PostgresDatabase) -> Self {
        let pool = db.pool().clone();

        Self {
            users: Arc::new(PostgresUsersRepository::new(pool.clone())),
            families: Arc::new(PostgresFamiliesRepository::new(pool.clone())),
            watch_records: Arc::new(PostgresWatchRecordsRepository::new(pool)),
        }
    }
}
