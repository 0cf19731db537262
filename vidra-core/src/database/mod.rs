//! Persistence: repository ports and their Postgres adapters.

pub mod infrastructure;
pub mod ports;
pub mod postgres;

pub use postgres::PostgresDatabase;
