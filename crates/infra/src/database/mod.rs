//! SQLite persistence: connection pool, record store, code tables.

pub mod code_table_repository;
pub mod manager;
pub mod record_repository;

pub use code_table_repository::SqliteCodeTableRepository;
pub use manager::DbManager;
pub use record_repository::SqliteRecordRepository;
