pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod predicate;
pub mod store;
pub mod table;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use predicate::Predicate;
pub use store::{EntityStore, Record};
pub use table::{Column, ColumnKind, Table};
