use async_trait::async_trait;
use serde_json::{Map, Value};

use super::manager::DatabaseError;
use super::predicate::Predicate;
use super::table::Table;

/// A row as a JSON object keyed by column name
pub type Record = Map<String, Value>;

/// Generic single-statement operations over the contact tables.
///
/// Implementations must be safe to share across request tasks; each call is
/// independent and none of them retry.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// All rows of a table in ascending id order
    async fn list_all(&self, table: Table) -> Result<Vec<Record>, DatabaseError>;

    /// First row matching the predicate
    async fn find(&self, table: Table, predicate: &Predicate) -> Result<Option<Record>, DatabaseError>;

    /// Rows of a child table owned by `parent_id`, ascending id
    async fn find_by_parent(&self, table: Table, parent_id: i64) -> Result<Vec<Record>, DatabaseError>;

    /// Insert a row and return its generated id
    async fn insert(&self, table: Table, fields: Record) -> Result<i64, DatabaseError>;

    /// Insert a row into a child table only if its parent row exists, as one
    /// atomic step with respect to `delete_cascade`. `NotFound` if the parent is missing.
    async fn insert_child(
        &self,
        parent: Table,
        parent_id: i64,
        table: Table,
        fields: Record,
    ) -> Result<i64, DatabaseError>;

    /// Overwrite the given columns of row `id`; `NotFound` if there is no such row
    async fn update(&self, table: Table, id: i64, fields: Record) -> Result<(), DatabaseError>;

    /// Remove row `id`; `NotFound` if there is no such row
    async fn delete(&self, table: Table, id: i64) -> Result<(), DatabaseError>;

    /// Remove every row of `children` owned by `id`, then row `id` of `parent`.
    /// The parent row goes last.
    async fn delete_cascade(&self, parent: Table, id: i64, children: &[Table]) -> Result<(), DatabaseError>;

    /// Connectivity check for the health endpoint
    async fn ping(&self) -> Result<(), DatabaseError>;
}

/// Reject field names that are not columns of `table`
pub(crate) fn check_columns(table: Table, fields: &Record) -> Result<(), DatabaseError> {
    for key in fields.keys() {
        if key == "id" || !table.has_column(key) {
            return Err(DatabaseError::QueryError(format!(
                "column '{}' is not writable on {}",
                key, table
            )));
        }
    }
    Ok(())
}
