//! In-process `EntityStore` used for tests and database-less development runs.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::manager::DatabaseError;
use super::predicate::Predicate;
use super::store::{check_columns, EntityStore, Record};
use super::table::Table;

#[derive(Default)]
struct TableData {
    next_id: i64,
    rows: BTreeMap<i64, Record>,
}

impl TableData {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Fill omitted columns the way the database would, then store the row
    fn insert(&mut self, table: Table, mut fields: Record) -> i64 {
        for column in table.columns() {
            if !fields.contains_key(column.name) {
                let value = column.default.map(Value::from).unwrap_or(Value::Null);
                fields.insert(column.name.to_string(), value);
            }
        }
        let id = self.allocate_id();
        fields.insert("id".to_string(), Value::from(id));
        self.rows.insert(id, fields);
        id
    }
}

pub struct MemoryStore {
    tables: RwLock<HashMap<Table, TableData>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        let tables = Table::ALL.into_iter().map(|t| (t, TableData::default())).collect();
        Self { tables: RwLock::new(tables) }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently in a table
    pub async fn count(&self, table: Table) -> usize {
        self.tables.read().await.get(&table).map(|t| t.rows.len()).unwrap_or(0)
    }
}

fn missing(table: Table) -> DatabaseError {
    DatabaseError::QueryError(format!("table {} is not initialized", table))
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn list_all(&self, table: Table) -> Result<Vec<Record>, DatabaseError> {
        let tables = self.tables.read().await;
        let data = tables.get(&table).ok_or_else(|| missing(table))?;
        Ok(data.rows.values().cloned().collect())
    }

    async fn find(&self, table: Table, predicate: &Predicate) -> Result<Option<Record>, DatabaseError> {
        let tables = self.tables.read().await;
        let data = tables.get(&table).ok_or_else(|| missing(table))?;
        Ok(data.rows.values().find(|row| predicate.matches(row)).cloned())
    }

    async fn find_by_parent(&self, table: Table, parent_id: i64) -> Result<Vec<Record>, DatabaseError> {
        let column = table
            .parent_column()
            .ok_or_else(|| DatabaseError::QueryError(format!("{} has no parent", table)))?;
        let predicate = Predicate::default().and_eq(column, parent_id);

        let tables = self.tables.read().await;
        let data = tables.get(&table).ok_or_else(|| missing(table))?;
        Ok(data.rows.values().filter(|row| predicate.matches(row)).cloned().collect())
    }

    async fn insert(&self, table: Table, fields: Record) -> Result<i64, DatabaseError> {
        check_columns(table, &fields)?;

        let mut tables = self.tables.write().await;
        let data = tables.get_mut(&table).ok_or_else(|| missing(table))?;
        Ok(data.insert(table, fields))
    }

    async fn insert_child(
        &self,
        parent: Table,
        parent_id: i64,
        table: Table,
        fields: Record,
    ) -> Result<i64, DatabaseError> {
        check_columns(table, &fields)?;

        // Parent check and insert share one write lock, so a cascade cannot run in between
        let mut tables = self.tables.write().await;
        let exists = tables.get(&parent).ok_or_else(|| missing(parent))?.rows.contains_key(&parent_id);
        if !exists {
            return Err(DatabaseError::NotFound(format!("{} {}", parent, parent_id)));
        }

        let data = tables.get_mut(&table).ok_or_else(|| missing(table))?;
        Ok(data.insert(table, fields))
    }

    async fn update(&self, table: Table, id: i64, fields: Record) -> Result<(), DatabaseError> {
        check_columns(table, &fields)?;

        let mut tables = self.tables.write().await;
        let data = tables.get_mut(&table).ok_or_else(|| missing(table))?;
        let row = data
            .rows
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {}", table, id)))?;
        row.extend(fields);
        Ok(())
    }

    async fn delete(&self, table: Table, id: i64) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        let data = tables.get_mut(&table).ok_or_else(|| missing(table))?;
        data.rows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {}", table, id)))
    }

    async fn delete_cascade(&self, parent: Table, id: i64, children: &[Table]) -> Result<(), DatabaseError> {
        // One write lock for the whole sequence, so no reader sees a partial aggregate
        let mut tables = self.tables.write().await;

        let exists = tables.get(&parent).ok_or_else(|| missing(parent))?.rows.contains_key(&id);
        if !exists {
            return Err(DatabaseError::NotFound(format!("{} {}", parent, id)));
        }

        for child in children {
            let column = child
                .parent_column()
                .ok_or_else(|| DatabaseError::QueryError(format!("{} has no parent", child)))?;
            let predicate = Predicate::default().and_eq(column, id);
            let data = tables.get_mut(child).ok_or_else(|| missing(*child))?;
            data.rows.retain(|_, row| !predicate.matches(row));
        }

        if let Some(data) = tables.get_mut(&parent) {
            data.rows.remove(&id);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
