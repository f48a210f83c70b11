//! Postgres-backed `EntityStore`.
//!
//! Rows are read with `row_to_json` so every table comes back as a JSON object
//! without per-table `FromRow` impls. Writes bind each value according to the
//! column's declared kind.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{postgres::PgArguments, PgPool, Postgres, Row};
use tracing::debug;

use super::manager::DatabaseError;
use super::predicate::Predicate;
use super::store::{check_columns, EntityStore, Record};
use super::table::{Column, ColumnKind, Table};

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn select(&self, table: Table, predicate: &Predicate, limit_one: bool) -> Result<Vec<Record>, DatabaseError> {
        let (clause, params) = predicate.to_sql(1);
        let sql = select_sql(table, &clause, limit_one);
        debug!("select: {}", sql);

        let mut q = sqlx::query(&sql);
        for p in params {
            q = q.bind(p);
        }
        let rows = q.fetch_all(&self.pool).await?;

        rows.into_iter()
            .map(|row| {
                let v: Value = row.try_get("row")?;
                match v {
                    Value::Object(map) => Ok(map),
                    other => Err(DatabaseError::Decode(format!("expected JSON object row, got {}", other))),
                }
            })
            .collect()
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn list_all(&self, table: Table) -> Result<Vec<Record>, DatabaseError> {
        self.select(table, &Predicate::default(), false).await
    }

    async fn find(&self, table: Table, predicate: &Predicate) -> Result<Option<Record>, DatabaseError> {
        Ok(self.select(table, predicate, true).await?.into_iter().next())
    }

    async fn find_by_parent(&self, table: Table, parent_id: i64) -> Result<Vec<Record>, DatabaseError> {
        let column = table
            .parent_column()
            .ok_or_else(|| DatabaseError::QueryError(format!("{} has no parent", table)))?;
        self.select(table, &Predicate::default().and_eq(column, parent_id), false).await
    }

    async fn insert(&self, table: Table, fields: Record) -> Result<i64, DatabaseError> {
        check_columns(table, &fields)?;
        let columns: Vec<&'static Column> = fields.keys().filter_map(|k| table.column(k)).collect();
        let sql = insert_sql(table, &columns);
        debug!("insert: {}", sql);

        let mut q = sqlx::query(&sql);
        for column in &columns {
            q = bind_value(q, column, &fields[column.name])?;
        }
        let row = q.fetch_one(&self.pool).await?;
        let id: i32 = row.try_get("id")?;
        Ok(id as i64)
    }

    async fn insert_child(
        &self,
        parent: Table,
        parent_id: i64,
        table: Table,
        fields: Record,
    ) -> Result<i64, DatabaseError> {
        check_columns(table, &fields)?;
        let columns: Vec<&'static Column> = fields.keys().filter_map(|k| table.column(k)).collect();
        let sql = insert_sql(table, &columns);
        debug!("insert_child: {}", sql);

        let mut tx = self.pool.begin().await?;

        // FOR SHARE conflicts with the cascade's FOR UPDATE, so the parent cannot vanish before commit
        let lock = lock_sql(parent, "FOR SHARE");
        if sqlx::query(&lock).bind(parent_id).fetch_optional(&mut *tx).await?.is_none() {
            tx.rollback().await?;
            return Err(DatabaseError::NotFound(format!("{} {}", parent, parent_id)));
        }

        let mut q = sqlx::query(&sql);
        for column in &columns {
            q = bind_value(q, column, &fields[column.name])?;
        }
        let row = q.fetch_one(&mut *tx).await?;
        let id: i32 = row.try_get("id")?;

        tx.commit().await?;
        Ok(id as i64)
    }

    async fn update(&self, table: Table, id: i64, fields: Record) -> Result<(), DatabaseError> {
        check_columns(table, &fields)?;
        if fields.is_empty() {
            return match self.find(table, &Predicate::id(id)).await? {
                Some(_) => Ok(()),
                None => Err(DatabaseError::NotFound(format!("{} {}", table, id))),
            };
        }

        let columns: Vec<&'static Column> = fields.keys().filter_map(|k| table.column(k)).collect();
        let sql = update_sql(table, &columns);
        debug!("update: {}", sql);

        let mut q = sqlx::query(&sql);
        for column in &columns {
            q = bind_value(q, column, &fields[column.name])?;
        }
        let result = q.bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("{} {}", table, id)));
        }
        Ok(())
    }

    async fn delete(&self, table: Table, id: i64) -> Result<(), DatabaseError> {
        let (clause, _) = Predicate::id(id).to_sql(1);
        let sql = delete_sql(table, &clause);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("{} {}", table, id)));
        }
        Ok(())
    }

    async fn delete_cascade(&self, parent: Table, id: i64, children: &[Table]) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let lock = lock_sql(parent, "FOR UPDATE");
        if sqlx::query(&lock).bind(id).fetch_optional(&mut *tx).await?.is_none() {
            tx.rollback().await?;
            return Err(DatabaseError::NotFound(format!("{} {}", parent, id)));
        }

        for child in children {
            let column = child
                .parent_column()
                .ok_or_else(|| DatabaseError::QueryError(format!("{} has no parent", child)))?;
            let (clause, _) = Predicate::default().and_eq(column, id).to_sql(1);
            let result = sqlx::query(&delete_sql(*child, &clause)).bind(id).execute(&mut *tx).await?;
            debug!("cascade removed {} rows from {}", result.rows_affected(), child);
        }

        let (clause, _) = Predicate::id(id).to_sql(1);
        sqlx::query(&delete_sql(parent, &clause)).bind(id).execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn select_sql(table: Table, where_clause: &str, limit_one: bool) -> String {
    format!(
        "SELECT row_to_json(t) AS row FROM (SELECT * FROM \"{}\" WHERE {}) t ORDER BY t.\"id\"{}",
        table.name(),
        where_clause,
        if limit_one { " LIMIT 1" } else { "" }
    )
}

fn lock_sql(table: Table, mode: &str) -> String {
    format!("SELECT \"id\" FROM \"{}\" WHERE \"id\" = $1 {}", table.name(), mode)
}

fn insert_sql(table: Table, columns: &[&Column]) -> String {
    if columns.is_empty() {
        return format!("INSERT INTO \"{}\" DEFAULT VALUES RETURNING \"id\"", table.name());
    }
    let names = columns.iter().map(|c| format!("\"{}\"", c.name)).collect::<Vec<_>>().join(", ");
    let placeholders = (1..=columns.len()).map(|i| format!("${}", i)).collect::<Vec<_>>().join(", ");
    format!(
        "INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING \"id\"",
        table.name(),
        names,
        placeholders
    )
}

fn update_sql(table: Table, columns: &[&Column]) -> String {
    let sets = columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("\"{}\" = ${}", c.name, i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    format!("UPDATE \"{}\" SET {} WHERE \"id\" = ${}", table.name(), sets, columns.len() + 1)
}

fn delete_sql(table: Table, where_clause: &str) -> String {
    format!("DELETE FROM \"{}\" WHERE {}", table.name(), where_clause)
}

fn bind_value<'q>(q: PgQuery<'q>, column: &Column, value: &Value) -> Result<PgQuery<'q>, DatabaseError> {
    let invalid = || DatabaseError::QueryError(format!("invalid value for column '{}': {}", column.name, value));

    let q = match column.kind {
        ColumnKind::Integer => {
            let v: Option<i32> = match value {
                Value::Null => None,
                Value::Number(n) => Some(n.as_i64().and_then(|i| i32::try_from(i).ok()).ok_or_else(invalid)?),
                Value::String(s) => Some(s.trim().parse().map_err(|_| invalid())?),
                _ => return Err(invalid()),
            };
            q.bind(v)
        }
        ColumnKind::Text => {
            let v: Option<String> = match value {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => return Err(invalid()),
            };
            q.bind(v)
        }
        ColumnKind::Timestamp => {
            let v: Option<DateTime<Utc>> = match value {
                Value::Null => None,
                Value::String(s) => Some(
                    DateTime::parse_from_rfc3339(s)
                        .map_err(|_| invalid())?
                        .with_timezone(&Utc),
                ),
                _ => return Err(invalid()),
            };
            q.bind(v)
        }
    };
    Ok(q)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_wraps_rows_as_json() {
        let sql = select_sql(Table::Emails, "\"contact_id\" = $1", false);
        assert_eq!(
            sql,
            "SELECT row_to_json(t) AS row FROM (SELECT * FROM \"emails\" WHERE \"contact_id\" = $1) t ORDER BY t.\"id\""
        );
        assert!(select_sql(Table::Contacts, "1=1", true).ends_with(" LIMIT 1"));
    }

    #[test]
    fn insert_lists_columns_in_order() {
        let columns = [
            Table::Phones.column("contact_id").unwrap(),
            Table::Phones.column("phone").unwrap(),
        ];
        assert_eq!(
            insert_sql(Table::Phones, &columns),
            "INSERT INTO \"phones\" (\"contact_id\", \"phone\") VALUES ($1, $2) RETURNING \"id\""
        );
        assert_eq!(
            insert_sql(Table::Phones, &[]),
            "INSERT INTO \"phones\" DEFAULT VALUES RETURNING \"id\""
        );
    }

    #[test]
    fn update_binds_id_last() {
        let columns = [
            Table::Contacts.column("first_name").unwrap(),
            Table::Contacts.column("updated_at").unwrap(),
        ];
        assert_eq!(
            update_sql(Table::Contacts, &columns),
            "UPDATE \"contacts\" SET \"first_name\" = $1, \"updated_at\" = $2 WHERE \"id\" = $3"
        );
    }

    #[test]
    fn parent_lock_modes() {
        assert_eq!(
            lock_sql(Table::Contacts, "FOR SHARE"),
            "SELECT \"id\" FROM \"contacts\" WHERE \"id\" = $1 FOR SHARE"
        );
        assert!(lock_sql(Table::Contacts, "FOR UPDATE").ends_with("FOR UPDATE"));
    }

    #[test]
    fn delete_uses_predicate_clause() {
        assert_eq!(
            delete_sql(Table::Addresses, "\"contact_id\" = $1"),
            "DELETE FROM \"addresses\" WHERE \"contact_id\" = $1"
        );
    }

    #[test]
    fn bind_rejects_values_of_the_wrong_shape() {
        let month = Table::Contacts.column("birthday_month").unwrap();
        let created = Table::Contacts.column("created_at").unwrap();

        assert!(bind_value(sqlx::query("SELECT $1"), month, &Value::from(12)).is_ok());
        assert!(bind_value(sqlx::query("SELECT $1"), month, &Value::from("twelve")).is_err());
        assert!(bind_value(sqlx::query("SELECT $1"), created, &Value::from("2026-10-18T10:00:00Z")).is_ok());
        assert!(bind_value(sqlx::query("SELECT $1"), created, &Value::from(5)).is_err());
    }
}
