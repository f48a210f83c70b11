use serde_json::Value;

use super::store::Record;

/// Conjunction of integer equality conditions, e.g. `id = 3 AND contact_id = 1`.
///
/// Column names only ever come from this crate's table catalog, so they are quoted
/// but never escaped; values are always bound as parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    conditions: Vec<(&'static str, i64)>,
}

impl Predicate {
    pub fn id(id: i64) -> Self {
        Self::default().and_eq("id", id)
    }

    pub fn parent(parent_id: i64) -> Self {
        Self::default().and_eq("contact_id", parent_id)
    }

    pub fn and_eq(mut self, column: &'static str, value: i64) -> Self {
        self.conditions.push((column, value));
        self
    }

    /// Evaluate against an in-memory row
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|(column, expected)| {
            record.get(*column).and_then(Value::as_i64) == Some(*expected)
        })
    }

    /// Render as a SQL boolean expression with placeholders starting at `$first_param`
    pub fn to_sql(&self, first_param: usize) -> (String, Vec<i64>) {
        if self.conditions.is_empty() {
            return ("1=1".to_string(), vec![]);
        }
        let clause = self
            .conditions
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("\"{}\" = ${}", column, first_param + i))
            .collect::<Vec<_>>()
            .join(" AND ");
        let params = self.conditions.iter().map(|(_, v)| *v).collect();
        (clause, params)
    }
}
