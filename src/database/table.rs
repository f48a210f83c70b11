use serde::Serialize;

/// Storage type of a column, used when binding values to SQL parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Text,
    Timestamp,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    /// Value the database fills in when an insert omits the column
    pub default: Option<&'static str>,
}

const fn col(name: &'static str, kind: ColumnKind) -> Column {
    Column { name, kind, default: None }
}

const CONTACT_COLUMNS: &[Column] = &[
    col("first_name", ColumnKind::Text),
    col("last_name", ColumnKind::Text),
    col("birthday_month", ColumnKind::Integer),
    col("birthday_day", ColumnKind::Integer),
    col("birthday_year", ColumnKind::Integer),
    col("created_at", ColumnKind::Timestamp),
    col("updated_at", ColumnKind::Timestamp),
];

const ADDRESS_COLUMNS: &[Column] = &[
    col("contact_id", ColumnKind::Integer),
    col("address_1", ColumnKind::Text),
    col("address_2", ColumnKind::Text),
    col("city", ColumnKind::Text),
    col("state", ColumnKind::Text),
    col("zip", ColumnKind::Text),
    Column { name: "country", kind: ColumnKind::Text, default: Some(DEFAULT_COUNTRY) },
];

const PHONE_COLUMNS: &[Column] = &[
    col("contact_id", ColumnKind::Integer),
    col("phone", ColumnKind::Text),
];

const EMAIL_COLUMNS: &[Column] = &[
    col("contact_id", ColumnKind::Integer),
    col("email", ColumnKind::Text),
];

pub const DEFAULT_COUNTRY: &str = "United States";

/// The four tables of the contact graph. Every table has an integer `id` primary key;
/// the child tables carry an unconstrained `contact_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Contacts,
    Addresses,
    Phones,
    Emails,
}

impl Table {
    pub const ALL: [Table; 4] = [Table::Contacts, Table::Addresses, Table::Phones, Table::Emails];
    pub const CHILDREN: [Table; 3] = [Table::Addresses, Table::Phones, Table::Emails];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Contacts => "contacts",
            Table::Addresses => "addresses",
            Table::Phones => "phones",
            Table::Emails => "emails",
        }
    }

    /// Columns other than `id`
    pub fn columns(&self) -> &'static [Column] {
        match self {
            Table::Contacts => CONTACT_COLUMNS,
            Table::Addresses => ADDRESS_COLUMNS,
            Table::Phones => PHONE_COLUMNS,
            Table::Emails => EMAIL_COLUMNS,
        }
    }

    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns().iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        name == "id" || self.column(name).is_some()
    }

    /// Foreign key column pointing at the owning contact
    pub fn parent_column(&self) -> Option<&'static str> {
        match self {
            Table::Contacts => None,
            _ => Some("contact_id"),
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_tables_have_parent_column() {
        for table in Table::CHILDREN {
            assert_eq!(table.parent_column(), Some("contact_id"));
            assert!(table.has_column("contact_id"));
        }
        assert_eq!(Table::Contacts.parent_column(), None);
    }

    #[test]
    fn country_defaults_to_united_states() {
        let country = Table::Addresses.column("country").unwrap();
        assert_eq!(country.default, Some("United States"));
        assert!(Table::Addresses.column("city").unwrap().default.is_none());
    }

    #[test]
    fn unknown_columns_are_rejected() {
        assert!(Table::Phones.has_column("id"));
        assert!(!Table::Phones.has_column("email"));
        assert!(!Table::Contacts.has_column("contact_id"));
    }
}
