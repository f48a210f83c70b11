//! Contact aggregate: contacts plus the address, phone and email rows they own.
//!
//! Every operation on a single child requires both the owning contact and the
//! child row itself to exist; a child that exists under a deleted or different
//! contact is reported as not found. Listing a collection only filters by owner.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::database::models::{Address, Contact, Email, Entity, Phone};
use crate::database::{DatabaseError, EntityStore, Predicate, Record, Table};
use crate::validation::rule_set::is_present;
use crate::validation::{RuleSet, RulesTable, ValidationErrors};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(what) => ServiceError::NotFound(what),
            other => ServiceError::Database(other),
        }
    }
}

/// The three child collections under `/contact/{id}/...`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildKind {
    Address,
    Phone,
    Email,
}

impl ChildKind {
    pub fn table(&self) -> Table {
        match self {
            ChildKind::Address => Table::Addresses,
            ChildKind::Phone => Table::Phones,
            ChildKind::Email => Table::Emails,
        }
    }

    pub fn path_segment(&self) -> &'static str {
        match self {
            ChildKind::Address => "address",
            ChildKind::Phone => "phone",
            ChildKind::Email => "email",
        }
    }
}

impl FromStr for ChildKind {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "address" => Ok(ChildKind::Address),
            "phone" => Ok(ChildKind::Phone),
            "email" => Ok(ChildKind::Email),
            other => Err(ServiceError::NotFound(format!("collection '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChildRecord {
    Address(Address),
    Phone(Phone),
    Email(Email),
}

impl ChildRecord {
    fn decode(kind: ChildKind, record: Record) -> Result<Self, DatabaseError> {
        Ok(match kind {
            ChildKind::Address => ChildRecord::Address(Address::from_record(record)?),
            ChildKind::Phone => ChildRecord::Phone(Phone::from_record(record)?),
            ChildKind::Email => ChildRecord::Email(Email::from_record(record)?),
        })
    }

    pub fn contact_id(&self) -> i64 {
        match self {
            ChildRecord::Address(a) => a.contact_id,
            ChildRecord::Phone(p) => p.contact_id,
            ChildRecord::Email(e) => e.contact_id,
        }
    }
}

#[derive(Clone)]
pub struct ContactService {
    store: Arc<dyn EntityStore>,
    rules: Arc<RulesTable>,
}

impl ContactService {
    pub fn new(store: Arc<dyn EntityStore>, rules: Arc<RulesTable>) -> Self {
        Self { store, rules }
    }

    pub async fn ping(&self) -> Result<(), ServiceError> {
        Ok(self.store.ping().await?)
    }

    pub async fn list_contacts(&self) -> Result<Vec<Contact>, ServiceError> {
        let rows = self.store.list_all(Table::Contacts).await?;
        Ok(Contact::from_records(rows)?)
    }

    pub async fn get_contact(&self, id: i64) -> Result<Contact, ServiceError> {
        let row = self.require_contact(id).await?;
        Ok(Contact::from_record(row)?)
    }

    /// Validate and insert a contact; timestamps are always server-set
    pub async fn create_contact(&self, payload: &Value) -> Result<i64, ServiceError> {
        let rules = self.rules.get(Table::Contacts);
        let mut fields = rules.validate(&rules.only(payload))?;

        let now = timestamp();
        fields.insert("created_at".to_string(), now.clone());
        fields.insert("updated_at".to_string(), now);

        let id = self.store.insert(Table::Contacts, fields).await?;
        info!("Created contact {}", id);
        Ok(id)
    }

    /// Merge submitted fields over the stored contact, then validate and persist.
    /// Omitted or blank fields keep their stored value.
    pub async fn update_contact(&self, id: i64, payload: &Value) -> Result<(), ServiceError> {
        let existing = self.require_contact(id).await?;
        let rules = self.rules.get(Table::Contacts);
        let submitted = rules.only(payload);

        let mut merged = Record::new();
        for name in rules.field_names() {
            let value = submitted
                .get(name)
                .filter(|v| is_present(v))
                .or_else(|| existing.get(name))
                .cloned()
                .unwrap_or(Value::Null);
            merged.insert(name.to_string(), value);
        }

        let mut fields = rules.validate(&merged)?;
        fields.insert("updated_at".to_string(), timestamp());

        self.store.update(Table::Contacts, id, fields).await?;
        info!("Updated contact {}", id);
        Ok(())
    }

    /// Remove a contact together with all of its addresses, phones and emails
    pub async fn delete_contact(&self, id: i64) -> Result<(), ServiceError> {
        self.require_contact(id).await?;
        self.store.delete_cascade(Table::Contacts, id, &Table::CHILDREN).await?;
        info!("Deleted contact {} and its child rows", id);
        Ok(())
    }

    /// Rows owned by `contact_id`; a contact that does not exist simply owns none
    pub async fn list_children(&self, contact_id: i64, kind: ChildKind) -> Result<Vec<ChildRecord>, ServiceError> {
        let rows = self.store.find_by_parent(kind.table(), contact_id).await?;
        debug!("Loaded {} {} rows for contact {}", rows.len(), kind.table(), contact_id);
        rows.into_iter()
            .map(|row| ChildRecord::decode(kind, row).map_err(ServiceError::from))
            .collect()
    }

    /// Validate and insert a child row. The contact is checked up front so a missing
    /// contact wins over validation errors, and again atomically with the insert.
    pub async fn create_child(&self, contact_id: i64, kind: ChildKind, payload: &Value) -> Result<i64, ServiceError> {
        self.require_contact(contact_id).await?;

        let table = kind.table();
        let rules = self.rules.get(table);
        let mut fields = rules.validate(&rules.only(payload))?;
        fill_absent(table, rules, &mut fields);
        fields.insert("contact_id".to_string(), Value::from(contact_id));

        let id = self.store.insert_child(Table::Contacts, contact_id, table, fields).await?;
        info!("Created {} {} for contact {}", kind.path_segment(), id, contact_id);
        Ok(id)
    }

    pub async fn get_child(&self, contact_id: i64, kind: ChildKind, child_id: i64) -> Result<ChildRecord, ServiceError> {
        let row = self.require_child(contact_id, kind, child_id).await?;
        Ok(ChildRecord::decode(kind, row)?)
    }

    /// Full replace of the child's writable fields. `contact_id` never changes.
    pub async fn update_child(
        &self,
        contact_id: i64,
        kind: ChildKind,
        child_id: i64,
        payload: &Value,
    ) -> Result<(), ServiceError> {
        self.require_child(contact_id, kind, child_id).await?;

        let table = kind.table();
        let rules = self.rules.get(table);
        let mut fields = rules.validate(&rules.only(payload))?;
        fill_absent(table, rules, &mut fields);

        self.store.update(table, child_id, fields).await?;
        info!("Updated {} {} for contact {}", kind.path_segment(), child_id, contact_id);
        Ok(())
    }

    pub async fn delete_child(&self, contact_id: i64, kind: ChildKind, child_id: i64) -> Result<(), ServiceError> {
        self.require_child(contact_id, kind, child_id).await?;
        self.store.delete(kind.table(), child_id).await?;
        info!("Deleted {} {} for contact {}", kind.path_segment(), child_id, contact_id);
        Ok(())
    }

    async fn require_contact(&self, id: i64) -> Result<Record, ServiceError> {
        self.store
            .find(Table::Contacts, &Predicate::id(id))
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("contact {}", id)))
    }

    async fn require_child(&self, contact_id: i64, kind: ChildKind, child_id: i64) -> Result<Record, ServiceError> {
        self.require_contact(contact_id).await?;
        let predicate = Predicate::parent(contact_id).and_eq("id", child_id);
        self.store
            .find(kind.table(), &predicate)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("{} {} of contact {}", kind.path_segment(), child_id, contact_id)))
    }
}

fn timestamp() -> Value {
    Value::String(Utc::now().to_rfc3339())
}

/// Give every whitelisted field a value so inserts and full replaces are explicit:
/// the column default where one exists, otherwise null.
fn fill_absent(table: Table, rules: &RuleSet, fields: &mut Record) {
    for name in rules.field_names() {
        if !fields.contains_key(name) {
            let value = table
                .column(name)
                .and_then(|c| c.default)
                .map(Value::from)
                .unwrap_or(Value::Null);
            fields.insert(name.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use serde_json::json;

    fn service() -> (ContactService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let rules = Arc::new(RulesTable::standard(2026).unwrap());
        (ContactService::new(store.clone(), rules), store)
    }

    async fn ron(service: &ContactService) -> i64 {
        service
            .create_contact(&json!({"first_name": "Ron", "last_name": "Swanson"}))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_then_get_round_trips_submitted_fields() {
        let (service, _) = service();
        let id = service
            .create_contact(&json!({
                "first_name": "Leslie",
                "last_name": "Knope",
                "birthday_month": "01",
                "birthday_day": 18,
                "birthday_year": 1975,
                "created_at": "1999-01-01T00:00:00Z"
            }))
            .await
            .unwrap();

        let contact = service.get_contact(id).await.unwrap();
        assert_eq!(contact.first_name, "Leslie");
        assert_eq!(contact.birthday_month, Some(1));
        assert_eq!(contact.birthday_year, Some(1975));
        assert!(contact.created_at.timestamp() > 946_684_800, "client timestamp must be ignored");
    }

    #[tokio::test]
    async fn invalid_contact_is_not_inserted() {
        let (service, store) = service();
        let err = service
            .create_contact(&json!({"first_name": "x".repeat(256), "last_name": "Swanson", "birthday_month": 13}))
            .await
            .unwrap_err();
        let ServiceError::Validation(errors) = err else { panic!("expected validation error") };
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["birthday_month", "first_name"]);
        assert_eq!(store.count(Table::Contacts).await, 0);
    }

    #[tokio::test]
    async fn update_falls_back_to_stored_values() {
        let (service, _) = service();
        let id = service
            .create_contact(&json!({"first_name": "Ron", "last_name": "Swanson", "birthday_month": 5}))
            .await
            .unwrap();
        let before = service.get_contact(id).await.unwrap();

        service
            .update_contact(id, &json!({"last_name": "Swanson II", "first_name": ""}))
            .await
            .unwrap();

        let after = service.get_contact(id).await.unwrap();
        assert_eq!(after.first_name, "Ron");
        assert_eq!(after.last_name, "Swanson II");
        assert_eq!(after.birthday_month, Some(5));
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at >= before.updated_at);
    }

    #[tokio::test]
    async fn update_validates_merged_record() {
        let (service, _) = service();
        let id = ron(&service).await;
        let err = service.update_contact(id, &json!({"birthday_day": 32})).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(matches!(
            service.update_contact(99, &json!({})).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn child_under_missing_contact_is_not_found() {
        let (service, store) = service();
        let err = service
            .create_child(7, ChildKind::Email, &json!({"email": "ron@example.com"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(store.count(Table::Emails).await, 0);
    }

    #[tokio::test]
    async fn children_are_scoped_to_their_contact() {
        let (service, _) = service();
        let ron = ron(&service).await;
        let leslie = service
            .create_contact(&json!({"first_name": "Leslie", "last_name": "Knope"}))
            .await
            .unwrap();
        let phone = service
            .create_child(ron, ChildKind::Phone, &json!({"phone": "555-0100"}))
            .await
            .unwrap();

        assert_eq!(service.get_child(ron, ChildKind::Phone, phone).await.unwrap().contact_id(), ron);
        assert!(matches!(
            service.get_child(leslie, ChildKind::Phone, phone).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.delete_child(leslie, ChildKind::Phone, phone).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(service.list_children(leslie, ChildKind::Phone).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn address_country_defaults_on_create_and_replace() {
        let (service, _) = service();
        let id = ron(&service).await;
        let payload = json!({"address_1": "123 Main Street", "city": "Pawnee", "state": "Indiana", "zip": "46205"});
        let address = service.create_child(id, ChildKind::Address, &payload).await.unwrap();

        let ChildRecord::Address(stored) = service.get_child(id, ChildKind::Address, address).await.unwrap() else {
            panic!("expected address");
        };
        assert_eq!(stored.country.as_deref(), Some("United States"));

        let replace = json!({"address_1": "1 City Hall", "address_2": "Room 2", "city": "Pawnee", "state": "Indiana", "zip": "46205", "country": "Canada"});
        service.update_child(id, ChildKind::Address, address, &replace).await.unwrap();
        service.update_child(id, ChildKind::Address, address, &payload).await.unwrap();

        let ChildRecord::Address(stored) = service.get_child(id, ChildKind::Address, address).await.unwrap() else {
            panic!("expected address");
        };
        assert_eq!(stored.address_1, "123 Main Street");
        assert_eq!(stored.address_2, None);
        assert_eq!(stored.country.as_deref(), Some("United States"));
        assert_eq!(stored.contact_id, id);
    }

    #[tokio::test]
    async fn deleting_contact_cascades() {
        let (service, store) = service();
        let id = ron(&service).await;
        service.create_child(id, ChildKind::Email, &json!({"email": "ron@example.com"})).await.unwrap();
        service.create_child(id, ChildKind::Phone, &json!({"phone": "555-0100"})).await.unwrap();
        service
            .create_child(id, ChildKind::Address, &json!({"address_1": "a", "city": "b", "state": "c", "zip": "d"}))
            .await
            .unwrap();

        service.delete_contact(id).await.unwrap();

        for table in Table::ALL {
            assert_eq!(store.count(table).await, 0, "{table}");
        }
        assert!(matches!(service.get_contact(id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(service.delete_contact(id).await, Err(ServiceError::NotFound(_))));
        for kind in [ChildKind::Address, ChildKind::Phone, ChildKind::Email] {
            assert!(service.list_children(id, kind).await.unwrap().is_empty());
        }
    }

    /// Deletes the parent contact right before forwarding a child insert,
    /// reproducing a DELETE that lands between the parent check and the write
    struct DeleteParentFirst(MemoryStore);

    #[async_trait::async_trait]
    impl EntityStore for DeleteParentFirst {
        async fn list_all(&self, table: Table) -> Result<Vec<Record>, DatabaseError> {
            self.0.list_all(table).await
        }
        async fn find(&self, table: Table, predicate: &Predicate) -> Result<Option<Record>, DatabaseError> {
            self.0.find(table, predicate).await
        }
        async fn find_by_parent(&self, table: Table, parent_id: i64) -> Result<Vec<Record>, DatabaseError> {
            self.0.find_by_parent(table, parent_id).await
        }
        async fn insert(&self, table: Table, fields: Record) -> Result<i64, DatabaseError> {
            self.0.insert(table, fields).await
        }
        async fn insert_child(
            &self,
            parent: Table,
            parent_id: i64,
            table: Table,
            fields: Record,
        ) -> Result<i64, DatabaseError> {
            self.0.delete_cascade(parent, parent_id, &Table::CHILDREN).await?;
            self.0.insert_child(parent, parent_id, table, fields).await
        }
        async fn update(&self, table: Table, id: i64, fields: Record) -> Result<(), DatabaseError> {
            self.0.update(table, id, fields).await
        }
        async fn delete(&self, table: Table, id: i64) -> Result<(), DatabaseError> {
            self.0.delete(table, id).await
        }
        async fn delete_cascade(&self, parent: Table, id: i64, children: &[Table]) -> Result<(), DatabaseError> {
            self.0.delete_cascade(parent, id, children).await
        }
        async fn ping(&self) -> Result<(), DatabaseError> {
            self.0.ping().await
        }
    }

    #[tokio::test]
    async fn child_insert_racing_contact_delete_leaves_no_orphan() {
        let store = Arc::new(DeleteParentFirst(MemoryStore::new()));
        let rules = Arc::new(RulesTable::standard(2026).unwrap());
        let service = ContactService::new(store.clone(), rules);
        let id = ron(&service).await;

        let err = service
            .create_child(id, ChildKind::Phone, &json!({"phone": "555"}))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(store.0.count(Table::Contacts).await, 0);
        assert_eq!(store.0.count(Table::Phones).await, 0, "phone row outlived its contact");
    }

    #[test]
    fn child_kinds_parse_from_path() {
        assert_eq!("address".parse::<ChildKind>().unwrap(), ChildKind::Address);
        assert_eq!("email".parse::<ChildKind>().unwrap().table(), Table::Emails);
        assert!("fax".parse::<ChildKind>().is_err());
    }
}
