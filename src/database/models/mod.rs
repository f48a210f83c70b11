pub mod address;
pub mod contact;
pub mod email;
pub mod phone;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::database::manager::DatabaseError;
use crate::database::store::Record;
use crate::database::table::Table;

pub use address::Address;
pub use contact::Contact;
pub use email::Email;
pub use phone::Phone;

/// A typed view over one table's rows
pub trait Entity: Serialize + DeserializeOwned + Send {
    const TABLE: Table;

    fn from_record(record: Record) -> Result<Self, DatabaseError> {
        serde_json::from_value(Value::Object(record))
            .map_err(|e| DatabaseError::Decode(format!("{} row: {}", Self::TABLE, e)))
    }

    fn from_records(records: Vec<Record>) -> Result<Vec<Self>, DatabaseError> {
        records.into_iter().map(Self::from_record).collect()
    }
}
