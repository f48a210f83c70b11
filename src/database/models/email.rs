use serde::{Deserialize, Serialize};

use super::Entity;
use crate::database::table::Table;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Email {
    pub id: i64,
    pub contact_id: i64,
    pub email: String,
}

impl Entity for Email {
    const TABLE: Table = Table::Emails;
}
