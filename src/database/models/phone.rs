use serde::{Deserialize, Serialize};

use super::Entity;
use crate::database::table::Table;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phone {
    pub id: i64,
    pub contact_id: i64,
    pub phone: String,
}

impl Entity for Phone {
    const TABLE: Table = Table::Phones;
}
