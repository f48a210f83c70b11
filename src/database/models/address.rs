use serde::{Deserialize, Serialize};

use super::Entity;
use crate::database::table::Table;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: i64,
    pub contact_id: i64,
    pub address_1: String,
    pub address_2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: Option<String>,
}

impl Entity for Address {
    const TABLE: Table = Table::Addresses;
}
