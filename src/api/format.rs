use serde::{Deserialize, Serialize};

use crate::database::models::Contact;

/// Public view of a contact: identity and name only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactView {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

pub fn project_one(contact: &Contact) -> ContactView {
    ContactView {
        id: contact.id,
        first_name: contact.first_name.clone(),
        last_name: contact.last_name.clone(),
    }
}

/// Element-wise `project_one`, order preserved
pub fn project_many(contacts: &[Contact]) -> Vec<ContactView> {
    contacts.iter().map(project_one).collect()
}
