pub mod contact_service;

pub use contact_service::{ChildKind, ChildRecord, ContactService, ServiceError};
