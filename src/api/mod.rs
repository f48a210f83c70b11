pub mod format;

pub use format::{project_many, project_one, ContactView};
