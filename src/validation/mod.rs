pub mod error;
pub mod rule_set;
pub mod rules_table;
pub mod types;

pub use error::{RuleParseError, ValidationErrors};
pub use rule_set::{FieldRules, RuleSet};
pub use rules_table::RulesTable;
pub use types::Rule;
