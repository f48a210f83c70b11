use serde_json::Value;

use super::error::{RuleParseError, ValidationErrors};
use super::types::{is_valid_email, Rule};
use crate::database::store::Record;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRules {
    pub field: String,
    pub rules: Vec<Rule>,
}

impl FieldRules {
    fn is_integer(&self) -> bool {
        self.rules.contains(&Rule::Integer)
    }

    fn is_required(&self) -> bool {
        self.rules.contains(&Rule::Required)
    }

    /// Human form of the field name used in messages
    fn label(&self) -> String {
        self.field.replace('_', " ")
    }
}

/// Ordered per-field constraints for one entity. The field list doubles as the
/// write whitelist: anything not named here is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    fields: Vec<FieldRules>,
}

impl RuleSet {
    /// Build from `(field, "rule|rule:arg")` pairs
    pub fn parse(table: &[(&str, &str)]) -> Result<Self, RuleParseError> {
        let fields = table
            .iter()
            .map(|(field, rules)| {
                Ok::<_, RuleParseError>(FieldRules {
                    field: field.to_string(),
                    rules: Rule::parse_list(field, rules)?,
                })
            })
            .collect::<Result<Vec<_>, RuleParseError>>()?;
        Ok(Self { fields })
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.field.as_str())
    }

    pub fn rules_for(&self, field: &str) -> Option<&[Rule]> {
        self.fields.iter().find(|f| f.field == field).map(|f| f.rules.as_slice())
    }

    /// Whitelisted subset of a request body. Non-object bodies yield an empty record.
    pub fn only(&self, payload: &Value) -> Record {
        let mut record = Record::new();
        if let Value::Object(map) = payload {
            for name in self.field_names() {
                if let Some(value) = map.get(name) {
                    record.insert(name.to_string(), value.clone());
                }
            }
        }
        record
    }

    /// Check every field and return the normalized write set: integers as JSON
    /// numbers, strings untouched, absent or blank fields omitted.
    pub fn validate(&self, input: &Record) -> Result<Record, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut output = Record::new();

        for field in &self.fields {
            let value = match input.get(&field.field) {
                Some(v) if is_present(v) => v,
                _ => {
                    if field.is_required() {
                        errors.add(&field.field, format!("The {} field is required.", field.label()));
                    }
                    continue;
                }
            };

            if let Some(normalized) = check_field(field, value, &mut errors) {
                output.insert(field.field.clone(), normalized);
            }
        }

        if errors.is_empty() {
            Ok(output)
        } else {
            Err(errors)
        }
    }
}

/// Null, blank strings and empty arrays count as "not supplied"
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(a) => !a.is_empty(),
        _ => true,
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn check_field(field: &FieldRules, value: &Value, errors: &mut ValidationErrors) -> Option<Value> {
    let label = field.label();
    let before = field_error_count(errors, &field.field);

    if field.is_integer() {
        let Some(n) = as_integer(value) else {
            errors.add(&field.field, format!("The {} must be an integer.", label));
            return None;
        };
        for rule in &field.rules {
            match rule {
                Rule::Min(min) if n < *min => {
                    errors.add(&field.field, format!("The {} must be at least {}.", label, min))
                }
                Rule::Max(max) if n > *max => {
                    errors.add(&field.field, format!("The {} may not be greater than {}.", label, max))
                }
                _ => {}
            }
        }
        return (field_error_count(errors, &field.field) == before).then(|| Value::from(n));
    }

    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => {
            errors.add(&field.field, format!("The {} must be a string.", label));
            return None;
        }
    };
    let length = text.chars().count() as i64;

    for rule in &field.rules {
        match rule {
            Rule::Min(min) if length < *min => errors.add(
                &field.field,
                format!("The {} must be at least {} characters.", label, min),
            ),
            Rule::Max(max) if length > *max => errors.add(
                &field.field,
                format!("The {} may not be greater than {} characters.", label, max),
            ),
            Rule::Email if !is_valid_email(&text) => {
                errors.add(&field.field, format!("The {} must be a valid email address.", label))
            }
            _ => {}
        }
    }

    (field_error_count(errors, &field.field) == before).then(|| Value::String(text))
}

fn field_error_count(errors: &ValidationErrors, field: &str) -> usize {
    errors.get(field).map(<[String]>::len).unwrap_or(0)
}
