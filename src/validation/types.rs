use validator::ValidateEmail;

use super::error::RuleParseError;

/// One constraint check. `Min`/`Max` bound the numeric value on fields that also
/// carry `Integer`, and the character count everywhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Required,
    Integer,
    Email,
    Min(i64),
    Max(i64),
}

impl Rule {
    /// Parse a single `name[:arg]` token, e.g. `max:255`
    pub fn parse(field: &str, token: &str) -> Result<Self, RuleParseError> {
        let (name, arg) = match token.split_once(':') {
            Some((name, arg)) => (name.trim(), Some(arg.trim())),
            None => (token.trim(), None),
        };

        let bound = || {
            arg.and_then(|a| a.parse::<i64>().ok()).ok_or_else(|| RuleParseError::InvalidArgument {
                field: field.to_string(),
                rule: token.to_string(),
            })
        };

        match name {
            "required" => Ok(Rule::Required),
            "integer" => Ok(Rule::Integer),
            "email" => Ok(Rule::Email),
            "min" => Ok(Rule::Min(bound()?)),
            "max" => Ok(Rule::Max(bound()?)),
            _ => Err(RuleParseError::UnknownRule {
                field: field.to_string(),
                rule: token.to_string(),
            }),
        }
    }

    /// Parse a pipe-separated rule string, e.g. `integer|min:1|max:12`
    pub fn parse_list(field: &str, rules: &str) -> Result<Vec<Self>, RuleParseError> {
        rules.split('|')
            .filter(|t| !t.trim().is_empty())
            .map(|t| Rule::parse(field, t))
            .collect()
    }
}

/// Email syntax as checked by the `email` rule
pub fn is_valid_email(value: &str) -> bool {
    value.validate_email()
}
