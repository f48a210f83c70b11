use chrono::Datelike;

use super::error::RuleParseError;
use super::rule_set::RuleSet;
use crate::database::table::Table;

/// Rule sets for every table, built once at startup and shared read-only
/// between request handlers.
#[derive(Debug, Clone)]
pub struct RulesTable {
    contact: RuleSet,
    address: RuleSet,
    phone: RuleSet,
    email: RuleSet,
}

impl RulesTable {
    /// The stock rules, with `current_year` as the upper bound for birthday years
    pub fn standard(current_year: i32) -> Result<Self, RuleParseError> {
        let max_year = format!("integer|min:1900|max:{}", current_year);

        Ok(Self {
            contact: RuleSet::parse(&[
                ("first_name", "required|max:255"),
                ("last_name", "required|max:255"),
                ("birthday_month", "integer|min:1|max:12"),
                ("birthday_day", "integer|min:1|max:31"),
                ("birthday_year", max_year.as_str()),
            ])?,
            address: RuleSet::parse(&[
                ("address_1", "required|max:255"),
                ("address_2", "max:255"),
                ("city", "required|max:255"),
                ("state", "required|max:255"),
                ("zip", "required|max:255"),
                ("country", "max:255"),
            ])?,
            phone: RuleSet::parse(&[("phone", "required|max:100")])?,
            email: RuleSet::parse(&[("email", "required|email|max:255")])?,
        })
    }

    /// Stock rules bounded by today's year (UTC)
    pub fn for_today() -> Result<Self, RuleParseError> {
        Self::standard(chrono::Utc::now().year())
    }

    pub fn get(&self, table: Table) -> &RuleSet {
        match table {
            Table::Contacts => &self.contact,
            Table::Addresses => &self.address,
            Table::Phones => &self.phone,
            Table::Emails => &self.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::types::Rule;
    use serde_json::json;

    #[test]
    fn birthday_year_is_bounded_by_current_year() {
        let rules = RulesTable::standard(2026).unwrap();
        assert_eq!(
            rules.get(Table::Contacts).rules_for("birthday_year").unwrap(),
            [Rule::Integer, Rule::Min(1900), Rule::Max(2026)]
        );

        let contact = rules.get(Table::Contacts);
        let input = json!({"first_name": "Ron", "last_name": "Swanson", "birthday_year": 2027});
        let errors = contact.validate(&contact.only(&input)).unwrap_err();
        assert_eq!(errors.get("birthday_year").unwrap(), ["The birthday year may not be greater than 2026."]);
    }

    #[test]
    fn every_table_has_rules() {
        let rules = RulesTable::for_today().unwrap();
        for table in Table::ALL {
            assert!(rules.get(table).field_names().count() > 0, "{table}");
        }
        assert_eq!(
            rules.get(Table::Addresses).field_names().collect::<Vec<_>>(),
            vec!["address_1", "address_2", "city", "state", "zip", "country"]
        );
    }

    #[test]
    fn child_whitelists_exclude_contact_id() {
        let rules = RulesTable::for_today().unwrap();
        for table in Table::CHILDREN {
            assert!(rules.get(table).rules_for("contact_id").is_none());
        }
    }

    #[test]
    fn phone_length_limit_is_100() {
        let rules = RulesTable::for_today().unwrap();
        let phone = rules.get(Table::Phones);
        let long = json!({"phone": "9".repeat(101)});
        let errors = phone.validate(&phone.only(&long)).unwrap_err();
        assert_eq!(errors.get("phone").unwrap(), ["The phone may not be greater than 100 characters."]);
    }
}
