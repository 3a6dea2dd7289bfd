//! Entity metadata handed in by the caller.
//!
//! The compiler never discovers table or column metadata itself. An
//! [`EntityContext`] carries the table name, the naming strategy and any
//! explicit column overrides for one compiled unit.

mod naming;

use std::collections::HashMap;
use std::sync::Arc;

pub use naming::{AsDeclared, NamingStrategy, SnakeCase};

/// Table context for one entity.
#[derive(Debug, Clone)]
pub struct EntityContext {
    table: String,
    naming: Arc<dyn NamingStrategy>,
    overrides: HashMap<String, String>,
    key_members: Vec<String>,
}

impl EntityContext {
    /// Creates a context for `table` that uses member names as declared.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            naming: Arc::new(AsDeclared),
            overrides: HashMap::new(),
            key_members: Vec::new(),
        }
    }

    /// Sets the naming strategy.
    #[must_use]
    pub fn naming(mut self, strategy: impl NamingStrategy + 'static) -> Self {
        self.naming = Arc::new(strategy);
        self
    }

    /// Maps a member path (dot-separated) to an explicit column name.
    #[must_use]
    pub fn column_override(mut self, member: impl Into<String>, column: impl Into<String>) -> Self {
        self.overrides.insert(member.into(), column.into());
        self
    }

    /// Declares a key member.
    #[must_use]
    pub fn key(mut self, member: impl Into<String>) -> Self {
        self.key_members.push(member.into());
        self
    }

    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Resolves the column name of a member path.
    ///
    /// An explicit override wins; otherwise each segment goes through the
    /// naming strategy and nested segments are joined with `_`.
    #[must_use]
    pub fn column_for(&self, segments: &[String]) -> String {
        let joined = segments.join(".");
        if let Some(column) = self.overrides.get(&joined) {
            return column.clone();
        }
        segments
            .iter()
            .map(|segment| self.naming.column_name(segment))
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Resolves the column name of a single member.
    #[must_use]
    pub fn column(&self, member: &str) -> String {
        self.column_for(&[String::from(member)])
    }

    /// Returns the resolved key column names.
    #[must_use]
    pub fn key_columns(&self) -> Vec<String> {
        self.key_members.iter().map(|m| self.column(m)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins_over_strategy() {
        let entity = EntityContext::new("users")
            .naming(SnakeCase)
            .column_override("EmailAddress", "mail");
        assert_eq!(entity.column("EmailAddress"), "mail");
        assert_eq!(entity.column("FirstName"), "first_name");
    }

    #[test]
    fn test_nested_member_path() {
        let entity = EntityContext::new("users").naming(SnakeCase);
        let path = vec![String::from("HomeAddress"), String::from("City")];
        assert_eq!(entity.column_for(&path), "home_address_city");
    }

    #[test]
    fn test_key_columns_are_resolved() {
        let entity = EntityContext::new("users").naming(SnakeCase).key("UserId");
        assert_eq!(entity.key_columns(), vec![String::from("user_id")]);
    }
}
