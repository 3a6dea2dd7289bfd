//! Column naming strategies.

use convert_case::{Case, Casing};

/// Maps a declared member name to a column name.
///
/// Implementations must be pure: the same input always maps to the same
/// column name.
pub trait NamingStrategy: std::fmt::Debug + Send + Sync {
    /// Returns the column name for one member name.
    fn column_name(&self, member: &str) -> String;
}

/// Uses member names exactly as declared.
#[derive(Debug, Default, Clone, Copy)]
pub struct AsDeclared;

impl NamingStrategy for AsDeclared {
    fn column_name(&self, member: &str) -> String {
        String::from(member)
    }
}

/// Maps camelCase and PascalCase member names to snake_case.
///
/// Idempotent: a name that is already snake_case is left as is.
#[derive(Debug, Default, Clone, Copy)]
pub struct SnakeCase;

impl NamingStrategy for SnakeCase {
    fn column_name(&self, member: &str) -> String {
        member.to_case(Case::Snake)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_declared() {
        assert_eq!(AsDeclared.column_name("IsActive"), "IsActive");
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(SnakeCase.column_name("IsActive"), "is_active");
        assert_eq!(SnakeCase.column_name("createdAt"), "created_at");
        assert_eq!(SnakeCase.column_name("Name"), "name");
    }

    #[test]
    fn test_snake_case_is_idempotent() {
        for name in ["IsActive", "userId", "order_total", "Email"] {
            let once = SnakeCase.column_name(name);
            assert_eq!(SnakeCase.column_name(&once), once);
        }
    }
}
