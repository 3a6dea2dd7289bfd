//! DELETE statement builder.

use crate::ast::Expr;
use crate::compiler::{compile_filters, CompileContext};
use crate::dialect::DialectDescriptor;
use crate::error::ClauseError;
use crate::schema::EntityContext;
use crate::statement::ParameterizedStatement;

use super::clause::build_delete;

/// A DELETE builder over one entity.
pub struct Delete<'e> {
    entity: &'e EntityContext,
    filters: Vec<Expr>,
}

impl<'e> Delete<'e> {
    /// Creates a new DELETE builder.
    #[must_use]
    pub const fn new(entity: &'e EntityContext) -> Self {
        Self {
            entity,
            filters: Vec::new(),
        }
    }

    /// Adds a filter; repeated filters are joined with `AND`.
    ///
    /// **Important**: DELETE without a filter deletes all rows!
    #[must_use]
    pub fn filter(mut self, predicate: Expr) -> Self {
        self.filters.push(predicate);
        self
    }

    /// Returns true if a filter is specified.
    #[must_use]
    pub fn has_filter(&self) -> bool {
        !self.filters.is_empty()
    }

    /// Compiles the filters and builds the statement.
    ///
    /// # Errors
    ///
    /// Any translation error, or a clause error from [`build_delete`].
    pub fn build(self, dialect: &DialectDescriptor) -> Result<ParameterizedStatement, ClauseError> {
        let mut ctx = CompileContext::new(self.entity);
        let predicate = compile_filters(&self.filters, dialect, &mut ctx)?;
        build_delete(dialect, self.entity.table(), predicate, ctx.into_parameters())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{get, DialectKind};

    #[test]
    fn test_delete_with_where() {
        let entity = EntityContext::new("sessions");
        let stmt = Delete::new(&entity)
            .filter(Expr::member("ExpiresAt").lt(Expr::lit("2024-01-01")))
            .build(get(DialectKind::Oracle))
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            stmt.sql(),
            "DELETE FROM \"sessions\" WHERE \"ExpiresAt\" < :p0"
        );
    }

    #[test]
    fn test_delete_all_rows() {
        let entity = EntityContext::new("sessions");
        let delete = Delete::new(&entity);
        assert!(!delete.has_filter());
        let stmt = delete
            .build(get(DialectKind::Sqlite))
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(stmt.sql(), "DELETE FROM [sessions]");
    }

    #[test]
    fn test_membership_delete() {
        let entity = EntityContext::new("sessions");
        let stmt = Delete::new(&entity)
            .filter(Expr::member("Id").is_in(Expr::collection(Vec::<i64>::new())))
            .build(get(DialectKind::Sqlite))
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(stmt.sql(), "DELETE FROM [sessions] WHERE [Id] IN (NULL)");
    }
}
