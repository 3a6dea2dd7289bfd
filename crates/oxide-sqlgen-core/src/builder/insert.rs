//! INSERT statement builder using the typestate pattern.

use std::marker::PhantomData;

use crate::ast::Expr;
use crate::compiler::{compile, CompileContext, SqlFragment};
use crate::dialect::DialectDescriptor;
use crate::error::ClauseError;
use crate::schema::EntityContext;
use crate::statement::{Parameter, ParameterizedStatement};

use super::clause::build_insert;
use super::upsert::build_upsert;

// Typestate markers

/// Marker: No values specified yet.
pub struct NoValues;
/// Marker: At least one value has been specified.
pub struct HasValues;

/// A single-row INSERT builder over one entity.
pub struct Insert<'e, Values> {
    entity: &'e EntityContext,
    values: Vec<(String, Expr)>,
    _state: PhantomData<Values>,
}

impl<'e> Insert<'e, NoValues> {
    /// Creates a new INSERT builder.
    #[must_use]
    pub const fn new(entity: &'e EntityContext) -> Self {
        Self {
            entity,
            values: Vec::new(),
            _state: PhantomData,
        }
    }
}

impl<'e, Values> Insert<'e, Values> {
    /// Adds a value for `member`.
    #[must_use]
    pub fn value(self, member: &str, value: Expr) -> Insert<'e, HasValues> {
        let mut values = self.values;
        values.push((String::from(member), value));
        Insert {
            entity: self.entity,
            values,
            _state: PhantomData,
        }
    }
}

impl Insert<'_, HasValues> {
    fn compile_row(
        &self,
        dialect: &DialectDescriptor,
    ) -> Result<(Vec<String>, Vec<SqlFragment>, Vec<Parameter>), ClauseError> {
        let mut ctx = CompileContext::new(self.entity);
        let mut columns = Vec::with_capacity(self.values.len());
        let mut fragments = Vec::with_capacity(self.values.len());
        for (member, value) in &self.values {
            columns.push(self.entity.column(member));
            fragments.push(compile(value, dialect, &mut ctx)?);
        }
        Ok((columns, fragments, ctx.into_parameters()))
    }

    /// Builds the INSERT statement.
    ///
    /// # Errors
    ///
    /// Any translation error, or a clause error from [`build_insert`].
    pub fn build(self, dialect: &DialectDescriptor) -> Result<ParameterizedStatement, ClauseError> {
        let (columns, values, parameters) = self.compile_row(dialect)?;
        build_insert(dialect, self.entity.table(), &columns, values, parameters)
    }

    /// Builds an upsert keyed on the entity's key members.
    ///
    /// # Errors
    ///
    /// Any translation error, or a clause error from [`build_upsert`].
    pub fn build_upsert(
        self,
        dialect: &DialectDescriptor,
    ) -> Result<ParameterizedStatement, ClauseError> {
        let (columns, values, parameters) = self.compile_row(dialect)?;
        build_upsert(
            dialect,
            self.entity.table(),
            &columns,
            &self.entity.key_columns(),
            values,
            parameters,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{get, DialectKind};
    use crate::schema::SnakeCase;
    use crate::value::TypedValue;

    #[test]
    fn test_insert() {
        let entity = EntityContext::new("users").naming(SnakeCase);
        let stmt = Insert::new(&entity)
            .value("UserName", Expr::lit("alice"))
            .value("Email", Expr::null())
            .build(get(DialectKind::PostgreSql))
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            stmt.sql(),
            "INSERT INTO \"users\" (\"user_name\", \"email\") VALUES (@p0, @p1)"
        );
        assert_eq!(
            stmt.parameters().get("p0"),
            Some(&TypedValue::String(String::from("alice")))
        );
        assert_eq!(stmt.parameters().get("p1"), Some(&TypedValue::Null));
    }

    #[test]
    fn test_insert_oracle_markers() {
        let entity = EntityContext::new("users");
        let stmt = Insert::new(&entity)
            .value("id", Expr::lit(1))
            .build(get(DialectKind::Oracle))
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(stmt.sql(), "INSERT INTO \"users\" (\"id\") VALUES (:p0)");
    }

    #[test]
    fn test_upsert_uses_entity_keys() {
        let entity = EntityContext::new("users").key("id");
        let stmt = Insert::new(&entity)
            .value("id", Expr::lit(1))
            .value("name", Expr::lit("bob"))
            .build_upsert(get(DialectKind::MySql))
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(stmt.sql().ends_with("ON DUPLICATE KEY UPDATE `name` = VALUES(`name`)"));
        assert_eq!(stmt.parameters().len(), 2);
    }

    #[test]
    fn test_upsert_without_keys() {
        let entity = EntityContext::new("users");
        let result = Insert::new(&entity)
            .value("id", Expr::lit(1))
            .build_upsert(get(DialectKind::PostgreSql));
        assert_eq!(result, Err(ClauseError::MissingKeyColumns));
    }
}
