//! UPDATE statement builder using the typestate pattern.

use std::marker::PhantomData;

use crate::ast::Expr;
use crate::compiler::{compile, compile_filters, CompileContext};
use crate::dialect::DialectDescriptor;
use crate::error::ClauseError;
use crate::schema::EntityContext;
use crate::statement::ParameterizedStatement;

use super::clause::{build_update, Assignment};

// Typestate markers

/// Marker: No SET clause specified yet.
pub struct NoSet;
/// Marker: SET clause has been specified.
pub struct HasSet;

/// An UPDATE builder over one entity.
///
/// `build()` is only available once at least one assignment was added.
pub struct Update<'e, Set> {
    entity: &'e EntityContext,
    assignments: Vec<(String, Expr)>,
    filters: Vec<Expr>,
    _state: PhantomData<Set>,
}

impl<'e> Update<'e, NoSet> {
    /// Creates a new UPDATE builder.
    #[must_use]
    pub const fn new(entity: &'e EntityContext) -> Self {
        Self {
            entity,
            assignments: Vec::new(),
            filters: Vec::new(),
            _state: PhantomData,
        }
    }
}

impl<'e, Set> Update<'e, Set> {
    /// Adds a SET assignment of `value` to `member`.
    #[must_use]
    pub fn set(self, member: &str, value: Expr) -> Update<'e, HasSet> {
        let mut assignments = self.assignments;
        assignments.push((String::from(member), value));
        Update {
            entity: self.entity,
            assignments,
            filters: self.filters,
            _state: PhantomData,
        }
    }

    /// Adds a filter; repeated filters are joined with `AND`.
    #[must_use]
    pub fn filter(mut self, predicate: Expr) -> Self {
        self.filters.push(predicate);
        self
    }
}

impl Update<'_, HasSet> {
    /// Compiles assignments and filters and builds the statement.
    ///
    /// # Errors
    ///
    /// Any translation error, or a clause error from [`build_update`].
    pub fn build(self, dialect: &DialectDescriptor) -> Result<ParameterizedStatement, ClauseError> {
        let mut ctx = CompileContext::new(self.entity);

        let assignments = self
            .assignments
            .iter()
            .map(|(member, value)| {
                compile(value, dialect, &mut ctx).map(|fragment| Assignment {
                    column: self.entity.column(member),
                    value: fragment,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let predicate = compile_filters(&self.filters, dialect, &mut ctx)?;
        build_update(
            dialect,
            self.entity.table(),
            assignments,
            predicate,
            ctx.into_parameters(),
        )
    }
}
