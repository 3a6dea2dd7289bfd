//! SELECT statement builder.

use crate::ast::Expr;
use crate::compiler::{compile, compile_filters, CompileContext};
use crate::dialect::DialectDescriptor;
use crate::error::ClauseError;
use crate::schema::EntityContext;
use crate::statement::ParameterizedStatement;

use super::clause::{
    build_select, OrderDirection, OrderTerm, Projection, ProjectionItem, SelectClauses,
};

/// A SELECT builder over one entity.
///
/// Consumed by [`Select::build`]; filters added with [`Select::filter`] are
/// joined with `AND`.
#[derive(Debug, Clone)]
pub struct Select<'e> {
    entity: &'e EntityContext,
    distinct: bool,
    count: bool,
    projection: Vec<(Expr, Option<String>)>,
    filters: Vec<Expr>,
    order_by: Vec<(Expr, OrderDirection)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl<'e> Select<'e> {
    /// Creates a `SELECT *` over the entity's table.
    #[must_use]
    pub const fn new(entity: &'e EntityContext) -> Self {
        Self {
            entity,
            distinct: false,
            count: false,
            projection: Vec::new(),
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Selects the given members.
    #[must_use]
    pub fn columns(mut self, members: &[&str]) -> Self {
        self.projection
            .extend(members.iter().map(|m| (Expr::member(m), None)));
        self
    }

    /// Adds a projected expression with an optional alias.
    #[must_use]
    pub fn project(mut self, expr: Expr, alias: Option<&str>) -> Self {
        self.projection.push((expr, alias.map(String::from)));
        self
    }

    /// Selects `COUNT(*)` instead of columns.
    #[must_use]
    pub const fn count(mut self) -> Self {
        self.count = true;
        self
    }

    /// Sets DISTINCT.
    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Adds a filter; repeated filters are joined with `AND`.
    #[must_use]
    pub fn filter(mut self, predicate: Expr) -> Self {
        self.filters.push(predicate);
        self
    }

    /// Adds an ascending ORDER BY term.
    #[must_use]
    pub fn order_by(mut self, expr: Expr) -> Self {
        self.order_by.push((expr, OrderDirection::Asc));
        self
    }

    /// Adds a descending ORDER BY term.
    #[must_use]
    pub fn order_by_desc(mut self, expr: Expr) -> Self {
        self.order_by.push((expr, OrderDirection::Desc));
        self
    }

    /// Adds a LIMIT clause.
    #[must_use]
    pub const fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Adds an OFFSET clause.
    #[must_use]
    pub const fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Compiles every clause and builds the statement.
    ///
    /// # Errors
    ///
    /// Any translation error of the projected, filtered or ordered
    /// expressions, or a clause error from [`build_select`].
    pub fn build(self, dialect: &DialectDescriptor) -> Result<ParameterizedStatement, ClauseError> {
        let mut ctx = CompileContext::new(self.entity);

        let projection = if self.count {
            Projection::Count
        } else {
            let items = self
                .projection
                .iter()
                .map(|(expr, alias)| {
                    compile(expr, dialect, &mut ctx).map(|fragment| ProjectionItem {
                        sql: fragment.into_sql(),
                        alias: alias.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Projection::Items(items)
        };

        let predicate = compile_filters(&self.filters, dialect, &mut ctx)?;

        let order_by = self
            .order_by
            .iter()
            .map(|(expr, direction)| {
                compile(expr, dialect, &mut ctx).map(|fragment| OrderTerm {
                    sql: fragment.into_sql(),
                    direction: *direction,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let clauses = SelectClauses {
            table: String::from(self.entity.table()),
            distinct: self.distinct,
            projection,
            predicate,
            order_by,
            limit: self.limit,
            offset: self.offset,
        };
        build_select(dialect, clauses, ctx.into_parameters())
    }
}
