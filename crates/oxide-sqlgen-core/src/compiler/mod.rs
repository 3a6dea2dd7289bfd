//! Expression-to-SQL compiler.
//!
//! Walks an [`Expr`] tree and emits a dialect-correct SQL fragment. Literals
//! are never inlined: each one becomes a named parameter (`p0`, `p1`, ...)
//! recorded in the [`CompileContext`], which is what keeps user data out of
//! the SQL text.
//!
//! Nodes are compiled in one of two positions. In *value* position a
//! condition is turned into `CASE WHEN .. THEN 1 ELSE 0 END`; in *condition*
//! position (WHERE, `AND`/`OR`/`NOT` operands, `CASE WHEN` tests) a boolean
//! value is compared against `1`.

mod methods;

use tracing::trace;

use crate::ast::{BinaryOp, Expr, MemberPath, UnaryOp};
use crate::dialect::{DialectDescriptor, DialectKind};
use crate::error::{Result, TranslationError};
use crate::schema::EntityContext;
use crate::statement::Parameter;
use crate::value::{TypedValue, ValueKind};

/// Parameter state for one statement under construction.
///
/// Parameter names are allocated from a counter that only grows, so several
/// fragments compiled with the same context never clash.
#[derive(Debug)]
pub struct CompileContext<'e> {
    entity: &'e EntityContext,
    parameters: Vec<Parameter>,
    next: u32,
}

impl<'e> CompileContext<'e> {
    /// Creates an empty context for `entity`.
    #[must_use]
    pub const fn new(entity: &'e EntityContext) -> Self {
        Self {
            entity,
            parameters: Vec::new(),
            next: 0,
        }
    }

    /// Returns the entity context.
    #[must_use]
    pub const fn entity(&self) -> &'e EntityContext {
        self.entity
    }

    /// Binds a value to a fresh parameter and returns its name.
    pub fn bind(&mut self, value: TypedValue) -> String {
        let position = self.next;
        let name = format!("p{position}");
        self.next += 1;
        self.parameters.push(Parameter {
            name: name.clone(),
            value,
            position,
        });
        name
    }

    /// Returns the parameters bound so far.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Consumes the context and returns its parameters.
    #[must_use]
    pub fn into_parameters(self) -> Vec<Parameter> {
        self.parameters
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Value,
    Condition,
}

/// A compiled SQL fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFragment {
    sql: String,
    kind: Option<ValueKind>,
    shape: Shape,
}

impl SqlFragment {
    /// Creates a value fragment.
    #[must_use]
    pub fn value(sql: impl Into<String>, kind: Option<ValueKind>) -> Self {
        Self {
            sql: sql.into(),
            kind,
            shape: Shape::Value,
        }
    }

    /// Creates a boolean condition fragment.
    #[must_use]
    pub fn condition(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            kind: Some(ValueKind::Bool),
            shape: Shape::Condition,
        }
    }

    /// Returns the SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the static result kind, when known.
    #[must_use]
    pub const fn kind(&self) -> Option<ValueKind> {
        self.kind
    }

    /// Returns true if the fragment is a boolean condition.
    #[must_use]
    pub fn is_condition(&self) -> bool {
        self.shape == Shape::Condition
    }

    /// Consumes the fragment and returns its SQL text.
    #[must_use]
    pub fn into_sql(self) -> String {
        self.sql
    }
}

/// Compiles `node` in value position (projections, assignments).
///
/// # Errors
///
/// Returns a `TranslationError` for malformed trees, unsupported methods and
/// operand kinds that cannot be combined.
pub fn compile(
    node: &Expr,
    dialect: &DialectDescriptor,
    ctx: &mut CompileContext<'_>,
) -> Result<SqlFragment> {
    Translator { dialect, ctx }.value(node)
}

/// Compiles `node` in condition position (WHERE).
///
/// # Errors
///
/// Same as [`compile`]; additionally a non-boolean value used as a
/// condition is a type mismatch.
pub fn compile_predicate(
    node: &Expr,
    dialect: &DialectDescriptor,
    ctx: &mut CompileContext<'_>,
) -> Result<SqlFragment> {
    Translator { dialect, ctx }.condition(node)
}

/// Compiles chained filters joined with `AND`.
///
/// No filters yields `None`, which the clause builder renders as no WHERE
/// clause at all.
///
/// # Errors
///
/// Same as [`compile_predicate`].
pub fn compile_filters(
    filters: &[Expr],
    dialect: &DialectDescriptor,
    ctx: &mut CompileContext<'_>,
) -> Result<Option<SqlFragment>> {
    filters
        .iter()
        .cloned()
        .reduce(Expr::and)
        .map(|combined| compile_predicate(&combined, dialect, ctx))
        .transpose()
}

struct Translator<'t, 'e> {
    dialect: &'t DialectDescriptor,
    ctx: &'t mut CompileContext<'e>,
}

impl Translator<'_, '_> {
    fn value(&mut self, node: &Expr) -> Result<SqlFragment> {
        let fragment = self.node(node)?;
        if fragment.is_condition() {
            return Ok(SqlFragment::value(
                format!("CASE WHEN {} THEN 1 ELSE 0 END", fragment.sql),
                Some(ValueKind::Bool),
            ));
        }
        Ok(fragment)
    }

    fn condition(&mut self, node: &Expr) -> Result<SqlFragment> {
        if let Expr::Literal(TypedValue::Bool(b)) = node {
            return Ok(SqlFragment::condition(if *b { "1 = 1" } else { "1 = 0" }));
        }
        let fragment = self.node(node)?;
        if fragment.is_condition() {
            return Ok(fragment);
        }
        match fragment.kind {
            None | Some(ValueKind::Bool) => {
                Ok(SqlFragment::condition(format!("{} = 1", fragment.sql)))
            }
            Some(kind) => Err(TranslationError::TypeMismatch {
                op: "condition",
                left: kind,
                right: ValueKind::Bool,
            }),
        }
    }

    fn node(&mut self, node: &Expr) -> Result<SqlFragment> {
        trace!(node = node.node_name(), "compiling expression");
        match node {
            Expr::Member(path) => self.member(path),
            Expr::Literal(value) => Ok(self.literal(value.clone())),
            Expr::Collection(_) => Err(TranslationError::malformed(
                "collection",
                "a collection is only valid as the target of Contains",
            )),
            Expr::Binary { op, left, right } => {
                if op.is_comparison() {
                    self.comparison(*op, left, right)
                } else if op.is_logical() {
                    self.logical(*op, left, right)
                } else {
                    self.arithmetic(*op, left, right)
                }
            }
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
            } => {
                let inner = self.condition(operand)?;
                Ok(SqlFragment::condition(format!("NOT ({})", inner.sql)))
            }
            Expr::MethodCall {
                target,
                method,
                args,
            } => methods::translate(self, target, *method, args),
            Expr::Conditional {
                test,
                if_true,
                if_false,
            } => self.conditional(test, if_true, if_false),
        }
    }

    fn member(&self, path: &MemberPath) -> Result<SqlFragment> {
        if path.segments.is_empty() || path.segments.iter().any(String::is_empty) {
            return Err(TranslationError::malformed(
                "member",
                "member path has an empty segment",
            ));
        }
        let column = self.ctx.entity().column_for(&path.segments);
        Ok(SqlFragment::value(
            self.dialect.quote_identifier(&column),
            path.kind,
        ))
    }

    fn literal(&mut self, value: TypedValue) -> SqlFragment {
        let kind = value.kind();
        let name = self.ctx.bind(value);
        SqlFragment::value(self.dialect.parameter_marker(&name), Some(kind))
    }

    fn comparison(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<SqlFragment> {
        match (left, right) {
            (operand, Expr::Literal(TypedValue::Null)) | (Expr::Literal(TypedValue::Null), operand) => {
                self.null_check(op, operand)
            }
            (operand, Expr::Literal(TypedValue::Bool(b)))
            | (Expr::Literal(TypedValue::Bool(b)), operand)
                if matches!(op, BinaryOp::Eq | BinaryOp::Ne) =>
            {
                self.bool_comparison(op, operand, *b)
            }
            _ => {
                let l = self.value(left)?;
                let r = self.value(right)?;
                check_comparable(op.as_str(), l.kind, r.kind)?;
                Ok(SqlFragment::condition(format!(
                    "{} {} {}",
                    l.sql,
                    op.as_str(),
                    r.sql
                )))
            }
        }
    }

    fn null_check(&mut self, op: BinaryOp, operand: &Expr) -> Result<SqlFragment> {
        let fragment = self.value(operand)?;
        match op {
            BinaryOp::Eq => Ok(SqlFragment::condition(format!("{} IS NULL", fragment.sql))),
            BinaryOp::Ne => Ok(SqlFragment::condition(format!(
                "{} IS NOT NULL",
                fragment.sql
            ))),
            _ => Err(TranslationError::TypeMismatch {
                op: op.as_str(),
                left: fragment.kind.unwrap_or(ValueKind::Null),
                right: ValueKind::Null,
            }),
        }
    }

    /// Booleans compare numerically (`= 1` / `= 0`) on every dialect.
    fn bool_comparison(&mut self, op: BinaryOp, operand: &Expr, b: bool) -> Result<SqlFragment> {
        let fragment = self.node(operand)?;
        if fragment.is_condition() {
            return Ok(if (op == BinaryOp::Eq) == b {
                fragment
            } else {
                SqlFragment::condition(format!("NOT ({})", fragment.sql))
            });
        }
        check_comparable(op.as_str(), fragment.kind, Some(ValueKind::Bool))?;
        Ok(SqlFragment::condition(format!(
            "{} {} {}",
            fragment.sql,
            op.as_str(),
            u8::from(b)
        )))
    }

    fn logical(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<SqlFragment> {
        let l = self.condition(left)?;
        let r = self.condition(right)?;
        Ok(SqlFragment::condition(format!(
            "({} {} {})",
            l.sql,
            op.as_str(),
            r.sql
        )))
    }

    fn arithmetic(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<SqlFragment> {
        let l = self.value(left)?;
        let r = self.value(right)?;
        let is_text = |kind: Option<ValueKind>| kind == Some(ValueKind::String);

        if op == BinaryOp::Add && (is_text(l.kind) || is_text(r.kind)) {
            if !matches!(l.kind, None | Some(ValueKind::String))
                || !matches!(r.kind, None | Some(ValueKind::String))
            {
                return Err(mismatch(op.as_str(), l.kind, r.kind));
            }
            return Ok(SqlFragment::value(
                self.dialect.concat(&[l.sql.as_str(), r.sql.as_str()]),
                Some(ValueKind::String),
            ));
        }

        let numeric = |kind: Option<ValueKind>| kind.is_none_or(ValueKind::is_numeric);
        if !numeric(l.kind) || !numeric(r.kind) {
            return Err(mismatch(op.as_str(), l.kind, r.kind));
        }
        let kind = match (l.kind, r.kind) {
            (Some(a), Some(b)) => Some(a.widen(b)),
            (known, None) | (None, known) => known,
        };
        let sql = if op == BinaryOp::Modulo && self.dialect.kind == DialectKind::Oracle {
            format!("MOD({}, {})", l.sql, r.sql)
        } else {
            format!("({} {} {})", l.sql, op.as_str(), r.sql)
        };
        Ok(SqlFragment::value(sql, kind))
    }

    fn conditional(&mut self, test: &Expr, if_true: &Expr, if_false: &Expr) -> Result<SqlFragment> {
        let t = self.condition(test)?;
        let a = self.value(if_true)?;
        let b = self.value(if_false)?;
        check_comparable("CASE", a.kind, b.kind)?;
        let kind = match (a.kind, b.kind) {
            (Some(ValueKind::Null) | None, other) => other,
            (known, _) => known,
        };
        Ok(SqlFragment::value(
            format!("CASE WHEN {} THEN {} ELSE {} END", t.sql, a.sql, b.sql),
            kind,
        ))
    }
}

fn mismatch(op: &'static str, left: Option<ValueKind>, right: Option<ValueKind>) -> TranslationError {
    TranslationError::TypeMismatch {
        op,
        left: left.unwrap_or(ValueKind::Null),
        right: right.unwrap_or(ValueKind::Null),
    }
}

/// Unknown kinds are accepted; known kinds must be comparable.
fn check_comparable(
    op: &'static str,
    left: Option<ValueKind>,
    right: Option<ValueKind>,
) -> Result<()> {
    match (left, right) {
        (Some(l), Some(r)) if !l.is_comparable_with(r) => Err(mismatch(op, left, right)),
        _ => Ok(()),
    }
}
