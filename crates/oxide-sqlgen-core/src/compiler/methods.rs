//! Method-call lowering.

use super::{mismatch, SqlFragment, Translator};
use crate::ast::{Expr, Method};
use crate::error::{Result, TranslationError};
use crate::value::{TypedValue, ValueKind};

pub(super) fn translate(
    t: &mut Translator<'_, '_>,
    target: &Expr,
    method: Method,
    args: &[Expr],
) -> Result<SqlFragment> {
    match method {
        Method::Contains => match target {
            Expr::Collection(values) => membership(t, values, args),
            _ => like(t, target, method, args),
        },
        Method::StartsWith | Method::EndsWith => like(t, target, method, args),
        Method::ToUpper => string_function(t, "UPPER", method, target, args),
        Method::ToLower => string_function(t, "LOWER", method, target, args),
        Method::Trim => string_function(t, "TRIM", method, target, args),
        Method::Length => {
            let length = t.dialect.length_function;
            let inner = string_function(t, length, method, target, args)?;
            Ok(SqlFragment::value(inner.into_sql(), Some(ValueKind::Int)))
        }
        Method::Abs => {
            expect_args(method, args, 0)?;
            let inner = t.value(target)?;
            if !inner.kind().is_none_or(ValueKind::is_numeric) {
                return Err(mismatch("ABS", inner.kind(), None));
            }
            let kind = inner.kind();
            Ok(SqlFragment::value(format!("ABS({})", inner.sql()), kind))
        }
    }
}

fn expect_args(method: Method, args: &[Expr], expected: usize) -> Result<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(TranslationError::malformed(
            "method call",
            format!(
                "{} expects {expected} argument(s), found {}",
                method.name(),
                args.len()
            ),
        ))
    }
}

const fn is_text(kind: Option<ValueKind>) -> bool {
    matches!(kind, None | Some(ValueKind::String))
}

/// `collection.Contains(member)` lowers to `member IN (...)`.
///
/// An empty collection lowers to `IN (NULL)`, which matches no row and is
/// valid on every dialect, unlike `IN ()`.
fn membership(
    t: &mut Translator<'_, '_>,
    values: &[TypedValue],
    args: &[Expr],
) -> Result<SqlFragment> {
    expect_args(Method::Contains, args, 1)?;
    let member = t.value(&args[0])?;

    if values.is_empty() {
        return Ok(SqlFragment::condition(format!("{} IN (NULL)", member.sql())));
    }

    if let Some(kind) = member.kind() {
        if let Some(bad) = values.iter().find(|v| !kind.is_comparable_with(v.kind())) {
            return Err(mismatch("IN", Some(kind), Some(bad.kind())));
        }
    }

    let markers: Vec<String> = values
        .iter()
        .map(|v| {
            let name = t.ctx.bind(v.clone());
            t.dialect.parameter_marker(&name)
        })
        .collect();
    Ok(SqlFragment::condition(format!(
        "{} IN ({})",
        member.sql(),
        markers.join(", ")
    )))
}

/// String search lowered to `LIKE`.
///
/// A literal pattern is bound with its wildcards already attached; any
/// other argument is wrapped with the dialect's concatenation syntax.
fn like(
    t: &mut Translator<'_, '_>,
    target: &Expr,
    method: Method,
    args: &[Expr],
) -> Result<SqlFragment> {
    expect_args(method, args, 1)?;
    let subject = t.value(target)?;
    if !is_text(subject.kind()) {
        return Err(mismatch("LIKE", subject.kind(), Some(ValueKind::String)));
    }

    let (lead, trail) = match method {
        Method::StartsWith => ("", "%"),
        Method::EndsWith => ("%", ""),
        _ => ("%", "%"),
    };

    let pattern = match &args[0] {
        Expr::Literal(TypedValue::String(s)) => {
            let name = t.ctx.bind(TypedValue::String(format!("{lead}{s}{trail}")));
            t.dialect.parameter_marker(&name)
        }
        Expr::Literal(other) => {
            return Err(mismatch("LIKE", Some(ValueKind::String), Some(other.kind())));
        }
        arg => {
            let needle = t.value(arg)?;
            if !is_text(needle.kind()) {
                return Err(mismatch("LIKE", Some(ValueKind::String), needle.kind()));
            }
            let mut parts = Vec::with_capacity(3);
            if !lead.is_empty() {
                parts.push("'%'");
            }
            parts.push(needle.sql());
            if !trail.is_empty() {
                parts.push("'%'");
            }
            t.dialect.concat(&parts)
        }
    };

    Ok(SqlFragment::condition(format!(
        "{} LIKE {pattern}",
        subject.sql()
    )))
}

fn string_function(
    t: &mut Translator<'_, '_>,
    function: &str,
    method: Method,
    target: &Expr,
    args: &[Expr],
) -> Result<SqlFragment> {
    expect_args(method, args, 0)?;
    let inner = t.value(target)?;
    if !is_text(inner.kind()) {
        return Err(mismatch(method.name(), inner.kind(), Some(ValueKind::String)));
    }
    Ok(SqlFragment::value(
        format!("{function}({})", inner.sql()),
        Some(ValueKind::String),
    ))
}

#[cfg(test)]
mod tests {
    use crate::ast::{Expr, Method};
    use crate::compiler::{compile, compile_predicate, CompileContext};
    use crate::dialect::{get, DialectKind};
    use crate::error::TranslationError;
    use crate::schema::EntityContext;
    use crate::value::{TypedValue, ValueKind};

    fn sql_of(expr: &Expr, kind: DialectKind) -> Result<String, TranslationError> {
        let entity = EntityContext::new("users");
        let mut ctx = CompileContext::new(&entity);
        compile_predicate(expr, get(kind), &mut ctx).map(super::SqlFragment::into_sql)
    }

    #[test]
    fn test_membership() {
        let expr = Expr::member("Id").is_in(Expr::collection([1, 2, 3]));
        assert_eq!(
            sql_of(&expr, DialectKind::SqlServer).as_deref(),
            Ok("[Id] IN (@p0, @p1, @p2)")
        );
    }

    #[test]
    fn test_empty_membership_matches_nothing() {
        for kind in DialectKind::ALL {
            let expr = Expr::member("Id").is_in(Expr::collection(Vec::<i64>::new()));
            let sql = sql_of(&expr, kind).unwrap_or_else(|e| panic!("{e}"));
            assert!(sql.ends_with(" IN (NULL)"), "{sql}");
        }
    }

    #[test]
    fn test_membership_kind_mismatch() {
        let expr = Expr::typed_member("Id", ValueKind::Int).is_in(Expr::collection(["a"]));
        assert!(matches!(
            sql_of(&expr, DialectKind::SqlServer),
            Err(TranslationError::TypeMismatch { op: "IN", .. })
        ));
    }

    #[test]
    fn test_string_contains_binds_pattern() {
        let entity = EntityContext::new("users");
        let mut ctx = CompileContext::new(&entity);
        let expr = Expr::member("Name").call(Method::Contains, vec![Expr::lit("ann")]);
        let sql = compile_predicate(&expr, get(DialectKind::PostgreSql), &mut ctx)
            .map(super::SqlFragment::into_sql);
        assert_eq!(sql.as_deref(), Ok("\"Name\" LIKE @p0"));
        assert_eq!(
            ctx.parameters()[0].value,
            TypedValue::String(String::from("%ann%"))
        );
    }

    #[test]
    fn test_starts_with_member_argument_uses_concat() {
        let expr = Expr::member("Name").call(Method::StartsWith, vec![Expr::member("Prefix")]);
        assert_eq!(
            sql_of(&expr, DialectKind::MySql).as_deref(),
            Ok("`Name` LIKE CONCAT(`Prefix`, '%')")
        );
        assert_eq!(
            sql_of(&expr, DialectKind::Oracle).as_deref(),
            Ok("\"Name\" LIKE (\"Prefix\" || '%')")
        );
    }

    #[test]
    fn test_string_functions() {
        let entity = EntityContext::new("users");
        let mut ctx = CompileContext::new(&entity);
        let upper = Expr::member("Name").call(Method::ToUpper, vec![]);
        let sql = compile(&upper, get(DialectKind::Sqlite), &mut ctx)
            .map(super::SqlFragment::into_sql);
        assert_eq!(sql.as_deref(), Ok("UPPER([Name])"));

        let trimmed = Expr::member("Name")
            .call(Method::Trim, vec![])
            .call(Method::ToLower, vec![]);
        let sql = compile(&trimmed, get(DialectKind::Sqlite), &mut ctx)
            .map(super::SqlFragment::into_sql);
        assert_eq!(sql.as_deref(), Ok("LOWER(TRIM([Name]))"));
    }

    #[test]
    fn test_length_is_dialect_specific() {
        let expr = Expr::member("Name")
            .call(Method::Length, vec![])
            .gt(Expr::lit(3));
        assert_eq!(
            sql_of(&expr, DialectKind::SqlServer).as_deref(),
            Ok("LEN([Name]) > @p0")
        );
        assert_eq!(
            sql_of(&expr, DialectKind::MySql).as_deref(),
            Ok("LENGTH(`Name`) > @p0")
        );
    }

    #[test]
    fn test_abs_rejects_text() {
        let expr = Expr::typed_member("Name", ValueKind::String)
            .call(Method::Abs, vec![])
            .gt(Expr::lit(1));
        assert!(matches!(
            sql_of(&expr, DialectKind::SqlServer),
            Err(TranslationError::TypeMismatch { op: "ABS", .. })
        ));
    }

    #[test]
    fn test_unsupported_method_name() {
        let err = Expr::member("Name")
            .call_named("PadLeft", vec![])
            .expect_err("unsupported");
        assert_eq!(
            err,
            TranslationError::UnsupportedOperation(String::from("PadLeft"))
        );
    }

    #[test]
    fn test_wrong_arity_is_malformed() {
        let expr = Expr::member("Name").call(Method::Contains, vec![]);
        assert!(matches!(
            sql_of(&expr, DialectKind::SqlServer),
            Err(TranslationError::MalformedExpression { node: "method call", .. })
        ));
    }
}
