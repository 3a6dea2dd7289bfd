//! Expression AST types.

use crate::error::TranslationError;
use crate::value::{ToTypedValue, TypedValue, ValueKind};

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Comparison
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,

    // Logical
    And,
    Or,

    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOp {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
        }
    }

    /// Returns true for `=`, `<>`, `>`, `>=`, `<` and `<=`.
    #[must_use]
    pub const fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Gt | Self::Ge | Self::Lt | Self::Le
        )
    }

    /// Returns true for `AND` and `OR`.
    #[must_use]
    pub const fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical NOT
    Not,
}

/// The closed set of translatable method calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Collection membership, or substring search on a string target.
    Contains,
    StartsWith,
    EndsWith,
    ToUpper,
    ToLower,
    Trim,
    Length,
    Abs,
}

impl Method {
    /// Maps a front-end method name to a supported method.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` for any name outside the supported set.
    pub fn parse(name: &str) -> Result<Self, TranslationError> {
        match name {
            "Contains" => Ok(Self::Contains),
            "StartsWith" => Ok(Self::StartsWith),
            "EndsWith" => Ok(Self::EndsWith),
            "ToUpper" | "ToUpperInvariant" => Ok(Self::ToUpper),
            "ToLower" | "ToLowerInvariant" => Ok(Self::ToLower),
            "Trim" => Ok(Self::Trim),
            "Length" => Ok(Self::Length),
            "Abs" => Ok(Self::Abs),
            other => Err(TranslationError::UnsupportedOperation(String::from(other))),
        }
    }

    /// Returns the canonical method name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Contains => "Contains",
            Self::StartsWith => "StartsWith",
            Self::EndsWith => "EndsWith",
            Self::ToUpper => "ToUpper",
            Self::ToLower => "ToLower",
            Self::Trim => "Trim",
            Self::Length => "Length",
            Self::Abs => "Abs",
        }
    }
}

/// A member access path, e.g. `Address.City`, with its declared kind when
/// the front-end knows it.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberPath {
    pub segments: Vec<String>,
    pub kind: Option<ValueKind>,
}

/// A typed predicate, assignment or projection expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Access to a member of the owning entity.
    Member(MemberPath),
    /// A literal value; always bound as a parameter.
    Literal(TypedValue),
    /// An in-memory collection, the target of membership tests.
    Collection(Vec<TypedValue>),
    /// Binary operation.
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary operation.
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// Method call on a target.
    MethodCall {
        target: Box<Expr>,
        method: Method,
        args: Vec<Expr>,
    },
    /// `test ? if_true : if_false`
    Conditional {
        test: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
    },
}

impl Expr {
    /// Creates a member access from a dot-separated path.
    #[must_use]
    pub fn member(path: &str) -> Self {
        Self::Member(MemberPath {
            segments: path.split('.').map(String::from).collect(),
            kind: None,
        })
    }

    /// Creates a member access with a known kind.
    #[must_use]
    pub fn typed_member(path: &str, kind: ValueKind) -> Self {
        Self::Member(MemberPath {
            segments: path.split('.').map(String::from).collect(),
            kind: Some(kind),
        })
    }

    /// Creates a literal.
    #[must_use]
    pub fn lit<T: ToTypedValue>(value: T) -> Self {
        Self::Literal(value.to_typed_value())
    }

    /// Creates a NULL literal.
    #[must_use]
    pub const fn null() -> Self {
        Self::Literal(TypedValue::Null)
    }

    /// Creates a collection of literals.
    #[must_use]
    pub fn collection<T, I>(values: I) -> Self
    where
        T: ToTypedValue,
        I: IntoIterator<Item = T>,
    {
        Self::Collection(values.into_iter().map(ToTypedValue::to_typed_value).collect())
    }

    /// Creates a binary expression.
    #[must_use]
    pub fn binary(op: BinaryOp, left: Self, right: Self) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Creates a conditional expression.
    #[must_use]
    pub fn conditional(test: Self, if_true: Self, if_false: Self) -> Self {
        Self::Conditional {
            test: Box::new(test),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        }
    }

    /// Creates a method call on `self`.
    #[must_use]
    pub fn call(self, method: Method, args: Vec<Self>) -> Self {
        Self::MethodCall {
            target: Box::new(self),
            method,
            args,
        }
    }

    /// Creates a method call from a front-end method name.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` if the name is not supported.
    pub fn call_named(self, name: &str, args: Vec<Self>) -> Result<Self, TranslationError> {
        Ok(self.call(Method::parse(name)?, args))
    }

    /// `self = other`
    #[must_use]
    pub fn eq(self, other: Self) -> Self {
        Self::binary(BinaryOp::Eq, self, other)
    }

    /// `self <> other`
    #[must_use]
    pub fn ne(self, other: Self) -> Self {
        Self::binary(BinaryOp::Ne, self, other)
    }

    /// `self > other`
    #[must_use]
    pub fn gt(self, other: Self) -> Self {
        Self::binary(BinaryOp::Gt, self, other)
    }

    /// `self >= other`
    #[must_use]
    pub fn ge(self, other: Self) -> Self {
        Self::binary(BinaryOp::Ge, self, other)
    }

    /// `self < other`
    #[must_use]
    pub fn lt(self, other: Self) -> Self {
        Self::binary(BinaryOp::Lt, self, other)
    }

    /// `self <= other`
    #[must_use]
    pub fn le(self, other: Self) -> Self {
        Self::binary(BinaryOp::Le, self, other)
    }

    /// `self AND other`
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::binary(BinaryOp::And, self, other)
    }

    /// `self OR other`
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::binary(BinaryOp::Or, self, other)
    }

    /// `collection.Contains(self)`
    #[must_use]
    pub fn is_in(self, collection: Self) -> Self {
        collection.call(Method::Contains, vec![self])
    }

    /// Returns the node kind name used in diagnostics.
    #[must_use]
    pub const fn node_name(&self) -> &'static str {
        match self {
            Self::Member(_) => "member",
            Self::Literal(_) => "literal",
            Self::Collection(_) => "collection",
            Self::Binary { .. } => "binary",
            Self::Unary { .. } => "unary",
            Self::MethodCall { .. } => "method call",
            Self::Conditional { .. } => "conditional",
        }
    }
}

impl std::ops::Not for Expr {
    type Output = Self;

    fn not(self) -> Self {
        Self::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self),
        }
    }
}

macro_rules! impl_arith_op {
    ($trait:ident, $method:ident, $op:ident) => {
        impl std::ops::$trait for Expr {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self {
                Self::binary(BinaryOp::$op, self, rhs)
            }
        }
    };
}

impl_arith_op!(Add, add, Add);
impl_arith_op!(Sub, sub, Subtract);
impl_arith_op!(Mul, mul, Multiply);
impl_arith_op!(Div, div, Divide);
impl_arith_op!(Rem, rem, Modulo);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse() {
        assert_eq!(Method::parse("ToUpper"), Ok(Method::ToUpper));
        assert_eq!(Method::parse("ToLowerInvariant"), Ok(Method::ToLower));
        assert_eq!(
            Method::parse("Reverse"),
            Err(TranslationError::UnsupportedOperation(String::from("Reverse")))
        );
    }

    #[test]
    fn test_member_path_split() {
        let Expr::Member(path) = Expr::member("Address.City") else {
            panic!("expected member");
        };
        assert_eq!(path.segments, vec!["Address", "City"]);
        assert_eq!(path.kind, None);
    }

    #[test]
    fn test_operator_overloads_build_nodes() {
        let expr = !(Expr::member("Age") + Expr::lit(1));
        assert!(matches!(
            expr,
            Expr::Unary {
                op: UnaryOp::Not,
                ..
            }
        ));
    }

    #[test]
    fn test_is_in_targets_collection() {
        let expr = Expr::member("Id").is_in(Expr::collection([1, 2]));
        let Expr::MethodCall { target, method, args } = expr else {
            panic!("expected method call");
        };
        assert_eq!(method, Method::Contains);
        assert!(matches!(*target, Expr::Collection(ref v) if v.len() == 2));
        assert_eq!(args.len(), 1);
    }
}
