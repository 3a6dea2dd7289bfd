//! Typed scalar values and parameter handling.
//!
//! Every literal that reaches the compiler or the template engine becomes a
//! [`TypedValue`]. Values are bound out-of-band as parameters; the inline
//! representation exists only for [`crate::ParameterizedStatement::render`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A scalar SQL value bound as a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Exact decimal value.
    Decimal(Decimal),
    /// Text value.
    String(String),
    /// Timestamp without time zone.
    DateTime(NaiveDateTime),
    /// UUID value.
    Guid(Uuid),
    /// Binary blob value.
    Bytes(Vec<u8>),
}

/// The static kind of a [`TypedValue`] or of a compiled expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    Decimal,
    String,
    DateTime,
    Guid,
    Bytes,
}

impl ValueKind {
    /// Returns true for `Int`, `Float` and `Decimal`.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float | Self::Decimal)
    }

    /// Returns whether two kinds may appear on both sides of a comparison.
    ///
    /// `Null` is compatible with everything, numeric kinds are mutually
    /// compatible and booleans compare against integers because they are
    /// stored as `1`/`0`.
    #[must_use]
    pub const fn is_comparable_with(self, other: Self) -> bool {
        match (self, other) {
            (Self::Null, _) | (_, Self::Null) => true,
            (Self::Bool, Self::Int) | (Self::Int, Self::Bool) => true,
            (a, b) if a.is_numeric() && b.is_numeric() => true,
            (a, b) => a as u8 == b as u8,
        }
    }

    /// Returns the wider of two numeric kinds.
    #[must_use]
    pub const fn widen(self, other: Self) -> Self {
        match (self, other) {
            (Self::Float, _) | (_, Self::Float) => Self::Float,
            (Self::Decimal, _) | (_, Self::Decimal) => Self::Decimal,
            _ => Self::Int,
        }
    }

    /// Returns a lowercase name used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::String => "string",
            Self::DateTime => "datetime",
            Self::Guid => "guid",
            Self::Bytes => "bytes",
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TypedValue {
    /// Returns the kind of this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Decimal(_) => ValueKind::Decimal,
            Self::String(_) => ValueKind::String,
            Self::DateTime(_) => ValueKind::DateTime,
            Self::Guid(_) => ValueKind::Guid,
            Self::Bytes(_) => ValueKind::Bytes,
        }
    }

    /// Returns true if this is `Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the SQL representation for inline use (escaped).
    ///
    /// **Warning**: inlining reintroduces the injection risk that bound
    /// parameters avoid. Use it for logging and diagnostics only.
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => String::from(if *b { "1" } else { "0" }),
            Self::Int(n) => format!("{n}"),
            // NaN and the infinities have no SQL literal.
            Self::Float(f) if !f.is_finite() => String::from("NULL"),
            Self::Float(f) => format!("{f}"),
            Self::Decimal(d) => d.to_string(),
            Self::String(s) => {
                // Escape single quotes by doubling them
                let escaped = s.replace('\'', "''");
                format!("'{escaped}'")
            }
            Self::DateTime(ts) => format!("'{}'", ts.format("%Y-%m-%d %H:%M:%S")),
            Self::Guid(id) => format!("'{}'", id.hyphenated()),
            Self::Bytes(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("X'{hex}'")
            }
        }
    }

    /// Converts a JSON value into a typed value.
    ///
    /// Arrays and objects have no scalar counterpart and are bound as their
    /// JSON text.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_u64().map(|u| Self::Decimal(Decimal::from(u))))
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            serde_json::Value::String(s) => Self::String(s.clone()),
            other => Self::String(other.to_string()),
        }
    }
}

/// Trait for types that can be converted to typed values.
pub trait ToTypedValue {
    /// Converts the value to a `TypedValue`.
    fn to_typed_value(self) -> TypedValue;
}

impl ToTypedValue for TypedValue {
    fn to_typed_value(self) -> TypedValue {
        self
    }
}

impl ToTypedValue for bool {
    fn to_typed_value(self) -> TypedValue {
        TypedValue::Bool(self)
    }
}

macro_rules! impl_to_typed_int {
    ($($ty:ty),+) => {
        $(
            impl ToTypedValue for $ty {
                fn to_typed_value(self) -> TypedValue {
                    TypedValue::Int(i64::from(self))
                }
            }
        )+
    };
}

impl_to_typed_int!(i64, i32, i16, i8, u32, u16, u8);

impl ToTypedValue for f64 {
    fn to_typed_value(self) -> TypedValue {
        TypedValue::Float(self)
    }
}

impl ToTypedValue for f32 {
    fn to_typed_value(self) -> TypedValue {
        TypedValue::Float(f64::from(self))
    }
}

impl ToTypedValue for Decimal {
    fn to_typed_value(self) -> TypedValue {
        TypedValue::Decimal(self)
    }
}

impl ToTypedValue for String {
    fn to_typed_value(self) -> TypedValue {
        TypedValue::String(self)
    }
}

impl ToTypedValue for &str {
    fn to_typed_value(self) -> TypedValue {
        TypedValue::String(String::from(self))
    }
}

impl ToTypedValue for NaiveDateTime {
    fn to_typed_value(self) -> TypedValue {
        TypedValue::DateTime(self)
    }
}

impl ToTypedValue for NaiveDate {
    fn to_typed_value(self) -> TypedValue {
        TypedValue::DateTime(self.and_time(chrono::NaiveTime::MIN))
    }
}

impl ToTypedValue for DateTime<Utc> {
    fn to_typed_value(self) -> TypedValue {
        TypedValue::DateTime(self.naive_utc())
    }
}

impl ToTypedValue for Uuid {
    fn to_typed_value(self) -> TypedValue {
        TypedValue::Guid(self)
    }
}

impl<T: ToTypedValue> ToTypedValue for Option<T> {
    fn to_typed_value(self) -> TypedValue {
        match self {
            Some(v) => v.to_typed_value(),
            None => TypedValue::Null,
        }
    }
}

impl ToTypedValue for Vec<u8> {
    fn to_typed_value(self) -> TypedValue {
        TypedValue::Bytes(self)
    }
}

impl ToTypedValue for &[u8] {
    fn to_typed_value(self) -> TypedValue {
        TypedValue::Bytes(self.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_null_is_bare_keyword() {
        assert_eq!(TypedValue::Null.to_sql_inline(), "NULL");
    }

    #[test]
    fn test_inline_bool_is_numeric() {
        assert_eq!(TypedValue::Bool(true).to_sql_inline(), "1");
        assert_eq!(TypedValue::Bool(false).to_sql_inline(), "0");
    }

    #[test]
    fn test_inline_non_finite_float_is_null() {
        assert_eq!(TypedValue::Float(f64::NAN).to_sql_inline(), "NULL");
        assert_eq!(TypedValue::Float(f64::INFINITY).to_sql_inline(), "NULL");
        assert_eq!(TypedValue::Float(f64::NEG_INFINITY).to_sql_inline(), "NULL");
        assert_eq!(TypedValue::Float(1.5).to_sql_inline(), "1.5");
    }

    #[test]
    fn test_inline_text_escaping() {
        assert_eq!(
            TypedValue::String(String::from("O'Brien")).to_sql_inline(),
            "'O''Brien'"
        );
        assert_eq!(
            "'; DROP TABLE users; --".to_typed_value().to_sql_inline(),
            "'''; DROP TABLE users; --'"
        );
    }

    #[test]
    fn test_inline_datetime() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(7, 5, 1))
            .map(TypedValue::DateTime);
        assert_eq!(
            ts.map(|v| v.to_sql_inline()).as_deref(),
            Some("'2024-03-09 07:05:01'")
        );
    }

    #[test]
    fn test_inline_guid_lowercase_hyphenated() {
        let id = Uuid::from_u128(0x67E5_5044_10B1_426F_9247_BB68_0E5F_E0C8);
        assert_eq!(
            TypedValue::Guid(id).to_sql_inline(),
            "'67e55044-10b1-426f-9247-bb680e5fe0c8'"
        );
    }

    #[test]
    fn test_inline_blob() {
        assert_eq!(
            TypedValue::Bytes(vec![0x48, 0x45, 0x4C, 0x4C, 0x4F]).to_sql_inline(),
            "X'48454C4C4F'"
        );
    }

    #[test]
    fn test_kind_compatibility() {
        assert!(ValueKind::Int.is_comparable_with(ValueKind::Decimal));
        assert!(ValueKind::Bool.is_comparable_with(ValueKind::Int));
        assert!(ValueKind::Null.is_comparable_with(ValueKind::Guid));
        assert!(!ValueKind::String.is_comparable_with(ValueKind::Int));
        assert!(!ValueKind::DateTime.is_comparable_with(ValueKind::Bool));
        assert_eq!(ValueKind::Int.widen(ValueKind::Float), ValueKind::Float);
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!({"a": 1, "b": "x", "c": null, "d": 1.5, "e": [1]});
        assert_eq!(TypedValue::from_json(&json["a"]), TypedValue::Int(1));
        assert_eq!(
            TypedValue::from_json(&json["b"]),
            TypedValue::String(String::from("x"))
        );
        assert_eq!(TypedValue::from_json(&json["c"]), TypedValue::Null);
        assert_eq!(TypedValue::from_json(&json["d"]), TypedValue::Float(1.5));
        assert_eq!(
            TypedValue::from_json(&json["e"]),
            TypedValue::String(String::from("[1]"))
        );
    }

    #[test]
    fn test_to_typed_value_conversions() {
        assert_eq!(true.to_typed_value(), TypedValue::Bool(true));
        assert_eq!(42_i32.to_typed_value(), TypedValue::Int(42));
        assert_eq!(2.5_f64.to_typed_value(), TypedValue::Float(2.5));
        assert_eq!(None::<i32>.to_typed_value(), TypedValue::Null);
        assert_eq!(Some(42_u8).to_typed_value(), TypedValue::Int(42));
    }
}
