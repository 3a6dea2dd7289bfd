//! Parameterized statements.
//!
//! A [`ParameterizedStatement`] is SQL text plus an ordered name-to-value
//! map. Every marker in the text has a binding and every binding has a
//! marker, except for the entries listed in
//! [`ParameterizedStatement::passthrough`].

use indexmap::IndexMap;

use crate::dialect::DialectDescriptor;
use crate::value::TypedValue;

/// A named parameter extracted during translation.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: TypedValue,
    /// Zero-based ordinal of first occurrence.
    pub position: u32,
}

/// SQL text with out-of-band named parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterizedStatement {
    sql: String,
    parameters: IndexMap<String, TypedValue>,
    passthrough: Vec<String>,
}

/// Mismatch between the markers in a statement and its bindings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("orphaned markers: {orphaned:?}, unused parameters: {unused:?}")]
pub struct BindingError {
    /// Markers in the SQL text without a binding.
    pub orphaned: Vec<String>,
    /// Bindings without a marker (passthrough entries excluded).
    pub unused: Vec<String>,
}

impl ParameterizedStatement {
    /// Creates a statement from SQL text and parameters in position order.
    #[must_use]
    pub fn new(sql: impl Into<String>, parameters: Vec<Parameter>) -> Self {
        let mut ordered = parameters;
        ordered.sort_by_key(|p| p.position);
        Self {
            sql: sql.into(),
            parameters: ordered.into_iter().map(|p| (p.name, p.value)).collect(),
            passthrough: Vec::new(),
        }
    }

    /// Creates a statement without parameters.
    #[must_use]
    pub fn pure(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }

    /// Adds a binding that the SQL text does not reference.
    pub(crate) fn push_passthrough(&mut self, name: String, value: TypedValue) {
        self.parameters.insert(name.clone(), value);
        self.passthrough.push(name);
    }

    /// Returns the SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the parameters, in first-occurrence order.
    #[must_use]
    pub const fn parameters(&self) -> &IndexMap<String, TypedValue> {
        &self.parameters
    }

    /// Returns the names of bindings that the SQL text does not reference.
    #[must_use]
    pub fn passthrough(&self) -> &[String] {
        &self.passthrough
    }

    /// Consumes the statement and returns SQL and parameters.
    #[must_use]
    pub fn into_parts(self) -> (String, IndexMap<String, TypedValue>) {
        (self.sql, self.parameters)
    }

    /// Returns the distinct parameter names referenced by markers in the
    /// SQL text, in order of first occurrence.
    #[must_use]
    pub fn markers(&self, dialect: &DialectDescriptor) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        scan(&self.sql, dialect, |piece| {
            if let Piece::Marker(name) = piece {
                if !names.iter().any(|n| n == name) {
                    names.push(String::from(name));
                }
            }
        });
        names
    }

    /// Checks that markers and bindings correspond one to one.
    ///
    /// # Errors
    ///
    /// Returns the orphaned markers and unused bindings if any exist.
    pub fn check_bindings(&self, dialect: &DialectDescriptor) -> Result<(), BindingError> {
        let markers = self.markers(dialect);
        let orphaned: Vec<String> = markers
            .iter()
            .filter(|m| !self.parameters.contains_key(m.as_str()))
            .cloned()
            .collect();
        let unused: Vec<String> = self
            .parameters
            .keys()
            .filter(|k| !markers.contains(k) && !self.passthrough.contains(k))
            .cloned()
            .collect();
        if orphaned.is_empty() && unused.is_empty() {
            Ok(())
        } else {
            Err(BindingError { orphaned, unused })
        }
    }

    /// Returns the SQL text with every bound marker replaced by an inline
    /// literal.
    ///
    /// **Warning**: the result is for logging and diagnostics only. Inlining
    /// reintroduces the injection risk that parameter binding avoids; never
    /// execute rendered SQL.
    #[must_use]
    pub fn render(&self, dialect: &DialectDescriptor) -> String {
        let mut out = String::with_capacity(self.sql.len());
        scan(&self.sql, dialect, |piece| match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Marker(name) => match self.parameters.get(name) {
                Some(value) => out.push_str(&value.to_sql_inline()),
                None => {
                    out.push(dialect.parameter_prefix);
                    out.push_str(name);
                }
            },
        });
        out
    }
}

enum Piece<'a> {
    Text(&'a str),
    Marker(&'a str),
}

const fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

const fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Splits SQL text into plain text and parameter markers.
///
/// String literals and quoted identifiers are passed through as text, as is
/// a doubled prefix such as `@@ROWCOUNT`.
fn scan<'a>(sql: &'a str, dialect: &DialectDescriptor, mut emit: impl FnMut(Piece<'a>)) {
    let prefix = dialect.parameter_prefix;
    let mut text_start = 0;
    let mut chars = sql.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c == '\'' || c == dialect.identifier_open {
            let close = if c == '\'' {
                '\''
            } else {
                dialect.identifier_close
            };
            // Doubled closing characters stay inside the quoted run.
            while let Some((_, inner)) = chars.next() {
                if inner == close {
                    if chars.peek().map(|&(_, n)| n) == Some(close) {
                        chars.next();
                    } else {
                        break;
                    }
                }
            }
        } else if c == prefix {
            match chars.peek() {
                Some(&(_, n)) if n == prefix => {
                    chars.next();
                    while chars.peek().is_some_and(|&(_, n)| is_ident_char(n)) {
                        chars.next();
                    }
                }
                Some(&(start, n)) if is_ident_start(n) => {
                    let mut end = start;
                    while let Some(&(j, n)) = chars.peek() {
                        if !is_ident_char(n) {
                            break;
                        }
                        end = j + n.len_utf8();
                        chars.next();
                    }
                    if text_start < i {
                        emit(Piece::Text(&sql[text_start..i]));
                    }
                    emit(Piece::Marker(&sql[start..end]));
                    text_start = end;
                }
                _ => {}
            }
        }
    }
    if text_start < sql.len() {
        emit(Piece::Text(&sql[text_start..]));
    }
}
