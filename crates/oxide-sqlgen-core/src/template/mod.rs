//! SQL templates with `{{name}}` placeholders.
//!
//! A template is parsed once and executed any number of times against
//! different parameter bags. Execution replaces each distinct placeholder
//! with a generated marker (`p0`, `p1`, ... in order of first occurrence),
//! so a name used twice binds a single parameter.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//!
//! use oxide_sqlgen_core::dialect::{get, DialectKind};
//! use oxide_sqlgen_core::template;
//! use oxide_sqlgen_core::value::TypedValue;
//!
//! let tpl = template::parse("SELECT * FROM t WHERE a = {{x}} OR b = {{x}}").unwrap();
//! let mut bag = HashMap::new();
//! bag.insert(String::from("x"), TypedValue::Int(1));
//!
//! let stmt = tpl.execute(get(DialectKind::SqlServer), &bag).unwrap();
//! assert_eq!(stmt.sql(), "SELECT * FROM t WHERE a = @p0 OR b = @p0");
//! assert_eq!(stmt.parameters().len(), 1);
//! ```

mod source;

use std::str::FromStr;

use tracing::{debug, warn};

use crate::dialect::DialectDescriptor;
use crate::error::TemplateError;
use crate::statement::{Parameter, ParameterizedStatement};

pub use source::{ParameterSource, Record};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    /// Index into `placeholder_names`.
    Placeholder(usize),
}

/// A parsed, reusable SQL template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlTemplate {
    raw: String,
    placeholder_names: Vec<String>,
    segments: Vec<Segment>,
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parses `text` into a template.
///
/// Placeholders are `{{identifier}}` with `identifier` matching
/// `[A-Za-z_][A-Za-z0-9_]*`; no whitespace is allowed inside the braces.
/// A placeholder inside a `'...'` string literal would be bound as literal
/// text, so it is rejected.
///
/// # Errors
///
/// `UnterminatedPlaceholder` for `{{` without `}}`, `EmptyPlaceholder` for
/// `{{}}`, `InvalidPlaceholder` for any other content that is not an
/// identifier, `PlaceholderInLiteral` for a placeholder between quotes.
pub fn parse(text: &str) -> Result<SqlTemplate, TemplateError> {
    let bytes = text.as_bytes();
    let mut placeholder_names: Vec<String> = Vec::new();
    let mut segments = Vec::new();
    let mut in_literal = false;
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\'' {
            // A doubled quote toggles twice and stays in the literal.
            in_literal = !in_literal;
            i += 1;
            continue;
        }
        if !bytes[i..].starts_with(b"{{") {
            i += 1;
            continue;
        }

        let offset = i;
        let after_open = &text[i + 2..];
        let close = after_open
            .find("}}")
            .ok_or(TemplateError::UnterminatedPlaceholder { offset })?;
        let name = &after_open[..close];

        if name.is_empty() {
            return Err(TemplateError::EmptyPlaceholder { offset });
        }
        if !is_identifier(name) {
            return Err(TemplateError::InvalidPlaceholder {
                name: String::from(name),
                offset,
            });
        }
        if in_literal {
            return Err(TemplateError::PlaceholderInLiteral {
                name: String::from(name),
                offset,
            });
        }

        if offset > text_start {
            segments.push(Segment::Text(String::from(&text[text_start..offset])));
        }
        let index = match placeholder_names.iter().position(|n| n == name) {
            Some(index) => index,
            None => {
                placeholder_names.push(String::from(name));
                placeholder_names.len() - 1
            }
        };
        segments.push(Segment::Placeholder(index));

        i = offset + 2 + close + 2;
        text_start = i;
    }
    if text_start < text.len() {
        segments.push(Segment::Text(String::from(&text[text_start..])));
    }

    debug!(placeholders = placeholder_names.len(), "parsed template");
    Ok(SqlTemplate {
        raw: String::from(text),
        placeholder_names,
        segments,
    })
}

impl FromStr for SqlTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl SqlTemplate {
    /// Returns the template text as parsed.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the distinct placeholder names in order of first occurrence.
    #[must_use]
    pub fn placeholder_names(&self) -> &[String] {
        &self.placeholder_names
    }

    /// Returns true if the template has no placeholders.
    #[must_use]
    pub fn is_pure(&self) -> bool {
        self.placeholder_names.is_empty()
    }

    /// Binds every placeholder from `source`.
    ///
    /// A pure template returns its text unchanged with no parameters,
    /// whatever the bag holds. Otherwise, bag entries the template never
    /// references are kept under their own names and listed in
    /// [`ParameterizedStatement::passthrough`]; an entry whose name collides
    /// with a generated marker name is dropped.
    ///
    /// # Errors
    ///
    /// `UnboundPlaceholder` if `source` has no value for a placeholder.
    pub fn execute<S>(
        &self,
        dialect: &DialectDescriptor,
        source: &S,
    ) -> Result<ParameterizedStatement, TemplateError>
    where
        S: ParameterSource + ?Sized,
    {
        if self.is_pure() {
            return Ok(ParameterizedStatement::pure(self.raw.clone()));
        }

        let mut parameters = Vec::with_capacity(self.placeholder_names.len());
        for (position, name) in (0_u32..).zip(&self.placeholder_names) {
            let value = source
                .lookup(name)
                .ok_or_else(|| TemplateError::UnboundPlaceholder(name.clone()))?;
            parameters.push(Parameter {
                name: format!("p{position}"),
                value,
                position,
            });
        }

        let mut sql = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => sql.push_str(text),
                Segment::Placeholder(index) => {
                    sql.push_str(&dialect.parameter_marker(&parameters[*index].name));
                }
            }
        }

        let generated: Vec<String> = parameters.iter().map(|p| p.name.clone()).collect();
        let mut statement = ParameterizedStatement::new(sql, parameters);

        for (name, value) in source.entries() {
            if self.placeholder_names.contains(&name) {
                continue;
            }
            if generated.contains(&name) {
                warn!(name = %name, "template bag entry collides with a generated parameter; dropped");
                continue;
            }
            warn!(name = %name, "template bag entry is not referenced; kept as passthrough");
            statement.push_passthrough(name, value);
        }

        Ok(statement)
    }

    /// Executes the template and inlines every bound value.
    ///
    /// **Warning**: for logging and diagnostics only; see
    /// [`ParameterizedStatement::render`].
    ///
    /// # Errors
    ///
    /// Same as [`SqlTemplate::execute`].
    pub fn render<S>(
        &self,
        dialect: &DialectDescriptor,
        source: &S,
    ) -> Result<String, TemplateError>
    where
        S: ParameterSource + ?Sized,
    {
        Ok(self.execute(dialect, source)?.render(dialect))
    }
}

/// Binds `template` against `source`; see [`SqlTemplate::execute`].
///
/// # Errors
///
/// `UnboundPlaceholder` if `source` has no value for a placeholder.
pub fn execute<S>(
    template: &SqlTemplate,
    dialect: &DialectDescriptor,
    source: &S,
) -> Result<ParameterizedStatement, TemplateError>
where
    S: ParameterSource + ?Sized,
{
    template.execute(dialect, source)
}
