//! SQL rendering
//!
//! Turns SQL text and a [`ParameterSnapshot`] into the text that goes into
//! the log. Rendering is pure and never fails. The output is meant for
//! reading only: values are not escaped and must never be executed.

use std::fmt;

use crate::{config::RenderMode, params::ParameterSnapshot};

/// The placeholder marking a positional bind parameter
pub const PLACEHOLDER: char = '?';

/// SQL text together with the bindings in effect at execution time
#[derive(Debug, Clone)]
pub struct RenderRequest<'a> {
    sql: &'a str,
    snapshot: ParameterSnapshot,
}

impl<'a> RenderRequest<'a> {
    pub fn new(sql: &'a str, snapshot: ParameterSnapshot) -> Self {
        Self { sql, snapshot }
    }

    pub fn sql(&self) -> &str {
        self.sql
    }

    pub fn snapshot(&self) -> &ParameterSnapshot {
        &self.snapshot
    }

    /// Render in the given mode, consuming the request
    pub fn render(self, mode: RenderMode) -> Rendered {
        match mode {
            RenderMode::Listing => Rendered::Listing {
                sql: self.sql.to_string(),
                params: self.snapshot,
            },
            RenderMode::Substitution => Rendered::Substituted(substitute(self.sql, &self.snapshot)),
        }
    }
}

/// A rendered statement
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    /// The SQL exactly as given, plus its bindings
    Listing {
        sql: String,
        params: ParameterSnapshot,
    },
    /// The SQL with placeholders replaced
    Substituted(String),
}

impl Rendered {
    /// The SQL text part of the rendering
    pub fn sql(&self) -> &str {
        match self {
            Rendered::Listing { sql, .. } => sql,
            Rendered::Substituted(sql) => sql,
        }
    }
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rendered::Listing { sql, params } => {
                write!(f, "'{}' with bind parameters: {}", sql, params)
            }
            Rendered::Substituted(sql) => f.write_str(sql),
        }
    }
}

/// Replace each `?` in `sql` with the value bound at its position.
///
/// The n-th placeholder takes the value at position n. Explicit nulls render
/// as `NULL`; positions that were never bound keep the literal `?`.
pub fn substitute(sql: &str, snapshot: &ParameterSnapshot) -> String {
    let mut out = String::with_capacity(sql.len() + snapshot.len() * 8);
    let mut position = 0u32;

    for (idx, fragment) in sql.split(PLACEHOLDER).enumerate() {
        if idx > 0 {
            position += 1;
            match snapshot.get(position) {
                Some(value) => out.push_str(&value.render()),
                None => out.push(PLACEHOLDER),
            }
        }
        out.push_str(fragment);
    }

    out
}

/// Count the placeholders in `sql`
pub fn placeholder_count(sql: &str) -> usize {
    sql.matches(PLACEHOLDER).count()
}
