//! SQL type codes
//!
//! This module provides the numeric type codes used by `set_null` and
//! `register_out_parameter`, together with a static table mapping each code
//! to its name for log output.

use std::fmt;

/// A numeric SQL type code.
///
/// Codes follow the widely used JDBC numbering so that drivers ported from
/// that ecosystem can pass their codes through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SqlType(pub i32);

impl SqlType {
    pub const BIT: SqlType = SqlType(-7);
    pub const TINYINT: SqlType = SqlType(-6);
    pub const BIGINT: SqlType = SqlType(-5);
    pub const LONGVARBINARY: SqlType = SqlType(-4);
    pub const VARBINARY: SqlType = SqlType(-3);
    pub const BINARY: SqlType = SqlType(-2);
    pub const LONGVARCHAR: SqlType = SqlType(-1);
    pub const NULL: SqlType = SqlType(0);
    pub const CHAR: SqlType = SqlType(1);
    pub const NUMERIC: SqlType = SqlType(2);
    pub const DECIMAL: SqlType = SqlType(3);
    pub const INTEGER: SqlType = SqlType(4);
    pub const SMALLINT: SqlType = SqlType(5);
    pub const FLOAT: SqlType = SqlType(6);
    pub const REAL: SqlType = SqlType(7);
    pub const DOUBLE: SqlType = SqlType(8);
    pub const VARCHAR: SqlType = SqlType(12);
    pub const BOOLEAN: SqlType = SqlType(16);
    pub const DATALINK: SqlType = SqlType(70);
    pub const DATE: SqlType = SqlType(91);
    pub const TIME: SqlType = SqlType(92);
    pub const TIMESTAMP: SqlType = SqlType(93);
    pub const OTHER: SqlType = SqlType(1111);
    pub const JAVA_OBJECT: SqlType = SqlType(2000);
    pub const DISTINCT: SqlType = SqlType(2001);
    pub const STRUCT: SqlType = SqlType(2002);
    pub const ARRAY: SqlType = SqlType(2003);
    pub const BLOB: SqlType = SqlType(2004);
    pub const CLOB: SqlType = SqlType(2005);
    pub const REF: SqlType = SqlType(2006);

    /// Get the name of this type code, or `""` when the code is unknown.
    pub fn name(&self) -> &'static str {
        TYPE_NAMES
            .binary_search_by_key(&self.0, |(code, _)| *code)
            .map(|idx| TYPE_NAMES[idx].1)
            .unwrap_or("")
    }

    /// Check whether the code appears in the type table
    pub fn is_known(&self) -> bool {
        !self.name().is_empty()
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            "" => write!(f, "{}", self.0),
            name => f.write_str(name),
        }
    }
}

impl From<i32> for SqlType {
    fn from(code: i32) -> Self {
        SqlType(code)
    }
}

/// Type code names, sorted by code for binary search.
static TYPE_NAMES: &[(i32, &str)] = &[
    (-7, "BIT"),
    (-6, "TINYINT"),
    (-5, "BIGINT"),
    (-4, "LONGVARBINARY"),
    (-3, "VARBINARY"),
    (-2, "BINARY"),
    (-1, "LONGVARCHAR"),
    (0, "NULL"),
    (1, "CHAR"),
    (2, "NUMERIC"),
    (3, "DECIMAL"),
    (4, "INTEGER"),
    (5, "SMALLINT"),
    (6, "FLOAT"),
    (7, "REAL"),
    (8, "DOUBLE"),
    (12, "VARCHAR"),
    (16, "BOOLEAN"),
    (70, "DATALINK"),
    (91, "DATE"),
    (92, "TIME"),
    (93, "TIMESTAMP"),
    (1111, "OTHER"),
    (2000, "JAVA_OBJECT"),
    (2001, "DISTINCT"),
    (2002, "STRUCT"),
    (2003, "ARRAY"),
    (2004, "BLOB"),
    (2005, "CLOB"),
    (2006, "REF"),
];
