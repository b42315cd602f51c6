//! Bind parameter values
//!
//! This module provides [`ParamValue`], the closed set of value kinds that can
//! be bound to a statement parameter, and the rules used to render each kind
//! for log output.

use std::{
    borrow::Cow,
    fmt::{self, Write as _},
    io::Read,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Token emitted when a value's string form cannot be produced.
pub const UNRENDERABLE: &str = "<unrenderable>";

/// A value bound to a statement parameter
#[derive(Clone)]
pub enum ParamValue {
    /// Explicit SQL NULL
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (all widths up to 64 bits)
    Integer(i64),
    /// Double/float value
    Double(f64),
    /// Exact numeric value kept in its textual form
    Decimal(String),
    /// Text value
    Text(String),
    /// Binary data
    Binary(Vec<u8>),
    /// Calendar date
    Date(NaiveDate),
    /// Time of day
    Time(NaiveTime),
    /// Date and time without zone
    Timestamp(NaiveDateTime),
    /// Reference to a large object held by the database
    Lob(LobRef),
    /// Reference to a stream handed to the underlying statement
    Stream(StreamRef),
    /// Any other value, rendered through its `Display` implementation
    Object(Arc<dyn fmt::Display + Send + Sync>),
}

impl ParamValue {
    /// Wrap an arbitrary displayable value
    pub fn object(value: impl fmt::Display + Send + Sync + 'static) -> Self {
        ParamValue::Object(Arc::new(value))
    }

    /// Check if the value is an explicit NULL
    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }

    /// Render the value for log output.
    ///
    /// Never fails: a value whose string form cannot be produced renders as
    /// [`UNRENDERABLE`].
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            ParamValue::Null => Cow::Borrowed("NULL"),
            ParamValue::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            ParamValue::Integer(i) => Cow::Owned(i.to_string()),
            ParamValue::Double(d) => Cow::Owned(d.to_string()),
            ParamValue::Decimal(s) | ParamValue::Text(s) => Cow::Borrowed(s.as_str()),
            ParamValue::Binary(b) => Cow::Owned(format!("0x{}", hex::encode(b))),
            ParamValue::Date(d) => Cow::Owned(d.to_string()),
            ParamValue::Time(t) => Cow::Owned(t.to_string()),
            ParamValue::Timestamp(ts) => Cow::Owned(ts.to_string()),
            ParamValue::Lob(lob) => Cow::Owned(lob.to_string()),
            ParamValue::Stream(stream) => Cow::Owned(stream.to_string()),
            ParamValue::Object(obj) => {
                let mut out = String::new();
                match write!(out, "{}", obj) {
                    Ok(()) => Cow::Owned(out),
                    Err(_) => Cow::Borrowed(UNRENDERABLE),
                }
            }
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl fmt::Debug for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Null => f.write_str("Null"),
            ParamValue::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            ParamValue::Integer(i) => f.debug_tuple("Integer").field(i).finish(),
            ParamValue::Double(d) => f.debug_tuple("Double").field(d).finish(),
            ParamValue::Decimal(s) => f.debug_tuple("Decimal").field(s).finish(),
            ParamValue::Text(s) => f.debug_tuple("Text").field(s).finish(),
            ParamValue::Binary(b) => f.debug_tuple("Binary").field(b).finish(),
            ParamValue::Date(d) => f.debug_tuple("Date").field(d).finish(),
            ParamValue::Time(t) => f.debug_tuple("Time").field(t).finish(),
            ParamValue::Timestamp(ts) => f.debug_tuple("Timestamp").field(ts).finish(),
            ParamValue::Lob(lob) => f.debug_tuple("Lob").field(lob).finish(),
            ParamValue::Stream(s) => f.debug_tuple("Stream").field(s).finish(),
            ParamValue::Object(_) => f.debug_tuple("Object").field(&self.render()).finish(),
        }
    }
}

impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        use ParamValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Double(a), Double(b)) => a == b,
            (Decimal(a), Decimal(b)) | (Text(a), Text(b)) => a == b,
            (Binary(a), Binary(b)) => a == b,
            (Date(a), Date(b)) => a == b,
            (Time(a), Time(b)) => a == b,
            (Timestamp(a), Timestamp(b)) => a == b,
            (Lob(a), Lob(b)) => a == b,
            (Stream(a), Stream(b)) => a == b,
            // Opaque objects compare by identity
            (Object(a), Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

macro_rules! integer_from {
    ($($ty:ty),*) => {
        $(impl From<$ty> for ParamValue {
            fn from(value: $ty) -> Self {
                ParamValue::Integer(value as i64)
            }
        })*
    };
}

integer_from!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        ParamValue::Double(value as f64)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Double(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<Vec<u8>> for ParamValue {
    fn from(value: Vec<u8>) -> Self {
        ParamValue::Binary(value)
    }
}

impl From<&[u8]> for ParamValue {
    fn from(value: &[u8]) -> Self {
        ParamValue::Binary(value.to_vec())
    }
}

impl From<NaiveDate> for ParamValue {
    fn from(value: NaiveDate) -> Self {
        ParamValue::Date(value)
    }
}

impl From<NaiveTime> for ParamValue {
    fn from(value: NaiveTime) -> Self {
        ParamValue::Time(value)
    }
}

impl From<NaiveDateTime> for ParamValue {
    fn from(value: NaiveDateTime) -> Self {
        ParamValue::Timestamp(value)
    }
}

impl From<LobRef> for ParamValue {
    fn from(value: LobRef) -> Self {
        ParamValue::Lob(value)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ParamValue::Null)
    }
}

/// Large object kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LobKind {
    Blob,
    Clob,
    NClob,
}

impl LobKind {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            LobKind::Blob => "BLOB",
            LobKind::Clob => "CLOB",
            LobKind::NClob => "NCLOB",
        }
    }
}

/// A reference to a large object, identified by a driver-specific locator
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LobRef {
    pub kind: LobKind,
    pub locator: String,
}

impl LobRef {
    pub fn new(kind: LobKind, locator: impl Into<String>) -> Self {
        Self {
            kind,
            locator: locator.into(),
        }
    }
}

impl fmt::Display for LobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind.as_str(), self.locator)
    }
}

/// Stream parameter kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Raw bytes
    Binary,
    /// ASCII text
    Ascii,
    /// Character data (UTF-8)
    Character,
}

impl StreamKind {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Binary => "binary",
            StreamKind::Ascii => "ascii",
            StreamKind::Character => "character",
        }
    }
}

static NEXT_STREAM_ID: AtomicU64 = AtomicU64::new(1);

/// A stand-in for a stream parameter.
///
/// The stream itself is handed to the underlying statement; only this
/// reference is tracked, so rendering shows which stream was bound, not what
/// it contained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamRef {
    pub kind: StreamKind,
    pub length: Option<u64>,
    pub id: u64,
}

impl fmt::Display for StreamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.length {
            Some(len) => write!(f, "<{} stream #{}, {} bytes>", self.kind.as_str(), self.id, len),
            None => write!(f, "<{} stream #{}>", self.kind.as_str(), self.id),
        }
    }
}

/// A stream bound to a statement parameter
pub struct ParamStream {
    reference: StreamRef,
    reader: Box<dyn Read + Send>,
}

impl ParamStream {
    /// Create a stream parameter of the given kind
    pub fn new(kind: StreamKind, reader: impl Read + Send + 'static, length: Option<u64>) -> Self {
        Self {
            reference: StreamRef {
                kind,
                length,
                id: NEXT_STREAM_ID.fetch_add(1, Ordering::Relaxed),
            },
            reader: Box::new(reader),
        }
    }

    /// Create a binary stream parameter
    pub fn binary(reader: impl Read + Send + 'static, length: Option<u64>) -> Self {
        Self::new(StreamKind::Binary, reader, length)
    }

    /// Create an ASCII stream parameter
    pub fn ascii(reader: impl Read + Send + 'static, length: Option<u64>) -> Self {
        Self::new(StreamKind::Ascii, reader, length)
    }

    /// Create a character stream parameter
    pub fn character(reader: impl Read + Send + 'static, length: Option<u64>) -> Self {
        Self::new(StreamKind::Character, reader, length)
    }

    /// The reference recorded in place of the stream content
    pub fn reference(&self) -> StreamRef {
        self.reference
    }

    pub fn kind(&self) -> StreamKind {
        self.reference.kind
    }

    pub fn length(&self) -> Option<u64> {
        self.reference.length
    }

    /// Take the reader out of the parameter
    pub fn into_reader(self) -> Box<dyn Read + Send> {
        self.reader
    }
}

impl fmt::Debug for ParamStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamStream")
            .field("reference", &self.reference)
            .finish_non_exhaustive()
    }
}
