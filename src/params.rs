//! Bind parameter tracking
//!
//! A [`ParameterTracker`] remembers the last value bound at each 1-based
//! parameter position of one prepared statement. Enumeration is always by
//! ascending position so that the n-th binding lines up with the n-th `?`
//! in the SQL text, whatever order the setters were called in.

use std::{collections::BTreeMap, fmt};

use crate::value::ParamValue;

/// Per-statement record of bound parameters
#[derive(Debug, Default, Clone)]
pub struct ParameterTracker {
    bindings: BTreeMap<u32, ParamValue>,
}

impl ParameterTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` at `position`, replacing any earlier binding there.
    ///
    /// Positions are not validated; rejecting them is the underlying
    /// statement's job.
    pub fn bind(&mut self, position: u32, value: impl Into<ParamValue>) {
        self.bindings.insert(position, value.into());
    }

    /// Record an explicit NULL at `position`
    pub fn bind_null(&mut self, position: u32) {
        self.bindings.insert(position, ParamValue::Null);
    }

    /// Remove every binding
    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    /// Get the value bound at `position`
    pub fn get(&self, position: u32) -> Option<&ParamValue> {
        self.bindings.get(&position)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Take an immutable copy of the current bindings, positions ascending
    pub fn snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot {
            bindings: self
                .bindings
                .iter()
                .map(|(pos, value)| (*pos, value.clone()))
                .collect(),
        }
    }
}

/// An immutable, position-ordered view of a statement's bindings
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParameterSnapshot {
    bindings: Vec<(u32, ParamValue)>,
}

impl ParameterSnapshot {
    /// A snapshot with no bindings
    pub fn empty() -> Self {
        Self::default()
    }

    /// Get the value bound at `position`
    pub fn get(&self, position: u32) -> Option<&ParamValue> {
        self.bindings
            .binary_search_by_key(&position, |(pos, _)| *pos)
            .ok()
            .map(|idx| &self.bindings[idx].1)
    }

    /// Iterate over `(position, value)` pairs in ascending position order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &ParamValue)> {
        self.bindings.iter().map(|(pos, value)| (*pos, value))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Renders as `{1=42, 2=x, 3=NULL}`
impl fmt::Display for ParameterSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (idx, (pos, value)) in self.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", pos, value.render())?;
        }
        f.write_str("}")
    }
}
