//! Bound statement parameters.
//!
//! Drivers bind values one at a time, as an array, or by reference (the
//! variable is read when the statement executes). All three normalize into
//! [`BoundParameters`] before the tenant check runs.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;

use crate::error::IdorError;
use crate::parser::ValueRef;

/// A concrete bound value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Null,
}

impl ParamValue {
    /// Textual form used for comparison against a tenant id. `Null` has none.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Null => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(&text),
            None => f.write_str("NULL"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A value bound by reference: set (or changed) after binding, read at
/// evaluation time.
#[derive(Debug, Clone, Default)]
pub struct DeferredSlot(Arc<Mutex<Option<ParamValue>>>);

impl DeferredSlot {
    pub fn set(&self, value: impl Into<ParamValue>) {
        *self.0.lock() = Some(value.into());
    }

    pub fn get(&self) -> Option<ParamValue> {
        self.0.lock().clone()
    }
}

#[derive(Debug, Clone)]
enum Binding {
    Value(ParamValue),
    Deferred(DeferredSlot),
}

impl Binding {
    fn current(&self) -> Option<ParamValue> {
        match self {
            Self::Value(value) => Some(value.clone()),
            Self::Deferred(slot) => slot.get(),
        }
    }
}

/// Parameter values keyed by 1-based position or by name.
#[derive(Debug, Clone, Default)]
pub struct BoundParameters {
    positional: BTreeMap<usize, Binding>,
    named: BTreeMap<String, Binding>,
}

impl BoundParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Array-of-binds: values bound to positions 1, 2, 3, ...
    pub fn from_positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        let mut params = Self::new();
        params.extend_positional(values);
        params
    }

    /// Array-of-binds keyed by placeholder name.
    pub fn from_named<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<ParamValue>,
    {
        let mut params = Self::new();
        for (name, value) in values {
            params.bind_named(name.as_ref(), value);
        }
        params
    }

    /// Append values after the highest bound position.
    pub fn extend_positional<I, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        let mut next = self.positional.keys().next_back().copied().unwrap_or(0);
        for value in values {
            next += 1;
            self.bind_positional(next, value);
        }
    }

    /// Bind a single value. A later bind on the same position wins.
    pub fn bind_positional(&mut self, index: usize, value: impl Into<ParamValue>) {
        self.positional.insert(index, Binding::Value(value.into()));
    }

    /// Bind a single named value; a leading `:` or `@` is ignored.
    pub fn bind_named(&mut self, name: &str, value: impl Into<ParamValue>) {
        self.named
            .insert(normalize_name(name), Binding::Value(value.into()));
    }

    /// Bind a position by reference. The returned slot is read when the
    /// statement is checked.
    pub fn bind_deferred_positional(&mut self, index: usize) -> DeferredSlot {
        let slot = DeferredSlot::default();
        self.positional
            .insert(index, Binding::Deferred(slot.clone()));
        slot
    }

    /// Bind a name by reference.
    pub fn bind_deferred_named(&mut self, name: &str) -> DeferredSlot {
        let slot = DeferredSlot::default();
        self.named
            .insert(normalize_name(name), Binding::Deferred(slot.clone()));
        slot
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    /// Current value of a placeholder, if bound and not `NULL`.
    pub fn get_positional(&self, index: usize) -> Option<ParamValue> {
        self.positional.get(&index).and_then(Binding::current)
    }

    pub fn get_named(&self, name: &str) -> Option<ParamValue> {
        self.named
            .get(&normalize_name(name))
            .and_then(Binding::current)
    }

    /// Resolve a value reference to the text compared against a tenant id.
    pub fn resolve(&self, value: &ValueRef) -> Result<String, IdorError> {
        let bound = match value {
            ValueRef::Literal(literal) => return Ok(literal.clone()),
            ValueRef::Positional(index) => self.get_positional(*index),
            ValueRef::Named(name) => self.get_named(name),
        };
        bound
            .and_then(|v| v.as_text())
            .ok_or_else(|| IdorError::UnresolvedBinding {
                placeholder: value.to_string(),
            })
    }
}

fn normalize_name(name: &str) -> String {
    name.trim_start_matches([':', '@']).to_string()
}
