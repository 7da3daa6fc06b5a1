//! Data context handed to template rendering.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// A scalar or boolean value stored in a [`DataContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ContextValue {
    Text(String),
    Bool(bool),
    Number(i64),
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextValue::Text(s) => write!(f, "{s}"),
            ContextValue::Bool(b) => write!(f, "{b}"),
            ContextValue::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::Text(value.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::Text(value)
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        ContextValue::Bool(value)
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        ContextValue::Number(value)
    }
}

/// Ordered key/value mapping supplied by the caller for one generation.
///
/// Keys iterate in lexicographic order, which keeps rendering and debug
/// output deterministic. A context is read-only while a pass runs; passes
/// that need an extra key (such as `environment`) derive a new context with
/// [`DataContext::with`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DataContext {
    values: BTreeMap<String, ContextValue>,
}

impl DataContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Return a copy of this context with one key set.
    pub fn with(&self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        let mut next = self.clone();
        next.insert(key, value);
        next
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Read a boolean flag. Non-boolean and missing values yield `None`.
    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.values.get(key) {
            Some(ContextValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(ContextValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for DataContext
where
    K: Into<String>,
    V: Into<ContextValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = Self::new();
        for (k, v) in iter {
            ctx.insert(k, v);
        }
        ctx
    }
}
