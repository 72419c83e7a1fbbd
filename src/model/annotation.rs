//! Node annotations for phylogenetic trees.
//!
//! Provides [Annotations], the ordered key/value metadata attached to a node
//! (Newick `[&key=value,...]` comments, NeXML `<meta>` elements). Supported
//! values captured by [AnnotationValue] are `i64`, `f64`, and `String`.

use std::fmt;

// =#========================================================================#=
// ANNOTATIONS
// =#========================================================================#=
/// Annotations of one node, kept in insertion order so that writing them
/// is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    entries: Vec<(String, AnnotationValue)>,
}

impl Annotations {
    /// Creates empty annotations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&AnnotationValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Sets the value for `key`. An existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AnnotationValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnnotationValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of annotations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether there are no annotations.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =#========================================================================#=
// ANNOTATION VALUE
// =#========================================================================#=
/// Enum to encapsulate a parsed annotation value.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    /// For integer values
    Int(i64),
    /// For floating point values
    Float(f64),
    /// For strings
    String(String),
}

impl AnnotationValue {
    /// Infers the value type from its textual form: integer, then float,
    /// otherwise string.
    pub fn infer(text: &str) -> Self {
        if let Ok(v) = text.parse::<i64>() {
            AnnotationValue::Int(v)
        } else if let Ok(v) = text.parse::<f64>() {
            AnnotationValue::Float(v)
        } else {
            AnnotationValue::String(text.to_string())
        }
    }
}

impl fmt::Display for AnnotationValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AnnotationValue::Int(v) => write!(f, "{v}"),
            AnnotationValue::Float(v) => write!(f, "{v}"),
            AnnotationValue::String(v) => f.write_str(v),
        }
    }
}

impl From<f64> for AnnotationValue {
    fn from(v: f64) -> Self {
        AnnotationValue::Float(v)
    }
}

impl From<i64> for AnnotationValue {
    fn from(v: i64) -> Self {
        AnnotationValue::Int(v)
    }
}

impl From<i32> for AnnotationValue {
    fn from(v: i32) -> Self {
        AnnotationValue::Int(v as i64)
    }
}

impl From<String> for AnnotationValue {
    fn from(v: String) -> Self {
        AnnotationValue::String(v)
    }
}

impl From<&str> for AnnotationValue {
    fn from(v: &str) -> Self {
        AnnotationValue::String(v.to_string())
    }
}
