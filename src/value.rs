//! The `Value` tree produced by the loader and consumed by the dumper.
//!
//! NestedText has exactly three shapes: strings, ordered sequences, and
//! insertion-ordered mappings. There is no number/boolean/null case here —
//! the core performs no type inference, so every leaf is a `String` by
//! construction. Mappings use `Vec<(String, Value)>` rather than a hash map
//! so that source order (which is significant — it controls dump output)
//! survives without pulling in an order-preserving-map dependency.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A loaded or caller-constructed NestedText value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    String(String),
    Sequence(Vec<Value>),
    Mapping(Vec<(String, Value)>),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn sequence(items: impl Into<Vec<Value>>) -> Self {
        Value::Sequence(items.into())
    }

    pub fn mapping(entries: impl Into<Vec<(String, Value)>>) -> Self {
        Value::Mapping(entries.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Value::Sequence(_))
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Value::Mapping(_))
    }

    /// Look up a key in a `Mapping`. Returns `None` for non-mapping values
    /// or keys not present — entries are a plain vector, so this is a
    /// linear scan, not a hash lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Mapping(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<Vec<(String, Value)>> for Value {
    fn from(entries: Vec<(String, Value)>) -> Self {
        Value::Mapping(entries)
    }
}

/// NestedText has no numeric or boolean leaf — these coerce a Rust scalar
/// into the one leaf shape the format has by rendering it with `Display`.
/// A collaborator building a tree from richer Rust types reaches for these
/// rather than hand-writing `.to_string()` at every leaf.
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::String(b.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::String(n.to_string())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::String(n.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::String(n.to_string())
    }
}

/// One segment of a key-path: a mapping key or a sequence index.
///
/// Key-paths address nodes in the tree by value rather than by reference,
/// so the keymap (and any caller holding a path) never has to worry about
/// the tree's lifetime — see the crate-level docs for the rationale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum KeyPathSegment {
    Key(String),
    Index(usize),
}

impl KeyPathSegment {
    pub fn as_key(&self) -> Option<&str> {
        match self {
            KeyPathSegment::Key(k) => Some(k),
            KeyPathSegment::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            KeyPathSegment::Index(i) => Some(*i),
            KeyPathSegment::Key(_) => None,
        }
    }

    /// Join a key-path into a single string with `sep` between segments,
    /// escaping any occurrence of `sep` inside a key segment with a leading
    /// backslash so the path can be split back apart unambiguously.
    pub fn join(path: &[KeyPathSegment], sep: &str) -> String {
        path.iter()
            .map(|seg| match seg {
                KeyPathSegment::Key(k) => {
                    if sep.is_empty() {
                        k.clone()
                    } else {
                        k.replace(sep, &format!("\\{sep}"))
                    }
                }
                KeyPathSegment::Index(i) => i.to_string(),
            })
            .collect::<Vec<_>>()
            .join(sep)
    }
}

/// An ordered sequence of mapping keys and sequence indices locating a node.
pub type KeyPath = Vec<KeyPathSegment>;
