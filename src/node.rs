//! Generic document tree and navigation helpers.
//!
//! [`Node`] is the working model the extractor rewrites in place. It keeps
//! mapping key order for stable output, while equality ignores key order.

use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_yaml::{Number, Value};

use crate::error::HoistError;
use crate::types::{OutputFormat, REF_KEY};

/// A leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(Scalar),
    Sequence(Vec<Node>),
    Mapping(IndexMap<String, Node>),
}

impl Node {
    /// Parse YAML (or JSON, which YAML subsumes) into a tree.
    ///
    /// # Errors
    ///
    /// Returns `HoistError::InvalidDocument` if the text does not parse.
    pub fn parse(source: &str) -> Result<Node, HoistError> {
        serde_yaml::from_str::<Value>(source)
            .map(Node::from)
            .map_err(|source| HoistError::InvalidDocument { source })
    }

    /// Serialize the tree in the requested format.
    pub fn render(&self, format: OutputFormat) -> Result<String, HoistError> {
        match format {
            OutputFormat::Yaml => serde_yaml::to_string(self).map_err(|e| HoistError::Serialize {
                message: e.to_string(),
            }),
            OutputFormat::Json => serde_json::to_string_pretty(self)
                .map(|mut s| {
                    s.push('\n');
                    s
                })
                .map_err(|e| HoistError::Serialize {
                    message: e.to_string(),
                }),
        }
    }

    pub fn string(s: impl Into<String>) -> Node {
        Node::Scalar(Scalar::String(s.into()))
    }

    pub fn empty_mapping() -> Node {
        Node::Mapping(IndexMap::new())
    }

    /// A bare reference node: `{ $ref: <target> }`.
    pub fn reference(target: impl Into<String>) -> Node {
        let mut map = IndexMap::new();
        map.insert(REF_KEY.to_string(), Node::string(target));
        Node::Mapping(map)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, Node>> {
        match self {
            Node::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut IndexMap<String, Node>> {
        match self {
            Node::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Node::Mapping(_))
    }

    /// Value for `key` if this is a mapping containing it.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping()?.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.as_mapping_mut()?.get_mut(key)
    }

    /// Follow a chain of mapping keys.
    ///
    /// Returns `None` if any intermediate node is not a mapping or a key is absent.
    pub fn lookup(&self, keys: &[&str]) -> Option<&Node> {
        keys.iter().try_fold(self, |node, key| node.get(key))
    }

    pub fn lookup_mut(&mut self, keys: &[&str]) -> Option<&mut Node> {
        keys.iter().try_fold(self, |node, key| node.get_mut(key))
    }

    /// True if this is a mapping carrying a `$ref` key.
    ///
    /// Sibling keys are allowed and not inspected.
    pub fn is_reference(&self) -> bool {
        self.get(REF_KEY).is_some()
    }

    /// Replace the value under `key` in place, returning the old value.
    ///
    /// No-op if this is not a mapping or `key` is absent.
    pub fn replace_child(&mut self, key: &str, new: Node) -> Option<Node> {
        let slot = self.get_mut(key)?;
        Some(std::mem::replace(slot, new))
    }

    /// Insert or overwrite `key`. No-op on non-mappings.
    pub fn insert(&mut self, key: impl Into<String>, value: Node) {
        if let Node::Mapping(map) = self {
            map.insert(key.into(), value);
        }
    }

    /// Non-empty `description` string, if any.
    pub fn description(&self) -> Option<&str> {
        self.get("description")?.as_str().filter(|d| !d.is_empty())
    }

    /// The declared `type` keyword, if it is a string.
    pub fn declared_type(&self) -> Option<&str> {
        self.get("type")?.as_str()
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Node::Scalar(Scalar::Null),
            Value::Bool(b) => Node::Scalar(Scalar::Bool(b)),
            Value::Number(n) => Node::Scalar(Scalar::Number(n)),
            Value::String(s) => Node::Scalar(Scalar::String(s)),
            Value::Sequence(seq) => Node::Sequence(seq.into_iter().map(Node::from).collect()),
            Value::Mapping(map) => Node::Mapping(
                map.into_iter()
                    .map(|(k, v)| (key_text(k), Node::from(v)))
                    .collect(),
            ),
            Value::Tagged(tagged) => Node::from(tagged.value),
        }
    }
}

/// Mapping keys are strings in the tree; unquoted `200:` becomes `"200"`.
pub(crate) fn key_text(key: Value) -> String {
    match key {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Tagged(tagged) => key_text(tagged.value),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Null => serializer.serialize_unit(),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Number(n) => n.serialize(serializer),
            Scalar::String(s) => serializer.serialize_str(s),
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Scalar(scalar) => scalar.serialize(serializer),
            Node::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Node::Mapping(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
        }
    }
}
