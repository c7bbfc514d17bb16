//! Equivalence checking between an original and a transformed document.
//!
//! Both documents are re-parsed from their serialized text into
//! `serde_json::Value` trees, independent of [`crate::Node`]. Each side then
//! goes through the same pipeline:
//!
//! 1. resolve `$ref`s into the definitions table (cycle-safe),
//! 2. strip documentation-only fields,
//! 3. collapse single-branch compositions,
//!
//! and the results are compared. The paths section must match exactly; every
//! original definition must exist with the same structure in the transformed
//! document, which may add new ones.

use std::collections::HashSet;

use serde_json::{Map, Value};
use serde_yaml::Value as YamlValue;
use tracing::debug;

use crate::error::{Divergence, HoistError, Side};
use crate::types::{escape_pointer, HoistOptions, COMPOSITION_KEYS, DOC_FIELDS, REF_KEY};

/// Check that `transformed` is equivalent to `original`.
///
/// # Errors
///
/// Returns `HoistError::EquivalenceDivergence` naming the first differing
/// location, or `HoistError::InvalidDocument` if either text does not parse.
pub fn check_equivalence(
    original: &str,
    transformed: &str,
    options: &HoistOptions,
) -> Result<(), HoistError> {
    match find_divergence(original, transformed, options)? {
        Some(divergence) => Err(HoistError::EquivalenceDivergence(divergence)),
        None => Ok(()),
    }
}

/// Compare two serialized documents, returning the first divergence if any.
pub fn find_divergence(
    original: &str,
    transformed: &str,
    options: &HoistOptions,
) -> Result<Option<Divergence>, HoistError> {
    let original = Prepared::new(&parse_tree(original)?, options);
    let transformed = Prepared::new(&parse_tree(transformed)?, options);

    if let Some(divergence) = first_difference(&original.paths, &transformed.paths, "/paths") {
        return Ok(Some(divergence));
    }

    let table: String = options
        .definitions_path
        .iter()
        .map(|segment| format!("/{}", escape_pointer(segment)))
        .collect();

    for (name, body) in &original.definitions {
        let path = format!("{}/{}", table, escape_pointer(name));
        let divergence = match transformed.definitions.get(name) {
            None => Some(Divergence::Missing {
                path,
                side: Side::Original,
            }),
            Some(other) => first_difference(body, other, &path),
        };
        if divergence.is_some() {
            return Ok(divergence);
        }
    }

    debug!(
        definitions = original.definitions.len(),
        added = transformed
            .definitions
            .len()
            .saturating_sub(original.definitions.len()),
        "documents are equivalent"
    );
    Ok(None)
}

/// A document after resolution, stripping, and normalization.
struct Prepared {
    paths: Value,
    definitions: Map<String, Value>,
}

impl Prepared {
    fn new(doc: &Value, options: &HoistOptions) -> Self {
        let table = options
            .definitions_path
            .iter()
            .try_fold(doc, |node, key| node.get(key))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let resolver = Resolver {
            definitions: &table,
            options,
        };

        let paths = doc
            .get("paths")
            .map(|paths| resolver.resolve(paths, &mut HashSet::new()))
            .unwrap_or(Value::Null);

        let definitions = table
            .iter()
            .map(|(name, body)| {
                let mut visited = HashSet::from([name.clone()]);
                let resolved = resolver.resolve(body, &mut visited);
                (name.clone(), normalize(strip_docs(resolved, false)))
            })
            .collect();

        Self {
            paths: normalize(strip_docs(paths, false)),
            definitions,
        }
    }
}

/// Inlines references into the definitions table.
struct Resolver<'a> {
    definitions: &'a Map<String, Value>,
    options: &'a HoistOptions,
}

impl Resolver<'_> {
    /// Substitute every resolvable `$ref` below `value`.
    ///
    /// A reference to a name already in `visited` stays as it is. References
    /// outside the definitions namespace, or to unknown names, are kept too.
    /// Sibling keys of a resolved reference take precedence over the target's.
    fn resolve(&self, value: &Value, visited: &mut HashSet<String>) -> Value {
        match value {
            Value::Object(map) => {
                if let Some(target) = map.get(REF_KEY).and_then(Value::as_str) {
                    return self.resolve_reference(map, target, visited);
                }
                Value::Object(
                    map.iter()
                        .map(|(k, v)| (k.clone(), self.resolve(v, visited)))
                        .collect(),
                )
            }
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| self.resolve(item, visited)).collect())
            }
            other => other.clone(),
        }
    }

    fn resolve_reference(
        &self,
        map: &Map<String, Value>,
        target: &str,
        visited: &mut HashSet<String>,
    ) -> Value {
        let Some(name) = self.options.definition_name(target) else {
            return Value::Object(map.clone());
        };
        if visited.contains(&name) {
            return Value::Object(map.clone());
        }
        let Some(definition) = self.definitions.get(&name) else {
            return Value::Object(map.clone());
        };

        visited.insert(name.clone());
        let resolved = self.resolve(definition, visited);
        let mut merged = Map::new();
        for (k, v) in map {
            if k != REF_KEY {
                merged.insert(k.clone(), self.resolve(v, visited));
            }
        }
        visited.remove(&name);

        match resolved {
            Value::Object(body) => {
                for (k, v) in body {
                    merged.entry(k).or_insert(v);
                }
                Value::Object(merged)
            }
            other if merged.is_empty() => other,
            _ => Value::Object(merged),
        }
    }
}

/// Remove documentation-only fields.
///
/// Keys of a `properties` mapping are property names, not keywords, so a
/// property called `description` survives.
fn strip_docs(value: Value, property_names: bool) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(k, _)| property_names || !DOC_FIELDS.contains(&k.as_str()))
                .map(|(k, v)| {
                    let names = !property_names && k == "properties";
                    (k, strip_docs(v, names))
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| strip_docs(item, false))
                .collect(),
        ),
        other => other,
    }
}

/// Collapse `{ allOf: [x] }` (and `anyOf`/`oneOf`) into `x`, bottom-up.
fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut map: Map<String, Value> =
                map.into_iter().map(|(k, v)| (k, normalize(v))).collect();
            if map.len() == 1 {
                let single_branch = COMPOSITION_KEYS.iter().find_map(|key| match map.get(*key) {
                    Some(Value::Array(branches)) if branches.len() == 1 => Some(*key),
                    _ => None,
                });
                if let Some(key) = single_branch {
                    if let Some(Value::Array(mut branches)) = map.remove(key) {
                        return branches.remove(0);
                    }
                }
            }
            Value::Object(map)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        other => other,
    }
}

/// Depth-first search for the first structural difference.
fn first_difference(original: &Value, transformed: &Value, path: &str) -> Option<Divergence> {
    match (original, transformed) {
        (Value::Object(a), Value::Object(b)) => {
            for (key, av) in a {
                let child = format!("{}/{}", path, escape_pointer(key));
                match b.get(key) {
                    None => {
                        return Some(Divergence::Missing {
                            path: child,
                            side: Side::Original,
                        })
                    }
                    Some(bv) => {
                        if let Some(divergence) = first_difference(av, bv, &child) {
                            return Some(divergence);
                        }
                    }
                }
            }
            b.keys().find(|key| !a.contains_key(*key)).map(|key| Divergence::Missing {
                path: format!("{}/{}", path, escape_pointer(key)),
                side: Side::Transformed,
            })
        }
        (Value::Array(a), Value::Array(b)) if a.len() == b.len() => a
            .iter()
            .zip(b)
            .enumerate()
            .find_map(|(i, (av, bv))| first_difference(av, bv, &format!("{}/{}", path, i))),
        (a, b) if a == b => None,
        (a, b) => Some(Divergence::Mismatch {
            path: path.to_string(),
            original: summarize(a),
            transformed: summarize(b),
        }),
    }
}

fn summarize(value: &Value) -> String {
    match value {
        Value::Object(map) => format!("object with {} key(s)", map.len()),
        Value::Array(items) => format!("array of {} item(s)", items.len()),
        other => other.to_string(),
    }
}

/// Parse YAML or JSON text into a `serde_json::Value`, stringifying keys.
fn parse_tree(source: &str) -> Result<Value, HoistError> {
    serde_yaml::from_str::<YamlValue>(source)
        .map(yaml_to_json)
        .map_err(|source| HoistError::InvalidDocument { source })
}

fn yaml_to_json(value: YamlValue) -> Value {
    match value {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or_else(|| Value::String(n.to_string()))
            }
        }
        YamlValue::String(s) => Value::String(s),
        YamlValue::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        YamlValue::Mapping(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (json_key(k), yaml_to_json(v)))
                .collect(),
        ),
        YamlValue::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn json_key(key: YamlValue) -> String {
    match yaml_to_json(key) {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
