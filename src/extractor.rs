//! Inline schema extraction.
//!
//! Walks the definitions table and then every operation's request and
//! response payloads, moving anonymous object schemas into the registry and
//! leaving a `$ref` at the original location.
//!
//! # Naming
//!
//! | Site | Name |
//! |------|------|
//! | property `p` | `<prefix><P>` |
//! | array items | `<prefix>Item` |
//! | `additionalProperties` | `<prefix>Value` |
//! | composition branch `i` | prefix becomes `<prefix>AllOf<i>` (etc.) |
//! | response payload | `<OperationId><Status>Response` |
//! | request payload | `<OperationId>RequestBody` |
//!
//! Property sites keep their usage-site `description` by wrapping the
//! reference in a single-branch `allOf`. Payload sites always get a bare
//! reference.

use heck::ToUpperCamelCase;
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::error::HoistError;
use crate::node::Node;
use crate::registry::Registry;
use crate::types::{HoistOptions, COMPOSITION_KEYS, HTTP_METHODS};

/// True for a non-reference mapping with `properties` whose type is
/// `object` or absent.
pub fn is_inline_object(node: &Node) -> bool {
    node.is_mapping()
        && !node.is_reference()
        && node.get("properties").is_some()
        && match node.get("type") {
            None => true,
            Some(t) => t.as_str() == Some("object"),
        }
}

/// True for a non-reference mapping with at least one composition key.
pub fn is_composition(node: &Node) -> bool {
    node.is_mapping()
        && !node.is_reference()
        && COMPOSITION_KEYS.iter().any(|key| node.get(key).is_some())
}

/// True for `type: array` whose `items` is an inline object.
pub fn is_inline_object_array(node: &Node) -> bool {
    node.declared_type() == Some("array") && node.get("items").is_some_and(is_inline_object)
}

/// PascalCase form used for every name segment.
pub fn pascal_case(s: &str) -> String {
    s.to_upper_camel_case()
}

/// Stateful walker owning the registry for one run.
pub struct Extractor<'a> {
    options: &'a HoistOptions,
    registry: Registry,
}

impl<'a> Extractor<'a> {
    pub fn new(options: &'a HoistOptions) -> Self {
        Self {
            options,
            registry: Registry::new(),
        }
    }

    /// Run both phases over `doc` and return the filled registry.
    ///
    /// Schemas are walked before paths so definition-derived names are minted
    /// first.
    pub fn run(mut self, doc: &mut Node) -> Registry {
        self.extract_schemas(doc);
        let after_schemas = self.registry.len();
        info!(extracted = after_schemas, "schemas phase complete");

        self.extract_paths(doc);
        info!(
            extracted = self.registry.len() - after_schemas,
            "paths phase complete"
        );

        self.registry
    }

    /// Schemas phase: walk each existing definition under its own name.
    pub fn extract_schemas(&mut self, doc: &mut Node) {
        let options = self.options;
        let keys = options.definitions_keys();
        let Some(Node::Mapping(table)) = doc.lookup_mut(&keys) else {
            return;
        };
        for (name, definition) in table.iter_mut() {
            self.walk(definition, name);
        }
    }

    /// Paths phase: walk request and response payloads of every operation
    /// that has an `operationId`.
    pub fn extract_paths(&mut self, doc: &mut Node) {
        let Some(Node::Mapping(paths)) = doc.get_mut("paths") else {
            return;
        };
        for item in paths.values_mut() {
            let Some(item) = item.as_mapping_mut() else {
                continue;
            };
            for (method, operation) in item.iter_mut() {
                if HTTP_METHODS.contains(&method.as_str()) {
                    self.extract_operation(operation);
                }
            }
        }
    }

    fn extract_operation(&mut self, operation: &mut Node) {
        let Some(base) = operation
            .get("operationId")
            .and_then(Node::as_str)
            .filter(|id| !id.is_empty())
            .map(pascal_case)
        else {
            return;
        };

        if let Some(Node::Mapping(responses)) = operation.get_mut("responses") {
            for (status, response) in responses.iter_mut() {
                if response.is_reference() {
                    continue;
                }
                let name = format!("{}{}Response", base, pascal_case(status));
                self.extract_content(response, &name);
            }
        }

        if let Some(body) = operation.get_mut("requestBody") {
            if !body.is_reference() {
                let name = format!("{}RequestBody", base);
                self.extract_content(body, &name);
            }
        }
    }

    /// Handle each media type's `schema` under a response or request body.
    fn extract_content(&mut self, holder: &mut Node, name: &str) {
        let Some(Node::Mapping(content)) = holder.get_mut("content") else {
            return;
        };
        for media in content.values_mut() {
            let Some(schema) = media.get_mut("schema") else {
                continue;
            };
            if is_inline_object(schema) || is_composition(schema) {
                let reference = self.hoist(schema, name);
                *schema = reference;
            } else {
                self.walk(schema, name);
            }
        }
    }

    /// Recursive descent over one schema node.
    pub fn walk(&mut self, node: &mut Node, prefix: &str) {
        let Node::Mapping(map) = node else {
            return;
        };

        for keyword in COMPOSITION_KEYS {
            if let Some(Node::Sequence(branches)) = map.get_mut(*keyword) {
                for (i, branch) in branches.iter_mut().enumerate() {
                    let branch_prefix = format!("{}{}{}", prefix, pascal_case(keyword), i);
                    self.walk(branch, &branch_prefix);
                }
            }
        }

        if let Some(Node::Mapping(properties)) = map.get_mut("properties") {
            self.walk_properties(properties, prefix);
        }

        self.walk_items(map, prefix);
        self.walk_additional_properties(map, prefix);
    }

    fn walk_properties(&mut self, properties: &mut IndexMap<String, Node>, prefix: &str) {
        for (property, value) in properties.iter_mut() {
            let name = format!("{}{}", prefix, pascal_case(property));
            if is_inline_object(value) {
                let description = value.description().map(String::from);
                let reference = self.hoist(value, &name);
                *value = match description {
                    Some(description) => documented_reference(reference, description),
                    None => reference,
                };
            } else if is_inline_object_array(value) {
                if let Node::Mapping(array) = value {
                    self.walk_items(array, &name);
                }
            } else {
                self.walk(value, &name);
            }
        }
    }

    fn walk_items(&mut self, map: &mut IndexMap<String, Node>, prefix: &str) {
        let Some(items) = map.get_mut("items") else {
            return;
        };
        let name = format!("{}Item", prefix);
        if is_inline_object(items) {
            let reference = self.hoist(items, &name);
            *items = reference;
        } else {
            self.walk(items, &name);
        }
    }

    fn walk_additional_properties(&mut self, map: &mut IndexMap<String, Node>, prefix: &str) {
        let Some(value) = map.get_mut("additionalProperties") else {
            return;
        };
        if !value.is_mapping() {
            return;
        }
        let name = format!("{}Value", prefix);
        if is_inline_object(value) {
            let reference = self.hoist(value, &name);
            *value = reference;
        } else {
            self.walk(value, &name);
        }
    }

    /// Copy `node` into the registry under a unique name derived from `base`,
    /// walk the copy, and return a bare reference to it.
    ///
    /// The caller writes the returned reference over the original location.
    fn hoist(&mut self, node: &Node, base: &str) -> Node {
        let name = self.registry.reserve(base);
        debug!(name = %name, "extracting inline schema");

        let mut extracted = node.clone();
        self.walk(&mut extracted, &name);
        self.registry.define(name.clone(), extracted);

        Node::reference(self.options.ref_to(&name))
    }
}

/// Usage-site wrapper keeping a property's description next to its reference.
fn documented_reference(reference: Node, description: String) -> Node {
    let mut map = IndexMap::new();
    map.insert("description".to_string(), Node::string(description));
    map.insert("allOf".to_string(), Node::Sequence(vec![reference]));
    Node::Mapping(map)
}

/// Extract every inline schema in `doc` and merge the results into its
/// definitions table. Returns the new definition names, sorted.
///
/// # Errors
///
/// Returns `StructuralPrecondition` or `NameCollision` from the merge.
pub fn extract(doc: &mut Node, options: &HoistOptions) -> Result<Vec<String>, HoistError> {
    let registry = Extractor::new(options).run(doc);
    registry.merge_into(doc, &options.definitions_keys())
}
