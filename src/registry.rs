//! Registry of newly minted definitions and the merge into the document.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use tracing::info;

use crate::error::HoistError;
use crate::node::Node;

/// Extracted definitions keyed by unique name.
///
/// Names are reserved before their body is known, so nested extraction can
/// never mint a name that is already taken.
#[derive(Debug, Default)]
pub struct Registry {
    entries: BTreeMap<String, Node>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `base` if unused, otherwise the first free name among `base2`, `base3`, ...
    pub fn unique_name(&self, base: &str) -> String {
        if !self.entries.contains_key(base) {
            return base.to_string();
        }
        (2u64..)
            .map(|n| format!("{}{}", base, n))
            .find(|candidate| !self.entries.contains_key(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    /// Mint a unique name from `base` and hold it with an empty body.
    pub fn reserve(&mut self, base: &str) -> String {
        let name = self.unique_name(base);
        self.entries.insert(name.clone(), Node::empty_mapping());
        name
    }

    /// Store the body of a definition.
    pub fn define(&mut self, name: impl Into<String>, body: Node) {
        self.entries.insert(name.into(), body);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names in lexicographic order.
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Commit all entries into the definitions table at `path`.
    ///
    /// The table is rebuilt as the union of existing and new definitions,
    /// sorted by name. Returns the new names, sorted.
    ///
    /// # Errors
    ///
    /// `StructuralPrecondition` if there is something to insert but no
    /// mapping at `path`; `NameCollision` if a new name already exists there.
    pub fn merge_into(self, doc: &mut Node, path: &[&str]) -> Result<Vec<String>, HoistError> {
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let count = self.entries.len();
        let table = doc
            .lookup_mut(path)
            .and_then(Node::as_mapping_mut)
            .ok_or_else(|| HoistError::StructuralPrecondition {
                path: path.join("."),
                count,
            })?;

        if let Some(name) = self.entries.keys().find(|name| table.contains_key(*name)) {
            return Err(HoistError::NameCollision { name: name.clone() });
        }

        let names = self.names();
        let existing = std::mem::take(table);
        let mut merged: BTreeMap<String, Node> = existing.into_iter().collect();
        merged.extend(self.entries);
        *table = merged.into_iter().collect::<IndexMap<_, _>>();

        info!(count, "merged extracted definitions");
        Ok(names)
    }
}
