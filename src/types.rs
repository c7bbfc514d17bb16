//! Core types and vocabulary for schema hoisting.

use serde::Serialize;

/// Key marking a node as a pointer to a named definition.
pub const REF_KEY: &str = "$ref";

/// Composition keywords, in the order branches are walked.
pub const COMPOSITION_KEYS: &[&str] = &["allOf", "anyOf", "oneOf"];

/// Fields that carry documentation only and never affect generated types.
pub const DOC_FIELDS: &[&str] = &["description", "example"];

/// Operation keys under a path item.
pub const HTTP_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Default location of the definitions table (OpenAPI 3).
pub const DEFAULT_DEFINITIONS_PATH: &str = "components/schemas";

/// Serialized form of the emitted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl OutputFormat {
    /// Parse a format name (case-insensitive).
    ///
    /// Returns `None` for unknown values (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(OutputFormat::Yaml),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Options for a hoisting run.
#[derive(Debug, Clone)]
pub struct HoistOptions {
    /// Key path of the definitions table, e.g. `["components", "schemas"]`.
    pub definitions_path: Vec<String>,
    /// Output serialization.
    pub format: OutputFormat,
}

impl Default for HoistOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl HoistOptions {
    /// Options for an OpenAPI 3 document emitted as YAML.
    pub fn new() -> Self {
        Self {
            definitions_path: split_path(DEFAULT_DEFINITIONS_PATH),
            format: OutputFormat::Yaml,
        }
    }

    /// Set the definitions table location as a slash-separated key path
    /// (`components/schemas`, or `definitions` for Swagger 2).
    pub fn definitions_path(mut self, path: &str) -> Self {
        self.definitions_path = split_path(path);
        self
    }

    /// Set the output format.
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Prefix of a `$ref` pointing into the definitions table,
    /// e.g. `#/components/schemas/`.
    pub fn ref_prefix(&self) -> String {
        let mut prefix = String::from("#/");
        for segment in &self.definitions_path {
            prefix.push_str(&escape_pointer(segment));
            prefix.push('/');
        }
        prefix
    }

    /// Build a `$ref` string for a definition name.
    pub fn ref_to(&self, name: &str) -> String {
        format!("{}{}", self.ref_prefix(), escape_pointer(name))
    }

    /// Extract the definition name from a `$ref`, if it points into the
    /// definitions table.
    pub fn definition_name(&self, reference: &str) -> Option<String> {
        let prefix = self.ref_prefix();
        let name = reference.strip_prefix(prefix.as_str())?;
        if name.is_empty() || name.contains('/') {
            return None;
        }
        Some(unescape_pointer(name))
    }

    /// Definitions path as borrowed segments, for tree lookups.
    pub fn definitions_keys(&self) -> Vec<&str> {
        self.definitions_path.iter().map(String::as_str).collect()
    }
}

/// Extraction summary for operator visibility.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HoistReport {
    /// Names of newly minted definitions, sorted.
    pub extracted: Vec<String>,
}

impl HoistReport {
    pub fn count(&self) -> usize {
        self.extracted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extracted.is_empty()
    }
}

/// Escape a JSON Pointer segment (RFC 6901).
pub fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Unescape a JSON Pointer segment (`~1` = `/`, `~0` = `~`).
pub fn unescape_pointer(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

fn split_path(path: &str) -> Vec<String> {
    path.trim_start_matches('#')
        .split('/')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
