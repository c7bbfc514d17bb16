//! OpenAPI Inline Schema Hoisting
//!
//! Rewrites an OpenAPI document so that every anonymous ("inline") object
//! schema becomes a named entry in `components/schemas`, referenced by `$ref`
//! from where it used to be. Code generators then emit one named type per
//! schema instead of inventing names or skipping nested types.
//!
//! Every run is checked: both documents are re-parsed, all references are
//! resolved, documentation-only fields are stripped, and the results must be
//! structurally identical. A divergent result is an error and is never written.
//!
//! # Example
//!
//! ```
//! use oas_hoist::{hoist, HoistOptions};
//!
//! let source = r#"
//! paths:
//!   /items:
//!     get:
//!       operationId: listItems
//!       responses:
//!         '200':
//!           description: A page of items
//!           content:
//!             application/json:
//!               schema:
//!                 type: object
//!                 properties:
//!                   pageToken: { type: string }
//! components:
//!   schemas: {}
//! "#;
//!
//! let hoisted = hoist(source, &HoistOptions::new()).unwrap();
//! assert_eq!(hoisted.report.extracted, vec!["ListItems200Response"]);
//! assert!(hoisted.document.contains("#/components/schemas/ListItems200Response"));
//! ```
//!
//! # Where inline schemas are found
//!
//! | Site | Replacement |
//! |------|-------------|
//! | property with `description` | `{ description, allOf: [$ref] }` |
//! | property without `description` | `$ref` |
//! | `items`, `additionalProperties` | `$ref` |
//! | response / request body `schema` | `$ref` |

mod equivalence;
mod error;
mod extractor;
mod hoist;
mod loader;
mod node;
mod registry;
mod types;

pub use equivalence::{check_equivalence, find_divergence};
pub use error::{Divergence, HoistError, Side};
pub use extractor::{
    extract, is_composition, is_inline_object, is_inline_object_array, pascal_case, Extractor,
};
pub use hoist::{hoist, hoist_to_file, Hoisted};
pub use loader::{is_url, load_document, load_document_auto};
pub use node::{Node, Scalar};
pub use registry::Registry;
pub use types::{HoistOptions, HoistReport, OutputFormat};

#[cfg(feature = "remote")]
pub use loader::load_document_url;
