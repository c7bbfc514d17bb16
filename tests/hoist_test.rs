//! Integration tests for inline schema hoisting.

use oas_hoist::{
    check_equivalence, find_divergence, hoist, Divergence, HoistError, HoistOptions, Node,
    OutputFormat, Side,
};
use pretty_assertions::assert_eq;

const LIST_ITEMS: &str = r#"
openapi: 3.0.3
info:
  title: Items
  version: '1.0'
paths:
  /items:
    get:
      operationId: listItems
      responses:
        200:
          description: A page of items
          content:
            application/json:
              schema:
                type: object
                properties:
                  items:
                    type: array
                    items:
                      $ref: '#/components/schemas/Item'
                  pageToken:
                    type: string
components:
  schemas:
    Item:
      type: object
      properties:
        id:
          type: string
"#;

fn parse(text: &str) -> Node {
    Node::parse(text).unwrap()
}

fn schema_at<'a>(doc: &'a Node, keys: &[&str]) -> &'a Node {
    doc.lookup(keys)
        .unwrap_or_else(|| panic!("nothing at {:?}", keys))
}

// === End-to-end scenario ===

mod scenario {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn list_items_response_is_hoisted() {
        let hoisted = hoist(LIST_ITEMS, &HoistOptions::new()).unwrap();
        assert_eq!(hoisted.report.extracted, vec!["ListItems200Response"]);

        let doc = parse(&hoisted.document);
        let schema = schema_at(
            &doc,
            &[
                "paths",
                "/items",
                "get",
                "responses",
                "200",
                "content",
                "application/json",
                "schema",
            ],
        );
        assert_eq!(
            schema,
            &Node::reference("#/components/schemas/ListItems200Response")
        );

        let extracted = schema_at(&doc, &["components", "schemas", "ListItems200Response"]);
        assert_eq!(
            extracted.lookup(&["properties", "items", "items"]),
            Some(&Node::reference("#/components/schemas/Item"))
        );
        assert_eq!(
            extracted.lookup(&["properties", "pageToken", "type"]),
            Some(&Node::string("string"))
        );
    }

    #[test]
    fn definitions_table_is_sorted() {
        let source = LIST_ITEMS.replace("    Item:\n", "    Zulu: { type: string }\n    Item:\n");
        let hoisted = hoist(&source, &HoistOptions::new()).unwrap();
        let doc = parse(&hoisted.document);
        let keys: Vec<&String> = schema_at(&doc, &["components", "schemas"])
            .as_mapping()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(keys, vec!["Item", "ListItems200Response", "Zulu"]);
    }

    #[test]
    fn output_is_deterministic() {
        let first = hoist(LIST_ITEMS, &HoistOptions::new()).unwrap();
        let second = hoist(LIST_ITEMS, &HoistOptions::new()).unwrap();
        assert_eq!(first.document, second.document);
    }

    #[test]
    fn hoisting_twice_extracts_nothing_new() {
        let first = hoist(LIST_ITEMS, &HoistOptions::new()).unwrap();
        let second = hoist(&first.document, &HoistOptions::new()).unwrap();
        assert!(second.report.is_empty());
        assert_eq!(parse(&second.document), parse(&first.document));
    }

    #[test]
    fn json_input_is_accepted() {
        let json: serde_json::Value = serde_yaml::from_str(
            "paths:\n  /a:\n    post:\n      operationId: makeA\n      requestBody:\n        content:\n          application/json:\n            schema:\n              properties:\n                x: { type: integer }\ncomponents:\n  schemas: {}\n",
        )
        .unwrap();
        let source = serde_json::to_string_pretty(&json).unwrap();

        let options = HoistOptions::new().format(OutputFormat::Json);
        let hoisted = hoist(&source, &options).unwrap();
        assert_eq!(hoisted.report.extracted, vec!["MakeARequestBody"]);
        let out: serde_json::Value = serde_json::from_str(&hoisted.document).unwrap();
        assert_eq!(
            out["paths"]["/a"]["post"]["requestBody"]["content"]["application/json"]["schema"],
            serde_json::json!({ "$ref": "#/components/schemas/MakeARequestBody" })
        );
    }
}

// === Documentation preservation ===

mod documentation {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOCUMENTED: &str = r#"
paths:
  /orders:
    post:
      operationId: placeOrder
      requestBody:
        content:
          application/json:
            schema:
              description: The order to place
              properties:
                shipTo:
                  description: Where the parcel goes
                  properties:
                    street: { type: string }
components:
  schemas: {}
"#;

    #[test]
    fn property_site_keeps_description_in_wrapper() {
        let hoisted = hoist(DOCUMENTED, &HoistOptions::new()).unwrap();
        let doc = parse(&hoisted.document);

        let ship_to = schema_at(
            &doc,
            &[
                "components",
                "schemas",
                "PlaceOrderRequestBody",
                "properties",
                "shipTo",
            ],
        );
        assert_eq!(ship_to.description(), Some("Where the parcel goes"));
        assert_eq!(
            ship_to.get("allOf"),
            Some(&Node::Sequence(vec![Node::reference(
                "#/components/schemas/PlaceOrderRequestBodyShipTo"
            )]))
        );
    }

    #[test]
    fn content_site_never_wraps() {
        let hoisted = hoist(DOCUMENTED, &HoistOptions::new()).unwrap();
        let doc = parse(&hoisted.document);

        let schema = schema_at(
            &doc,
            &[
                "paths",
                "/orders",
                "post",
                "requestBody",
                "content",
                "application/json",
                "schema",
            ],
        );
        assert_eq!(
            schema,
            &Node::reference("#/components/schemas/PlaceOrderRequestBody")
        );
        // The payload's own description lives on the definition
        assert_eq!(
            schema_at(&doc, &["components", "schemas", "PlaceOrderRequestBody"]).description(),
            Some("The order to place")
        );
    }

    #[test]
    fn other_sibling_metadata_is_dropped_at_property_site() {
        let source = DOCUMENTED.replace(
            "                  description: Where the parcel goes\n",
            "                  description: Where the parcel goes\n                  x-internal: true\n",
        );
        let hoisted = hoist(&source, &HoistOptions::new()).unwrap();
        let doc = parse(&hoisted.document);
        let ship_to = schema_at(
            &doc,
            &[
                "components",
                "schemas",
                "PlaceOrderRequestBody",
                "properties",
                "shipTo",
            ],
        );
        assert!(ship_to.get("x-internal").is_none());
    }
}

// === Equivalence ===

mod equivalence {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn untouched_document_is_equivalent() {
        assert!(check_equivalence(LIST_ITEMS, LIST_ITEMS, &HoistOptions::new()).is_ok());
    }

    #[test]
    fn corrupted_extracted_field_is_divergent() {
        let hoisted = hoist(LIST_ITEMS, &HoistOptions::new()).unwrap();
        let mut doc = parse(&hoisted.document);
        doc.lookup_mut(&[
            "components",
            "schemas",
            "ListItems200Response",
            "properties",
            "pageToken",
        ])
        .unwrap()
        .replace_child("type", Node::string("integer"));
        let corrupted = doc.render(OutputFormat::Yaml).unwrap();

        let err = check_equivalence(LIST_ITEMS, &corrupted, &HoistOptions::new()).unwrap_err();
        let HoistError::EquivalenceDivergence(divergence) = err else {
            panic!("expected divergence, got {:?}", err);
        };
        assert_eq!(
            divergence,
            Divergence::Mismatch {
                path: "/paths/~1items/get/responses/200/content/application~1json/schema/properties/pageToken/type".into(),
                original: "\"string\"".into(),
                transformed: "\"integer\"".into(),
            }
        );
    }

    #[test]
    fn corrupted_carried_over_definition_is_divergent() {
        let source = r#"
components:
  schemas:
    Account:
      properties:
        owner:
          properties:
            email: { type: string }
"#;
        let hoisted = hoist(source, &HoistOptions::new()).unwrap();
        let mut doc = parse(&hoisted.document);
        doc.lookup_mut(&["components", "schemas", "AccountOwner", "properties", "email"])
            .unwrap()
            .replace_child("type", Node::string("integer"));
        let corrupted = doc.render(OutputFormat::Yaml).unwrap();

        let divergence = find_divergence(source, &corrupted, &HoistOptions::new())
            .unwrap()
            .unwrap();
        assert_eq!(
            divergence.path(),
            "/components/schemas/Account/properties/owner/properties/email/type"
        );
    }

    #[test]
    fn dropped_property_is_reported_missing() {
        let hoisted = hoist(LIST_ITEMS, &HoistOptions::new()).unwrap();
        let mut doc = parse(&hoisted.document);
        doc.lookup_mut(&["components", "schemas", "ListItems200Response", "properties"])
            .and_then(Node::as_mapping_mut)
            .unwrap()
            .shift_remove("pageToken");
        let corrupted = doc.render(OutputFormat::Yaml).unwrap();

        let divergence = find_divergence(LIST_ITEMS, &corrupted, &HoistOptions::new())
            .unwrap()
            .unwrap();
        assert!(matches!(
            divergence,
            Divergence::Missing { side: Side::Original, ref path } if path.ends_with("/properties/pageToken")
        ));
    }

    #[test]
    fn recursive_definitions_hoist_and_verify() {
        let source = r#"
components:
  schemas:
    Tree:
      type: object
      properties:
        node:
          properties:
            label: { type: string }
            children:
              type: array
              items:
                $ref: '#/components/schemas/Tree'
paths:
  /trees:
    get:
      operationId: getForest
      responses:
        200:
          content:
            application/json:
              schema:
                properties:
                  roots:
                    type: array
                    items: { $ref: '#/components/schemas/Tree' }
"#;
        let hoisted = hoist(source, &HoistOptions::new()).unwrap();
        assert_eq!(
            hoisted.report.extracted,
            vec!["GetForest200Response", "TreeNode"]
        );
    }
}

// === Swagger 2 definitions table ===

#[test]
fn swagger_definitions_are_supported() {
    let source = r#"
swagger: '2.0'
definitions:
  Pet:
    properties:
      owner:
        properties:
          name: { type: string }
"#;
    let options = HoistOptions::new().definitions_path("definitions");
    let hoisted = hoist(source, &options).unwrap();
    assert_eq!(hoisted.report.extracted, vec!["PetOwner"]);
    assert!(hoisted.document.contains("#/definitions/PetOwner"));
}

// === Properties ===

mod properties {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn schema() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(json!({ "type": "string" })),
            Just(json!({ "type": "integer", "description": "a number" })),
            Just(json!({ "$ref": "#/components/schemas/Base" })),
        ];
        leaf.prop_recursive(4, 24, 3, |inner| {
            prop_oneof![
                proptest::collection::btree_map("[a-e]{1,3}", inner.clone(), 1..4).prop_map(
                    |props| json!({ "type": "object", "properties": props })
                ),
                proptest::collection::btree_map("[a-e]{1,3}", inner.clone(), 1..3).prop_map(
                    |props| json!({ "description": "documented", "properties": props })
                ),
                inner.clone().prop_map(|items| json!({ "type": "array", "items": items })),
                inner
                    .clone()
                    .prop_map(|value| json!({ "type": "object", "additionalProperties": value })),
                proptest::collection::vec(inner, 1..3).prop_map(|branches| json!({ "oneOf": branches })),
            ]
        })
    }

    fn document(definition: Value, payload: Value) -> String {
        let doc = json!({
            "paths": {
                "/things": {
                    "post": {
                        "operationId": "makeThing",
                        "requestBody": {
                            "content": { "application/json": { "schema": payload } }
                        },
                        "responses": { "201": { "description": "created" } }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Base": { "type": "object", "properties": { "id": { "type": "string" } } },
                    "Thing": definition
                }
            }
        });
        serde_yaml::to_string(&doc).unwrap()
    }

    proptest! {
        #[test]
        fn hoisting_preserves_equivalence(definition in schema(), payload in schema()) {
            let source = document(definition, payload);
            let hoisted = hoist(&source, &HoistOptions::new());
            prop_assert!(hoisted.is_ok(), "hoist failed: {:?}", hoisted.as_ref().err());

            let hoisted = hoisted.unwrap();
            let mut sorted = hoisted.report.extracted.clone();
            sorted.sort();
            sorted.dedup();
            prop_assert_eq!(&sorted, &hoisted.report.extracted);
        }

        #[test]
        fn every_document_is_equivalent_to_itself(definition in schema()) {
            let source = document(definition, json!({ "type": "string" }));
            prop_assert!(check_equivalence(&source, &source, &HoistOptions::new()).is_ok());
        }
    }
}
