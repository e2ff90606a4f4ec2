//! Integration tests for OpenAPI to Cedar schema mapping.

use cedar_openapi_schema::{
    generate_schema, load_spec, validate_schema, AuthMapping, MappingError, MappingOptions,
    SchemaType,
};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn generate(spec: &Value, namespace: &str) -> (Value, Value) {
    let mapping = generate_schema(spec, &MappingOptions::new(namespace)).unwrap();
    (
        mapping.legacy().to_value().unwrap(),
        mapping.annotated().to_value().unwrap(),
    )
}

/// Both projections must be accepted by Cedar's schema parser.
fn assert_cedar_accepts(mapping: &AuthMapping) {
    let legacy = mapping.legacy().to_value().unwrap();
    let annotated = mapping.annotated().to_value().unwrap();
    if let Err(e) = validate_schema(&legacy) {
        panic!("legacy schema rejected by Cedar: {e}\n{legacy:#}");
    }
    if let Err(e) = validate_schema(&annotated) {
        panic!("annotated schema rejected by Cedar: {e}\n{annotated:#}");
    }
}

const VERBS: [&str; 5] = ["get", "post", "put", "patch", "delete"];

/// Leaf common types every generated `$ref` points at.
const REF_TARGETS: usize = 3;

/// Paths as (segments, verbs) pairs.
fn path_definitions() -> impl Strategy<Value = Vec<(Vec<String>, Vec<&'static str>)>> {
    prop::collection::vec(
        (
            prop::collection::vec("[-_a-zA-Z]{1,10}", 1..25),
            prop::sample::subsequence(VERBS.to_vec(), 1..=VERBS.len()),
        ),
        10..25,
    )
}

/// Schema trees of primitives, arrays, objects and references to `T<n>`.
fn schema_tree() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        prop::sample::select(vec!["string", "number", "integer", "boolean"])
            .prop_map(|ty| json!({ "type": ty })),
        (0..REF_TARGETS).prop_map(|i| json!({ "$ref": format!("#/components/schemas/T{}", i) })),
    ];
    leaf.prop_recursive(5, 48, 4, |inner| {
        prop_oneof![
            inner
                .clone()
                .prop_map(|items| json!({ "type": "array", "items": items })),
            prop::collection::btree_map("[a-z]{1,10}", inner, 0..4)
                .prop_map(|properties| json!({ "type": "object", "properties": properties })),
        ]
    })
}

/// Reusable schemas keyed by name, plus the string-typed `T<n>` reference targets.
fn reusable_schemas() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("c_[a-z]{1,10}", schema_tree(), 0..8).prop_map(|generated| {
        let mut schemas: Map<String, Value> = generated.into_iter().collect();
        for i in 0..REF_TARGETS {
            schemas.insert(format!("T{}", i), json!({ "type": "string" }));
        }
        schemas
    })
}

mod examples {
    use super::*;

    #[test]
    fn get_user_by_id() {
        let spec = json!({
            "openapi": "3.0.0",
            "paths": {
                "/users": {
                    "get": { "operationId": "getUsers" },
                    "post": { "operationId": "createUser" }
                },
                "/users/{id}": {
                    "get": {
                        "operationId": "getUserById",
                        "x-cedar": { "appliesToResourceTypes": ["User"] },
                        "parameters": [
                            { "name": "id", "in": "path", "required": true, "schema": { "type": "string" } }
                        ]
                    }
                }
            }
        });
        let (_, annotated) = generate(&spec, "TestAPI");
        let actions = &annotated["TestAPI"]["actions"];

        assert_eq!(actions["getUserById"]["appliesTo"]["resourceTypes"], json!(["User"]));
        assert_eq!(actions["getUserById"]["appliesTo"]["principalTypes"], json!(["User"]));
        assert_eq!(
            actions["getUserById"]["appliesTo"]["context"]["attributes"]["pathParameters"]
                ["attributes"]["id"],
            json!({ "type": "String", "required": true })
        );
        assert_eq!(actions["getUsers"]["annotations"]["httpVerb"], "get");
        assert_eq!(actions["createUser"]["annotations"]["httpVerb"], "post");
        assert_eq!(
            actions["getUserById"]["annotations"]["httpPathTemplate"],
            "/users/{id}"
        );
    }

    #[test]
    fn nested_common_types() {
        let spec = json!({
            "paths": {
                "/users": {
                    "get": {
                        "operationId": "getUsers",
                        "x-cedar": { "appliesToResourceTypes": ["Spine"] }
                    }
                }
            },
            "components": {
                "schemas": {
                    "T1": { "$ref": "#/components/schemas/T2" },
                    "T2": { "type": "array", "items": { "$ref": "#/components/schemas/T3" } },
                    "T3": { "type": "string" },
                    "Marrow": {
                        "type": "array",
                        "items": {
                            "type": "array",
                            "items": { "type": "array", "items": { "$ref": "#/components/schemas/T1" } }
                        }
                    },
                    "Bone": { "type": "array", "items": { "type": "string" } },
                    "Spine": {
                        "type": "object",
                        "properties": {
                            "spineprop1": {
                                "type": "object",
                                "properties": {
                                    "doublenested1": { "$ref": "#/components/schemas/T3" },
                                    "doublenested2": { "type": "array", "items": { "type": "integer" } }
                                }
                            }
                        }
                    },
                    "Skull": { "type": "boolean" }
                }
            }
        });
        let (legacy, _) = generate(&spec, "TestAPI");
        let namespace = &legacy["TestAPI"];

        let mut common: Vec<&str> = namespace["commonTypes"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        common.sort();
        assert_eq!(common, vec!["Bone", "Marrow", "Skull", "Spine", "T1", "T2", "T3"]);

        let mut entities: Vec<&str> = namespace["entityTypes"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        entities.sort();
        assert_eq!(entities, vec!["Application", "Spine", "User", "UserGroup"]);

        assert_eq!(
            namespace["entityTypes"]["Spine"],
            json!({ "shape": { "type": "Spine" }, "memberOfTypes": [] })
        );
        assert_eq!(
            namespace["commonTypes"]["Spine"]["attributes"]["spineprop1"]["attributes"]
                ["doublenested2"],
            json!({ "type": "Set", "element": { "type": "Long" } })
        );
        assert_eq!(
            namespace["commonTypes"]["Marrow"]["element"]["element"]["element"],
            json!({ "type": "T1" })
        );
    }

    #[test]
    fn two_servers_without_base_path_are_ambiguous() {
        let spec = json!({
            "servers": [
                { "url": "https://prod.example.com/v1" },
                { "url": "https://sandbox.example.com/v1" }
            ],
            "paths": { "/users": { "get": {} } }
        });
        let result = generate_schema(&spec, &MappingOptions::new("App"));
        assert!(matches!(
            result,
            Err(MappingError::AmbiguousServers { count: 2 })
        ));
    }

    #[test]
    fn two_servers_with_base_path_prefix_templates() {
        let spec = json!({
            "servers": [
                { "url": "https://example.com/v1" },
                { "url": "https://example.com/v2" }
            ],
            "paths": { "/users": { "get": { "operationId": "listUsers" } } }
        });
        let mapping =
            generate_schema(&spec, &MappingOptions::new("App").base_path("/v2/")).unwrap();
        assert_eq!(
            mapping.schema().actions["listUsers"].annotations.http_path_template,
            "/v2/users"
        );
    }

    #[test]
    fn single_server_base_path() {
        let spec = json!({
            "servers": [{ "url": "http://host/api/v1/" }],
            "paths": { "/users": { "get": {} } }
        });
        let (_, annotated) = generate(&spec, "App");
        assert_eq!(
            annotated["App"]["actions"]["get /users"]["annotations"]["httpPathTemplate"],
            "/api/v1/users"
        );
    }

    #[test]
    fn any_method_marker_only_maps_declared_verbs() {
        let spec = json!({
            "paths": {
                "/proxy": {
                    "x-amazon-apigateway-any-method": { "operationId": "proxyAll" }
                },
                "/mixed": {
                    "x-amazon-apigateway-any-method": {},
                    "patch": { "operationId": "patchMixed" }
                }
            }
        });
        let mapping = generate_schema(&spec, &MappingOptions::new("App")).unwrap();
        let names: Vec<&str> = mapping.schema().actions.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["patchMixed"]);
    }
}

mod errors {
    use super::*;

    #[test]
    fn composition_in_common_types_is_rejected() {
        let spec = json!({
            "paths": {},
            "components": {
                "schemas": {
                    "Animal": { "oneOf": [{ "$ref": "#/components/schemas/Cat" }] }
                }
            }
        });
        assert!(matches!(
            generate_schema(&spec, &MappingOptions::new("App")),
            Err(MappingError::UnsupportedSchemaShape { name, .. }) if name == "Animal"
        ));
    }

    #[test]
    fn malformed_extension_aborts_mapping() {
        let spec = json!({
            "paths": {
                "/users": {
                    "get": {
                        "operationId": "getUsers",
                        "x-cedar": { "appliesToResourceTypes": [1, 2] }
                    }
                }
            }
        });
        assert!(matches!(
            generate_schema(&spec, &MappingOptions::new("App")),
            Err(MappingError::InvalidCedarExtension { action, .. }) if action == "getUsers"
        ));
    }

    #[test]
    fn ref_outside_components_is_rejected() {
        let spec = json!({
            "paths": {
                "/users": {
                    "get": {
                        "parameters": [
                            { "name": "q", "in": "query",
                              "schema": { "$ref": "https://example.com/schemas.json#/Query" } }
                        ]
                    }
                }
            }
        });
        assert!(matches!(
            generate_schema(&spec, &MappingOptions::new("App")),
            Err(MappingError::UnsupportedRef { name, .. }) if name == "q"
        ));
    }

    #[test]
    fn dangling_ref_is_rejected() {
        let spec = json!({
            "paths": {},
            "components": {
                "schemas": { "A": { "$ref": "#/components/schemas/Missing" } }
            }
        });
        assert!(matches!(
            generate_schema(&spec, &MappingOptions::new("App")),
            Err(MappingError::UnsupportedRef { name, reference })
                if name == "A" && reference == "#/components/schemas/Missing"
        ));
    }

    #[test]
    fn dangling_ref_in_parameter_is_rejected() {
        let spec = json!({
            "paths": {
                "/pets": {
                    "get": {
                        "parameters": [
                            { "name": "filter", "in": "query",
                              "schema": { "$ref": "#/components/schemas/Filter" } }
                        ]
                    }
                }
            },
            "components": { "schemas": { "Pet": { "type": "object" } } }
        });
        assert!(matches!(
            generate_schema(&spec, &MappingOptions::new("App")),
            Err(MappingError::UnsupportedRef { name, .. }) if name == "filter"
        ));
    }

    #[test]
    fn base_path_must_match_a_server() {
        let spec = json!({
            "servers": [{ "url": "https://example.com/v1" }],
            "paths": {}
        });
        assert!(matches!(
            generate_schema(&spec, &MappingOptions::new("App").base_path("/v9")),
            Err(MappingError::BasePathMismatch { .. })
        ));
    }
}

mod properties {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn action_count_matches_operation_count(definitions in path_definitions()) {
            let mut paths = Map::new();
            for (segments, verbs) in &definitions {
                let item: Map<String, Value> = verbs
                    .iter()
                    .map(|verb| {
                        let operation = json!({ "responses": { "200": { "description": "OK" } } });
                        (verb.to_string(), operation)
                    })
                    .collect();
                paths.insert(format!("/{}", segments.join("/")), Value::Object(item));
            }
            let operations: usize = paths
                .values()
                .filter_map(Value::as_object)
                .map(Map::len)
                .sum();
            let spec = json!({ "openapi": "3.0.0", "paths": paths });

            let mapping = generate_schema(&spec, &MappingOptions::new("NS")).unwrap();
            let legacy = mapping.legacy().to_value().unwrap();
            let annotated = mapping.annotated().to_value().unwrap();
            prop_assert_eq!(legacy["NS"]["actions"].as_object().unwrap().len(), operations);
            prop_assert_eq!(annotated["NS"]["actions"].as_object().unwrap().len(), operations);
            assert_cedar_accepts(&mapping);
        }

        #[test]
        fn every_reusable_schema_becomes_one_common_type(schemas in reusable_schemas()) {
            let declared: Vec<String> = schemas.keys().cloned().collect();
            let spec = json!({ "paths": {}, "components": { "schemas": schemas } });

            let mapping = generate_schema(&spec, &MappingOptions::new("NS")).unwrap();
            let common: Vec<String> = mapping.schema().common_types.keys().cloned().collect();
            prop_assert_eq!(common, declared);
            assert_cedar_accepts(&mapping);
        }

        #[test]
        fn generation_is_idempotent(
            schemas in reusable_schemas(),
            definitions in path_definitions()
        ) {
            let paths: Map<String, Value> = definitions
                .iter()
                .map(|(segments, verbs)| {
                    let item: Map<String, Value> =
                        verbs.iter().map(|verb| (verb.to_string(), json!({}))).collect();
                    (format!("/{}", segments.join("/")), Value::Object(item))
                })
                .collect();
            let spec = json!({ "paths": paths, "components": { "schemas": schemas } });
            let options = MappingOptions::new("NS");

            let first = generate_schema(&spec, &options).unwrap();
            let second = generate_schema(&spec, &options).unwrap();
            prop_assert_eq!(first.legacy_json().unwrap(), second.legacy_json().unwrap());
            prop_assert_eq!(first.annotated_json().unwrap(), second.annotated_json().unwrap());
        }
    }

    #[test]
    fn fixture_generation_is_idempotent() {
        let spec = load_spec(std::path::Path::new("tests/fixtures/petstore.json")).unwrap();
        let options = MappingOptions::new("PetStore");

        let first = generate_schema(&spec, &options).unwrap();
        let second = generate_schema(&spec, &options).unwrap();
        assert_eq!(first.legacy_json().unwrap(), second.legacy_json().unwrap());
        assert_eq!(first.annotated_json().unwrap(), second.annotated_json().unwrap());
    }
}

mod fixtures {
    use super::*;

    fn petstore() -> Value {
        load_spec(std::path::Path::new("tests/fixtures/petstore.json")).unwrap()
    }

    #[test]
    fn petstore_actions_in_declaration_order() {
        let mapping = generate_schema(&petstore(), &MappingOptions::new("PetStore")).unwrap();
        let names: Vec<&str> = mapping.schema().actions.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec!["listPets", "createPet", "getPet", "delete /pets/{petId}", "getInventory"]
        );
    }

    #[test]
    fn petstore_entities_and_context() {
        let mapping = generate_schema(&petstore(), &MappingOptions::new("PetStore")).unwrap();
        let schema = mapping.schema();

        let entities: Vec<&str> = schema.entity_types.keys().map(String::as_str).collect();
        assert_eq!(entities, vec!["User", "UserGroup", "Application", "Pet", "Store"]);
        assert_eq!(schema.entity_types["Pet"].shape, SchemaType::reference("Pet"));
        assert_eq!(schema.entity_types["Store"].shape, SchemaType::empty_record());
        assert_eq!(schema.base_path, "/api/v1");

        let context = mapping.legacy().to_value().unwrap()["PetStore"]["actions"]["listPets"]
            ["appliesTo"]["context"]
            .clone();
        assert_eq!(
            context,
            json!({
                "type": "Record",
                "attributes": {
                    "pathParameters": { "type": "Record", "attributes": {} },
                    "queryStringParameters": {
                        "type": "Record",
                        "attributes": {
                            "limit": { "type": "Long" },
                            "tags": { "type": "Set", "element": { "type": "String" } }
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn petstore_schemas_parse_with_cedar() {
        let mapping = generate_schema(&petstore(), &MappingOptions::new("PetStore")).unwrap();
        assert_cedar_accepts(&mapping);
    }

    #[test]
    fn petstore_annotated_paths_include_base_path() {
        let mapping = generate_schema(&petstore(), &MappingOptions::new("PetStore")).unwrap();
        let annotated = mapping.annotated().to_value().unwrap();
        assert_eq!(
            annotated["PetStore"]["actions"]["delete /pets/{petId}"]["annotations"],
            json!({ "httpVerb": "delete", "httpPathTemplate": "/api/v1/pets/{petId}" })
        );
    }

    #[test]
    fn legacy_json_key_order() {
        let mapping = generate_schema(&petstore(), &MappingOptions::new("PetStore")).unwrap();
        let legacy = mapping.legacy_json().unwrap();

        let entity = legacy.find("\"entityTypes\"").unwrap();
        let actions = legacy.find("\"actions\"").unwrap();
        let common = legacy.find("\"commonTypes\"").unwrap();
        assert!(entity < actions && actions < common);
        assert!(!legacy.contains("\"annotations\""));
        assert!(!legacy.contains("\"required\": false"));
    }
}
