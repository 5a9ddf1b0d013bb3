//! Generation Request Tests
//!
//! End-to-end preparation of a module schema into a structured-output request,
//! and decoding of a reply that conforms to it.

use narrative_schemas::config::GenerationConfig;
use narrative_schemas::{
    compare_modules, parse_completion, ModuleRef, Schema, SchemaError, StructuredOutputRequest,
};
use serde_json::{json, Value};

fn character_schema() -> Schema {
    let doc: Value = serde_json::from_str(include_str!("fixtures/character_module.json")).unwrap();
    Schema::from_value(doc).unwrap()
}

#[test]
fn test_module_request_round_trip() {
    let module = ModuleRef::parse("story:character@v2.1.0-draft").unwrap();
    let config = GenerationConfig {
        model: "gpt-4o".to_string(),
        strict: true,
        system_prompt: Some("You help writers build consistent worlds.".to_string()),
    };

    let request = StructuredOutputRequest::for_module(
        &module,
        Some("Main character sheet".to_string()),
        character_schema(),
        "Create the protagonist of a gothic novel.",
        &config,
    )
    .unwrap();

    let body = serde_json::to_string(&request).unwrap();
    let decoded: StructuredOutputRequest = serde_json::from_str(&body).unwrap();
    assert_eq!(decoded, request);

    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["model"], json!("gpt-4o"));
    assert_eq!(body["response_format"]["json_schema"]["name"], json!("character"));
    assert_eq!(
        body["response_format"]["json_schema"]["schema"]["properties"]["email"]["type"],
        json!(["string", "null"])
    );
}

#[test]
fn test_unusable_module_schema() {
    let module = ModuleRef::parse("story:empty@v1.0.0").unwrap();
    let schema = Schema::from_value(json!({
        "type": "object",
        "properties": {"link": {"type": "string", "format": "uri"}}
    }))
    .unwrap();

    let err = StructuredOutputRequest::for_module(
        &module,
        None,
        schema,
        "Fill it.",
        &GenerationConfig::default(),
    )
    .unwrap_err();

    assert!(matches!(err, SchemaError::UnsupportedSchema { .. }));
    assert_eq!(
        err.to_string(),
        "Schema of module story:empty@v1.0.0 cannot be used for AI generation"
    );
}

#[test]
fn test_completion_matches_module_fields() {
    let data = parse_completion(
        r#"{
            "name": "Ada",
            "age": 36,
            "email": null,
            "birthday": null,
            "role": "protagonist",
            "traits": [{"label": "curious", "intensity": null}],
            "origin": null,
            "coordinates": null,
            "notes": null
        }"#,
    )
    .unwrap();

    let request = StructuredOutputRequest::for_module(
        &ModuleRef::decode("story:character@v1.0.0"),
        None,
        character_schema(),
        "Create the protagonist.",
        &GenerationConfig::default(),
    )
    .unwrap();

    for name in &request.schema().required {
        assert!(data.contains_key(name), "missing {name}");
    }
}

#[test]
fn test_module_versions_match_versionless_reference() {
    let module = ModuleRef::parse("story:character@v2.1.0-draft").unwrap();
    assert!(compare_modules("story:character", &module.to_string()));
    assert!(!compare_modules("story:character@v2.1.0", &module.to_string()));
}
