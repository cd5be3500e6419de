//! JSON schema builders for MCP tools.

use super::CHUNK_MODES;
use serde_json::{Map, Value};

/// Build the schema describing the `summarize-pdf` tool input.
pub(crate) fn summarize_pdf_input_schema() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(
        "path".into(),
        string_schema("Path to a local .pdf file readable by the server"),
    );

    let mut mode_schema = Map::new();
    mode_schema.insert("type".into(), Value::String("string".into()));
    mode_schema.insert(
        "description".into(),
        Value::String("Segmentation mode; defaults to the configured CHUNK_MODE".into()),
    );
    mode_schema.insert(
        "enum".into(),
        Value::Array(
            CHUNK_MODES
                .into_iter()
                .map(|mode| Value::String(mode.into()))
                .collect(),
        ),
    );
    properties.insert("mode".into(), Value::Object(mode_schema));

    let mut sentences_schema = Map::new();
    sentences_schema.insert("type".into(), Value::String("integer".into()));
    sentences_schema.insert(
        "description".into(),
        Value::String("Sentences kept by the extractive summarizer".into()),
    );
    sentences_schema.insert("minimum".into(), Value::Number(1.into()));
    properties.insert("sentences".into(), Value::Object(sentences_schema));

    properties.insert(
        "force".into(),
        boolean_schema("Ignore cached and stored summaries and regenerate"),
    );
    properties.insert(
        "persist".into(),
        boolean_schema("Store the PDF and its summary in the configured backend"),
    );

    finalize_object_schema(properties, &["path"])
}

/// Schema representing an empty object (used for parameterless tools).
pub(crate) fn empty_object_schema() -> Map<String, Value> {
    finalize_object_schema(Map::new(), &[])
}

fn string_schema(description: &str) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("string".into()));
    schema.insert("description".into(), Value::String(description.into()));
    Value::Object(schema)
}

fn boolean_schema(description: &str) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("boolean".into()));
    schema.insert("description".into(), Value::String(description.into()));
    schema.insert("default".into(), Value::Bool(false));
    Value::Object(schema)
}

fn finalize_object_schema(properties: Map<String, Value>, required: &[&str]) -> Map<String, Value> {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("object".into()));
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert(
            "required".into(),
            Value::Array(
                required
                    .iter()
                    .map(|&key| Value::String(key.into()))
                    .collect(),
            ),
        );
    }
    schema.insert("additionalProperties".into(), Value::Bool(false));
    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_schema_requires_path_only() {
        let schema = summarize_pdf_input_schema();
        assert_eq!(schema["required"], serde_json::json!(["path"]));
        assert_eq!(schema["additionalProperties"], Value::Bool(false));
        let modes = schema["properties"]["mode"]["enum"]
            .as_array()
            .expect("mode enum");
        assert_eq!(modes.len(), 3);
    }

    #[test]
    fn empty_schema_has_no_required_list() {
        let schema = empty_object_schema();
        assert!(!schema.contains_key("required"));
        assert_eq!(schema["properties"], Value::Object(Map::new()));
    }
}
