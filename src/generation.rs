//! Structured-output generation requests
//!
//! Prepares a module schema for AI generation and wraps it into the request
//! body expected by a chat-completion API in JSON Schema response mode. The
//! HTTP exchange itself happens elsewhere; this module only builds the body
//! and decodes the model's reply.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::compiler::{compile, Compiled};
use crate::config::GenerationConfig;
use crate::error::{Result, SchemaError};
use crate::module::ModuleRef;
use crate::schema::Schema;

/// Compile a module schema, failing when nothing of it can be generated
pub fn prepare_module_schema(module: &ModuleRef, schema: Schema) -> Result<Schema> {
    match compile(schema) {
        Compiled::Supported(schema) => {
            info!(module = %module, properties = schema.properties.len(), "module schema prepared");
            Ok(schema)
        }
        Compiled::Unsupported => {
            warn!(module = %module, "module schema cannot be used for generation");
            Err(SchemaError::UnsupportedSchema {
                module: module.to_string(),
            })
        }
    }
}

/// Chat message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// `response_format` of a chat-completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    JsonSchema { json_schema: JsonSchemaFormat },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSchemaFormat {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: Schema,
    pub strict: bool,
}

/// A chat-completion request constrained to a module schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredOutputRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub response_format: ResponseFormat,
}

impl StructuredOutputRequest {
    /// Build the request for a module. The raw module schema is compiled here.
    pub fn for_module(
        module: &ModuleRef,
        description: Option<String>,
        schema: Schema,
        prompt: impl Into<String>,
        config: &GenerationConfig,
    ) -> Result<Self> {
        let schema = prepare_module_schema(module, schema)?;

        let mut messages = Vec::with_capacity(2);
        if let Some(system_prompt) = &config.system_prompt {
            messages.push(ChatMessage::system(system_prompt.clone()));
        }
        messages.push(ChatMessage::user(prompt));

        Ok(Self {
            model: config.model.clone(),
            messages,
            response_format: ResponseFormat::JsonSchema {
                json_schema: JsonSchemaFormat {
                    name: module.module.clone(),
                    description: description.filter(|d| !d.is_empty()),
                    schema,
                    strict: config.strict,
                },
            },
        })
    }

    /// The compiled schema carried by this request
    pub fn schema(&self) -> &Schema {
        match &self.response_format {
            ResponseFormat::JsonSchema { json_schema } => &json_schema.schema,
        }
    }
}

/// Decode the model's reply into the generated module data
pub fn parse_completion(content: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(content)? {
        Value::Object(data) => Ok(data),
        other => Err(SchemaError::InvalidCompletion(format!(
            "expected a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
