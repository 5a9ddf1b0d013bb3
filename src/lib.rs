//! Narrative Schemas
//!
//! Prepares narrative engine module schemas for structured-output AI
//! generation.
//!
//! ## Features
//!
//! - **Strict Dialect Compilation**: Rewrites resolved JSON Schemas into the
//!   subset accepted by structured outputs (all properties required, optional
//!   ones nullable, no extra keys, limited types and formats)
//! - **Local Pruning**: Unsupported properties, items and `anyOf` branches are
//!   removed without failing their siblings
//! - **Module References**: `namespace:name@vX.Y.Z[-pre]` decoding and matching
//! - **Request Building**: JSON Schema response-format request bodies
//!
//! ## Pipeline
//!
//! ```text
//! resolved module schema
//!         │
//!         ▼
//!   compiler::compile ──► Unsupported ──► SchemaError::UnsupportedSchema
//!         │
//!         ▼ Supported
//!   StructuredOutputRequest ──► generation API ──► parse_completion
//! ```

pub mod compiler;
pub mod config;
pub mod error;
pub mod generation;
pub mod module;
pub mod schema;

pub use compiler::{compile, compile_optional, compile_value, Compiled};
pub use config::SchemaConfig;
pub use error::{Result, SchemaError};
pub use generation::{parse_completion, prepare_module_schema, StructuredOutputRequest};
pub use module::{compare_modules, versionless, ModuleRef};
pub use schema::{AdditionalProperties, Items, Schema, TypeTags};
