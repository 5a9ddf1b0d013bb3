//! Structured-output schema compiler
//!
//! Rewrites a resolved JSON Schema into the strict dialect accepted by
//! structured-output ("strict mode") generation:
//!
//! - every object property is listed in `required`; properties that were
//!   optional become nullable instead
//! - objects reject unknown keys (`additionalProperties: {"not": {}}`)
//! - only [`SUPPORTED_TYPES`] and [`SUPPORTED_FORMATS`] survive
//! - `anyOf` is the only composition keyword allowed
//!
//! Unsupported sub-schemas are pruned where they stand: a bad property removes
//! that property, a bad `anyOf` branch removes that branch. Only the root
//! itself can make a whole document unusable.
//!
//! The input must be acyclic and `$ref`-free. Recursion depth equals nesting
//! depth, so pathologically deep documents can exhaust the stack.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::schema::{
    AdditionalProperties, Items, Schema, TypeTags, SUPPORTED_FORMATS, SUPPORTED_TYPES, TYPE_ARRAY,
    TYPE_NULL, TYPE_OBJECT,
};

const ROOT: &str = "#";

/// Outcome of compiling one schema node
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum Compiled {
    /// The node in canonical structured-output form
    Supported(Schema),
    /// The node cannot be expressed; its parent must drop it
    Unsupported,
}

impl Compiled {
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Supported(_))
    }

    pub fn supported(&self) -> Option<&Schema> {
        match self {
            Self::Supported(schema) => Some(schema),
            Self::Unsupported => None,
        }
    }

    pub fn into_option(self) -> Option<Schema> {
        match self {
            Self::Supported(schema) => Some(schema),
            Self::Unsupported => None,
        }
    }
}

/// Compile a schema into its structured-output form
pub fn compile(schema: Schema) -> Compiled {
    compile_at(schema, ROOT)
}

/// Compile a possibly absent schema; an absent schema has nothing to keep
pub fn compile_optional(schema: Option<Schema>) -> Compiled {
    match schema {
        Some(schema) => compile(schema),
        None => Compiled::Unsupported,
    }
}

/// Decode a JSON document and compile it
pub fn compile_value(value: Value) -> Result<Compiled> {
    Ok(compile(Schema::from_value(value)?))
}

fn compile_at(mut schema: Schema, path: &str) -> Compiled {
    // anyOf replaces the whole node.
    if schema.is_any_of() {
        let alternatives: Vec<Schema> = std::mem::take(&mut schema.any_of)
            .into_iter()
            .enumerate()
            .filter_map(|(i, alternative)| {
                compile_at(alternative, &format!("{path}/anyOf/{i}")).into_option()
            })
            .collect();

        if alternatives.is_empty() {
            return reject(path, "no anyOf alternative is supported");
        }

        return Compiled::Supported(Schema {
            any_of: alternatives,
            ..Schema::default()
        });
    }

    let Some(type_tags) = resolve_types(std::mem::take(&mut schema.type_tags)) else {
        return reject(path, "no supported type");
    };

    if let Some(keyword) = vetoed_keyword(&schema) {
        return reject(path, keyword);
    }

    let format = schema.format.take().filter(|f| !f.is_empty());
    if let Some(format) = &format {
        if !SUPPORTED_FORMATS.contains(&format.as_str()) {
            debug!(path, format = %format, "pruning schema with unsupported format");
            return Compiled::Unsupported;
        }
    }

    let is_object = type_tags.contains(TYPE_OBJECT);
    let is_array = type_tags.contains(TYPE_ARRAY);

    let mut properties = IndexMap::new();
    let mut required = Vec::new();
    if is_object {
        for (name, property) in std::mem::take(&mut schema.properties) {
            let Compiled::Supported(mut property) =
                compile_at(property, &format!("{path}/properties/{name}"))
            else {
                continue;
            };

            if !schema.required.contains(&name) {
                widen_nullable(&mut property);
            }
            properties.insert(name, property);
        }

        if properties.is_empty() {
            return reject(path, "object has no supported property");
        }
        required = properties.keys().cloned().collect();
    }

    let mut items = None;
    if is_array {
        items = match schema.items.take() {
            Some(Items::Single(item)) => match compile_at(*item, &format!("{path}/items")) {
                Compiled::Supported(item) => Some(Items::Single(Box::new(item))),
                Compiled::Unsupported => return reject(path, "array items are not supported"),
            },
            Some(Items::Tuple(elements)) => {
                let elements: Vec<Schema> = elements
                    .into_iter()
                    .enumerate()
                    .filter_map(|(i, element)| {
                        compile_at(element, &format!("{path}/items/{i}")).into_option()
                    })
                    .collect();
                if elements.is_empty() {
                    return reject(path, "no tuple item is supported");
                }
                Some(Items::Tuple(elements))
            }
            None => return reject(path, "array declares no items"),
        };
    }

    // Rebuild from the allowed keywords only.
    Compiled::Supported(Schema {
        type_tags,

        min_length: schema.min_length,
        max_length: schema.max_length,
        pattern: schema.pattern,
        format,

        multiple_of: schema.multiple_of,
        maximum: schema.maximum,
        exclusive_maximum: schema.exclusive_maximum,
        minimum: schema.minimum,
        exclusive_minimum: schema.exclusive_minimum,

        min_items: schema.min_items,
        max_items: schema.max_items,
        items,

        properties,
        required,
        additional_properties: is_object.then(AdditionalProperties::nothing),

        examples: schema.examples,

        ..Schema::default()
    })
}

/// Filter the declared types down to the supported vocabulary.
///
/// The list and the scalar are unioned as-is: a type named by both counts
/// twice, so `"object"` plus `["object"]` resolves to a two-entry list.
fn resolve_types(tags: TypeTags) -> Option<TypeTags> {
    let mut supported: Vec<String> = tags
        .list
        .into_iter()
        .chain(tags.scalar)
        .filter(|t| SUPPORTED_TYPES.contains(&t.as_str()))
        .collect();

    match supported.len() {
        0 => None,
        1 => supported.pop().map(TypeTags::single),
        _ => Some(TypeTags::many(supported)),
    }
}

fn vetoed_keyword(schema: &Schema) -> Option<&'static str> {
    let vetoes = [
        (schema.r#const.is_some(), "const"),
        (schema.contains.is_some(), "contains"),
        (schema.unique_items, "uniqueItems"),
        (schema.deprecated, "deprecated"),
        (schema.read_only, "readOnly"),
        (schema.pattern_properties.is_some(), "patternProperties"),
        (schema.additional_items.is_some(), "additionalItems"),
        (schema.all_of.is_some(), "allOf"),
        (schema.one_of.is_some(), "oneOf"),
        (schema.prefix_items.is_some(), "prefixItems"),
    ];

    vetoes
        .into_iter()
        .find_map(|(present, keyword)| present.then_some(keyword))
}

/// Make an optional property expressible as a required one by admitting `null`.
fn widen_nullable(schema: &mut Schema) {
    if schema.is_any_of() {
        if !schema.any_of.iter().any(|alt| alt.type_tags.is_null_only()) {
            schema.any_of.push(Schema::of_type(TYPE_NULL));
        }
        return;
    }

    let tags = &mut schema.type_tags;
    match tags.scalar.take() {
        // Unlike a plain append, `null` is not repeated as `["null", "null"]`.
        Some(scalar) if scalar == TYPE_NULL => tags.scalar = Some(scalar),
        Some(scalar) => tags.list = vec![scalar, TYPE_NULL.to_string()],
        None if !tags.contains(TYPE_NULL) => tags.list.push(TYPE_NULL.to_string()),
        None => {}
    }
}

fn reject(path: &str, reason: &str) -> Compiled {
    debug!(path, reason, "pruning unsupported schema");
    Compiled::Unsupported
}
