//! Target shapes and the schema documents derived from them
//!
//! A [`TargetShape`] describes the record the caller wants back: field
//! names, their types and nested objects, in declaration order. It can be
//! built directly, inferred from a skeleton JSON document, or derived from a
//! Rust type through `schemars`.
//!
//! [`SchemaDeriver::derive`] turns a shape into a [`SchemaDocument`], the
//! JSON-Schema representation placed in every prompt of a run. The schema
//! document also checks parsed completions against the shape.

use crate::error::{SchemaError, ShapeError};
use schemars::JsonSchema;
use serde_json::{json, Map, Value};
use std::collections::HashSet;

/// Nesting limit when following `$ref`s in a schemars schema
const MAX_REF_DEPTH: usize = 32;

/// Type of one field of a shape
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// Text
    String,
    /// Whole number
    Integer,
    /// Any number
    Number,
    /// true / false
    Boolean,
    /// Nested record
    Object(TargetShape),
    /// List whose items share one type; `None` leaves items unconstrained
    Array(Option<Box<FieldType>>),
    /// Any value
    Any,
}

impl FieldType {
    /// JSON-Schema type name
    pub fn schema_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Object(_) => "object",
            FieldType::Array(_) => "array",
            FieldType::Any => "any",
        }
    }
}

/// One named field of a shape
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeField {
    /// Field name as it appears in the output record
    pub name: String,
    /// Field type
    pub field_type: FieldType,
}

/// Description of the desired output record
///
/// Field order is declaration order and is preserved in the derived schema.
///
/// # Examples
///
/// ```
/// use docfill_extractor::{FieldType, TargetShape};
///
/// let shape = TargetShape::new()
///     .field("name", FieldType::String)
///     .field("age", FieldType::Integer);
/// assert_eq!(shape.fields().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TargetShape {
    fields: Vec<ShapeField>,
}

impl TargetShape {
    /// Create an empty shape
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(ShapeField {
            name: name.into(),
            field_type,
        });
        self
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[ShapeField] {
        &self.fields
    }

    /// Infer a shape from a skeleton document such as `{"name": "", "age": 0}`
    ///
    /// Types are taken from the values: strings, integers, other numbers,
    /// booleans, nested objects, and arrays (typed by their first element,
    /// unconstrained when empty). A `null` leaf accepts any value.
    pub fn from_skeleton(skeleton: &Value) -> Result<Self, SchemaError> {
        match skeleton {
            Value::Object(map) => shape_from_object(map, ""),
            _ => Err(SchemaError::NotAnObject),
        }
    }

    /// Parse skeleton JSON text and infer its shape
    pub fn from_skeleton_str(skeleton: &str) -> Result<Self, SchemaError> {
        let value: Value =
            serde_json::from_str(skeleton).map_err(|e| SchemaError::InvalidJson(e.to_string()))?;
        Self::from_skeleton(&value)
    }

    /// Derive a shape from a Rust type's JSON schema
    ///
    /// `Option<T>` fields are treated as `T`. Maps, tuples and untyped
    /// unions are rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use docfill_extractor::TargetShape;
    /// use schemars::JsonSchema;
    ///
    /// #[derive(JsonSchema)]
    /// struct Person {
    ///     name: String,
    ///     age: u32,
    /// }
    ///
    /// let shape = TargetShape::of::<Person>().unwrap();
    /// assert_eq!(shape.fields()[0].name, "name");
    /// ```
    pub fn of<T: JsonSchema>() -> Result<Self, SchemaError> {
        let root = schemars::schema_for!(T);
        let value = serde_json::to_value(&root).map_err(|e| SchemaError::UnsupportedType {
            field: String::new(),
            reason: e.to_string(),
        })?;

        let definitions = value
            .get("definitions")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        match field_type_from_schema(&value, &definitions, "", 0)? {
            FieldType::Object(shape) => Ok(shape),
            _ => Err(SchemaError::NotAnObject),
        }
    }
}

fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

fn shape_from_object(map: &Map<String, Value>, path: &str) -> Result<TargetShape, SchemaError> {
    let mut shape = TargetShape::new();
    for (name, value) in map {
        let field_path = child_path(path, name);
        let field_type = field_type_from_value(value, &field_path)?;
        shape = shape.field(name.clone(), field_type);
    }
    Ok(shape)
}

fn field_type_from_value(value: &Value, path: &str) -> Result<FieldType, SchemaError> {
    match value {
        Value::String(_) => Ok(FieldType::String),
        Value::Bool(_) => Ok(FieldType::Boolean),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(FieldType::Integer),
        Value::Number(_) => Ok(FieldType::Number),
        Value::Object(map) => Ok(FieldType::Object(shape_from_object(map, path)?)),
        Value::Array(items) => match items.first() {
            Some(first) => {
                let item_type = field_type_from_value(first, &format!("{}[]", path))?;
                Ok(FieldType::Array(Some(Box::new(item_type))))
            }
            None => Ok(FieldType::Array(None)),
        },
        Value::Null => Ok(FieldType::Any),
    }
}

fn field_type_from_schema(
    schema: &Value,
    definitions: &Map<String, Value>,
    path: &str,
    depth: usize,
) -> Result<FieldType, SchemaError> {
    let unsupported = |reason: &str| SchemaError::UnsupportedType {
        field: path.to_string(),
        reason: reason.to_string(),
    };

    if depth > MAX_REF_DEPTH {
        return Err(unsupported("recursive type"));
    }

    let obj = schema.as_object().ok_or_else(|| unsupported("schema is not an object"))?;

    if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
        let name = reference.trim_start_matches("#/definitions/");
        let target = definitions
            .get(name)
            .ok_or_else(|| SchemaError::UnresolvedReference(reference.to_string()))?;
        return field_type_from_schema(target, definitions, path, depth + 1);
    }

    for combinator in ["anyOf", "oneOf", "allOf"] {
        if let Some(variants) = obj.get(combinator).and_then(Value::as_array) {
            let non_null: Vec<&Value> = variants
                .iter()
                .filter(|v| v.get("type").and_then(Value::as_str) != Some("null"))
                .collect();
            return match non_null.as_slice() {
                [single] => field_type_from_schema(single, definitions, path, depth + 1),
                _ => Err(unsupported("union of several types")),
            };
        }
    }

    let type_name = match obj.get("type") {
        Some(Value::String(name)) => name.as_str(),
        Some(Value::Array(names)) => {
            let non_null: Vec<&str> = names
                .iter()
                .filter_map(Value::as_str)
                .filter(|name| *name != "null")
                .collect();
            match non_null.as_slice() {
                [single] => *single,
                _ => return Err(unsupported("union of several types")),
            }
        }
        _ => return Err(unsupported("schema has no type")),
    };

    match type_name {
        "string" => Ok(FieldType::String),
        "integer" => Ok(FieldType::Integer),
        "number" => Ok(FieldType::Number),
        "boolean" => Ok(FieldType::Boolean),
        "array" => match obj.get("items") {
            None => Ok(FieldType::Array(None)),
            Some(items) if items.is_object() => {
                let item_path = format!("{}[]", path);
                let item = field_type_from_schema(items, definitions, &item_path, depth + 1)?;
                Ok(FieldType::Array(Some(Box::new(item))))
            }
            Some(_) => Err(unsupported("tuple arrays")),
        },
        "object" => match obj.get("properties").and_then(Value::as_object) {
            Some(properties) => {
                let mut shape = TargetShape::new();
                for (name, property) in properties {
                    let field_path = child_path(path, name);
                    let field_type =
                        field_type_from_schema(property, definitions, &field_path, depth + 1)?;
                    shape = shape.field(name.clone(), field_type);
                }
                Ok(FieldType::Object(shape))
            }
            None => Err(unsupported("map without named properties")),
        },
        other => Err(unsupported(other)),
    }
}

/// Serializable schema derived from a [`TargetShape`]
///
/// Created once per run and shared read-only by every document's prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    shape: TargetShape,
    value: Value,
    rendered: String,
}

impl SchemaDocument {
    /// The shape this schema was derived from
    pub fn shape(&self) -> &TargetShape {
        &self.shape
    }

    /// The JSON-Schema value
    pub fn as_value(&self) -> &Value {
        &self.value
    }

    /// Pretty-printed schema, as placed in prompts
    pub fn to_prompt_string(&self) -> &str {
        &self.rendered
    }

    /// Check a parsed completion against the shape
    ///
    /// Every declared field must be present with a compatible value. An empty
    /// string or `null` is accepted for any field, since engines are told to
    /// leave unsupported fields empty. Undeclared fields are allowed.
    pub fn check(&self, record: &Map<String, Value>) -> Result<(), ShapeError> {
        check_object(&self.shape, record, "")
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn check_object(
    shape: &TargetShape,
    record: &Map<String, Value>,
    path: &str,
) -> Result<(), ShapeError> {
    for field in shape.fields() {
        let field_path = child_path(path, &field.name);
        let value = record
            .get(&field.name)
            .ok_or_else(|| ShapeError::MissingField(field_path.clone()))?;
        check_value(&field.field_type, value, &field_path)?;
    }
    Ok(())
}

fn check_value(field_type: &FieldType, value: &Value, path: &str) -> Result<(), ShapeError> {
    let empty = match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    };
    if empty {
        return Ok(());
    }

    let matches = match (field_type, value) {
        (FieldType::String, Value::String(_)) => true,
        (FieldType::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
        (FieldType::Number, Value::Number(_)) => true,
        (FieldType::Boolean, Value::Bool(_)) => true,
        (FieldType::Any, _) => true,
        (FieldType::Object(shape), Value::Object(map)) => {
            return check_object(shape, map, path);
        }
        (FieldType::Array(item_type), Value::Array(items)) => {
            if let Some(item_type) = item_type {
                for (idx, item) in items.iter().enumerate() {
                    check_value(item_type, item, &format!("{}[{}]", path, idx))?;
                }
            }
            return Ok(());
        }
        _ => false,
    };

    if matches {
        Ok(())
    } else {
        Err(ShapeError::TypeMismatch {
            field: path.to_string(),
            expected: field_type.schema_name().to_string(),
            found: json_type_name(value).to_string(),
        })
    }
}

/// Derives schema documents from target shapes
pub struct SchemaDeriver;

impl SchemaDeriver {
    /// Derive the schema document for a shape
    ///
    /// Pure and deterministic: the same shape always yields an equal schema
    /// document, with properties in declaration order.
    ///
    /// # Errors
    ///
    /// Fails if any object has an empty or duplicated field name.
    pub fn derive(shape: &TargetShape) -> Result<SchemaDocument, SchemaError> {
        let value = object_schema(shape, "")?;
        let rendered = serde_json::to_string_pretty(&value)
            .map_err(|e| SchemaError::InvalidJson(e.to_string()))?;

        Ok(SchemaDocument {
            shape: shape.clone(),
            value,
            rendered,
        })
    }
}

fn object_schema(shape: &TargetShape, path: &str) -> Result<Value, SchemaError> {
    let mut seen = HashSet::new();
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in shape.fields() {
        let field_path = child_path(path, &field.name);
        if field.name.is_empty() {
            return Err(SchemaError::EmptyFieldName);
        }
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateField(field_path));
        }
        properties.insert(
            field.name.clone(),
            field_schema(&field.field_type, &field_path)?,
        );
        required.push(Value::String(field.name.clone()));
    }

    Ok(json!({
        "type": "object",
        "properties": properties,
        "required": required,
    }))
}

fn field_schema(field_type: &FieldType, path: &str) -> Result<Value, SchemaError> {
    match field_type {
        FieldType::Object(shape) => object_schema(shape, path),
        FieldType::Array(Some(item)) => Ok(json!({
            "type": "array",
            "items": field_schema(item, &format!("{}[]", path))?,
        })),
        FieldType::Any => Ok(json!({})),
        other => Ok(json!({ "type": other.schema_name() })),
    }
}
