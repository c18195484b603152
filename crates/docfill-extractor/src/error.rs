//! Error types for the Extractor

use thiserror::Error;

/// The target shape cannot be represented as a schema document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The shape description is not valid JSON
    #[error("Invalid shape JSON: {0}")]
    InvalidJson(String),

    /// The root of the shape is not an object
    #[error("Shape root must be a JSON object")]
    NotAnObject,

    /// A field name is empty
    #[error("Shape contains an empty field name")]
    EmptyFieldName,

    /// Two fields of the same object share a name
    #[error("Duplicate field '{0}'")]
    DuplicateField(String),

    /// A field's type has no schema representation
    #[error("Unsupported type for field '{field}': {reason}")]
    UnsupportedType {
        /// Dotted path of the field
        field: String,
        /// What was found instead of a supported type
        reason: String,
    },

    /// A `$ref` points at a missing definition
    #[error("Unresolved schema reference: {0}")]
    UnresolvedReference(String),
}

/// The completion text does not match the expected shape
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// The text is not JSON at all
    #[error("Completion is not valid JSON: {0}")]
    NotJson(String),

    /// The JSON is valid but not an object
    #[error("Completion is not a JSON object")]
    NotAnObject,

    /// A declared field is absent
    #[error("Missing field '{0}'")]
    MissingField(String),

    /// A declared field has an incompatible value
    #[error("Field '{field}' should be {expected}, found {found}")]
    TypeMismatch {
        /// Dotted path of the field
        field: String,
        /// Schema type name
        expected: String,
        /// JSON type of the value
        found: String,
    },

    /// The record could not be decoded into the requested type
    #[error("Failed to decode record: {0}")]
    Decode(String),
}

/// Errors that can occur while setting up or serializing a run
///
/// Per-document failures are never reported through this type; they are
/// captured in the document's fill result.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Shape could not be turned into a schema
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Completion did not match the shape
    #[error("Shape error: {0}")]
    Shape(#[from] ShapeError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::Json(e.to_string())
    }
}
