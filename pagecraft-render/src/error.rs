use thiserror::Error;

pub type PageResult<T> = Result<T, PageError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PageError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    // --- schema errors ---

    #[error("Schema must decode to a mapping, got {found}")]
    SchemaNotAMapping { found: String },

    #[error("Schema has no 'properties' entry")]
    MissingProperties,

    #[error("Schema 'properties' must be a mapping of field name to definition, got {found}")]
    InvalidProperties { found: String },

    // --- page content errors ---

    #[error("Page content must decode to an array of components, got {found}")]
    ContentNotAnArray { found: String },

    #[error("Duplicate id '{id}': component ids must be unique within a page")]
    DuplicateId { id: String },

    #[error("Invalid props for component type '{kind}': {reason}")]
    InvalidProps { kind: String, reason: String },

    // --- dynamic block errors ---

    #[error("Script for '{instance}' was rejected: {reason}")]
    ScriptRejected { instance: String, reason: String },

    #[error("Script for '{instance}' failed: {message}")]
    ScriptFailed { instance: String, message: String },
}

impl From<serde_json::Error> for PageError {
    fn from(err: serde_json::Error) -> Self {
        PageError::InvalidJson(err.to_string())
    }
}

/// Short name of a JSON value's shape, used in error messages.
pub(crate) fn json_kind(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
    .to_string()
}
