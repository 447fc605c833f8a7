//! Error types with fix suggestions
//!
//! The analysis engine itself never fails: malformed template text degrades to
//! fewer discovered paths. Errors only surface at the edges (reading templates,
//! loading configuration, parsing supplied sample data).

use thiserror::Error;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug)]
pub enum InferError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Template source errors (TPL-010 to TPL-012)
    // ─────────────────────────────────────────────────────────────

    #[error("TPL-010: Template '{path}' not found under '{root}'")]
    TemplateNotFound { path: String, root: String },

    #[error("TPL-011: Failed to read template '{path}': {details}")]
    TemplateRead { path: String, details: String },

    #[error("TPL-012: Template path is empty")]
    EmptyTemplatePath,

    // ─────────────────────────────────────────────────────────────
    // Configuration errors (TPL-020 to TPL-021)
    // ─────────────────────────────────────────────────────────────

    #[error("TPL-020: Invalid configuration '{field}': {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("TPL-021: Failed to load config '{path}': {details}")]
    ConfigLoad { path: String, details: String },

    // ─────────────────────────────────────────────────────────────
    // Sample data errors (TPL-030)
    // ─────────────────────────────────────────────────────────────

    #[error("TPL-030: Sample data must be a JSON object, got {found}")]
    DataNotObject { found: String },
}

impl FixSuggestion for InferError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            InferError::Io(_) => Some("Check file path and permissions"),
            InferError::YamlParse(_) => Some("Check YAML syntax: indentation and quoting"),
            InferError::JsonParse(_) => Some("Check JSON syntax (try parsing with jq)"),
            InferError::TemplateNotFound { .. } => {
                Some("Use a path relative to the templates directory, without the suffix")
            }
            InferError::TemplateRead { .. } => Some("Ensure the template is UTF-8 text"),
            InferError::EmptyTemplatePath => Some("Pass a template path such as fragments/card"),
            InferError::InvalidConfig { .. } => Some("Fix the value in template-infer.yaml"),
            InferError::ConfigLoad { .. } => {
                Some("Check the --config path or remove it to use defaults")
            }
            InferError::DataNotObject { .. } => {
                Some("Wrap sample data in an object: { \"name\": value }")
            }
        }
    }
}
