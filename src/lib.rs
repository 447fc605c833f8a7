//! template-infer - sample model inference for Thymeleaf-style templates
//!
//! Scans `${...}` expressions, `th:each` loops, `th:with` locals and static
//! fragment references, then synthesizes a nested placeholder model that a
//! preview renderer can use when no real data exists.
//!
//! ```
//! use serde_json::json;
//! use template_infer::analyze;
//!
//! let html = r#"<li th:each="item : ${items}" th:text="${item.label}"></li>"#;
//! let model = analyze(html, Vec::<String>::new()).to_inferred_model();
//! assert_eq!(model.to_value(), json!({"items": [{"label": "Sample label"}]}));
//! ```

pub mod config;
pub mod error;
pub mod expression;
pub mod fragment_refs;
pub mod inference;
pub mod inferred_model;
pub mod leaf_value;
pub mod loops;
pub mod model_path;
pub mod scan;
pub mod scope;
pub mod source;

pub use config::InferConfig;
pub use error::{FixSuggestion, InferError};
pub use inference::{analyze, TemplateAnalyzer, TemplateInference};
pub use inferred_model::{InferredModel, SampleValue};
pub use leaf_value::infer_leaf_value;
pub use model_path::ModelPath;
pub use scope::Scope;
pub use source::{FsTemplateSource, MemoryTemplateSource, ModelInference, TemplateSource};
