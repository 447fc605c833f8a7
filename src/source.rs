//! Template sources and recursive model inference
//!
//! - [`TemplateSource`]: where template text comes from (filesystem, memory)
//! - [`ModelInference`]: analyzes a template, follows its static fragment
//!   references and merges every model into one
//!
//! Analyses are cached per (template, parameter set) and shared via `Arc`.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use walkdir::WalkDir;

use crate::config::InferConfig;
use crate::error::InferError;
use crate::inference::{TemplateAnalyzer, TemplateInference};
use crate::inferred_model::InferredModel;

/// Read-only access to template text by template path (`fragments/card`)
pub trait TemplateSource {
    /// `Ok(None)` when the template does not exist
    fn read(&self, template_path: &str) -> Result<Option<String>, InferError>;

    /// Human-readable location for error messages
    fn location(&self) -> String;
}

// ═══════════════════════════════════════════════════════════════
// Filesystem source
// ═══════════════════════════════════════════════════════════════

/// Templates stored as `<root>/<template path><suffix>`
#[derive(Debug, Clone)]
pub struct FsTemplateSource {
    root: PathBuf,
    suffix: String,
}

impl FsTemplateSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            suffix: ".html".to_string(),
        }
    }

    pub fn from_config(config: &InferConfig) -> Self {
        Self::new(&config.templates_dir).with_suffix(&config.suffix)
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `template_path`; `None` for paths escaping the root
    pub fn file_path(&self, template_path: &str) -> Option<PathBuf> {
        let relative = Path::new(template_path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return None;
        }
        if !self.suffix.is_empty() && template_path.ends_with(&self.suffix) {
            Some(self.root.join(relative))
        } else {
            Some(self.root.join(format!("{template_path}{}", self.suffix)))
        }
    }

    /// Every template under the root, as sorted template paths
    pub fn template_paths(&self) -> Result<Vec<String>, InferError> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(true) {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let relative = relative.to_string_lossy().replace('\\', "/");
            if let Some(template_path) = relative.strip_suffix(self.suffix.as_str()) {
                if !template_path.is_empty() {
                    paths.push(template_path.to_string());
                }
            }
        }
        paths.sort();
        Ok(paths)
    }
}

impl TemplateSource for FsTemplateSource {
    fn read(&self, template_path: &str) -> Result<Option<String>, InferError> {
        let Some(file) = self.file_path(template_path) else {
            tracing::warn!(template = template_path, "template path escapes the templates directory");
            return Ok(None);
        };
        if !file.is_file() {
            return Ok(None);
        }
        fs::read_to_string(&file)
            .map(Some)
            .map_err(|e| InferError::TemplateRead {
                path: file.display().to_string(),
                details: e.to_string(),
            })
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}

// ═══════════════════════════════════════════════════════════════
// In-memory source
// ═══════════════════════════════════════════════════════════════

/// Templates held in memory (previews, tests)
#[derive(Debug, Clone, Default)]
pub struct MemoryTemplateSource {
    templates: HashMap<String, String>,
}

impl MemoryTemplateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, template_path: impl Into<String>, html: impl Into<String>) -> Self {
        self.insert(template_path, html);
        self
    }

    pub fn insert(&mut self, template_path: impl Into<String>, html: impl Into<String>) {
        self.templates.insert(template_path.into(), html.into());
    }
}

impl TemplateSource for MemoryTemplateSource {
    fn read(&self, template_path: &str) -> Result<Option<String>, InferError> {
        Ok(self.templates.get(template_path).cloned())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}

// ═══════════════════════════════════════════════════════════════
// Recursive inference
// ═══════════════════════════════════════════════════════════════

/// Template path + sorted, deduplicated parameter names
type CacheKey = (String, Vec<String>);

/// Model inference over a template source, following fragment references
pub struct ModelInference<S: TemplateSource> {
    source: S,
    analyzer: TemplateAnalyzer,
    follow_references: bool,
    max_depth: usize,
    cache: DashMap<CacheKey, Arc<TemplateInference>>,
}

impl<S: TemplateSource> ModelInference<S> {
    pub fn new(source: S) -> Self {
        let defaults = InferConfig::default();
        Self {
            source,
            analyzer: TemplateAnalyzer::new(),
            follow_references: defaults.follow_references,
            max_depth: defaults.max_depth,
            cache: DashMap::new(),
        }
    }

    pub fn from_config(source: S, config: &InferConfig) -> Self {
        Self::new(source)
            .with_analyzer(TemplateAnalyzer::new().with_reserved_roots(config.reserved_roots.iter().cloned()))
            .follow_references(config.follow_references)
            .max_depth(config.max_depth)
    }

    pub fn with_analyzer(mut self, analyzer: TemplateAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn follow_references(mut self, follow: bool) -> Self {
        self.follow_references = follow;
        self
    }

    /// Levels of references followed below the root template (min 1)
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.max(1);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Analyze one template (cached); `Ok(None)` if the source has no such template
    pub fn analyze<I, P>(&self, template_path: &str, parameter_names: I) -> Result<Option<Arc<TemplateInference>>, InferError>
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let template_path = normalize_template_path(template_path)?;
        let mut parameters: Vec<String> = parameter_names.into_iter().map(Into::into).collect();
        parameters.sort();
        parameters.dedup();

        let key = (template_path.to_string(), parameters);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(Some(Arc::clone(&cached)));
        }

        let Some(html) = self.source.read(template_path)? else {
            return Ok(None);
        };
        let inference = Arc::new(self.analyzer.analyze_template(template_path, &html, key.1.iter().cloned()));
        self.cache.insert(key, Arc::clone(&inference));
        Ok(Some(inference))
    }

    /// Sample model for a template and everything it statically includes
    ///
    /// The referencing template always wins: referenced models only fill in
    /// keys that are still missing.
    ///
    /// A missing or unreadable root template is an error here, not an empty
    /// model; preview callers that want a blank fallback must handle
    /// [`InferError::TemplateNotFound`] and [`InferError::TemplateRead`].
    pub fn infer_model<I, P>(&self, template_path: &str, parameter_names: I) -> Result<InferredModel, InferError>
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let template_path = normalize_template_path(template_path)?;
        let root = self
            .analyze(template_path, parameter_names)?
            .ok_or_else(|| InferError::TemplateNotFound {
                path: template_path.to_string(),
                root: self.source.location(),
            })?;

        let mut model = root.to_inferred_model();
        if self.follow_references {
            let mut visited = HashSet::from([template_path.to_string()]);
            self.merge_references(template_path, &root, 1, &mut visited, &mut model);
        }
        Ok(model)
    }

    /// Like [`infer_model`](Self::infer_model), but `explicit` data is kept as-is
    pub fn infer_model_with_data<I, P>(
        &self,
        template_path: &str,
        parameter_names: I,
        explicit: &Value,
    ) -> Result<InferredModel, InferError>
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let Value::Object(data) = explicit else {
            return Err(InferError::DataNotObject {
                found: json_kind(explicit).to_string(),
            });
        };
        let mut model = InferredModel::from_json(data);
        model.merge(self.infer_model(template_path, parameter_names)?);
        Ok(model)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    fn merge_references(
        &self,
        origin: &str,
        inference: &TemplateInference,
        depth: usize,
        visited: &mut HashSet<String>,
        model: &mut InferredModel,
    ) {
        for (reference, &follow) in inference.referenced_template_paths_with_recursion_flags() {
            if !follow || reference == origin || visited.contains(reference) {
                continue;
            }
            if depth > self.max_depth {
                tracing::warn!(template = %reference, max_depth = self.max_depth, "reference too deep, skipping");
                continue;
            }
            visited.insert(reference.clone());

            match self.analyze(reference, Vec::<String>::new()) {
                Ok(Some(child)) => {
                    model.merge(child.to_inferred_model());
                    self.merge_references(reference, &child, depth + 1, visited, model);
                }
                Ok(None) => {
                    tracing::warn!(template = %reference, from = origin, "referenced template not found, skipping");
                }
                Err(e) => {
                    tracing::warn!(template = %reference, from = origin, error = %e, "referenced template unreadable, skipping");
                }
            }
        }
    }
}

fn normalize_template_path(template_path: &str) -> Result<&str, InferError> {
    let trimmed = template_path.trim().trim_start_matches('/');
    if trimmed.is_empty() {
        return Err(InferError::EmptyTemplatePath);
    }
    Ok(trimmed)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_params() -> Vec<String> {
        Vec::new()
    }

    fn site() -> MemoryTemplateSource {
        MemoryTemplateSource::new()
            .with_template(
                "pages/home",
                r#"<h1 th:text="${page.title}"></h1>
                   <div th:replace="~{fragments/points-panel :: pointsPanel}"></div>
                   <div th:replace="~{fragments/missing :: nothing}"></div>"#,
            )
            .with_template(
                "fragments/points-panel",
                r#"<p th:text="${pointPage.totalPoints}"></p>
                   <p th:text="${page.title}"></p>
                   <p th:text="${page.subtitle}"></p>
                   <footer th:insert="~{fragments/footer :: footer}"></footer>"#,
            )
            .with_template("fragments/footer", r#"<small th:text="${site.copyright}"></small>"#)
    }

    // ─────────────────────────────────────────────────────────────
    // Recursive inference
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn references_are_followed_and_merged() {
        let inference = ModelInference::new(site());
        let model = inference.infer_model("pages/home", no_params()).unwrap();
        assert_eq!(
            model.to_value(),
            json!({
                "page": {"title": "Sample title", "subtitle": "Sample subtitle"},
                "pointPage": {"totalPoints": 0},
                "site": {"copyright": "Sample copyright"}
            })
        );
    }

    #[test]
    fn no_follow_stops_at_root() {
        let inference = ModelInference::new(site()).follow_references(false);
        let model = inference.infer_model("pages/home", no_params()).unwrap();
        assert_eq!(model.to_value(), json!({"page": {"title": "Sample title"}}));
    }

    #[test]
    fn max_depth_limits_nesting() {
        let inference = ModelInference::new(site()).max_depth(1);
        let model = inference.infer_model("pages/home", no_params()).unwrap();
        assert!(model.get("pointPage").is_some());
        assert!(model.get("site").is_none());
    }

    #[test]
    fn cycles_and_self_references_terminate() {
        let source = MemoryTemplateSource::new()
            .with_template("a", r#"<p th:text="${a.x}"></p><div th:replace="~{b :: f}"></div><div th:replace="~{a :: g}"></div>"#)
            .with_template("b", r#"<p th:text="${b.y}"></p><div th:replace="~{a :: f}"></div>"#);
        let model = ModelInference::new(source).infer_model("a", no_params()).unwrap();
        assert_eq!(
            model.to_value(),
            json!({"a": {"x": "Sample x"}, "b": {"y": "Sample y"}})
        );
    }

    #[test]
    fn missing_root_is_an_error() {
        let err = ModelInference::new(site())
            .infer_model("pages/nope", no_params())
            .unwrap_err();
        assert!(matches!(err, InferError::TemplateNotFound { ref path, .. } if path == "pages/nope"));
    }

    #[test]
    fn unreadable_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.html"), [0xff, 0xfe, 0x00]).unwrap();

        let err = ModelInference::new(FsTemplateSource::new(dir.path()))
            .infer_model("broken", no_params())
            .unwrap_err();
        assert!(matches!(err, InferError::TemplateRead { .. }));
    }

    #[test]
    fn empty_path_is_an_error() {
        let err = ModelInference::new(site()).infer_model(" / ", no_params()).unwrap_err();
        assert!(matches!(err, InferError::EmptyTemplatePath));
    }

    #[test]
    fn parameters_apply_to_root_only() {
        let inference = ModelInference::new(site());
        let model = inference.infer_model("fragments/points-panel", ["page"]).unwrap();
        assert_eq!(
            model.to_value(),
            json!({"pointPage": {"totalPoints": 0}, "site": {"copyright": "Sample copyright"}})
        );
    }

    #[test]
    fn explicit_data_wins() {
        let inference = ModelInference::new(site());
        let data = json!({"page": {"title": "Welcome"}});
        let model = inference
            .infer_model_with_data("pages/home", no_params(), &data)
            .unwrap();
        assert_eq!(model.to_value()["page"], json!({"title": "Welcome", "subtitle": "Sample subtitle"}));
    }

    #[test]
    fn explicit_data_must_be_object() {
        let err = ModelInference::new(site())
            .infer_model_with_data("pages/home", no_params(), &json!([1, 2]))
            .unwrap_err();
        assert!(matches!(err, InferError::DataNotObject { ref found } if found == "array"));
    }

    // ─────────────────────────────────────────────────────────────
    // Cache
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn analysis_is_cached_per_parameter_set() {
        let inference = ModelInference::new(site());
        let first = inference.analyze("pages/home", ["b", "a"]).unwrap().unwrap();
        let second = inference.analyze("/pages/home", ["a", "b", "a"]).unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let other = inference.analyze("pages/home", ["a"]).unwrap().unwrap();
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(inference.cached_len(), 2);

        inference.clear_cache();
        assert_eq!(inference.cached_len(), 0);
    }

    #[test]
    fn missing_templates_are_not_cached() {
        let inference = ModelInference::new(site());
        assert!(inference.analyze("nope", no_params()).unwrap().is_none());
        assert_eq!(inference.cached_len(), 0);
    }

    // ─────────────────────────────────────────────────────────────
    // Filesystem source
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn fs_source_reads_with_suffix() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("fragments")).unwrap();
        fs::write(dir.path().join("fragments/card.html"), "<p th:text=\"${card.title}\"></p>").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let source = FsTemplateSource::new(dir.path());
        assert!(source.read("fragments/card").unwrap().is_some());
        assert!(source.read("fragments/card.html").unwrap().is_some());
        assert!(source.read("fragments/none").unwrap().is_none());
        assert!(source.read("../etc/passwd").unwrap().is_none());
        assert_eq!(source.template_paths().unwrap(), vec!["fragments/card"]);
    }

    #[test]
    fn fs_source_reports_unreadable_template() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("binary.html"), [0xff, 0xfe, 0x00]).unwrap();
        let err = FsTemplateSource::new(dir.path()).read("binary").unwrap_err();
        assert!(matches!(err, InferError::TemplateRead { .. }));
    }

    #[test]
    fn from_config_uses_suffix_and_reserved_roots() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mail.txt"), "<p th:text=\"${messages.hi + user.name}\"></p>").unwrap();
        let config = InferConfig {
            templates_dir: dir.path().to_path_buf(),
            suffix: ".txt".into(),
            reserved_roots: vec!["messages".into()],
            ..InferConfig::default()
        };
        let inference = ModelInference::from_config(FsTemplateSource::from_config(&config), &config);
        let model = inference.infer_model("mail", no_params()).unwrap();
        assert_eq!(model.to_value(), json!({"user": {"name": "Sample name"}}));
    }
}
