//! Template inference - one immutable analysis snapshot per template
//!
//! Pipeline:
//! 1. Scope: parameters + `th:with` locals + reserved roots
//! 2. Loop bindings: `th:each` alias → iterable path
//! 3. Model paths: every `${...}` expression, scan order, duplicates kept
//! 4. Static fragment references (with recursion flags)
//!
//! [`TemplateInference::to_inferred_model`] then turns the snapshot into a
//! sample model, redirecting alias-rooted paths under their iterable.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;

use crate::expression::extract_expression_paths;
use crate::fragment_refs::extract_referenced_template_paths;
use crate::inferred_model::{InferredModel, Step};
use crate::loops::{extract_loop_variable_paths, LoopBindings};
use crate::model_path::ModelPath;
use crate::scope::Scope;

/// Immutable result of analyzing one template
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateInference {
    model_paths: Vec<ModelPath>,
    loop_variable_paths: LoopBindings,
    /// Referenced template → follow it during recursive inference
    referenced_template_paths: IndexMap<String, bool>,
}

impl TemplateInference {
    pub fn new(
        model_paths: Vec<ModelPath>,
        loop_variable_paths: LoopBindings,
        referenced_template_paths: IndexMap<String, bool>,
    ) -> Self {
        Self {
            model_paths,
            loop_variable_paths,
            referenced_template_paths,
        }
    }

    pub fn model_paths(&self) -> &[ModelPath] {
        &self.model_paths
    }

    pub fn loop_variable_paths(&self) -> &LoopBindings {
        &self.loop_variable_paths
    }

    pub fn referenced_template_paths(&self) -> impl Iterator<Item = &str> {
        self.referenced_template_paths.keys().map(String::as_str)
    }

    pub fn referenced_template_paths_with_recursion_flags(&self) -> &IndexMap<String, bool> {
        &self.referenced_template_paths
    }

    /// Resolve a path into tree steps, following loop aliases
    ///
    /// `row.amount` with `row : ${page.items}` becomes
    /// `page → items → [item] → amount`. Aliases bound to another alias's
    /// iterable nest further; an alias already on the resolution chain is
    /// treated as a plain key so self-referencing loops terminate.
    pub fn resolve_steps(&self, path: &ModelPath) -> Vec<Step> {
        let mut visiting = Vec::new();
        self.resolve_segments(path.segments(), &mut visiting)
    }

    /// Steps of the list bound to `alias`, evaluated outside its own loop
    fn resolve_iterable<'a>(&'a self, alias: &'a str, iterable: &ModelPath) -> Vec<Step> {
        let mut visiting = vec![alias];
        self.resolve_segments(iterable.segments(), &mut visiting)
    }

    fn resolve_segments<'a>(&'a self, segments: &[String], visiting: &mut Vec<&'a str>) -> Vec<Step> {
        let root = segments[0].as_str();
        match self.loop_variable_paths.get_key_value(root) {
            Some((alias, iterable)) if !visiting.contains(&alias.as_str()) => {
                visiting.push(alias);
                let mut steps = self.resolve_segments(iterable.segments(), visiting);
                steps.push(Step::Item);
                steps.extend(Step::keys(&segments[1..]));
                steps
            }
            _ => Step::keys(segments).collect(),
        }
    }

    /// Build the sample model for this template
    ///
    /// - Alias-rooted paths land inside the iterable's single list element
    /// - A path naming a loop iterable itself becomes the list placeholder
    /// - Everything else is a nested map with a heuristic leaf
    pub fn to_inferred_model(&self) -> InferredModel {
        let iterables: IndexMap<&ModelPath, Vec<Step>> = self
            .loop_variable_paths
            .iter()
            .map(|(alias, iterable)| (iterable, self.resolve_iterable(alias, iterable)))
            .collect();
        let iterable_steps: HashSet<&Vec<Step>> = iterables.values().collect();

        let mut inferred = InferredModel::new();
        for path in &self.model_paths {
            let mut steps = match iterables.get(path) {
                Some(steps) => steps.clone(),
                None => self.resolve_steps(path),
            };
            if iterable_steps.contains(&steps) {
                steps.push(Step::Item);
            }
            inferred.put_steps(&steps, path.infer_sample_value());
        }
        inferred
    }
}

/// Template analyzer with configurable reserved roots
#[derive(Debug, Clone, Default)]
pub struct TemplateAnalyzer {
    reserved_roots: Vec<String>,
}

impl TemplateAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extra names that are never model roots (e.g. project-wide helpers)
    pub fn with_reserved_roots<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_roots.extend(names.into_iter().map(Into::into));
        self
    }

    /// Analyze template text; every static reference is flagged for recursion
    pub fn analyze<I, S>(&self, html: &str, parameter_names: I) -> TemplateInference
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.analyze_inner(None, html, parameter_names)
    }

    /// Analyze the template stored at `template_path`
    ///
    /// A reference back to `template_path` itself is kept but not flagged
    /// for recursion.
    pub fn analyze_template<I, S>(
        &self,
        template_path: &str,
        html: &str,
        parameter_names: I,
    ) -> TemplateInference
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.analyze_inner(Some(template_path), html, parameter_names)
    }

    fn analyze_inner<I, S>(&self, origin: Option<&str>, html: &str, parameter_names: I) -> TemplateInference
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let scope = Scope::resolve(html, parameter_names)
            .with_reserved_roots(self.reserved_roots.iter().cloned());

        let loop_variable_paths = extract_loop_variable_paths(html, &scope);
        let model_paths = extract_expression_paths(html, &scope);
        let referenced_template_paths: IndexMap<String, bool> = extract_referenced_template_paths(html)
            .into_iter()
            .map(|path| {
                let follow = origin != Some(path.as_str());
                (path, follow)
            })
            .collect();

        tracing::debug!(
            template = origin.unwrap_or("<inline>"),
            paths = model_paths.len(),
            loops = loop_variable_paths.len(),
            references = referenced_template_paths.len(),
            "analyzed template"
        );

        TemplateInference::new(model_paths, loop_variable_paths, referenced_template_paths)
    }
}

/// Analyze with the default analyzer
pub fn analyze<I, S>(html: &str, parameter_names: I) -> TemplateInference
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    TemplateAnalyzer::new().analyze(html, parameter_names)
}
