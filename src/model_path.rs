//! Model paths - access chains into the external template model

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::leaf_value::infer_leaf_value;

/// An ordered, non-empty list of segment names (`user.profile.name`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ModelPath(Vec<String>);

impl ModelPath {
    /// Build a path; returns `None` for an empty segment list
    pub fn new<I, S>(segments: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        (!segments.is_empty()).then_some(Self(segments))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true: construction rejects empty paths
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn root(&self) -> &str {
        &self.0[0]
    }

    pub fn leaf(&self) -> &str {
        &self.0[self.0.len() - 1]
    }

    /// Everything after the root (empty for a single-segment path)
    pub fn sub_path_without_root(&self) -> &[String] {
        &self.0[1..]
    }

    /// Placeholder value for this path's leaf
    pub fn infer_sample_value(&self) -> Value {
        infer_leaf_value(self.leaf())
    }
}

impl fmt::Display for ModelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}
