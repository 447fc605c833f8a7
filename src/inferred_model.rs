//! Inferred sample model - nested placeholder data for template previews
//!
//! The tree is a tagged value type instead of loosely typed JSON so that
//! insertion and merge are exhaustive:
//!
//! - `Leaf`: a synthesized (or explicitly supplied) value
//! - `Node`: an insertion-ordered map of child keys
//! - `List`: a loop placeholder, always exactly one element (a `Node`)
//!
//! Every write is first-write-wins: an existing key is never overwritten,
//! and a key holding a leaf is never turned into a map or list.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Ordered child map of a node
pub type SampleNode = IndexMap<String, SampleValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    Leaf(Value),
    Node(SampleNode),
    /// Single synthetic list element
    List(SampleNode),
}

impl SampleValue {
    /// Plain JSON form (`List` becomes a one-element array)
    pub fn to_json(&self) -> Value {
        match self {
            SampleValue::Leaf(value) => value.clone(),
            SampleValue::Node(node) => Value::Object(node_to_json(node)),
            SampleValue::List(item) => Value::Array(vec![Value::Object(node_to_json(item))]),
        }
    }

    /// Convert supplied JSON: objects become nodes, everything else is a leaf
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Object(map) => SampleValue::Node(node_from_json(map)),
            other => SampleValue::Leaf(other.clone()),
        }
    }
}

impl Serialize for SampleValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SampleValue::Leaf(value) => value.serialize(serializer),
            SampleValue::Node(node) => node.serialize(serializer),
            SampleValue::List(item) => [item].serialize(serializer),
        }
    }
}

/// One hop into the sample tree: a map key, or the single list element
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    Key(String),
    Item,
}

impl Step {
    pub fn keys<'a>(segments: &'a [String]) -> impl Iterator<Item = Step> + 'a {
        segments.iter().cloned().map(Step::Key)
    }
}

/// Sample model built from one or more template analyses
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct InferredModel {
    values: SampleNode,
}

impl InferredModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a model from explicitly supplied data
    ///
    /// Merging inferred models into the result afterwards keeps every
    /// supplied value, because merge is first-write-wins.
    pub fn from_json(data: &Map<String, Value>) -> Self {
        Self {
            values: node_from_json(data),
        }
    }

    /// `a.b.c = leaf`, creating intermediate maps as needed
    pub fn put_path(&mut self, path: &[String], leaf_value: Value) {
        let steps: Vec<Step> = Step::keys(path).collect();
        self.put_steps(&steps, leaf_value);
    }

    /// `iterable → [ { sub: leaf } ]`
    ///
    /// Creates the list and its single element on first use and reuses them
    /// afterwards. An empty `item_sub_path` only ensures the list exists.
    pub fn put_loop_path(&mut self, iterable_path: &[String], item_sub_path: &[String], leaf_value: Value) {
        if iterable_path.is_empty() {
            return;
        }
        let steps: Vec<Step> = Step::keys(iterable_path)
            .chain(std::iter::once(Step::Item))
            .chain(Step::keys(item_sub_path))
            .collect();
        self.put_steps(&steps, leaf_value);
    }

    /// Insert along resolved steps; a trailing `Item` only ensures the list
    pub fn put_steps(&mut self, steps: &[Step], leaf_value: Value) {
        insert(&mut self.values, steps, leaf_value);
    }

    /// Deep-merge `other` into `self`, keeping existing values
    ///
    /// Nodes present on both sides are merged recursively. Lists and leaves
    /// are opaque: whichever side wrote the key first keeps it.
    pub fn merge(&mut self, other: InferredModel) {
        deep_merge(&mut self.values, other.values);
    }

    pub fn get(&self, key: &str) -> Option<&SampleValue> {
        self.values.get(key)
    }

    pub fn values(&self) -> &SampleNode {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Plain nested JSON map for renderers
    pub fn to_map(&self) -> Map<String, Value> {
        node_to_json(&self.values)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.to_map())
    }
}

fn insert(node: &mut SampleNode, steps: &[Step], leaf_value: Value) {
    let Some((Step::Key(key), rest)) = steps.split_first() else {
        return;
    };
    match rest.first() {
        None => {
            node.entry(key.clone())
                .or_insert(SampleValue::Leaf(leaf_value));
        }
        Some(Step::Key(_)) => {
            let child = node
                .entry(key.clone())
                .or_insert_with(|| SampleValue::Node(SampleNode::new()));
            if let SampleValue::Node(child) = child {
                insert(child, rest, leaf_value);
            }
        }
        Some(Step::Item) => {
            let list = node
                .entry(key.clone())
                .or_insert_with(|| SampleValue::List(SampleNode::new()));
            if let SampleValue::List(item) = list {
                insert(item, &rest[1..], leaf_value);
            }
        }
    }
}

fn deep_merge(target: &mut SampleNode, source: SampleNode) {
    for (key, source_value) in source {
        match target.get_mut(&key) {
            Some(SampleValue::Node(target_node)) => {
                if let SampleValue::Node(source_node) = source_value {
                    deep_merge(target_node, source_node);
                }
            }
            Some(_) => {}
            None => {
                target.insert(key, source_value);
            }
        }
    }
}

fn node_to_json(node: &SampleNode) -> Map<String, Value> {
    node.iter()
        .map(|(key, value)| (key.clone(), value.to_json()))
        .collect()
}

fn node_from_json(map: &Map<String, Value>) -> SampleNode {
    map.iter()
        .map(|(key, value)| (key.clone(), SampleValue::from_json(value)))
        .collect()
}
