// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Schema-free label data attached to nodes and edges.
//!
//! A [`Label`] is an ordered string-keyed mapping whose values form a closed
//! recursive algebra ([`Value`]): nested labels, sequences, and scalars. The two
//! operations the engine relies on are total over this algebra:
//!
//! - [`Label::is_subset_of`]: structural-subset matching used by declarative
//!   match specifications.
//! - [`Label::merge`]: deep merge used by declarative update specifications.
//!
//! [`Label::map_strings`] is the generic tree rewrite used for placeholder
//! substitution during subgraph insertion.
use std::collections::BTreeMap;

use blake3::Hasher;
use serde::{Deserialize, Serialize};

/// A single label value.
///
/// Serialized untagged so JSON documents map onto it directly
/// (`true`, `3`, `"room"`, `[..]`, `{..}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean scalar.
    Bool(bool),
    /// Numeric scalar (all numbers are `f64`).
    Num(f64),
    /// String scalar.
    Str(String),
    /// Ordered sequence of values.
    List(Vec<Value>),
    /// Nested mapping.
    Map(Label),
}

impl Value {
    /// Returns the string payload when this is a [`Value::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric payload when this is a [`Value::Num`].
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Num(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean payload when this is a [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the nested label when this is a [`Value::Map`].
    pub fn as_label(&self) -> Option<&Label> {
        match self {
            Self::Map(l) => Some(l),
            _ => None,
        }
    }

    /// Structural subset test: `self` is the pattern, `target` the candidate.
    ///
    /// Mappings recurse with subset semantics; every other pairing compares by
    /// equality (sequences included).
    pub fn is_subset_of(&self, target: &Value) -> bool {
        match (self, target) {
            (Self::Map(pattern), Self::Map(actual)) => pattern.is_subset_of(actual),
            (pattern, actual) => pattern == actual,
        }
    }

    /// Rewrites every string scalar reachable from this value.
    ///
    /// `f` returns `Some(replacement)` to substitute a string and `None` to
    /// keep it. Map keys are never rewritten.
    pub fn map_strings<F>(&mut self, f: &mut F)
    where
        F: FnMut(&str) -> Option<String>,
    {
        match self {
            Self::Str(s) => {
                if let Some(replacement) = f(s) {
                    *s = replacement;
                }
            }
            Self::List(items) => {
                for item in items {
                    item.map_strings(f);
                }
            }
            Self::Map(label) => label.map_strings(f),
            Self::Bool(_) | Self::Num(_) => {}
        }
    }

    pub(crate) fn hash_into(&self, hasher: &mut Hasher) {
        match self {
            Self::Bool(b) => {
                hasher.update(&[0]);
                hasher.update(&[u8::from(*b)]);
            }
            Self::Num(n) => {
                hasher.update(&[1]);
                hasher.update(&n.to_bits().to_le_bytes());
            }
            Self::Str(s) => {
                hasher.update(&[2]);
                hash_bytes(hasher, s.as_bytes());
            }
            Self::List(items) => {
                hasher.update(&[3]);
                hasher.update(&(items.len() as u64).to_le_bytes());
                for item in items {
                    item.hash_into(hasher);
                }
            }
            Self::Map(label) => {
                hasher.update(&[4]);
                label.hash_into(hasher);
            }
        }
    }
}

fn hash_bytes(hasher: &mut Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Num(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Num(f64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Num(f64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Label> for Value {
    fn from(v: Label) -> Self {
        Self::Map(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

/// Open string-keyed mapping attached to a node or edge.
///
/// Keys iterate in ascending order, which keeps hashing and serialization
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(BTreeMap<String, Value>);

impl Label {
    /// Creates an empty label.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns a mutable reference to the value stored under `key`.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    /// Inserts `value` under `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Removes and returns the value under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Returns `true` when `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of top-level keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the label has no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates top-level entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Shorthand for a string-valued key.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Shorthand for a number-valued key.
    pub fn num(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    /// Shorthand for a boolean-valued key.
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Shorthand for a nested label.
    pub fn label(&self, key: &str) -> Option<&Label> {
        self.get(key).and_then(Value::as_label)
    }

    /// Returns `true` when every key of `self` exists in `target` and each
    /// value is recursively a structural subset of the target's value.
    ///
    /// Keys present only in `target` are ignored; an empty pattern matches
    /// everything.
    pub fn is_subset_of(&self, target: &Label) -> bool {
        self.0.iter().all(|(key, pattern)| {
            target
                .0
                .get(key)
                .is_some_and(|actual| pattern.is_subset_of(actual))
        })
    }

    /// Deep-merges `patch` into `self`.
    ///
    /// Mapping values recurse into the corresponding nested mapping (created
    /// when absent, replaced when the existing value is not a mapping); every
    /// other value overwrites the key. Keys absent from `patch` are preserved.
    pub fn merge(&mut self, patch: &Label) {
        for (key, value) in &patch.0 {
            match value {
                Value::Map(nested) => {
                    let slot = self
                        .0
                        .entry(key.clone())
                        .or_insert_with(|| Value::Map(Label::new()));
                    if !matches!(slot, Value::Map(_)) {
                        *slot = Value::Map(Label::new());
                    }
                    if let Value::Map(target) = slot {
                        target.merge(nested);
                    }
                }
                other => {
                    self.0.insert(key.clone(), other.clone());
                }
            }
        }
    }

    /// Rewrites every string scalar anywhere in this label (see
    /// [`Value::map_strings`]).
    pub fn map_strings<F>(&mut self, f: &mut F)
    where
        F: FnMut(&str) -> Option<String>,
    {
        for value in self.0.values_mut() {
            value.map_strings(f);
        }
    }

    pub(crate) fn hash_into(&self, hasher: &mut Hasher) {
        hasher.update(&(self.0.len() as u64).to_le_bytes());
        for (key, value) in &self.0 {
            hash_bytes(hasher, key.as_bytes());
            value.hash_into(hasher);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Label
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn deep_merge_preserves_sibling_keys() {
        let mut label = Label::new().with("a", Label::new().with("b", 0).with("c", 2));
        label.merge(&Label::new().with("a", Label::new().with("b", 1)));
        assert_eq!(
            label,
            Label::new().with("a", Label::new().with("b", 1).with("c", 2))
        );
    }

    #[test]
    fn merge_creates_missing_nested_maps_and_replaces_scalars() {
        let mut label = Label::new().with("loot", "none");
        label.merge(
            &Label::new()
                .with("loot", Label::new().with("kind", "chest"))
                .with("meta", Label::new().with("seen", true)),
        );
        assert_eq!(label.label("loot").and_then(|l| l.str("kind")), Some("chest"));
        assert_eq!(label.label("meta").and_then(|l| l.flag("seen")), Some(true));
    }

    #[test]
    fn subset_ignores_extra_keys_and_recurses() {
        let target = Label::new()
            .with("type", "room")
            .with("loot", Label::new().with("kind", "chest").with("gold", 5));
        assert!(Label::new().is_subset_of(&target));
        assert!(Label::new().with("type", "room").is_subset_of(&target));
        assert!(Label::new()
            .with("loot", Label::new().with("kind", "chest"))
            .is_subset_of(&target));
        assert!(!Label::new().with("type", "hall").is_subset_of(&target));
        assert!(!Label::new().with("missing", true).is_subset_of(&target));
        assert!(!Label::new()
            .with("loot", Label::new().with("gold", 6))
            .is_subset_of(&target));
    }

    #[test]
    fn sequences_compare_by_equality() {
        let target = Label::new().with("tags", vec![Value::from("a"), Value::from("b")]);
        assert!(!Label::new()
            .with("tags", vec![Value::from("a")])
            .is_subset_of(&target));
        assert!(target.clone().is_subset_of(&target));
    }

    #[test]
    fn map_strings_reaches_nested_lists_and_maps() {
        let mut label = Label::new()
            .with("prereq", Label::new().with("node_id", "$k"))
            .with("list", vec![Value::from("$k"), Value::from(3)])
            .with("keep", "$other");
        label.map_strings(&mut |s| (s == "$k").then(|| "n9".to_owned()));
        assert_eq!(label.label("prereq").and_then(|p| p.str("node_id")), Some("n9"));
        assert_eq!(
            label.get("list"),
            Some(&Value::List(vec![Value::from("n9"), Value::from(3)]))
        );
        assert_eq!(label.str("keep"), Some("$other"));
    }

    #[test]
    fn json_shapes_deserialize_untagged() {
        let label: Label =
            serde_json::from_str(r#"{"a": 1, "b": "x", "c": [true], "d": {"e": 2.5}}"#).unwrap();
        assert_eq!(label.num("a"), Some(1.0));
        assert_eq!(label.str("b"), Some("x"));
        assert_eq!(label.get("c"), Some(&Value::List(vec![Value::Bool(true)])));
        assert_eq!(label.label("d").and_then(|d| d.num("e")), Some(2.5));
    }
}
