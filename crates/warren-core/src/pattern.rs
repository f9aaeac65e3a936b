// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Left-hand-side match specifications.
use std::fmt;
use std::sync::Arc;

use crate::graph::Graph;
use crate::label::Label;
use crate::record::{Edge, Node};

/// Entities that carry a [`Label`].
pub trait Labelled {
    /// The entity's label.
    fn label(&self) -> &Label;
}

impl Labelled for Node {
    fn label(&self) -> &Label {
        &self.label
    }
}

impl Labelled for Edge {
    fn label(&self) -> &Label {
        &self.label
    }
}

/// Caller-supplied predicate over an entity and the graph it lives in.
pub type Predicate<T> = Arc<dyn Fn(&T, &Graph) -> bool + Send + Sync>;

/// Match condition for a single node or edge.
///
/// An absent specification is [`MatchSpec::Any`], which matches everything.
pub enum MatchSpec<T> {
    /// Permissive matcher.
    Any,
    /// Structural subset of the entity's label (see [`Label::is_subset_of`]).
    Structure(Label),
    /// Procedural test, used verbatim.
    Predicate(Predicate<T>),
}

impl<T> MatchSpec<T> {
    /// Wraps a closure as a [`MatchSpec::Predicate`].
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&T, &Graph) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }
}

impl<T: Labelled> MatchSpec<T> {
    /// Evaluates the condition against `entity`.
    pub fn matches(&self, entity: &T, graph: &Graph) -> bool {
        match self {
            Self::Any => true,
            Self::Structure(pattern) => pattern.is_subset_of(entity.label()),
            Self::Predicate(test) => test(entity, graph),
        }
    }
}

impl<T> Default for MatchSpec<T> {
    fn default() -> Self {
        Self::Any
    }
}

impl<T> Clone for MatchSpec<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Any => Self::Any,
            Self::Structure(label) => Self::Structure(label.clone()),
            Self::Predicate(f) => Self::Predicate(Arc::clone(f)),
        }
    }
}

impl<T> From<Label> for MatchSpec<T> {
    fn from(label: Label) -> Self {
        Self::Structure(label)
    }
}

impl<T> From<Option<Label>> for MatchSpec<T> {
    fn from(label: Option<Label>) -> Self {
        label.map_or(Self::Any, Self::Structure)
    }
}

impl<T> fmt::Debug for MatchSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("Any"),
            Self::Structure(label) => f.debug_tuple("Structure").field(label).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Three-way match over an edge and its endpoints.
#[derive(Debug, Clone, Default)]
pub struct EdgePattern {
    /// Condition on the source node.
    pub src: MatchSpec<Node>,
    /// Condition on the destination node.
    pub dest: MatchSpec<Node>,
    /// Condition on the edge itself.
    pub edge: MatchSpec<Edge>,
}

impl EdgePattern {
    /// Pattern constraining only the edge.
    pub fn edge(edge: impl Into<MatchSpec<Edge>>) -> Self {
        Self {
            edge: edge.into(),
            ..Self::default()
        }
    }

    /// Replaces the source condition.
    pub fn with_src(mut self, src: impl Into<MatchSpec<Node>>) -> Self {
        self.src = src.into();
        self
    }

    /// Replaces the destination condition.
    pub fn with_dest(mut self, dest: impl Into<MatchSpec<Node>>) -> Self {
        self.dest = dest.into();
        self
    }

    /// All three conditions must hold independently.
    pub fn matches(&self, src: &Node, dest: &Node, edge: &Edge, graph: &Graph) -> bool {
        self.src.matches(src, graph) && self.dest.matches(dest, graph) && self.edge.matches(edge, graph)
    }
}
