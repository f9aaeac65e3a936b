// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Rewrite rule definitions.
use std::fmt;
use std::sync::Arc;

use crate::ident::NodeId;
use crate::label::Label;
use crate::pattern::{EdgePattern, MatchSpec};
use crate::record::{Edge, Node};
use crate::update::UpdateSpec;

/// A matched edge together with its resolved endpoints.
///
/// Handed to subgraph builders by value-snapshot: `edge` is the edge as it was
/// before removal.
#[derive(Debug, Clone, PartialEq)]
pub struct Triple {
    /// Source node of the matched edge.
    pub src: Node,
    /// Destination node of the matched edge.
    pub dest: Node,
    /// The matched edge.
    pub edge: Edge,
}

/// Builder invoked by a graph rule once the matched edge has been removed.
///
/// Returning `None` is valid: the step then reduces to the edge removal.
pub type SubgraphFn = Arc<dyn Fn(&Triple) -> Option<SubgraphSpec> + Send + Sync>;

/// Endpoint of an edge introduced by subgraph substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// A node declared in the same [`SubgraphSpec`], by placeholder id.
    Placeholder(String),
    /// An existing node (typically the matched `src` or `dest`).
    Node(NodeId),
}

impl From<NodeId> for Endpoint {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<&str> for Endpoint {
    fn from(placeholder: &str) -> Self {
        Self::Placeholder(placeholder.to_owned())
    }
}

/// Node introduced by subgraph substitution.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    /// Builder-chosen placeholder id, remapped to a fresh `NodeId` on insert.
    pub id: String,
    /// Label of the new node.
    pub label: Label,
}

/// Edge introduced by subgraph substitution.
///
/// Any string anywhere in `label` or `prereq` that equals a placeholder of
/// the same subgraph is rewritten to the fresh node id on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeSpec {
    /// Source endpoint.
    pub src: Endpoint,
    /// Destination endpoint.
    pub dest: Endpoint,
    /// Label of the new edge.
    pub label: Label,
    /// Optional prerequisite label.
    pub prereq: Option<Label>,
}

impl EdgeSpec {
    /// New edge between two endpoints.
    pub fn new(src: impl Into<Endpoint>, dest: impl Into<Endpoint>, label: Label) -> Self {
        Self {
            src: src.into(),
            dest: dest.into(),
            label,
            prereq: None,
        }
    }

    /// Re-emits an existing edge: same endpoints, label and prerequisite.
    ///
    /// The inserted copy always receives a fresh `EdgeId`; the original id is
    /// never carried over.
    pub fn reemit(edge: &Edge) -> Self {
        Self {
            src: Endpoint::Node(edge.src),
            dest: Endpoint::Node(edge.dest),
            label: edge.label.clone(),
            prereq: edge.prereq.clone(),
        }
    }

    /// Deep-merges `patch` into the label.
    pub fn merged(mut self, patch: &Label) -> Self {
        self.label.merge(patch);
        self
    }

    /// Sets the prerequisite label.
    pub fn with_prereq(mut self, prereq: Label) -> Self {
        self.prereq = Some(prereq);
        self
    }
}

/// Nodes and edges inserted by a graph rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubgraphSpec {
    /// New nodes, inserted in order.
    pub nodes: Vec<NodeSpec>,
    /// New edges, inserted in order after all nodes.
    pub edges: Vec<EdgeSpec>,
}

impl SubgraphSpec {
    /// Empty spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a placeholder node.
    pub fn node(mut self, placeholder: impl Into<String>, label: Label) -> Self {
        self.nodes.push(NodeSpec {
            id: placeholder.into(),
            label,
        });
        self
    }

    /// Adds an edge.
    pub fn edge(mut self, edge: EdgeSpec) -> Self {
        self.edges.push(edge);
        self
    }
}

/// The three production kinds, plus the loader's fallback for unknown tags.
#[derive(Clone)]
pub enum RuleKind {
    /// Update a matched node's label.
    Node {
        /// Match condition on the node.
        node: MatchSpec<Node>,
        /// Update applied to the node label.
        update: UpdateSpec,
    },
    /// Retype a matched edge's label; id and endpoints are preserved.
    Edge {
        /// Match condition on the edge and its endpoints.
        pattern: EdgePattern,
        /// Update applied to the edge label.
        update: UpdateSpec,
    },
    /// Replace a matched edge with a generated subgraph.
    Graph {
        /// Match condition on the edge and its endpoints.
        pattern: EdgePattern,
        /// Subgraph builder.
        build: SubgraphFn,
    },
    /// A rule whose kind tag was not recognised when loaded. Never matches.
    Unrecognized {
        /// The offending tag.
        kind: String,
    },
}

impl RuleKind {
    /// Short tag for logs.
    pub fn tag(&self) -> &str {
        match self {
            Self::Node { .. } => "node",
            Self::Edge { .. } => "edge",
            Self::Graph { .. } => "graph",
            Self::Unrecognized { kind } => kind,
        }
    }
}

impl fmt::Debug for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node { node, update } => f
                .debug_struct("Node")
                .field("node", node)
                .field("update", update)
                .finish(),
            Self::Edge { pattern, update } => f
                .debug_struct("Edge")
                .field("pattern", pattern)
                .field("update", update)
                .finish(),
            Self::Graph { pattern, .. } => f
                .debug_struct("Graph")
                .field("pattern", pattern)
                .finish_non_exhaustive(),
            Self::Unrecognized { kind } => {
                f.debug_struct("Unrecognized").field("kind", kind).finish()
            }
        }
    }
}

/// A weighted production.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Human-readable name for logs and debugging.
    pub name: String,
    /// Relative selection weight; expected positive.
    pub weight: f64,
    /// Left- and right-hand side.
    pub kind: RuleKind,
}

impl Rule {
    /// Node production.
    pub fn node(
        name: impl Into<String>,
        weight: f64,
        node: impl Into<MatchSpec<Node>>,
        update: impl Into<UpdateSpec>,
    ) -> Self {
        Self {
            name: name.into(),
            weight,
            kind: RuleKind::Node {
                node: node.into(),
                update: update.into(),
            },
        }
    }

    /// Edge production.
    pub fn edge(
        name: impl Into<String>,
        weight: f64,
        pattern: EdgePattern,
        update: impl Into<UpdateSpec>,
    ) -> Self {
        Self {
            name: name.into(),
            weight,
            kind: RuleKind::Edge {
                pattern,
                update: update.into(),
            },
        }
    }

    /// Graph (subgraph substitution) production.
    pub fn graph<F>(name: impl Into<String>, weight: f64, pattern: EdgePattern, build: F) -> Self
    where
        F: Fn(&Triple) -> Option<SubgraphSpec> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            weight,
            kind: RuleKind::Graph {
                pattern,
                build: Arc::new(build),
            },
        }
    }
}

/// One priority tier: rules that compete by weight when the tier is chosen.
#[derive(Debug, Clone, Default)]
pub struct Subgrammar {
    /// Tier name for logs.
    pub name: String,
    /// Rules in declaration order.
    pub rules: Vec<Rule>,
}

impl Subgrammar {
    /// Empty tier.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    /// Appends a rule.
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }
}

/// Ordered tiers; an earlier tier with any match preempts every later one.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    /// Tiers, highest priority first.
    pub tiers: Vec<Subgrammar>,
}

impl Grammar {
    /// Empty grammar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a lower-priority tier.
    pub fn tier(mut self, tier: Subgrammar) -> Self {
        self.tiers.push(tier);
        self
    }

    /// Total number of rules across tiers.
    pub fn rule_count(&self) -> usize {
        self.tiers.iter().map(|t| t.rules.len()).sum()
    }
}
