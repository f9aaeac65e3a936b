// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Declarative grammar documents.
//!
//! A [`GrammarDef`] is the serde-facing form of a [`Grammar`]: structural
//! match labels on the left, merge labels or a subgraph template on the right.
//! Loading never fails on content: an unknown `kind` tag becomes
//! [`RuleKind::Unrecognized`] and is reported when searched.
//!
//! ```json
//! { "subgrammars": [ { "name": "grow", "rules": [
//!     { "name": "split", "kind": "graph", "weight": 2,
//!       "lhs": { "edge": { "type": "path" } },
//!       "rhs": { "subgraph": {
//!         "nodes": [ { "id": "$mid", "label": { "role": "chamber" } } ],
//!         "edges": [ { "src": "$src", "dest": "$mid", "label": { "type": "hall" } },
//!                    { "src": "$mid", "dest": "$dest", "label": { "type": "hall" } } ] } } }
//! ] } ] }
//! ```
use serde::{Deserialize, Serialize};

use crate::label::Label;
use crate::pattern::{EdgePattern, MatchSpec};
use crate::rule::{EdgeSpec, Endpoint, Grammar, Rule, RuleKind, SubgraphSpec, Subgrammar, Triple};

/// Placeholder bound to the matched edge's source node.
pub const SRC_PLACEHOLDER: &str = "$src";
/// Placeholder bound to the matched edge's destination node.
pub const DEST_PLACEHOLDER: &str = "$dest";

/// Serialized grammar: tiers in priority order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrammarDef {
    /// Tiers, highest priority first.
    pub subgrammars: Vec<SubgrammarDef>,
}

/// Serialized tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubgrammarDef {
    /// Tier name.
    #[serde(default)]
    pub name: String,
    /// Rules in declaration order.
    #[serde(default)]
    pub rules: Vec<RuleDef>,
}

fn default_weight() -> f64 {
    1.0
}

/// Serialized rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDef {
    /// Rule name.
    #[serde(default)]
    pub name: String,
    /// `node`, `edge` or `graph`.
    pub kind: String,
    /// Selection weight (default 1).
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Structural match labels.
    #[serde(default)]
    pub lhs: LhsDef,
    /// Updates or subgraph template.
    #[serde(default)]
    pub rhs: RhsDef,
}

/// Left-hand side; absent entries match anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LhsDef {
    /// Node condition (node rules).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<Label>,
    /// Source condition (edge/graph rules).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<Label>,
    /// Destination condition (edge/graph rules).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<Label>,
    /// Edge condition (edge/graph rules).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge: Option<Label>,
}

/// Right-hand side; absent updates are no-ops.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RhsDef {
    /// Merge label for node rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<Label>,
    /// Merge label for edge rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge: Option<Label>,
    /// Template for graph rules; absent means "remove the edge only".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subgraph: Option<SubgraphTemplate>,
}

/// Subgraph template instantiated for every application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubgraphTemplate {
    /// New nodes.
    #[serde(default)]
    pub nodes: Vec<NodeTemplate>,
    /// New edges.
    #[serde(default)]
    pub edges: Vec<EdgeTemplate>,
}

/// Node entry of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTemplate {
    /// Placeholder id.
    pub id: String,
    /// Node label.
    #[serde(default)]
    pub label: Label,
}

/// Edge entry of a template.
///
/// Endpoints default to `$src` / `$dest`. With `reemit`, the matched edge is
/// copied (label deep-merged with `label`) instead of starting empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeTemplate {
    /// Start from a copy of the matched edge.
    #[serde(default)]
    pub reemit: bool,
    /// Source placeholder or node id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    /// Destination placeholder or node id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    /// Edge label (merged over the copy when `reemit`).
    #[serde(default)]
    pub label: Label,
    /// Prerequisite label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prereq: Option<Label>,
}

impl SubgraphTemplate {
    /// Instantiates the template against a matched triple.
    ///
    /// `$src` / `$dest` resolve to the matched endpoints, both as edge
    /// endpoints and anywhere inside edge labels and prerequisites.
    pub fn instantiate(&self, triple: &Triple) -> SubgraphSpec {
        let src_id = triple.src.id.to_string();
        let dest_id = triple.dest.id.to_string();
        let mut bind = |s: &str| match s {
            SRC_PLACEHOLDER => Some(src_id.clone()),
            DEST_PLACEHOLDER => Some(dest_id.clone()),
            _ => None,
        };
        let endpoint = |name: Option<&String>, default: &Endpoint| match name.map(String::as_str) {
            None => default.clone(),
            Some(SRC_PLACEHOLDER) => Endpoint::Node(triple.src.id),
            Some(DEST_PLACEHOLDER) => Endpoint::Node(triple.dest.id),
            Some(other) => Endpoint::Placeholder(other.to_owned()),
        };

        let mut spec = SubgraphSpec::new();
        for node in &self.nodes {
            spec = spec.node(node.id.clone(), node.label.clone());
        }
        for edge in &self.edges {
            let mut out = if edge.reemit {
                EdgeSpec::reemit(&triple.edge).merged(&edge.label)
            } else {
                EdgeSpec::new(triple.src.id, triple.dest.id, edge.label.clone())
            };
            out.src = endpoint(edge.src.as_ref(), &out.src);
            out.dest = endpoint(edge.dest.as_ref(), &out.dest);
            if let Some(prereq) = &edge.prereq {
                out.prereq = Some(prereq.clone());
            }
            out.label.map_strings(&mut bind);
            if let Some(prereq) = out.prereq.as_mut() {
                prereq.map_strings(&mut bind);
            }
            spec = spec.edge(out);
        }
        spec
    }
}

impl RuleDef {
    fn edge_pattern(&self) -> EdgePattern {
        EdgePattern {
            src: MatchSpec::from(self.lhs.src.clone()),
            dest: MatchSpec::from(self.lhs.dest.clone()),
            edge: MatchSpec::from(self.lhs.edge.clone()),
        }
    }

    /// Compiles into an engine rule.
    pub fn compile(self) -> Rule {
        let kind = match self.kind.as_str() {
            "node" => RuleKind::Node {
                node: MatchSpec::from(self.lhs.node.clone()),
                update: self.rhs.node.clone().into(),
            },
            "edge" => RuleKind::Edge {
                pattern: self.edge_pattern(),
                update: self.rhs.edge.clone().into(),
            },
            "graph" => {
                let pattern = self.edge_pattern();
                let template = self.rhs.subgraph.clone();
                return Rule::graph(self.name, self.weight, pattern, move |triple: &Triple| {
                    template.as_ref().map(|t| t.instantiate(triple))
                });
            }
            other => RuleKind::Unrecognized {
                kind: other.to_owned(),
            },
        };
        Rule {
            name: self.name,
            weight: self.weight,
            kind,
        }
    }
}

impl From<GrammarDef> for Grammar {
    fn from(def: GrammarDef) -> Self {
        Self {
            tiers: def
                .subgrammars
                .into_iter()
                .map(|sub| Subgrammar {
                    name: sub.name,
                    rules: sub.rules.into_iter().map(RuleDef::compile).collect(),
                })
                .collect(),
        }
    }
}
