// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Candidate search with the priority cascade.
//!
//! Every step rescans the whole graph; nothing is cached between steps, so a
//! candidate can never refer to state that a previous application changed.
use tracing::warn;

use crate::graph::Graph;
use crate::ident::{EdgeId, NodeId};
use crate::rule::{Grammar, Rule, RuleKind, Subgrammar};

/// Where a rule matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    /// A node rule matched this node.
    Node(NodeId),
    /// An edge or graph rule matched this edge and its endpoints.
    Edge {
        /// Source endpoint.
        src: NodeId,
        /// Destination endpoint.
        dest: NodeId,
        /// The matched edge.
        edge: EdgeId,
    },
}

/// One concrete match of one rule against the current graph.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'r> {
    /// Originating rule; its weight is the candidate's weight.
    pub rule: &'r Rule,
    /// Match site.
    pub site: Site,
}

impl Candidate<'_> {
    /// Selection weight inherited from the rule.
    pub fn weight(&self) -> f64 {
        self.rule.weight
    }
}

/// Candidates drawn from a single tier.
#[derive(Debug, Clone)]
pub struct CandidateSet<'r> {
    /// Index of the tier that produced the candidates.
    pub tier: usize,
    /// Non-empty list of candidates in rule order, then site order.
    pub candidates: Vec<Candidate<'r>>,
}

/// Finds every match in the highest-priority tier that has at least one.
///
/// Returns `None` when no tier matches anything (the terminal state).
pub fn find_candidates<'r>(graph: &Graph, grammar: &'r Grammar) -> Option<CandidateSet<'r>> {
    grammar.tiers.iter().enumerate().find_map(|(tier, sub)| {
        let candidates = tier_candidates(graph, sub);
        (!candidates.is_empty()).then_some(CandidateSet { tier, candidates })
    })
}

/// All matches of every rule in one tier, accumulated in rule order.
pub fn tier_candidates<'r>(graph: &Graph, tier: &'r Subgrammar) -> Vec<Candidate<'r>> {
    let mut out = Vec::new();
    for rule in &tier.rules {
        rule_candidates(graph, rule, &mut out);
    }
    out
}

fn rule_candidates<'r>(graph: &Graph, rule: &'r Rule, out: &mut Vec<Candidate<'r>>) {
    match &rule.kind {
        RuleKind::Node { node: spec, .. } => {
            out.extend(
                graph
                    .nodes()
                    .filter(|n| spec.matches(n, graph))
                    .map(|n| Candidate {
                        rule,
                        site: Site::Node(n.id),
                    }),
            );
        }
        RuleKind::Edge { pattern, .. } | RuleKind::Graph { pattern, .. } => {
            for edge in graph.edges() {
                let (Some(src), Some(dest)) = (graph.node(edge.src), graph.node(edge.dest)) else {
                    continue;
                };
                if pattern.matches(src, dest, edge, graph) {
                    out.push(Candidate {
                        rule,
                        site: Site::Edge {
                            src: edge.src,
                            dest: edge.dest,
                            edge: edge.id,
                        },
                    });
                }
            }
        }
        RuleKind::Unrecognized { kind } => {
            warn!(rule = %rule.name, kind = %kind, "unrecognized rule kind; skipping");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::label::Label;
    use crate::pattern::{EdgePattern, MatchSpec};
    use crate::update::UpdateSpec;

    fn line() -> Graph {
        let mut graph = Graph::new();
        let a = graph.add_node(Label::new().with("role", "entrance"));
        let b = graph.add_node(Label::new().with("role", "goal"));
        graph
            .add_edge(a, b, Label::new().with("type", "path"))
            .unwrap();
        graph
    }

    #[test]
    fn node_rules_emit_one_candidate_per_matching_node() {
        let graph = line();
        let tier = Subgrammar::new("t").rule(Rule::node("any", 1.0, MatchSpec::Any, UpdateSpec::Keep));
        let found = tier_candidates(&graph, &tier);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].site, Site::Node(NodeId(0)));
        assert_eq!(found[1].site, Site::Node(NodeId(1)));
    }

    #[test]
    fn unrecognized_kind_contributes_nothing_and_cascade_continues() {
        let graph = line();
        let grammar = Grammar::new()
            .tier(Subgrammar::new("broken").rule(Rule {
                name: "mystery".into(),
                weight: 1.0,
                kind: RuleKind::Unrecognized {
                    kind: "hyperedge".into(),
                },
            }))
            .tier(Subgrammar::new("ok").rule(Rule::edge(
                "retype",
                1.0,
                EdgePattern::edge(Label::new().with("type", "path")),
                Label::new().with("type", "corridor"),
            )));
        let set = find_candidates(&graph, &grammar).unwrap();
        assert_eq!(set.tier, 1);
        assert_eq!(
            set.candidates[0].site,
            Site::Edge {
                src: NodeId(0),
                dest: NodeId(1),
                edge: EdgeId(0)
            }
        );
    }

    #[test]
    fn empty_grammar_is_terminal() {
        assert!(find_candidates(&line(), &Grammar::new()).is_none());
    }
}
