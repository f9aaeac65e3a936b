// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Rule application: label updates, edge retyping, subgraph substitution.
use std::collections::BTreeMap;

use tracing::{trace, warn};

use crate::graph::Graph;
use crate::ident::{EdgeId, NodeId};
use crate::rule::{Endpoint, RuleKind, SubgraphSpec, Triple};
use crate::search::{Candidate, Site};

/// Summary of the mutations performed by one application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Applied {
    /// Node whose label was updated (node rules).
    pub updated_node: Option<NodeId>,
    /// Edge whose label was updated (edge rules).
    pub updated_edge: Option<EdgeId>,
    /// Edge removed by a graph rule.
    pub removed_edge: Option<EdgeId>,
    /// Fresh node ids, in insertion order.
    pub added_nodes: Vec<NodeId>,
    /// Fresh edge ids, in insertion order.
    pub added_edges: Vec<EdgeId>,
    /// New edges skipped because an endpoint could not be resolved.
    pub dropped_edges: usize,
}

/// Applies `candidate` to `graph` in place.
///
/// The candidate must come from a search over this same graph state. A site
/// that no longer resolves, or that does not fit the rule kind, leaves the
/// graph untouched.
pub fn apply_candidate(graph: &mut Graph, candidate: &Candidate<'_>) -> Applied {
    let mut applied = Applied::default();
    match (&candidate.rule.kind, candidate.site) {
        (RuleKind::Node { update, .. }, Site::Node(id)) => {
            if let Some(label) = graph.node_label_mut(id) {
                update.run(label);
                applied.updated_node = Some(id);
            }
        }
        (RuleKind::Edge { update, .. }, Site::Edge { edge, .. }) => {
            if let Some(label) = graph.edge_label_mut(edge) {
                update.run(label);
                applied.updated_edge = Some(edge);
            }
        }
        (RuleKind::Graph { build, .. }, Site::Edge { src, dest, edge }) => {
            let (Some(src), Some(dest)) = (graph.node(src).cloned(), graph.node(dest).cloned())
            else {
                return applied;
            };
            let Some(edge) = graph.remove_edge(edge) else {
                return applied;
            };
            applied.removed_edge = Some(edge.id);
            let triple = Triple { src, dest, edge };
            if let Some(spec) = build(&triple) {
                insert_subgraph(graph, spec, &mut applied);
            }
        }
        (kind, site) => {
            warn!(
                rule = %candidate.rule.name,
                kind = kind.tag(),
                ?site,
                "candidate site does not fit rule kind; skipping"
            );
        }
    }
    applied
}

/// Inserts `spec`, remapping placeholder ids to freshly allocated node ids.
///
/// Nodes are inserted first. Each edge then has its endpoints resolved and
/// every string anywhere in its label and prerequisite that equals a
/// placeholder replaced by the mapped id (`n<k>`). Endpoint strings that are
/// not placeholders are accepted if they parse as an existing node id.
pub fn insert_subgraph(graph: &mut Graph, spec: SubgraphSpec, applied: &mut Applied) {
    let mut placeholders: BTreeMap<String, NodeId> = BTreeMap::new();
    for node in spec.nodes {
        let fresh = graph.add_node(node.label);
        trace!(placeholder = %node.id, node = %fresh, "placeholder bound");
        placeholders.insert(node.id, fresh);
        applied.added_nodes.push(fresh);
    }

    let mut remap = |s: &str| placeholders.get(s).map(ToString::to_string);
    for mut edge in spec.edges {
        edge.label.map_strings(&mut remap);
        if let Some(prereq) = edge.prereq.as_mut() {
            prereq.map_strings(&mut remap);
        }
        let (Some(src), Some(dest)) = (
            resolve(&edge.src, &placeholders),
            resolve(&edge.dest, &placeholders),
        ) else {
            warn!(src = ?edge.src, dest = ?edge.dest, "unresolved placeholder endpoint; edge dropped");
            applied.dropped_edges += 1;
            continue;
        };
        match graph.add_edge_with_prereq(src, dest, edge.label, edge.prereq) {
            Ok(id) => applied.added_edges.push(id),
            Err(err) => {
                warn!(%err, "generated edge dropped");
                applied.dropped_edges += 1;
            }
        }
    }
}

fn resolve(endpoint: &Endpoint, placeholders: &BTreeMap<String, NodeId>) -> Option<NodeId> {
    match endpoint {
        Endpoint::Node(id) => Some(*id),
        Endpoint::Placeholder(name) => placeholders
            .get(name)
            .copied()
            .or_else(|| name.parse().ok()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::label::Label;
    use crate::pattern::{EdgePattern, MatchSpec};
    use crate::rule::{EdgeSpec, Rule};

    fn two_rooms() -> (Graph, NodeId, NodeId, EdgeId) {
        let mut graph = Graph::new();
        let a = graph.add_node(Label::new().with("role", "entrance"));
        let b = graph.add_node(Label::new().with("role", "goal"));
        let e = graph
            .add_edge(a, b, Label::new().with("type", "path").with("depth", 0))
            .unwrap();
        (graph, a, b, e)
    }

    #[test]
    fn node_rule_deep_merges_in_place() {
        let (mut graph, a, _, _) = two_rooms();
        let rule = Rule::node(
            "lamp",
            1.0,
            MatchSpec::Any,
            Label::new().with("light", Label::new().with("lit", true)),
        );
        let applied = apply_candidate(
            &mut graph,
            &Candidate {
                rule: &rule,
                site: Site::Node(a),
            },
        );
        assert_eq!(applied.updated_node, Some(a));
        let label = &graph.node(a).unwrap().label;
        assert_eq!(label.str("role"), Some("entrance"));
        assert_eq!(label.label("light").and_then(|l| l.flag("lit")), Some(true));
    }

    #[test]
    fn edge_rule_preserves_identity_and_endpoints() {
        let (mut graph, a, b, e) = two_rooms();
        let rule = Rule::edge(
            "retype",
            1.0,
            EdgePattern::default(),
            Label::new().with("type", "corridor"),
        );
        apply_candidate(
            &mut graph,
            &Candidate {
                rule: &rule,
                site: Site::Edge { src: a, dest: b, edge: e },
            },
        );
        let edge = graph.edge(e).unwrap();
        assert_eq!((edge.src, edge.dest), (a, b));
        assert_eq!(edge.label.str("type"), Some("corridor"));
        assert_eq!(edge.label.num("depth"), Some(0.0));
    }

    #[test]
    fn graph_rule_without_subgraph_only_removes_the_edge() {
        let (mut graph, a, b, e) = two_rooms();
        let rule = Rule::graph("collapse", 1.0, EdgePattern::default(), |_| None);
        let applied = apply_candidate(
            &mut graph,
            &Candidate {
                rule: &rule,
                site: Site::Edge { src: a, dest: b, edge: e },
            },
        );
        assert_eq!(applied.removed_edge, Some(e));
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn placeholders_remap_into_nested_prereq_fields() {
        let (mut graph, a, b, e) = two_rooms();
        let rule = Rule::graph("lock", 1.0, EdgePattern::default(), |t: &Triple| {
            Some(
                SubgraphSpec::new()
                    .node("$k", Label::new().with("role", "key"))
                    .edge(EdgeSpec::new(t.src.id, "$k", Label::new().with("type", "corridor")))
                    .edge(
                        EdgeSpec::reemit(&t.edge)
                            .merged(&Label::new().with("locked", true))
                            .with_prereq(Label::new().with("node_id", "$k")),
                    ),
            )
        });
        let applied = apply_candidate(
            &mut graph,
            &Candidate {
                rule: &rule,
                site: Site::Edge { src: a, dest: b, edge: e },
            },
        );
        let key = applied.added_nodes[0];
        assert_eq!(applied.added_edges.len(), 2);
        let locked = graph.edge(applied.added_edges[1]).unwrap();
        let node_id = locked.prereq.as_ref().and_then(|p| p.str("node_id"));
        assert_eq!(node_id, Some(key.to_string().as_str()));
        assert_ne!(node_id, Some("$k"));
        let corridor = graph.edge(applied.added_edges[0]).unwrap();
        assert_eq!((corridor.src, corridor.dest), (a, key));
        graph.check_integrity().unwrap();
    }

    #[test]
    fn reemitted_edges_get_fresh_distinct_ids() {
        let (mut graph, a, b, e) = two_rooms();
        let rule = Rule::graph("fork", 1.0, EdgePattern::default(), |t: &Triple| {
            Some(
                SubgraphSpec::new()
                    .edge(EdgeSpec::reemit(&t.edge))
                    .edge(EdgeSpec::reemit(&t.edge)),
            )
        });
        let applied = apply_candidate(
            &mut graph,
            &Candidate {
                rule: &rule,
                site: Site::Edge { src: a, dest: b, edge: e },
            },
        );
        assert_eq!(applied.added_edges.len(), 2);
        assert!(!applied.added_edges.contains(&e));
        assert_ne!(applied.added_edges[0], applied.added_edges[1]);
        assert!(graph.edge(e).is_none());
        for id in &applied.added_edges {
            let copy = graph.edge(*id).unwrap();
            assert_eq!((copy.src, copy.dest), (a, b));
            assert_eq!(copy.label, Label::new().with("type", "path").with("depth", 0));
        }
    }

    #[test]
    fn unresolved_endpoints_are_dropped_not_inserted() {
        let (mut graph, a, b, e) = two_rooms();
        let rule = Rule::graph("typo", 1.0, EdgePattern::default(), |t: &Triple| {
            Some(
                SubgraphSpec::new()
                    .node("$x", Label::new())
                    .edge(EdgeSpec::new(t.src.id, "$y", Label::new()))
                    .edge(EdgeSpec::new("$x", NodeId(999), Label::new()))
                    .edge(EdgeSpec::new("$x", t.dest.id, Label::new())),
            )
        });
        let applied = apply_candidate(
            &mut graph,
            &Candidate {
                rule: &rule,
                site: Site::Edge { src: a, dest: b, edge: e },
            },
        );
        assert_eq!(applied.dropped_edges, 2);
        assert_eq!(applied.added_edges.len(), 1);
        graph.check_integrity().unwrap();
    }

    #[test]
    fn endpoint_strings_may_name_existing_nodes() {
        let (mut graph, a, b, e) = two_rooms();
        let rule = Rule::graph("textual", 1.0, EdgePattern::default(), move |_| {
            Some(SubgraphSpec::new().edge(EdgeSpec::new("n1", "n0", Label::new())))
        });
        let applied = apply_candidate(
            &mut graph,
            &Candidate {
                rule: &rule,
                site: Site::Edge { src: a, dest: b, edge: e },
            },
        );
        let back = graph.edge(applied.added_edges[0]).unwrap();
        assert_eq!((back.src, back.dest), (b, a));
    }
}
