// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code, clippy::panic)]

use std::sync::Arc;

use warren_core::demo::dungeon::{dungeon_grammar, seed_graph, DungeonConfig};
use warren_core::demo::flavor::TemplateText;
use warren_core::{Engine, Graph, Label, NodeId};

/// Dungeon engine with offline flavor text.
pub fn dungeon_engine(seed: u64, max_depth: u32) -> Engine {
    let config = DungeonConfig {
        max_depth,
        ..DungeonConfig::default()
    };
    Engine::with_seed(
        seed_graph(),
        dungeon_grammar(&config, Arc::new(TemplateText)),
        seed,
    )
}

/// `count` isolated nodes sharing one label.
pub fn add_nodes(graph: &mut Graph, count: usize, label: &Label) -> Vec<NodeId> {
    (0..count).map(|_| graph.add_node(label.clone())).collect()
}

/// Two nodes joined by one edge carrying `label`.
pub fn single_edge(label: Label) -> Graph {
    let mut graph = Graph::new();
    let a = graph.add_node(Label::new().with("role", "a"));
    let b = graph.add_node(Label::new().with("role", "b"));
    if let Err(err) = graph.add_edge(a, b, label) {
        panic!("fixture edge rejected: {err}");
    }
    graph
}
