// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graphviz export.
//!
//! Nodes are captioned with their id and `role` (or `name`, or `type`). Edges
//! are captioned with their `type`; locked edges are dashed and name the node
//! their prerequisite points at.

use std::fmt::{self, Write};

use warren_core::{Edge, Graph, Label, Node};

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn caption(label: &Label) -> Option<&str> {
    ["role", "name", "type"].iter().find_map(|key| label.str(key))
}

fn node_line(out: &mut String, node: &Node) -> fmt::Result {
    let text = match caption(&node.label) {
        Some(c) => format!("{}\\n{}", node.id, escape(c)),
        None => node.id.to_string(),
    };
    writeln!(out, "  \"{}\" [label=\"{text}\"];", node.id)
}

fn prereq_text(prereq: &Label) -> String {
    prereq.str("node_id").map_or_else(
        || escape(&serde_json::to_string(prereq).unwrap_or_default()),
        |id| format!("needs {}", escape(id)),
    )
}

fn edge_line(out: &mut String, edge: &Edge) -> fmt::Result {
    let mut parts: Vec<String> = Vec::new();
    if let Some(kind) = edge.label.str("type") {
        parts.push(escape(kind));
    }
    if let Some(state) = edge.label.str("state") {
        parts.push(escape(state));
    }
    if let Some(prereq) = &edge.prereq {
        parts.push(prereq_text(prereq));
    }
    write!(
        out,
        "  \"{}\" -> \"{}\" [label=\"{}\"",
        edge.src,
        edge.dest,
        parts.join("\\n")
    )?;
    if edge.label.str("state") == Some("locked") {
        out.write_str(", style=dashed")?;
    }
    out.write_str("];\n")
}

/// Renders `graph` as a Graphviz digraph, nodes then edges in id order.
pub fn render(graph: &Graph) -> Result<String, fmt::Error> {
    let mut out = String::from("digraph warren {\n  node [shape=box];\n");
    for node in graph.nodes() {
        node_line(&mut out, node)?;
    }
    for edge in graph.edges() {
        edge_line(&mut out, edge)?;
    }
    out.push_str("}\n");
    Ok(out)
}
