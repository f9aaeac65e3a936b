// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph record types: nodes and edges.
use serde::{Deserialize, Serialize};

use crate::ident::{EdgeId, NodeId};
use crate::label::Label;

/// A node stored in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Identifier, unique within the node namespace.
    pub id: NodeId,
    /// Open label data.
    #[serde(default)]
    pub label: Label,
}

/// A directed edge stored in the graph.
///
/// Invariants
/// - `src` and `dest` reference nodes present in the same graph.
/// - `id` is never reused once the edge is removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Identifier, unique within the edge namespace.
    pub id: EdgeId,
    /// Source node.
    pub src: NodeId,
    /// Destination node.
    pub dest: NodeId,
    /// Open label data.
    #[serde(default)]
    pub label: Label,
    /// Optional traversal requirement (e.g. `{ node_id: "n4" }` for a key room).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prereq: Option<Label>,
}
