// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory graph store rewritten in place by the engine.
use std::collections::BTreeMap;

use blake3::Hasher;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ident::{EdgeId, Hash, IdAllocator, NodeId};
use crate::label::Label;
use crate::record::{Edge, Node};

/// Errors raised when a mutation would break graph invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// An edge endpoint does not resolve to a node in this graph.
    #[error("edge {edge} references missing node {node}")]
    DanglingEndpoint {
        /// Offending edge (or the id it would have received).
        edge: EdgeId,
        /// Missing endpoint.
        node: NodeId,
    },
    /// A node with this id already exists.
    #[error("duplicate node id {0}")]
    DuplicateNode(NodeId),
    /// An edge with this id already exists.
    #[error("duplicate edge id {0}")]
    DuplicateEdge(EdgeId),
}

/// Node and edge maps plus the id counters that feed them.
///
/// Both maps are `BTreeMap`s so iteration (and therefore candidate order and
/// the snapshot digest) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GraphDocument", into = "GraphDocument")]
pub struct Graph {
    nodes: BTreeMap<NodeId, Node>,
    edges: BTreeMap<EdgeId, Edge>,
    ids: IdAllocator,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node under a freshly allocated id.
    pub fn add_node(&mut self, label: Label) -> NodeId {
        let id = self.ids.node();
        self.nodes.insert(id, Node { id, label });
        id
    }

    /// Inserts an edge under a freshly allocated id.
    ///
    /// # Errors
    /// Returns [`GraphError::DanglingEndpoint`] when `src` or `dest` is not in
    /// the graph; no id is consumed in that case.
    pub fn add_edge(&mut self, src: NodeId, dest: NodeId, label: Label) -> Result<EdgeId, GraphError> {
        self.add_edge_with_prereq(src, dest, label, None)
    }

    /// Like [`Graph::add_edge`], attaching an optional prerequisite label.
    ///
    /// # Errors
    /// Returns [`GraphError::DanglingEndpoint`] when an endpoint is missing.
    pub fn add_edge_with_prereq(
        &mut self,
        src: NodeId,
        dest: NodeId,
        label: Label,
        prereq: Option<Label>,
    ) -> Result<EdgeId, GraphError> {
        self.check_endpoints(self.ids.peek_edge(), src, dest)?;
        let id = self.ids.edge();
        self.edges.insert(
            id,
            Edge {
                id,
                src,
                dest,
                label,
                prereq,
            },
        );
        Ok(id)
    }

    /// Inserts a node that already carries an id (seed graphs, documents).
    ///
    /// # Errors
    /// Returns [`GraphError::DuplicateNode`] if the id is taken.
    pub fn insert_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        self.ids.observe_node(node.id);
        self.nodes.insert(node.id, node);
        Ok(())
    }

    /// Inserts an edge that already carries an id (seed graphs, documents).
    ///
    /// # Errors
    /// Returns [`GraphError::DuplicateEdge`] if the id is taken or
    /// [`GraphError::DanglingEndpoint`] if an endpoint is missing.
    pub fn insert_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        if self.edges.contains_key(&edge.id) {
            return Err(GraphError::DuplicateEdge(edge.id));
        }
        self.check_endpoints(edge.id, edge.src, edge.dest)?;
        self.ids.observe_edge(edge.id);
        self.edges.insert(edge.id, edge);
        Ok(())
    }

    /// Removes an edge, returning it. Its id stays retired.
    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        self.edges.remove(&id)
    }

    /// Returns a node when it exists.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Returns the label of a node for in-place updates.
    pub fn node_label_mut(&mut self, id: NodeId) -> Option<&mut Label> {
        self.nodes.get_mut(&id).map(|n| &mut n.label)
    }

    /// Returns an edge when it exists.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    /// Returns the label of an edge for in-place updates. Endpoints and ids
    /// are fixed at insertion.
    pub fn edge_label_mut(&mut self, id: EdgeId) -> Option<&mut Label> {
        self.edges.get_mut(&id).map(|e| &mut e.label)
    }

    /// Returns the prerequisite slot of an edge.
    pub fn edge_prereq_mut(&mut self, id: EdgeId) -> Option<&mut Option<Label>> {
        self.edges.get_mut(&id).map(|e| &mut e.prereq)
    }

    /// Iterates nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Iterates edges in ascending id order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The id counters backing this graph.
    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    /// Verifies that every edge endpoint resolves.
    ///
    /// # Errors
    /// Returns the first [`GraphError::DanglingEndpoint`] found, in edge order.
    pub fn check_integrity(&self) -> Result<(), GraphError> {
        self.edges
            .values()
            .try_for_each(|e| self.check_endpoints(e.id, e.src, e.dest))
    }

    /// Canonical BLAKE3 digest of the graph contents.
    ///
    /// Nodes are visited in ascending `NodeId` order, then edges in ascending
    /// `EdgeId` order. Ids are 8-byte little-endian, label keys and strings are
    /// length-prefixed, and numbers hash their IEEE-754 bit pattern. Id counters
    /// are not part of the digest.
    pub fn digest(&self) -> Hash {
        let mut hasher = Hasher::new();
        hasher.update(&(self.nodes.len() as u64).to_le_bytes());
        for node in self.nodes.values() {
            hasher.update(&node.id.0.to_le_bytes());
            node.label.hash_into(&mut hasher);
        }
        hasher.update(&(self.edges.len() as u64).to_le_bytes());
        for edge in self.edges.values() {
            hasher.update(&edge.id.0.to_le_bytes());
            hasher.update(&edge.src.0.to_le_bytes());
            hasher.update(&edge.dest.0.to_le_bytes());
            edge.label.hash_into(&mut hasher);
            match &edge.prereq {
                None => {
                    hasher.update(&[0]);
                }
                Some(prereq) => {
                    hasher.update(&[1]);
                    prereq.hash_into(&mut hasher);
                }
            }
        }
        hasher.finalize().into()
    }

    fn check_endpoints(&self, edge: EdgeId, src: NodeId, dest: NodeId) -> Result<(), GraphError> {
        for node in [src, dest] {
            if !self.nodes.contains_key(&node) {
                return Err(GraphError::DanglingEndpoint { edge, node });
            }
        }
        Ok(())
    }
}

/// Serialized form of a [`Graph`]: flat node and edge lists plus the id
/// counters, so ids retired before saving stay retired after loading.
#[derive(Serialize, Deserialize)]
struct GraphDocument {
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    edges: Vec<Edge>,
    #[serde(default)]
    next_node: u64,
    #[serde(default)]
    next_edge: u64,
}

impl TryFrom<GraphDocument> for Graph {
    type Error = GraphError;

    fn try_from(doc: GraphDocument) -> Result<Self, Self::Error> {
        let mut graph = Self::new();
        for node in doc.nodes {
            graph.insert_node(node)?;
        }
        for edge in doc.edges {
            graph.insert_edge(edge)?;
        }
        graph.ids.resume_from(NodeId(doc.next_node), EdgeId(doc.next_edge));
        Ok(graph)
    }
}

impl From<Graph> for GraphDocument {
    fn from(graph: Graph) -> Self {
        Self {
            next_node: graph.ids.peek_node().0,
            next_edge: graph.ids.peek_edge().0,
            nodes: graph.nodes.into_values().collect(),
            edges: graph.edges.into_values().collect(),
        }
    }
}
