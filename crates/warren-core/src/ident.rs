// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier types and the monotonic id allocator.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::label::Value;

/// Canonical 256-bit digest used for graph snapshots.
pub type Hash = [u8; 32];

/// Identifier for a node, unique within the node namespace.
///
/// Renders as `n<k>`; that string form is what label data uses to refer to a
/// node (for example an edge's `prereq.node_id`).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(pub u64);

/// Identifier for an edge, unique within the edge namespace. Renders as `e<k>`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct EdgeId(pub u64);

/// Error returned when parsing an id from its string form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} id: {text:?}")]
pub struct ParseIdError {
    kind: &'static str,
    text: String,
}

fn parse_prefixed(s: &str, prefix: char, kind: &'static str) -> Result<u64, ParseIdError> {
    s.strip_prefix(prefix)
        .and_then(|digits| digits.parse::<u64>().ok())
        .ok_or_else(|| ParseIdError {
            kind,
            text: s.to_owned(),
        })
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_prefixed(s, 'n', "node").map(Self)
    }
}

impl FromStr for EdgeId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_prefixed(s, 'e', "edge").map(Self)
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Self::Str(id.to_string())
    }
}

macro_rules! string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                text.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(NodeId);
string_serde!(EdgeId);

/// Two independent monotonic counters, one per id namespace.
///
/// Invariant: every id handed out is strictly greater than every id handed out
/// (or observed via [`IdAllocator::observe_node`] / [`IdAllocator::observe_edge`])
/// before it, so ids are never reissued even after their entity is removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdAllocator {
    next_node: u64,
    next_edge: u64,
}

impl IdAllocator {
    /// Allocates a fresh node id.
    pub fn node(&mut self) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        id
    }

    /// Allocates a fresh edge id.
    pub fn edge(&mut self) -> EdgeId {
        let id = EdgeId(self.next_edge);
        self.next_edge += 1;
        id
    }

    /// Advances the node counter past an externally supplied id.
    pub fn observe_node(&mut self, id: NodeId) {
        self.next_node = self.next_node.max(id.0.saturating_add(1));
    }

    /// Advances the edge counter past an externally supplied id.
    pub fn observe_edge(&mut self, id: EdgeId) {
        self.next_edge = self.next_edge.max(id.0.saturating_add(1));
    }

    /// Raises both counters to at least the given next ids.
    ///
    /// Counters never move backwards, so ids already observed stay retired.
    pub fn resume_from(&mut self, next_node: NodeId, next_edge: EdgeId) {
        self.next_node = self.next_node.max(next_node.0);
        self.next_edge = self.next_edge.max(next_edge.0);
    }

    /// Next node id that [`IdAllocator::node`] would return.
    pub fn peek_node(&self) -> NodeId {
        NodeId(self.next_node)
    }

    /// Next edge id that [`IdAllocator::edge`] would return.
    pub fn peek_edge(&self) -> EdgeId {
        EdgeId(self.next_edge)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn namespaces_are_independent() {
        let mut ids = IdAllocator::default();
        assert_eq!(ids.node(), NodeId(0));
        assert_eq!(ids.node(), NodeId(1));
        assert_eq!(ids.edge(), EdgeId(0));
        assert_eq!(ids.node(), NodeId(2));
    }

    #[test]
    fn observe_never_moves_backwards() {
        let mut ids = IdAllocator::default();
        ids.observe_node(NodeId(9));
        ids.observe_node(NodeId(3));
        assert_eq!(ids.node(), NodeId(10));
        ids.observe_edge(EdgeId(0));
        assert_eq!(ids.edge(), EdgeId(1));
    }

    #[test]
    fn string_forms_round_trip() {
        assert_eq!(NodeId(42).to_string(), "n42");
        assert_eq!("e7".parse::<EdgeId>(), Ok(EdgeId(7)));
        assert!("7".parse::<NodeId>().is_err());
        assert!("e7".parse::<NodeId>().is_err());
        assert!("n-1".parse::<NodeId>().is_err());
    }
}
