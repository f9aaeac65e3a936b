// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Demo dungeon grammar: grows a path into chambers, forks and side rooms,
//! then locks or opens each door and furnishes the rooms.
//!
//! Tiers, highest priority first:
//!
//! 1. `grow` splits every `path` edge shallower than `max_depth`.
//! 2. `lock` decides each path edge: locked behind a key room, or open.
//! 3. `furnish` stocks side rooms and writes room descriptions.
//!
//! Every production consumes the condition that made it match, so the
//! grammar reaches the terminal state on its own.
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::demo::flavor::TextGenerator;
use crate::graph::Graph;
use crate::label::Label;
use crate::pattern::{EdgePattern, MatchSpec};
use crate::record::{Edge, Node};
use crate::rule::{EdgeSpec, Grammar, Rule, SubgraphSpec, Subgrammar, Triple};
use crate::update::UpdateSpec;

/// Rule names, as reported in step outcomes and logs.
pub const INSERT_CHAMBER: &str = "grow/insert_chamber";
/// Parallel-path production: the matched edge is re-emitted twice.
pub const FORK_PATH: &str = "grow/fork_path";
/// Side room hung off the source of a path.
pub const SIDE_ROOM: &str = "grow/side_room";
/// Door locked behind a new key room.
pub const LOCK_DOOR: &str = "lock/lock_door";
/// Door left open.
pub const OPEN_DOOR: &str = "lock/open_door";
/// Loot placed in side rooms.
pub const STOCK_SIDE_ROOM: &str = "furnish/stock_side_room";
/// Flavor text and the `described` marker.
pub const DESCRIBE_ROOM: &str = "furnish/describe_room";

/// Tunables for the demo grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DungeonConfig {
    /// Path edges at this depth are no longer split.
    pub max_depth: u32,
    /// Style token passed to the text generator.
    pub style: String,
}

impl Default for DungeonConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            style: "dungeon".to_owned(),
        }
    }
}

fn room(role: &str) -> Label {
    Label::new().with("type", "room").with("role", role)
}

fn path(depth: f64) -> Label {
    Label::new().with("type", "path").with("depth", depth)
}

fn depth(edge: &Edge) -> f64 {
    edge.label.num("depth").unwrap_or(0.0)
}

fn is_path(edge: &Edge) -> bool {
    edge.label.str("type") == Some("path")
}

/// Entrance and goal joined by a single depth-0 path.
pub fn seed_graph() -> Graph {
    let mut graph = Graph::new();
    let entrance = graph.add_node(room("entrance"));
    let goal = graph.add_node(room("goal"));
    // Both endpoints were just inserted.
    if let Err(err) = graph.add_edge(entrance, goal, path(0.0)) {
        debug!(%err, "seed path rejected");
    }
    graph
}

/// Builds the three-tier dungeon grammar.
pub fn dungeon_grammar(config: &DungeonConfig, text: Arc<dyn TextGenerator>) -> Grammar {
    Grammar::new()
        .tier(grow_tier(config))
        .tier(lock_tier(config, Arc::clone(&text)))
        .tier(furnish_tier(config, text))
}

fn grow_tier(config: &DungeonConfig) -> Subgrammar {
    let max = f64::from(config.max_depth);
    let growable = move || {
        EdgePattern::edge(MatchSpec::predicate(move |e: &Edge, _: &Graph| {
            is_path(e) && !e.label.contains_key("state") && depth(e) < max
        }))
    };

    Subgrammar::new("grow")
        .rule(Rule::graph(INSERT_CHAMBER, 3.0, growable(), |t: &Triple| {
            let next = depth(&t.edge) + 1.0;
            Some(
                SubgraphSpec::new()
                    .node("$chamber", room("chamber"))
                    .edge(EdgeSpec::new(t.src.id, "$chamber", path(next)))
                    .edge(EdgeSpec::new("$chamber", t.dest.id, path(next))),
            )
        }))
        .rule(Rule::graph(FORK_PATH, 1.0, growable(), |t: &Triple| {
            let deeper = Label::new().with("depth", depth(&t.edge) + 1.0);
            Some(
                SubgraphSpec::new()
                    .edge(EdgeSpec::reemit(&t.edge).merged(&deeper))
                    .edge(EdgeSpec::reemit(&t.edge).merged(&deeper)),
            )
        }))
        .rule(Rule::graph(
            SIDE_ROOM,
            2.0,
            growable().with_src(MatchSpec::predicate(|n: &Node, _: &Graph| {
                n.label.str("role") != Some("side")
            })),
            |t: &Triple| {
                let deeper = Label::new().with("depth", depth(&t.edge) + 1.0);
                Some(
                    SubgraphSpec::new()
                        .node("$side", room("side"))
                        .edge(EdgeSpec::reemit(&t.edge).merged(&deeper))
                        .edge(EdgeSpec::new(
                            t.src.id,
                            "$side",
                            Label::new().with("type", "corridor"),
                        )),
                )
            },
        ))
}

fn lock_tier(config: &DungeonConfig, text: Arc<dyn TextGenerator>) -> Subgrammar {
    let undecided = || {
        EdgePattern::edge(MatchSpec::predicate(|e: &Edge, _: &Graph| {
            is_path(e) && !e.label.contains_key("state")
        }))
    };
    let style = config.style.clone();

    Subgrammar::new("lock")
        .rule(Rule::graph(LOCK_DOOR, 1.0, undecided(), move |t: &Triple| {
            let mut corridor = Label::new().with("type", "corridor").with("leads_to", "key");
            let prior = t.src.label.str("role").unwrap_or("room");
            match text.continue_text(&style, prior, "A narrow corridor ends at a small alcove.") {
                Ok(line) => {
                    corridor.insert("description", line);
                }
                Err(err) => debug!(%err, "corridor text omitted"),
            }
            Some(
                SubgraphSpec::new()
                    .node("$key", room("key"))
                    .edge(EdgeSpec::new(t.src.id, "$key", corridor))
                    .edge(
                        EdgeSpec::reemit(&t.edge)
                            .merged(&Label::new().with("state", "locked"))
                            .with_prereq(Label::new().with("node_id", "$key")),
                    ),
            )
        }))
        .rule(Rule::edge(
            OPEN_DOOR,
            3.0,
            undecided(),
            Label::new().with("state", "open"),
        ))
}

fn furnish_tier(config: &DungeonConfig, text: Arc<dyn TextGenerator>) -> Subgrammar {
    let style = config.style.clone();

    Subgrammar::new("furnish")
        .rule(Rule::node(
            STOCK_SIDE_ROOM,
            1.0,
            MatchSpec::predicate(|n: &Node, _: &Graph| {
                n.label.str("role") == Some("side") && !n.label.contains_key("loot")
            }),
            Label::new().with("loot", Label::new().with("kind", "chest").with("opened", false)),
        ))
        .rule(Rule::node(
            DESCRIBE_ROOM,
            1.0,
            MatchSpec::predicate(|n: &Node, _: &Graph| {
                n.label.str("type") == Some("room") && !n.label.contains_key("described")
            }),
            UpdateSpec::apply(move |label: &mut Label| {
                let template = match label.str("role") {
                    Some("entrance") => "Daylight spills through the entrance.",
                    Some("goal") => "The final chamber waits in silence.",
                    Some("key") => "A key glints on a stone plinth.",
                    Some("side") => "A cramped side room, thick with dust.",
                    _ => "A bare chamber of damp stone.",
                };
                match text.rewrite(&style, template) {
                    Ok(line) => {
                        label.insert("description", line);
                    }
                    Err(err) => debug!(%err, "room text omitted"),
                }
                label.insert("described", true);
            }),
        ))
}
