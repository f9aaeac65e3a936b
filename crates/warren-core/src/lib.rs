// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! warren-core: weighted, priority-tiered graph grammar rewriting.
//!
//! A run grows a seed [`Graph`] by repeatedly scanning a [`Grammar`] for
//! candidates, drawing one by rule weight from a seeded [`Prng`], and applying
//! it in place until nothing matches or the step budget is spent.
//!
//! ```
//! use std::sync::Arc;
//! use warren_core::demo::{dungeon, flavor::NoText};
//! use warren_core::{Engine, Halt};
//!
//! let grammar = dungeon::dungeon_grammar(&dungeon::DungeonConfig::default(), Arc::new(NoText));
//! let mut engine = Engine::with_seed(dungeon::seed_graph(), grammar, 7);
//! assert_eq!(engine.run(1_000).halt, Halt::Exhausted);
//! assert!(engine.graph().check_integrity().is_ok());
//! ```
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::cast_precision_loss
)]

/// Demo grammar and its text-generation port.
pub mod demo;

mod apply;
mod engine_impl;
mod grammar_def;
mod graph;
mod ident;
mod label;
mod pattern;
mod prng;
mod record;
mod rule;
mod search;
mod select;
mod update;

/// Rule application (label updates, retyping, subgraph substitution).
pub use apply::{apply_candidate, insert_subgraph, Applied};
/// Simulation driver.
pub use engine_impl::{run, step, Engine, Halt, RunSummary, StepOutcome};
/// Declarative grammar documents.
pub use grammar_def::{
    EdgeTemplate, GrammarDef, LhsDef, NodeTemplate, RhsDef, RuleDef, SubgraphTemplate,
    SubgrammarDef, DEST_PLACEHOLDER, SRC_PLACEHOLDER,
};
/// Graph store and its invariant errors.
pub use graph::{Graph, GraphError};
/// Identifiers and the id allocator.
pub use ident::{EdgeId, Hash, IdAllocator, NodeId, ParseIdError};
/// Label value algebra.
pub use label::{Label, Value};
/// Match specifications.
pub use pattern::{EdgePattern, Labelled, MatchSpec, Predicate};
/// Seeded generator.
pub use prng::Prng;
/// Node and edge records.
pub use record::{Edge, Node};
/// Rules, tiers, grammars and subgraph specs.
pub use rule::{
    EdgeSpec, Endpoint, Grammar, NodeSpec, Rule, RuleKind, SubgraphFn, SubgraphSpec, Subgrammar,
    Triple,
};
/// Candidate search.
pub use search::{find_candidates, tier_candidates, Candidate, CandidateSet, Site};
/// Weighted selection.
pub use select::{pick_weighted, select};
/// Label updates.
pub use update::{UpdateFn, UpdateSpec};
