// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Simulation driver: search → select → apply, bounded by a step budget.
use tracing::{debug, info, instrument};

use crate::apply::{apply_candidate, Applied};
use crate::graph::Graph;
use crate::prng::Prng;
use crate::rule::Grammar;
use crate::search::find_candidates;
use crate::select::select;

/// Why a run stopped. Both are normal completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// No tier had any candidate.
    Exhausted,
    /// `max_steps` applications were performed.
    Budget,
}

/// Result of [`run`] / [`Engine::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of rule applications performed.
    pub steps: u64,
    /// Stopping condition.
    pub halt: Halt,
}

/// Result of a single cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// A candidate was selected and applied.
    Applied {
        /// Name of the applied rule.
        rule: String,
        /// Tier the candidate came from.
        tier: usize,
        /// Size of the candidate set it was drawn from.
        candidates: usize,
        /// Mutations performed.
        applied: Applied,
    },
    /// Terminal state: nothing matched.
    Exhausted,
}

/// Performs one full scan, one weighted selection, and one application.
pub fn step(graph: &mut Graph, grammar: &Grammar, rng: &mut Prng) -> StepOutcome {
    let Some(set) = find_candidates(graph, grammar) else {
        return StepOutcome::Exhausted;
    };
    let Some(chosen) = select(&set.candidates, rng).copied() else {
        return StepOutcome::Exhausted;
    };
    let applied = apply_candidate(graph, &chosen);
    debug!(
        rule = %chosen.rule.name,
        kind = chosen.rule.kind.tag(),
        tier = set.tier,
        candidates = set.candidates.len(),
        site = ?chosen.site,
        "applied"
    );
    StepOutcome::Applied {
        rule: chosen.rule.name.clone(),
        tier: set.tier,
        candidates: set.candidates.len(),
        applied,
    }
}

/// Repeats [`step`] until the grammar is exhausted or `max_steps`
/// applications have been performed.
///
/// `max_steps = 0` performs no scan and leaves `graph` untouched.
pub fn run(graph: &mut Graph, grammar: &Grammar, rng: &mut Prng, max_steps: u64) -> RunSummary {
    let mut steps = 0;
    while steps < max_steps {
        match step(graph, grammar, rng) {
            StepOutcome::Applied { .. } => steps += 1,
            StepOutcome::Exhausted => {
                return RunSummary {
                    steps,
                    halt: Halt::Exhausted,
                };
            }
        }
    }
    RunSummary {
        steps,
        halt: Halt::Budget,
    }
}

/// Owns the graph, the grammar, and the seeded generator for a run.
///
/// The graph is exclusively owned for the duration of a run; read it back
/// through [`Engine::graph`] or [`Engine::into_graph`].
#[derive(Debug)]
pub struct Engine {
    graph: Graph,
    grammar: Grammar,
    rng: Prng,
    steps: u64,
}

impl Engine {
    /// Constructs an engine over a seed graph and grammar.
    pub fn new(graph: Graph, grammar: Grammar, rng: Prng) -> Self {
        Self {
            graph,
            grammar,
            rng,
            steps: 0,
        }
    }

    /// Convenience constructor seeding the generator from one `u64`.
    pub fn with_seed(graph: Graph, grammar: Grammar, seed: u64) -> Self {
        Self::new(graph, grammar, Prng::from_seed_u64(seed))
    }

    /// Current graph state.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The grammar driving this engine.
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Total applications performed over the engine's lifetime.
    pub fn steps_taken(&self) -> u64 {
        self.steps
    }

    /// Consumes the engine, returning the graph.
    pub fn into_graph(self) -> Graph {
        self.graph
    }

    /// One search/select/apply cycle.
    pub fn step(&mut self) -> StepOutcome {
        let outcome = step(&mut self.graph, &self.grammar, &mut self.rng);
        if matches!(outcome, StepOutcome::Applied { .. }) {
            self.steps += 1;
        }
        outcome
    }

    /// Runs until exhausted or `max_steps` applications.
    #[instrument(skip(self), fields(tiers = self.grammar.tiers.len(), rules = self.grammar.rule_count()))]
    pub fn run(&mut self, max_steps: u64) -> RunSummary {
        let summary = run(&mut self.graph, &self.grammar, &mut self.rng, max_steps);
        self.steps += summary.steps;
        info!(
            steps = summary.steps,
            halt = ?summary.halt,
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            "run finished"
        );
        summary
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::label::Label;
    use crate::pattern::{EdgePattern, MatchSpec};
    use crate::rule::{Rule, Subgrammar};

    #[test]
    fn zero_budget_is_a_no_op() {
        let mut graph = Graph::new();
        graph.add_node(Label::new());
        let before = graph.clone();
        let grammar = Grammar::new().tier(Subgrammar::new("t").rule(Rule::node(
            "tag",
            1.0,
            MatchSpec::Any,
            Label::new().with("seen", true),
        )));
        let mut rng = Prng::from_seed_u64(1);
        let rng_before = rng.clone();
        let summary = run(&mut graph, &grammar, &mut rng, 0);
        assert_eq!(summary, RunSummary { steps: 0, halt: Halt::Budget });
        assert_eq!(graph, before);
        assert_eq!(rng, rng_before);
    }

    #[test]
    fn engine_counts_steps_across_calls() {
        let mut graph = Graph::new();
        let a = graph.add_node(Label::new());
        graph.add_edge(a, a, Label::new()).unwrap();
        let grammar = Grammar::new().tier(Subgrammar::new("loop").rule(Rule::edge(
            "touch",
            1.0,
            EdgePattern::default(),
            Label::new().with("touched", true),
        )));
        let mut engine = Engine::with_seed(graph, grammar, 9);
        assert_eq!(engine.run(3).halt, Halt::Budget);
        assert!(matches!(engine.step(), StepOutcome::Applied { .. }));
        assert_eq!(engine.steps_taken(), 4);
    }
}
