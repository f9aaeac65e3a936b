// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
use std::collections::BTreeSet;

use proptest::prelude::*;
use proptest::test_runner::{Config as PropConfig, RngAlgorithm, TestRng, TestRunner};

mod common;

use common::dungeon_engine;
use warren_core::{Halt, StepOutcome};

// Case generation is pinned so failures reproduce across machines. Override
// locally with PROPTEST_SEED or edit SEED_BYTES.
const SEED_BYTES: [u8; 32] = [
    0x57, 0x41, 0x52, 0x52, 0x45, 0x4e, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0,
];

fn pinned_runner(cases: u32) -> TestRunner {
    let rng = TestRng::from_seed(RngAlgorithm::ChaCha, &SEED_BYTES);
    TestRunner::new_with_rng(PropConfig::with_cases(cases), rng)
}

#[test]
fn proptest_seed_pinned_dungeon_invariants() {
    let mut runner = pinned_runner(48);
    let strategy = (any::<u64>(), 0_u32..4);

    runner
        .run(&strategy, |(seed, max_depth)| {
            let mut engine = dungeon_engine(seed, max_depth);
            let mut nodes: BTreeSet<_> = engine.graph().nodes().map(|n| n.id).collect();
            let mut edges: BTreeSet<_> = engine.graph().edges().map(|e| e.id).collect();

            let mut steps = 0_u64;
            while let StepOutcome::Applied { applied, .. } = engine.step() {
                steps += 1;
                prop_assert!(steps < 10_000, "dungeon grammar failed to terminate");
                prop_assert!(engine.graph().check_integrity().is_ok());
                prop_assert_eq!(applied.dropped_edges, 0);
                for id in applied.added_nodes {
                    prop_assert!(nodes.insert(id));
                }
                for id in applied.added_edges {
                    prop_assert!(edges.insert(id));
                }
            }

            for edge in engine.graph().edges() {
                if edge.label.str("type") == Some("path") {
                    prop_assert!(matches!(edge.label.str("state"), Some("open" | "locked")));
                }
            }
            Ok(())
        })
        .expect("dungeon invariants hold for every pinned case");
}

#[test]
fn proptest_seed_pinned_budget_is_respected() {
    let mut runner = pinned_runner(32);
    let strategy = (any::<u64>(), 0_u64..12);

    runner
        .run(&strategy, |(seed, budget)| {
            let mut engine = dungeon_engine(seed, 3);
            let summary = engine.run(budget);
            prop_assert!(summary.steps <= budget);
            if summary.halt == Halt::Budget {
                prop_assert_eq!(summary.steps, budget);
            }
            prop_assert_eq!(engine.steps_taken(), summary.steps);
            Ok(())
        })
        .expect("budget property holds for every pinned case");
}
