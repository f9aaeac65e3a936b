// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
/// Demo dungeon grammar and seed graph.
pub mod dungeon;
/// Text-generation port consumed by demo rule builders.
pub mod flavor;
