// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Warren CLI
//!
//! Grows a dungeon graph by repeatedly applying a weighted, tiered graph
//! grammar, then prints the result.
//!
//! # Usage
//! ```text
//! warren [--seed N] [--steps N] [--max-depth N] [--style S]
//!        [--grammar FILE] [--graph FILE] [--format json|dot|summary]
//!        [--config FILE] [--save-config] [-v...]
//! ```
//!
//! Without `--grammar` / `--graph` the built-in dungeon demo is used. Settings
//! come from command-line flags, then the config file, then defaults.

// The CLI is expected to print to stdout/stderr.
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod config;
mod dot;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use warren_core::demo::dungeon::{dungeon_grammar, seed_graph, DungeonConfig};
use warren_core::demo::flavor::TemplateText;
use warren_core::{Engine, Grammar, GrammarDef, Graph, Halt, RunSummary};

use crate::config::{ConfigSource, OutputFormat, Overrides, RunConfig};

#[derive(Parser, Debug)]
#[command(name = "warren", version, about, long_about = None)]
struct Args {
    /// Selection seed (derived from the clock when absent)
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum number of rule applications
    #[arg(long)]
    steps: Option<u64>,

    /// Path depth at which the demo grammar stops splitting
    #[arg(long)]
    max_depth: Option<u32>,

    /// Style token passed to the flavor-text generator
    #[arg(long)]
    style: Option<String>,

    /// JSON grammar to run instead of the dungeon demo
    #[arg(long, value_name = "FILE")]
    grammar: Option<PathBuf>,

    /// JSON seed graph to grow instead of the demo seed
    #[arg(long, value_name = "FILE")]
    graph: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Config file (defaults to the user config directory)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the effective settings back to the config file and exit
    #[arg(long)]
    save_config: bool,

    /// Log verbosity: -v for debug, -vv for trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            seed: self.seed,
            max_steps: self.steps,
            max_depth: self.max_depth,
            style: self.style.clone(),
            format: self.format,
        }
    }
}

fn init_tracing(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() ^ u64::from(d.subsec_nanos()).rotate_left(32))
        .unwrap_or_default()
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {what} {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {what} {}", path.display()))
}

fn load_graph(path: Option<&Path>) -> Result<Graph> {
    path.map_or_else(|| Ok(seed_graph()), |p| read_json(p, "graph"))
}

fn load_grammar(path: Option<&Path>, config: &RunConfig) -> Result<Grammar> {
    match path {
        Some(p) => Ok(Grammar::from(read_json::<GrammarDef>(p, "grammar")?)),
        None => {
            let demo = DungeonConfig {
                max_depth: config.max_depth,
                style: config.style.clone(),
            };
            Ok(dungeon_grammar(&demo, Arc::new(TemplateText)))
        }
    }
}

fn summary_line(seed: u64, summary: RunSummary, graph: &Graph) -> String {
    let halt = match summary.halt {
        Halt::Exhausted => "exhausted",
        Halt::Budget => "budget",
    };
    format!(
        "seed={seed} steps={} halt={halt} nodes={} edges={} digest={}",
        summary.steps,
        graph.node_count(),
        graph.edge_count(),
        hex::encode(graph.digest())
    )
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let source = ConfigSource::resolve(args.config.as_deref());
    let stored = match &source {
        Ok(source) if args.save_config => source.load_for_update().context("loading config")?,
        Ok(source) => source.load().context("loading config")?,
        Err(err) => {
            warn!(%err, "user config directory unavailable; using defaults");
            RunConfig::default()
        }
    };
    let config = stored.with_overrides(args.overrides());

    if args.save_config {
        source
            .context("resolving config location")?
            .save(&config)
            .context("saving config")?;
        info!("config saved");
        return Ok(());
    }

    let seed = config.seed.unwrap_or_else(|| {
        let seed = clock_seed();
        info!(seed, "no seed given; derived one from the clock");
        seed
    });
    let graph = load_graph(args.graph.as_deref())?;
    let grammar = load_grammar(args.grammar.as_deref(), &config)?;
    info!(
        seed,
        max_steps = config.max_steps,
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "growing"
    );

    let mut engine = Engine::with_seed(graph, grammar, seed);
    let summary = engine.run(config.max_steps);
    let graph = engine.graph();

    match config.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(graph).context("serializing graph")?);
        }
        OutputFormat::Dot => print!("{}", dot::render(graph).context("rendering dot")?),
        OutputFormat::Summary => println!("{}", summary_line(seed, summary, graph)),
    }
    Ok(())
}
