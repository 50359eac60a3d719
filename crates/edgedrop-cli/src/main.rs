//! edgedrop CLI - inspect datasets, draw edge-dropped views, summarize runs.
//!
//! # Usage
//!
//! ```bash
//! # Dataset overview
//! edgedrop stats cora.json
//!
//! # Draw five training views keeping 70% of edges
//! edgedrop sample cora.json --percent 0.7 --rounds 5 --seed 42
//!
//! # Write the normalized test operator as triplets
//! edgedrop normalize cora.json --normalization NormAdj --view test -o op.json
//!
//! # Test accuracy tables across runs
//! edgedrop report --loss-dir losses --datasets cora,citeseer --inits init,no_init --layers 2,4,8
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use edgedrop_core::formats::JsonDataset;
use edgedrop_core::{GraphStore, LearningType, Normalization, Sampler, View};
use edgedrop_train::AccuracyReport;
use indicatif::ProgressBar;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "edgedrop")]
#[command(about = "Edge-dropping sampler for GCN training", long_about = None)]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show statistics about a dataset
    Stats {
        /// Dataset file (JSON)
        input: PathBuf,
    },

    /// Draw randomly edge-dropped training views
    Sample {
        /// Dataset file (JSON)
        input: PathBuf,

        /// Probability of keeping each edge
        #[arg(short, long, default_value = "1.0")]
        percent: f64,

        /// Normalization scheme
        #[arg(short, long, default_value = "AugNormAdj")]
        normalization: Normalization,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Number of views to draw
        #[arg(short, long, default_value = "1")]
        rounds: usize,
    },

    /// Write a normalized operator as (row, col, value) triplets
    Normalize {
        /// Dataset file (JSON)
        input: PathBuf,

        /// Normalization scheme
        #[arg(short, long, default_value = "AugNormAdj")]
        normalization: Normalization,

        /// Which graph to normalize
        #[arg(long, default_value = "test")]
        view: ViewArg,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Aggregate test accuracy across saved runs
    Report {
        /// Directory holding `<dataset>_<init>/layers_<n>*/acc_test.json`
        #[arg(long, default_value = "losses")]
        loss_dir: PathBuf,

        /// Dataset names
        #[arg(long, value_delimiter = ',', default_value = "citeseer,cora,pubmed")]
        datasets: Vec<String>,

        /// Initialization variants
        #[arg(long, value_delimiter = ',', default_value = "init,no_init")]
        inits: Vec<String>,

        /// Layer counts
        #[arg(long, value_delimiter = ',', default_value = "2,4,8,10,16")]
        layers: Vec<usize>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ViewArg {
    /// Unsampled training graph
    Train,
    /// Validation graph
    Val,
    /// Test graph
    Test,
}

#[derive(Serialize)]
struct OperatorRecord {
    normalization: Normalization,
    num_nodes: usize,
    triplets: Vec<(usize, usize, f32)>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Stats { input } => cmd_stats(&input),
        Commands::Sample {
            input,
            percent,
            normalization,
            seed,
            rounds,
        } => cmd_sample(&input, percent, normalization, seed, rounds),
        Commands::Normalize {
            input,
            normalization,
            view,
            output,
        } => cmd_normalize(&input, normalization, view, &output),
        Commands::Report {
            loss_dir,
            datasets,
            inits,
            layers,
        } => cmd_report(&loss_dir, &datasets, &inits, &layers),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_dataset(path: &Path) -> Result<GraphStore> {
    let start = Instant::now();
    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("Loading {}...", path.display()));

    let store = JsonDataset::read_file(path)
        .with_context(|| format!("Failed to load dataset {}", path.display()))?;

    pb.finish_with_message(format!("Loaded in {:.2?}", start.elapsed()));
    tracing::debug!(
        learning_type = ?store.learning_type(),
        nfeat = store.num_features(),
        nclass = store.num_classes(),
        "dataset loaded"
    );
    Ok(store)
}

fn cmd_stats(input: &Path) -> Result<()> {
    let store = load_dataset(input)?;
    let split = store.split();
    let train = store.train_graph();
    let eval = store.eval_graph();

    println!("Dataset Statistics");
    println!("==================");
    match store.learning_type() {
        LearningType::Transductive => {
            println!("Learning type:  transductive");
            println!("Nodes:          {}", train.num_nodes());
            println!("Edges:          {}", train.adjacency().num_undirected_edges());
        }
        LearningType::Inductive => {
            println!("Learning type:  inductive");
            println!("Train nodes:    {}", train.num_nodes());
            println!("Train edges:    {}", train.adjacency().num_undirected_edges());
            println!("Eval nodes:     {}", eval.num_nodes());
            println!("Eval edges:     {}", eval.adjacency().num_undirected_edges());
        }
    }
    println!("Features:       {}", store.num_features());
    println!("Classes:        {}", store.num_classes());
    println!(
        "Split:          {} train / {} val / {} test",
        split.train.len(),
        split.val.len(),
        split.test.len()
    );

    Ok(())
}

fn cmd_sample(
    input: &Path,
    percent: f64,
    normalization: Normalization,
    seed: u64,
    rounds: usize,
) -> Result<()> {
    let store = load_dataset(input)?;
    let total = store.train_graph().adjacency().num_undirected_edges();
    let mut sampler = Sampler::new(store, seed);

    println!(
        "Sampling {} views (percent={}, normalization={}, seed={})...",
        rounds, percent, normalization, seed
    );
    for round in 1..=rounds {
        let start = Instant::now();
        let view = sampler
            .training_view(percent, normalization)
            .context("Failed to sample training view")?;
        println!(
            "Round {:>3}: kept {} / {} edges ({:.2?})",
            round,
            view.operator.num_undirected_edges(),
            total,
            start.elapsed()
        );
    }
    Ok(())
}

fn cmd_normalize(input: &Path, normalization: Normalization, view: ViewArg, output: &Path) -> Result<()> {
    let store = load_dataset(input)?;
    let mut sampler = Sampler::new(store, 0);

    let View { operator, .. } = match view {
        ViewArg::Train => sampler.unsampled_training_view(normalization),
        ViewArg::Val => sampler.validation_view(normalization),
        ViewArg::Test => sampler.test_view(normalization),
    };
    let record = OperatorRecord {
        normalization,
        num_nodes: operator.num_nodes(),
        triplets: operator.iter().collect(),
    };

    let json = serde_json::to_string_pretty(&record)?;
    fs::write(output, json).with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Wrote {} entries ({} nodes, {}) -> {}",
        record.triplets.len(),
        record.num_nodes,
        normalization,
        output.display()
    );
    Ok(())
}

fn cmd_report(loss_dir: &Path, datasets: &[String], inits: &[String], layers: &[usize]) -> Result<()> {
    let report = AccuracyReport::collect(loss_dir, datasets, inits, layers)
        .with_context(|| format!("Failed to read runs under {}", loss_dir.display()))?;
    print!("{report}");
    Ok(())
}
