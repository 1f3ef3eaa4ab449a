//! Topogas CLI - Topology-Learning Neural Networks
//!
//! Command-line interface for training networks on data files and measuring
//! the topology they learn.

use clap::{Args, Parser, Subcommand};
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use log::error;
use std::path::PathBuf;
use std::time::Instant;
use topogas::{
    load_vectors, AlgorithmKind, Config, FinishReason, LoadOptions, Network, ParameterMap,
    ProgressEvent, Result, Trainer, TrainerOptions,
};

#[derive(Parser)]
#[command(name = "topogas")]
#[command(author = "Topogas Contributors")]
#[command(version)]
#[command(about = "Topology-learning neural networks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a network on a data file
    Train {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Show quality measures of a freshly initialised network
    Measure {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Print the default parameter file
    Defaults {
        /// Only set ALGORITHM to this value
        #[arg(short, long)]
        algorithm: Option<AlgorithmKind>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Whitespace-separated data file
    data: PathBuf,

    /// Algorithm (CL, GNG, GCS, NG, SOM)
    #[arg(short, long)]
    algorithm: Option<AlgorithmKind>,

    /// JSON parameter file
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Override one parameter (KEY=VALUE), may be repeated
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Number of epochs
    #[arg(short, long)]
    epochs: Option<u64>,

    /// Coordinates per vector
    #[arg(short, long)]
    dimension: Option<u64>,

    /// Records end with a label token
    #[arg(long)]
    labelled: bool,

    /// Rescale attributes into [0, 1]
    #[arg(long)]
    normalise: bool,

    /// Random seed for reproducibility
    #[arg(short, long)]
    seed: Option<u64>,

    /// Sequential dealing and fixed initial positions
    #[arg(long)]
    deterministic: bool,
}

impl RunArgs {
    /// Defaults, then the parameter file, then `--set`, then dedicated flags.
    fn parameters(&self) -> Result<ParameterMap> {
        let mut params = ParameterMap::defaults();
        if let Some(path) = &self.params {
            params.merge(ParameterMap::from_json_file(path)?);
        }
        for assignment in &self.overrides {
            params.set_override(assignment)?;
        }
        if let Some(kind) = self.algorithm {
            params.insert("ALGORITHM", kind.name());
        }
        if let Some(epochs) = self.epochs {
            params.insert("EPOCH", epochs);
        }
        if let Some(dimension) = self.dimension {
            params.insert("DIMENSIONALITY", dimension);
        }
        if let Some(seed) = self.seed {
            params.insert("SEED", seed);
        }
        if self.labelled {
            params.insert("LABELLED", true);
        }
        if self.normalise {
            params.insert("NORMALISED", true);
        }
        if self.deterministic {
            params.insert("DEBUG", true);
        }
        Ok(params)
    }

    fn network(&self) -> Result<(Config, Network)> {
        let params = self.parameters()?;
        let config = Config::from_parameters(&params)?;
        let inputs = load_vectors(&self.data, &LoadOptions::from_parameters(&params)?)?;
        let network = Network::new(&config, inputs)?;
        Ok((config, network))
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let result = match cli.command {
        Commands::Train { run } => train(run),
        Commands::Measure { run } => measure(run),
        Commands::Defaults { algorithm } => print_defaults(algorithm),
    };

    if let Err(e) = result {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn train(run: RunArgs) -> Result<()> {
    let start_time = Instant::now();
    let (config, network) = run.network()?;

    println!("Topogas");
    println!("   Training {} on: {}", network.kind(), run.data.display());
    println!(
        "   {} inputs, {} epochs",
        format_number(network.inputs().len()),
        config.run.epochs
    );
    println!();

    let total = (network.inputs().len() * config.run.epochs) as u64;
    let bar_style = ProgressStyle::default_bar()
        .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) ETA: {eta}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░  ");
    let pb = ProgressBar::new(total);
    pb.set_style(bar_style);
    pb.set_message("Training...");

    let options = TrainerOptions {
        display_stride: config.run.display_stride,
        ..TrainerOptions::default()
    };
    let (trainer, events) = Trainer::spawn(network, options)?;
    trainer.start();

    let mut stopped = false;
    for event in events {
        match event {
            ProgressEvent::Iteration(iteration) => pb.set_position(iteration),
            ProgressEvent::Snapshot {
                network, sse, ..
            } => pb.set_message(format!(
                "{} nodes, {} edges, SSE {:.6}",
                network.node_count(),
                network.edge_count(),
                sse
            )),
            ProgressEvent::Finished { reason, .. } => stopped = reason == FinishReason::Stopped,
            ProgressEvent::Failed { message } => pb.set_message(format!("Failed: {}", message)),
        }
    }
    pb.finish_and_clear();

    let network = trainer.finish()?;
    let steps = network.counter().completed();
    if stopped {
        println!("! Training stopped early");
    }
    println!("✓ Trained for {} steps", format_number(steps as usize));
    print_measures(&network)?;

    println!();
    println!("Training complete in {}", HumanDuration(start_time.elapsed()));
    Ok(())
}

fn measure(run: RunArgs) -> Result<()> {
    let (_, network) = run.network()?;
    println!("{} network on {}", network.kind(), run.data.display());
    print_measures(&network)
}

fn print_measures(network: &Network) -> Result<()> {
    let graph = network.graph();
    println!();
    println!("  Nodes:       {}", format_number(graph.node_count()));
    println!("  Edges:       {}", format_number(graph.edge_count()));
    println!("  SSE:         {:.6}", network.sse()?);
    match network.topological_correlation()? {
        Some(r) => println!("  Correlation: {:.4}", r),
        None => println!("  Correlation: undefined"),
    }
    Ok(())
}

fn print_defaults(algorithm: Option<AlgorithmKind>) -> Result<()> {
    let mut params = ParameterMap::defaults();
    if let Some(kind) = algorithm {
        params.insert("ALGORITHM", kind.name());
    }
    println!("{}", params.to_json_pretty()?);
    Ok(())
}

fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
