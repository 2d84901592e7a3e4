use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use expense_categorizer::{load_records, ArtifactStore, Categorizer, ServingContext, TrainingConfig};
use log::{error, info};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct ArtifactArgs {
    /// Directory holding categorizer.bin
    /// (defaults to $EXPENSE_CATEGORIZER_ARTIFACTS or the user data directory)
    #[arg(short, long)]
    artifacts: Option<PathBuf>,
}

impl ArtifactArgs {
    fn store(&self) -> ArtifactStore {
        match &self.artifacts {
            Some(dir) => ArtifactStore::new(dir),
            None => ArtifactStore::new_default(),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Train on a CSV dataset (title, description, categories) and save the artifacts
    Train {
        /// Path to the training CSV
        #[arg(short, long)]
        data: PathBuf,
        #[command(flatten)]
        artifacts: ArtifactArgs,
        /// Maximum vocabulary size
        #[arg(long)]
        max_features: Option<usize>,
        /// Seed for the train/evaluation split
        #[arg(long)]
        seed: Option<u64>,
        /// Share of each category held out for evaluation
        #[arg(long)]
        test_fraction: Option<f64>,
        /// Optimizer iteration cap
        #[arg(long)]
        max_iterations: Option<usize>,
        /// Split all rows together instead of per category
        #[arg(long)]
        no_stratify: bool,
        /// Try the freshly trained categorizer from the console afterwards
        #[arg(short, long)]
        interactive: bool,
    },
    /// Categorize a single description with the saved artifacts
    Predict {
        #[command(flatten)]
        artifacts: ArtifactArgs,
        /// Also print the probability of every category
        #[arg(long)]
        scores: bool,
        description: String,
    },
    /// Answer JSON requests, one per stdin line, with one JSON reply per stdout line
    Serve {
        #[command(flatten)]
        artifacts: ArtifactArgs,
    },
    /// Categorize descriptions typed at the console
    Interactive {
        #[command(flatten)]
        artifacts: ArtifactArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Train {
            data,
            artifacts,
            max_features,
            seed,
            test_fraction,
            max_iterations,
            no_stratify,
            interactive,
        } => {
            let defaults = TrainingConfig::default();
            let config = TrainingConfig {
                max_features: max_features.unwrap_or(defaults.max_features),
                seed: seed.unwrap_or(defaults.seed),
                test_fraction: test_fraction.unwrap_or(defaults.test_fraction),
                max_iterations: max_iterations.unwrap_or(defaults.max_iterations),
                stratify: !no_stratify,
                ..defaults
            };
            let categorizer = train(&data, &artifacts.store(), config)?;
            if interactive {
                run_interactive(&categorizer).await?;
            }
        }
        Command::Predict { artifacts, scores, description } => {
            let categorizer = artifacts.store().load()?;
            if scores {
                println!("Predicted category: {}", categorizer.categorize(&description)?);
                println!("Scores:");
                for (category, score) in categorizer.scores(&description)? {
                    println!("  {}: {:.1}%", category, score * 100.0);
                }
            } else {
                println!("{}", categorizer.categorize(&description)?);
            }
        }
        Command::Serve { artifacts } => {
            // refuse to serve anything if the artifacts cannot be loaded
            let context = ServingContext::initialize(&artifacts.store())
                .context("Cannot start serving")?;
            serve(context).await?;
        }
        Command::Interactive { artifacts } => {
            let categorizer = artifacts.store().load()?;
            run_interactive(&categorizer).await?;
        }
    }

    Ok(())
}

fn train(data: &Path, store: &ArtifactStore, config: TrainingConfig) -> Result<Categorizer> {
    let start_time = Instant::now();
    info!("=== Training expense categorizer ===");

    let records = load_records(data)?;
    println!("Dataset loaded successfully! ({} records)", records.len());

    let trained = Categorizer::builder()
        .with_config(config)
        .add_records(records)
        .build()?;

    println!("\nClassification Report:\n");
    println!("{}", trained.report);

    store.save(&trained.categorizer)?;
    println!("Model and vectorizer saved to {:?}", store.dir());

    let fit = &trained.fit;
    info!(
        "Training took {:.2?} ({} iterations, converged: {}, objective {:.5})",
        start_time.elapsed(), fit.iterations, fit.converged, fit.objective
    );
    Ok(trained.categorizer)
}

async fn serve(context: ServingContext) -> Result<()> {
    info!("Serving requests from stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = context.handle_json(&line);
        println!("{}", serde_json::to_string(&reply)?);
    }
    info!("Input closed, shutting down");
    Ok(())
}

async fn run_interactive(categorizer: &Categorizer) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\nEnter an expense description (or type 'exit' to quit): ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().eq_ignore_ascii_case("exit") {
            println!("Exiting... Goodbye!");
            break;
        }

        match categorizer.categorize(&line) {
            Ok(category) => println!("Predicted Category: {}", category),
            Err(e) => {
                error!("Could not categorize input: {}", e);
                eprintln!("{}", e);
            }
        }
    }
    Ok(())
}
