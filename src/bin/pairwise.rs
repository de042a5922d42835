//! Times every pairwise strategy on one input with `a^2 / b`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pairwise::{execute, random_input, read_input, report_lines, Config, Strategy};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pairwise", version, about)]
struct Cli {
    /// Length of the random input, ignored with --input
    #[arg(short = 'n', long = "len", default_value_t = 10_000)]
    len: usize,

    /// JSON array of numbers to use instead of a random input
    #[arg(long)]
    input: Option<PathBuf>,

    /// Seed for the random input
    #[arg(long)]
    seed: Option<u64>,

    /// Strategy to run, repeatable (default: all)
    #[arg(short = 's', long = "strategy")]
    strategies: Vec<Strategy>,

    /// Rows per tile for the tiled strategies (env: PAIRWISE_BLOCK_SIZE)
    #[arg(long)]
    block_size: Option<usize>,

    /// Size of the rayon thread pool
    #[arg(long)]
    threads: Option<usize>,

    /// Run the strategies concurrently
    #[arg(long)]
    concurrent: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure the thread pool")?;
    }

    let mut config = Config::from_env();
    if let Some(block_size) = cli.block_size {
        config.block_size = block_size;
    }
    config.concurrent |= cli.concurrent;

    let x = match &cli.input {
        Some(path) => read_input(path)
            .with_context(|| format!("failed to read input from {}", path.display()))?,
        None => random_input(cli.len, cli.seed),
    };
    let strategies = if cli.strategies.is_empty() {
        Strategy::ALL.to_vec()
    } else {
        cli.strategies
    };
    info!(
        "running {} strategies on {} values",
        strategies.len(),
        x.len()
    );

    let report = execute(&x, &strategies, &config)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in report_lines(&report) {
            println!("{line}");
        }
    }
    Ok(())
}
