use std::{collections::BTreeMap, fmt, path::Path, str::FromStr, time::Instant};

use faer::MatRef;
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Uniform};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    pairwise_broadcast, pairwise_compiled, pairwise_naive, pairwise_square_ratio, pairwise_tiled,
    pairwise_tiled_par, Error, SquareRatio,
};

pub const DEFAULT_BLOCK_SIZE: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Naive,
    Compiled,
    SquareRatio,
    Broadcast,
    Tiled,
    TiledPar,
}

impl Strategy {
    pub const ALL: [Strategy; 6] = [
        Strategy::Naive,
        Strategy::Compiled,
        Strategy::SquareRatio,
        Strategy::Broadcast,
        Strategy::Tiled,
        Strategy::TiledPar,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Naive => "naive",
            Strategy::Compiled => "compiled",
            Strategy::SquareRatio => "square_ratio",
            Strategy::Broadcast => "broadcast",
            Strategy::Tiled => "tiled",
            Strategy::TiledPar => "tiled_par",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|x| x.name() == s)
            .ok_or_else(|| Error::UnknownStrategy(s.to_string()))
    }
}

/// Wall clock duration and result of one strategy, serialized as
/// `(duration_seconds, result)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(into = "(f64, f64)")]
pub struct Timing {
    pub duration_seconds: f64,
    pub result: f64,
}

impl From<Timing> for (f64, f64) {
    fn from(t: Timing) -> Self {
        (t.duration_seconds, t.result)
    }
}

pub type Report = BTreeMap<Strategy, Timing>;

/// One `name: ~<secs> seconds (result <value>)` line per strategy.
pub fn report_lines(report: &Report) -> Vec<String> {
    report
        .iter()
        .map(|(strategy, t)| {
            format!(
                "{strategy}: ~{:.8} seconds (result {})",
                t.duration_seconds, t.result
            )
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Rows per tile for the tiled strategies.
    pub block_size: usize,
    /// Run the strategies at the same time instead of one after another.
    pub concurrent: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            concurrent: false,
        }
    }
}

impl Config {
    /// Defaults overridden by `PAIRWISE_BLOCK_SIZE`.
    pub fn from_env() -> Self {
        Self {
            block_size: parse_block_size(std::env::var("PAIRWISE_BLOCK_SIZE").ok().as_deref()),
            ..Self::default()
        }
    }
}

fn parse_block_size(value: Option<&str>) -> usize {
    value
        .and_then(|x| x.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_BLOCK_SIZE)
        .max(1)
}

/// `n` values drawn uniformly from `[0, 1)`.
pub fn random_input(n: usize, seed: Option<u64>) -> Vec<f64> {
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    Uniform::<f64>::new(0.0, 1.0).sample_iter(rng).take(n).collect()
}

/// Reads a JSON array of numbers.
pub fn read_input(path: impl AsRef<Path>) -> Result<Vec<f64>, Error> {
    let file = std::fs::File::open(path)?;
    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}

pub fn parse_input(s: &str) -> Result<Vec<f64>, Error> {
    Ok(serde_json::from_str(s)?)
}

/// Flattens a single row or single column matrix.
pub fn input_from_mat(mat: MatRef<'_, f64>) -> Result<Vec<f64>, Error> {
    match (mat.nrows(), mat.ncols()) {
        (0, _) | (_, 0) => Ok(Vec::new()),
        (nrows, 1) => Ok((0..nrows).map(|i| mat[(i, 0)]).collect()),
        (1, ncols) => Ok((0..ncols).map(|j| mat[(0, j)]).collect()),
        (nrows, ncols) => Err(Error::NotOneDimensional { nrows, ncols }),
    }
}

/// Runs one strategy on `x` with `a^2 / b`.
pub fn time_strategy(strategy: Strategy, x: &[f64], config: &Config) -> Result<Timing, Error> {
    debug!("running {} on {} values", strategy, x.len());
    let f = SquareRatio;
    let start = Instant::now();
    let result = match strategy {
        Strategy::Naive => pairwise_naive(x, &f),
        Strategy::Compiled => pairwise_compiled(x, &f),
        Strategy::SquareRatio => pairwise_square_ratio(x),
        Strategy::Broadcast => pairwise_broadcast(x, &f),
        Strategy::Tiled => pairwise_tiled(x, &f, config.block_size),
        Strategy::TiledPar => pairwise_tiled_par(x, &f, config.block_size),
    }?;
    let duration_seconds = start.elapsed().as_secs_f64();
    info!(
        "{} finished in {:.8} seconds with result {}",
        strategy, duration_seconds, result
    );
    Ok(Timing {
        duration_seconds,
        result,
    })
}

/// Runs the strategies one after another, stopping at the first failure.
#[tracing::instrument(skip(x, config), fields(n = x.len()))]
pub fn run(x: &[f64], strategies: &[Strategy], config: &Config) -> Result<Report, Error> {
    strategies
        .iter()
        .map(|&s| time_strategy(s, x, config).map(|t| (s, t)))
        .collect()
}

/// Runs the strategies concurrently on the rayon pool. The input is shared
/// read-only, every strategy accumulates on its own.
#[tracing::instrument(skip(x, config), fields(n = x.len()))]
pub fn run_concurrent(
    x: &[f64],
    strategies: &[Strategy],
    config: &Config,
) -> Result<Report, Error> {
    strategies
        .par_iter()
        .map(|&s| time_strategy(s, x, config).map(|t| (s, t)))
        .collect()
}

/// [`run`] or [`run_concurrent`] depending on `config.concurrent`.
pub fn execute(x: &[f64], strategies: &[Strategy], config: &Config) -> Result<Report, Error> {
    if config.concurrent {
        run_concurrent(x, strategies, config)
    } else {
        run(x, strategies, config)
    }
}
