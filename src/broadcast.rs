//! Matrix strategies: evaluate the pairwise matrix `M[i, j] = f(x[i], x[j])`
//! row-wise with the broadcast form of the function, mask it down to the strict
//! lower triangle and sum what remains.

use std::ops::Range;

use aligned_vec::AVec;
use faer::Mat;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::{Error, PairwiseFn};

const TILE_ALIGN: usize = 64;

/// Materializes the full `n x n` matrix, so peak memory is `O(n^2)`. Prefer
/// [`pairwise_tiled`] for large inputs.
#[tracing::instrument(skip(x, f), fields(n = x.len()))]
pub fn pairwise_broadcast<F: PairwiseFn + ?Sized>(x: &[f64], f: &F) -> Result<f64, Error> {
    let n = x.len();
    if n < 2 {
        return Ok(0.0);
    }
    f.validate(x)?;
    let mut m = Mat::<f64>::zeros(n, n);
    let mut row = vec![0.0; n];
    for i in 1..n {
        let row = &mut row[..i];
        f.eval_row(x[i], &x[..i], row)?;
        for (j, v) in row.iter().enumerate() {
            m[(i, j)] = *v;
        }
    }
    debug!("materialized pairwise matrix");
    let mask = lower_mask(n);
    let mut z = 0.0;
    for j in 0..n {
        for i in 0..n {
            if mask[j * n + i] {
                z += m[(i, j)];
            }
        }
    }
    Ok(z)
}

/// Column-major `n x n` mask, true where the column index is below the row
/// index.
pub fn lower_mask(n: usize) -> Vec<bool> {
    (0..n)
        .flat_map(|j| (0..n).map(move |i| j < i))
        .collect()
}

/// Blocked variant of [`pairwise_broadcast`]: rows are evaluated `block` at a
/// time into a reused `block x n` tile.
#[tracing::instrument(skip(x, f), fields(n = x.len()))]
pub fn pairwise_tiled<F: PairwiseFn + ?Sized>(
    x: &[f64],
    f: &F,
    block: usize,
) -> Result<f64, Error> {
    if block == 0 {
        return Err(Error::InvalidBlockSize);
    }
    let n = x.len();
    if n < 2 {
        return Ok(0.0);
    }
    f.validate(x)?;
    let block = block.min(n);
    let mut tile = new_tile(block, n);
    let mut z = 0.0;
    for rows in row_blocks(n, block) {
        z += tile_sum(x, f, rows, &mut tile)?;
    }
    Ok(z)
}

/// [`pairwise_tiled`] with row blocks spread over the rayon pool.
///
/// Every block has its own accumulator and the partial sums are added in block
/// order, so the result only depends on `block`, not on scheduling.
#[tracing::instrument(skip(x, f), fields(n = x.len()))]
pub fn pairwise_tiled_par<F: PairwiseFn + ?Sized>(
    x: &[f64],
    f: &F,
    block: usize,
) -> Result<f64, Error> {
    if block == 0 {
        return Err(Error::InvalidBlockSize);
    }
    let n = x.len();
    if n < 2 {
        return Ok(0.0);
    }
    f.validate(x)?;
    let block = block.min(n);
    let partials = row_blocks(n, block)
        .collect::<Vec<_>>()
        .into_par_iter()
        .map_init(
            || new_tile(block, n),
            |tile, rows| tile_sum(x, f, rows, tile),
        )
        .collect::<Result<Vec<_>, _>>()?;
    debug!(blocks = partials.len(), "summed row blocks");
    Ok(partials.into_iter().sum())
}

fn new_tile(block: usize, n: usize) -> AVec<f64> {
    let mut tile = AVec::<f64>::with_capacity(TILE_ALIGN, block * n);
    tile.resize(block * n, 0.0);
    tile
}

fn row_blocks(n: usize, block: usize) -> impl Iterator<Item = Range<usize>> {
    (0..n).step_by(block).map(move |start| start..(start + block).min(n))
}

fn tile_sum<F: PairwiseFn + ?Sized>(
    x: &[f64],
    f: &F,
    rows: Range<usize>,
    tile: &mut [f64],
) -> Result<f64, Error> {
    let n = x.len();
    trace!("tile rows {}..{}", rows.start, rows.end);
    let mut z = 0.0;
    for (r, i) in rows.enumerate() {
        let out = &mut tile[r * n..r * n + i];
        f.eval_row(x[i], &x[..i], out)?;
        z += out.iter().sum::<f64>();
    }
    Ok(z)
}
