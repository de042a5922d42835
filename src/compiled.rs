#![allow(clippy::needless_range_loop)]

use tracing::debug;

use crate::{Error, PairwiseFn, SquareRatio};

/// Same traversal as [`crate::pairwise_naive`], monomorphized over the
/// function type so the per-pair call is inlined instead of dispatched.
#[tracing::instrument(skip(x, f), fields(n = x.len()))]
pub fn pairwise_compiled<F: PairwiseFn + ?Sized>(x: &[f64], f: &F) -> Result<f64, Error> {
    if x.len() < 2 {
        return Ok(0.0);
    }
    f.validate(x)?;
    let mut z = 0.0;
    for i in 0..x.len() {
        let a = x[i];
        for j in 0..i {
            z += f.eval(a, x[j])?;
        }
    }
    Ok(z)
}

/// Fixed `a^2 / b` reduction compiled for the best instruction set available
/// at runtime.
#[tracing::instrument(skip(x), fields(n = x.len()))]
pub fn pairwise_square_ratio(x: &[f64]) -> Result<f64, Error> {
    if x.len() < 2 {
        return Ok(0.0);
    }
    SquareRatio.validate(x)?;
    let z = pulp::Arch::new().dispatch(
        #[inline(always)]
        || square_ratio_kernel(x),
    );
    debug!("square ratio reduction finished");
    Ok(z)
}

// the inner loop keeps four independent accumulators so it can be vectorized
// without reassociating a single running sum
#[inline(always)]
fn square_ratio_kernel(x: &[f64]) -> f64 {
    let mut z = 0.0;
    for i in 1..x.len() {
        let a2 = x[i] * x[i];
        let (head, tail) = pulp::as_arrays::<4, _>(&x[..i]);
        let mut acc = [0.0; 4];
        for b in head {
            acc[0] += a2 / b[0];
            acc[1] += a2 / b[1];
            acc[2] += a2 / b[2];
            acc[3] += a2 / b[3];
        }
        let mut row = (acc[0] + acc[1]) + (acc[2] + acc[3]);
        for b in tail {
            row += a2 / b;
        }
        z += row;
    }
    z
}
