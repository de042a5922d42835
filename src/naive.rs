#![allow(clippy::needless_range_loop)]

use tracing::debug;

use crate::{Error, PairwiseFn};

/// Sum of `f(x[i], x[j])` over all `j < i`, one dynamically dispatched call
/// per pair, accumulated row by row in index order.
///
/// This is the reference every other strategy is checked against.
#[tracing::instrument(skip(x, f), fields(n = x.len()))]
pub fn pairwise_naive(x: &[f64], f: &dyn PairwiseFn) -> Result<f64, Error> {
    if x.len() < 2 {
        return Ok(0.0);
    }
    f.validate(x)?;
    let mut z = 0.0;
    for i in 0..x.len() {
        for j in 0..i {
            z += f.eval(x[i], x[j])?;
        }
    }
    debug!("naive reduction finished");
    Ok(z)
}

/// Same as [`pairwise_naive`].
#[inline]
pub fn reduce(x: &[f64], f: &dyn PairwiseFn) -> Result<f64, Error> {
    pairwise_naive(x, f)
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::{Counted, Fallible, SquareRatio};

    #[test]
    fn test_naive_small() {
        assert_eq!(pairwise_naive(&[1.0, 2.0, 4.0], &SquareRatio).unwrap(), 28.0);
    }

    #[test]
    fn test_naive_no_pairs() {
        assert_eq!(pairwise_naive(&[], &SquareRatio).unwrap(), 0.0);
        assert_eq!(pairwise_naive(&[5.0], &SquareRatio).unwrap(), 0.0);
        // no pairs, so the zero is never a divisor
        assert_eq!(pairwise_naive(&[0.0], &SquareRatio).unwrap(), 0.0);
    }

    #[test]
    fn test_naive_closure() {
        let f = |a: f64, b: f64| a * b;
        // 1*2 + 1*3 + 2*3
        assert_eq!(reduce(&[1.0, 2.0, 3.0], &f).unwrap(), 11.0);
    }

    #[test]
    fn test_naive_division_by_zero() {
        assert!(matches!(
            pairwise_naive(&[0.0, 1.0], &SquareRatio),
            Err(Error::DivisionByZero { index: Some(0) })
        ));
        // the only pair is 0^2 / 1
        assert_eq!(pairwise_naive(&[1.0, 0.0], &SquareRatio).unwrap(), 0.0);
    }

    #[test]
    fn test_naive_pair_count() {
        let f = Counted::new(SquareRatio);
        let x = (1..=50).map(|x| x as f64).collect::<Vec<_>>();
        pairwise_naive(&x, &f).unwrap();
        assert_eq!(f.calls(), 50 * 49 / 2);
    }

    #[test]
    fn test_naive_fallible_propagates() {
        let f = Counted::new(Fallible(|a: f64, b: f64| {
            if a == 3.0 && b == 2.0 {
                Err(Error::Evaluation("bad pair".to_string()))
            } else {
                Ok(a + b)
            }
        }));
        let err = pairwise_naive(&[1.0, 2.0, 3.0, 4.0], &f).unwrap_err();
        assert!(matches!(err, Error::Evaluation(ref s) if s == "bad pair"));
        // (1,0), (2,0), (2,1)
        assert_eq!(f.calls(), 3);
    }

    #[test]
    fn test_naive_idempotent() {
        let x = [0.3, 1.7, 2.2, 0.9, 5.5];
        let a = pairwise_naive(&x, &SquareRatio).unwrap();
        let b = pairwise_naive(&x, &SquareRatio).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
