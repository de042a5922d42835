use std::sync::atomic::{AtomicU64, Ordering};

use crate::Error;

/// A binary function summed over the strict lower triangle of the pairwise
/// matrix of an input, `f(x[i], x[j])` for every `j < i`.
///
/// Every strategy calls [`PairwiseFn::validate`] once before evaluating
/// anything, and only when the input holds at least one pair.
pub trait PairwiseFn: Sync {
    fn eval(&self, a: f64, b: f64) -> Result<f64, Error>;

    /// Broadcast form: `out[k] = f(a, bs[k])`.
    #[inline]
    fn eval_row(&self, a: f64, bs: &[f64], out: &mut [f64]) -> Result<(), Error> {
        debug_assert_eq!(bs.len(), out.len());
        for (o, &b) in out.iter_mut().zip(bs) {
            *o = self.eval(a, b)?;
        }
        Ok(())
    }

    #[inline]
    fn validate(&self, _x: &[f64]) -> Result<(), Error> {
        Ok(())
    }
}

impl<F> PairwiseFn for F
where
    F: Fn(f64, f64) -> f64 + Sync,
{
    #[inline(always)]
    fn eval(&self, a: f64, b: f64) -> Result<f64, Error> {
        Ok(self(a, b))
    }
}

/// Adapter for closures that can fail on some pairs.
pub struct Fallible<F>(pub F);

impl<F> PairwiseFn for Fallible<F>
where
    F: Fn(f64, f64) -> Result<f64, Error> + Sync,
{
    #[inline(always)]
    fn eval(&self, a: f64, b: f64) -> Result<f64, Error> {
        (self.0)(a, b)
    }
}

/// `a^2 / b`. Defined when no divisor is zero, that is no zero in `x[..n - 1]`;
/// the last element only ever appears as a numerator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquareRatio;

impl PairwiseFn for SquareRatio {
    #[inline(always)]
    fn eval(&self, a: f64, b: f64) -> Result<f64, Error> {
        if b == 0.0 {
            return Err(Error::DivisionByZero { index: None });
        }
        Ok(a * a / b)
    }

    // a row only sees a slice of the input, so it cannot name the offending index
    fn eval_row(&self, a: f64, bs: &[f64], out: &mut [f64]) -> Result<(), Error> {
        debug_assert_eq!(bs.len(), out.len());
        if bs.contains(&0.0) {
            return Err(Error::DivisionByZero { index: None });
        }
        let a2 = a * a;
        pulp::Arch::new().dispatch(
            #[inline(always)]
            || {
                for (o, &b) in out.iter_mut().zip(bs) {
                    *o = a2 / b;
                }
            },
        );
        Ok(())
    }

    fn validate(&self, x: &[f64]) -> Result<(), Error> {
        let Some((_, divisors)) = x.split_last() else {
            return Ok(());
        };
        match divisors.iter().position(|&v| v == 0.0) {
            Some(index) => Err(Error::DivisionByZero {
                index: Some(index),
            }),
            None => Ok(()),
        }
    }
}

/// Counts scalar evaluations of the wrapped function.
///
/// Broadcast rows go through the default [`PairwiseFn::eval_row`], so each
/// element of a row is counted as one call.
#[derive(Debug, Default)]
pub struct Counted<F> {
    inner: F,
    calls: AtomicU64,
}

impl<F> Counted<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            calls: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::Relaxed);
    }

    pub fn into_inner(self) -> F {
        self.inner
    }
}

impl<F: PairwiseFn> PairwiseFn for Counted<F> {
    #[inline]
    fn eval(&self, a: f64, b: f64) -> Result<f64, Error> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.inner.eval(a, b)
    }

    fn validate(&self, x: &[f64]) -> Result<(), Error> {
        self.inner.validate(x)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_closure_eval() {
        let f = |a: f64, b: f64| a - b;
        assert_eq!(f.eval(3.0, 1.0).unwrap(), 2.0);
        assert!(f.validate(&[0.0, 0.0]).is_ok());
    }

    #[test]
    fn test_square_ratio_eval() {
        assert_eq!(SquareRatio.eval(4.0, 2.0).unwrap(), 8.0);
        assert!(matches!(
            SquareRatio.eval(1.0, 0.0),
            Err(Error::DivisionByZero { index: None })
        ));
    }

    #[test]
    fn test_square_ratio_eval_row() {
        let bs = [1.0, 2.0, 4.0, 8.0, 16.0, 0.5];
        let mut out = [0.0; 6];
        SquareRatio.eval_row(4.0, &bs, &mut out).unwrap();
        assert_eq!(out, [16.0, 8.0, 4.0, 2.0, 1.0, 32.0]);
    }

    #[test]
    fn test_square_ratio_eval_row_zero() {
        let bs = [1.0, 2.0, 0.0];
        let mut out = [0.0; 3];
        assert!(matches!(
            SquareRatio.eval_row(4.0, &bs, &mut out),
            Err(Error::DivisionByZero { index: None })
        ));
    }

    #[test]
    fn test_square_ratio_validate() {
        assert!(SquareRatio.validate(&[1.0, 2.0]).is_ok());
        assert!(matches!(
            SquareRatio.validate(&[1.0, 0.0, 3.0, 0.0]),
            Err(Error::DivisionByZero { index: Some(1) })
        ));
        // the last element is never a divisor
        assert!(SquareRatio.validate(&[1.0, 2.0, 0.0]).is_ok());
        assert!(SquareRatio.validate(&[0.0]).is_ok());
        assert!(SquareRatio.validate(&[]).is_ok());
    }

    #[test]
    fn test_division_by_zero_message() {
        assert_eq!(
            SquareRatio.eval(1.0, 0.0).unwrap_err().to_string(),
            "division by zero"
        );
        assert_eq!(
            SquareRatio.validate(&[2.0, 0.0, 1.0]).unwrap_err().to_string(),
            "division by zero: x[1] is zero"
        );
    }

    #[test]
    fn test_fallible() {
        let f = Fallible(|a: f64, b: f64| {
            if a < 0.0 {
                Err(Error::Evaluation("negative".to_string()))
            } else {
                Ok(a + b)
            }
        });
        assert_eq!(f.eval(1.0, 2.0).unwrap(), 3.0);
        assert!(f.eval(-1.0, 2.0).is_err());
    }

    #[test]
    fn test_counted() {
        let f = Counted::new(SquareRatio);
        let mut out = [0.0; 3];
        f.eval(1.0, 1.0).unwrap();
        f.eval_row(2.0, &[1.0, 2.0, 4.0], &mut out).unwrap();
        assert_eq!(out, [4.0, 2.0, 1.0]);
        assert_eq!(f.calls(), 4);
        assert!(f.validate(&[0.0, 1.0]).is_err());
        f.reset();
        assert_eq!(f.calls(), 0);
    }
}
