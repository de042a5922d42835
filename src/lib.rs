//! Sums of a binary function over the strict lower triangle of the pairwise
//! matrix of a one dimensional input,
//! `sum(f(x[i], x[j]) for i in 0..n for j in 0..i)`, with interchangeable
//! evaluation strategies and a small timing harness.

mod broadcast;
mod compiled;
mod error;
mod func;
mod harness;
mod naive;

pub use crate::{broadcast::*, compiled::*, error::*, func::*, harness::*, naive::*};
