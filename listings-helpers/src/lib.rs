use ndarray::{ArrayView1, NdFloat, ScalarOperand};
use ndarray_stats::QuantileExt;
use num_traits::{FromPrimitive, NumCast};

use std::iter::Sum;

// Include submodules
mod common;
mod distance;
mod flag;

// Re-export types from submodules
pub use common::DataPoint;
pub use distance::{Distance, L2Dist};
pub use flag::{FlagError, YesNo};

/// Float types the model crates are generic over.
pub trait Float: NdFloat + FromPrimitive + Default + Sum + ScalarOperand + std::marker::Unpin {
    fn cast<T: NumCast>(x: T) -> Option<Self> {
        NumCast::from(x)
    }
}

impl Float for f32 {}

impl Float for f64 {}

/// Index of the largest entry, first one wins on ties.
///
/// Returns `None` for an empty view or when a NaN makes the ordering undefined.
pub fn argmax<F: Float>(values: ArrayView1<F>) -> Option<usize> {
    values.argmax().ok()
}
