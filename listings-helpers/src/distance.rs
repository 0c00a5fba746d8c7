use ndarray::{ArrayView1, Zip};

use crate::Float;

/// A metric over feature vectors.
pub trait Distance<F: Float>: Clone + Send + Sync {
    /// A monotone stand-in for the true distance, cheaper to compute.
    fn rdistance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F;

    fn rdist_to_dist(&self, rdist: F) -> F;

    fn distance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        self.rdist_to_dist(self.rdistance(a, b))
    }
}

/// Euclidean distance; `rdistance` is the squared distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct L2Dist;

impl<F: Float> Distance<F> for L2Dist {
    fn rdistance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        Zip::from(&a)
            .and(&b)
            .fold(F::zero(), |acc, &x, &y| acc + (x - y) * (x - y))
    }

    fn rdist_to_dist(&self, rdist: F) -> F {
        rdist.sqrt()
    }
}
