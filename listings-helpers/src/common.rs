use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A labelled feature vector, e.g. one encoded reference listing.
///
/// L: The type of the label (e.g. `String` class names).
/// F: The float type for the features (e.g., f32, f64).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint<L, F> {
    pub features: Array1<F>,
    pub label: L,
}

impl<L, F> DataPoint<L, F>
where
    L: Clone + Eq + std::hash::Hash + Debug,
{
    pub fn new(features: Array1<F>, label: L) -> Self {
        DataPoint { features, label }
    }

    pub fn dim(&self) -> usize {
        self.features.len()
    }
}
