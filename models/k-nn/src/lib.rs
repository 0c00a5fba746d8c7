use std::fmt::Debug;
use std::hash::Hash;

use listings_helpers::{DataPoint, Distance, Float, argmax};
use ndarray::{Array1, ArrayView1};
use thiserror::Error;

/// Errors that can occur when using the k-NN classifier.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KnnError {
    /// k cannot be zero for a k-NN classifier
    #[error("k cannot be zero for a k-NN classifier")]
    InvalidK,
    /// Cannot predict with an empty reference set
    #[error("Cannot predict with an empty reference set")]
    EmptyTrainingSet,
    /// Reference points do not share one feature width
    #[error("Reference point {index} has {found} features, expected {expected}")]
    MismatchedDimensions {
        index: usize,
        expected: usize,
        found: usize,
    },
    /// A query with the wrong feature width
    #[error("Query has {found} features, expected {expected}")]
    QueryDimensions { expected: usize, found: usize },
    /// A reference label that is not in the class list
    #[error("Reference label {0} is not among the declared classes")]
    UnknownLabel(String),
    /// Invalid distance comparison (likely due to NaN values in data)
    #[error("Invalid distance comparison (likely due to NaN values in data)")]
    InvalidDistance,
}

/// A k-Nearest Neighbors (k-NN) classifier over a fixed reference set.
///
/// The probability of a class is the share of the `k` nearest references
/// that carry it, so the probabilities of one query always sum to one.
/// `predict` returns the class with the largest share, the first class in
/// `classes()` order on ties.
///
/// # Type Parameters
///
/// * `L`: The type of the label (e.g., `String`, `i32`, or a custom `enum`).
/// * `F`: The float type for the features (e.g., `f32`, `f64`).
/// * `D`: The distance metric, which must implement the `Distance` trait.
#[derive(Debug, Clone)]
pub struct KnnClassifier<L, F, D>
where
    L: Clone + Eq + Hash + Debug,
    F: Float,
    D: Distance<F>,
{
    k: usize,
    references: Vec<DataPoint<L, F>>,
    classes: Vec<L>,
    distance: D,
}

impl<L, F, D> KnnClassifier<L, F, D>
where
    L: Clone + Eq + Hash + Debug + Ord,
    F: Float,
    D: Distance<F>,
{
    /// Creates a new k-NN classifier; classes are the sorted distinct labels.
    ///
    /// # Errors
    ///
    /// Returns `KnnError::InvalidK` if `k` is 0, `KnnError::EmptyTrainingSet`
    /// for an empty reference set and `KnnError::MismatchedDimensions` if the
    /// references disagree on feature width.
    pub fn new(k: usize, references: Vec<DataPoint<L, F>>, distance: D) -> Result<Self, KnnError> {
        let mut classes: Vec<L> = references.iter().map(|p| p.label.clone()).collect();
        classes.sort();
        classes.dedup();
        Self::with_classes(k, references, classes, distance)
    }
}

impl<L, F, D> KnnClassifier<L, F, D>
where
    L: Clone + Eq + Hash + Debug,
    F: Float,
    D: Distance<F>,
{
    /// Creates a classifier whose probability columns follow `classes`.
    ///
    /// Every reference label must appear in `classes`; classes without any
    /// reference are allowed and always get probability zero.
    pub fn with_classes(
        k: usize,
        references: Vec<DataPoint<L, F>>,
        classes: Vec<L>,
        distance: D,
    ) -> Result<Self, KnnError> {
        if k == 0 {
            return Err(KnnError::InvalidK);
        }
        let Some(first) = references.first() else {
            return Err(KnnError::EmptyTrainingSet);
        };
        let expected = first.dim();
        for (index, point) in references.iter().enumerate() {
            if point.dim() != expected {
                return Err(KnnError::MismatchedDimensions {
                    index,
                    expected,
                    found: point.dim(),
                });
            }
            if !classes.contains(&point.label) {
                return Err(KnnError::UnknownLabel(format!("{:?}", point.label)));
            }
        }
        Ok(Self {
            k,
            references,
            classes,
            distance,
        })
    }

    pub fn classes(&self) -> &[L] {
        &self.classes
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn n_features(&self) -> usize {
        self.references.first().map_or(0, DataPoint::dim)
    }

    /// Share of each class among the `k` nearest references, in `classes()` order.
    pub fn predict_proba(&self, features: ArrayView1<F>) -> Result<Array1<F>, KnnError> {
        if features.len() != self.n_features() {
            return Err(KnnError::QueryDimensions {
                expected: self.n_features(),
                found: features.len(),
            });
        }

        // Relative (squared) distance to every reference is enough to rank them.
        let mut distances: Vec<(F, &L)> = self
            .references
            .iter()
            .map(|dp| (self.distance.rdistance(dp.features.view(), features), &dp.label))
            .collect();
        if distances.iter().any(|(d, _)| d.is_nan()) {
            return Err(KnnError::InvalidDistance);
        }

        // Stable sort keeps reference order among equally distant points.
        distances.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        // k larger than the reference set just uses every reference.
        let num_neighbors = self.k.min(distances.len());
        let mut votes = Array1::<F>::zeros(self.classes.len());
        for (_, label) in &distances[..num_neighbors] {
            if let Some(idx) = self.classes.iter().position(|c| c == *label) {
                votes[idx] += F::one();
            }
        }
        let total = F::from_usize(num_neighbors).ok_or(KnnError::InvalidDistance)?;
        Ok(votes / total)
    }

    /// Predicts the label for a new, unseen data point.
    pub fn predict(&self, features: ArrayView1<F>) -> Result<L, KnnError> {
        let proba = self.predict_proba(features)?;
        let idx = argmax(proba.view()).ok_or(KnnError::InvalidDistance)?;
        Ok(self.classes[idx].clone())
    }
}
