use listings_helpers::{Float, argmax};
use ndarray::{Array1, Array2, ArrayView1};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SoftmaxError {
    #[error("weight matrix is empty")]
    EmptyWeights,
    #[error("{rows} weight rows do not fit {classes} classes")]
    ClassMismatch { rows: usize, classes: usize },
    #[error("{intercepts} intercepts for {rows} weight rows")]
    InterceptMismatch { rows: usize, intercepts: usize },
    #[error("query has {found} features, expected {expected}")]
    QueryDimensions { expected: usize, found: usize },
    #[error("probabilities are undefined (NaN in weights or input)")]
    Undefined,
}

/// Multinomial logistic regression with fixed, already fitted coefficients.
///
/// With two classes the model may carry a single weight row; that row scores
/// the second class and the probabilities are `[1 - σ(z), σ(z)]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftmaxRegression<F: Float> {
    weights: Array2<F>,
    intercepts: Array1<F>,
    n_classes: usize,
}

impl<F: Float> SoftmaxRegression<F> {
    /// `weights` is `(rows, features)` where `rows` is `n_classes`, or 1 for a binary model.
    pub fn new(weights: Array2<F>, intercepts: Array1<F>, n_classes: usize) -> Result<Self, SoftmaxError> {
        let (rows, cols) = weights.dim();
        if rows == 0 || cols == 0 {
            return Err(SoftmaxError::EmptyWeights);
        }
        let binary = n_classes == 2 && rows == 1;
        if !binary && rows != n_classes {
            return Err(SoftmaxError::ClassMismatch { rows, classes: n_classes });
        }
        if intercepts.len() != rows {
            return Err(SoftmaxError::InterceptMismatch {
                rows,
                intercepts: intercepts.len(),
            });
        }
        Ok(Self {
            weights,
            intercepts,
            n_classes,
        })
    }

    pub fn n_features(&self) -> usize {
        self.weights.ncols()
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn scores(&self, features: ArrayView1<F>) -> Result<Array1<F>, SoftmaxError> {
        if features.len() != self.n_features() {
            return Err(SoftmaxError::QueryDimensions {
                expected: self.n_features(),
                found: features.len(),
            });
        }
        Ok(self.weights.dot(&features) + &self.intercepts)
    }

    pub fn predict_proba(&self, features: ArrayView1<F>) -> Result<Array1<F>, SoftmaxError> {
        let scores = self.scores(features)?;
        let proba = if self.weights.nrows() == 1 && self.n_classes == 2 {
            let p = F::one() / (F::one() + (-scores[0]).exp());
            Array1::from(vec![F::one() - p, p])
        } else {
            // Shift by the max score so exp() cannot overflow.
            let max = scores.fold(F::neg_infinity(), |m, &s| m.max(s));
            let exp = scores.mapv(|s| (s - max).exp());
            let total = exp.sum();
            exp / total
        };
        if proba.iter().any(|p| p.is_nan()) {
            return Err(SoftmaxError::Undefined);
        }
        Ok(proba)
    }

    /// Index of the most probable class.
    pub fn predict(&self, features: ArrayView1<F>) -> Result<usize, SoftmaxError> {
        let proba = self.predict_proba(features)?;
        argmax(proba.view()).ok_or(SoftmaxError::Undefined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn binary_model_uses_sigmoid() {
        let model = SoftmaxRegression::new(array![[1.0, -1.0]], array![0.0], 2).unwrap();
        let proba = model.predict_proba(array![2.0, 2.0].view()).unwrap();
        assert_abs_diff_eq!(proba[0], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(proba[1], 0.5, epsilon = 1e-12);

        let proba = model.predict_proba(array![3.0, 0.0].view()).unwrap();
        assert!(proba[1] > 0.9);
        assert_eq!(model.predict(array![3.0, 0.0].view()).unwrap(), 1);
    }

    #[test]
    fn multinomial_rows_sum_to_one() {
        let weights = array![[1.0, 0.0], [0.0, 1.0], [0.5, 0.5]];
        let model = SoftmaxRegression::new(weights, array![0.0, 0.1, -0.2], 3).unwrap();
        let proba = model.predict_proba(array![4.0, 1.0].view()).unwrap();
        assert_abs_diff_eq!(proba.sum(), 1.0, epsilon = 1e-12);
        assert_eq!(model.predict(array![4.0, 1.0].view()).unwrap(), 0);
    }

    #[test]
    fn large_scores_do_not_overflow() {
        let model = SoftmaxRegression::new(array![[1000.0], [999.0]], array![0.0, 0.0], 2).unwrap();
        let proba = model.predict_proba(array![1.0].view()).unwrap();
        assert!(proba.iter().all(|p: &f64| p.is_finite()));
        assert_abs_diff_eq!(proba.sum(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn shape_errors() {
        assert_eq!(
            SoftmaxRegression::new(array![[1.0], [1.0]], array![0.0, 0.0], 3),
            Err(SoftmaxError::ClassMismatch { rows: 2, classes: 3 })
        );
        assert_eq!(
            SoftmaxRegression::new(array![[1.0]], array![0.0, 1.0], 2),
            Err(SoftmaxError::InterceptMismatch { rows: 1, intercepts: 2 })
        );
        let model = SoftmaxRegression::new(array![[1.0, 2.0]], array![0.0], 2).unwrap();
        assert_eq!(
            model.predict_proba(array![1.0].view()),
            Err(SoftmaxError::QueryDimensions { expected: 2, found: 1 })
        );
    }
}
