//! A fitted tabular classification pipeline: a fixed-schema column encoder
//! followed by one estimator, loaded from a JSON artifact.
//!
//! The pipeline never trains. It exposes the classic trio of `classes`,
//! `predict_proba` and `predict`, where `predict` is always the arg-max of
//! `predict_proba` in `classes` order.

use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

use k_nn::KnnClassifier;
use listings_helpers::{DataPoint, L2Dist, argmax};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use softmax::SoftmaxRegression;
use tracing::info;

mod encoder;
mod error;

pub use encoder::{ColumnEncoder, ColumnKind, ColumnSpec};
pub use error::PipelineError;

/// One input value of a request row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<u32> for Cell {
    fn from(value: u32) -> Self {
        Cell::Number(f64::from(value))
    }
}

impl From<u8> for Cell {
    fn from(value: u8) -> Self {
        Cell::Number(f64::from(value))
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// A stored reference row of a k-NN estimator, in raw (unencoded) form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRow {
    pub row: Vec<Cell>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EstimatorArtifact {
    Softmax {
        weights: Vec<Vec<f64>>,
        intercepts: Vec<f64>,
    },
    Knn {
        k: usize,
        references: Vec<ReferenceRow>,
    },
}

/// The on-disk shape of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineArtifact {
    pub columns: Vec<ColumnSpec>,
    pub classes: Vec<String>,
    pub estimator: EstimatorArtifact,
}

#[derive(Debug, Clone)]
enum Estimator {
    Softmax(SoftmaxRegression<f64>),
    Knn(KnnClassifier<String, f64, L2Dist>),
}

impl Estimator {
    fn predict_proba(&self, features: ArrayView1<f64>) -> Result<Array1<f64>, PipelineError> {
        match self {
            Estimator::Softmax(model) => Ok(model.predict_proba(features)?),
            Estimator::Knn(model) => Ok(model.predict_proba(features)?),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Estimator::Softmax(_) => "softmax",
            Estimator::Knn(_) => "knn",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    encoder: ColumnEncoder,
    classes: Vec<String>,
    estimator: Estimator,
}

impl Pipeline {
    pub fn from_artifact(artifact: PipelineArtifact) -> Result<Self, PipelineError> {
        let PipelineArtifact {
            columns,
            classes,
            estimator,
        } = artifact;

        if classes.is_empty() {
            return Err(PipelineError::InvalidArtifact("no classes".into()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = classes.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(PipelineError::InvalidArtifact(format!("duplicate class '{dup}'")));
        }

        let encoder = ColumnEncoder::new(columns)?;
        let estimator = match estimator {
            EstimatorArtifact::Softmax { weights, intercepts } => {
                let rows = weights.len();
                let cols = weights.first().map_or(0, Vec::len);
                if weights.iter().any(|w| w.len() != cols) {
                    return Err(PipelineError::InvalidArtifact("ragged weight matrix".into()));
                }
                if cols != encoder.width() {
                    return Err(PipelineError::InvalidArtifact(format!(
                        "weights have {cols} features, encoder produces {}",
                        encoder.width()
                    )));
                }
                let weights = Array2::from_shape_vec((rows, cols), weights.concat())
                    .map_err(|e| PipelineError::InvalidArtifact(e.to_string()))?;
                Estimator::Softmax(SoftmaxRegression::new(
                    weights,
                    Array1::from(intercepts),
                    classes.len(),
                )?)
            }
            EstimatorArtifact::Knn { k, references } => {
                let points = references
                    .iter()
                    .map(|r| Ok(DataPoint::new(encoder.encode(&r.row)?, r.label.clone())))
                    .collect::<Result<Vec<_>, PipelineError>>()?;
                Estimator::Knn(KnnClassifier::with_classes(k, points, classes.clone(), L2Dist)?)
            }
        };

        Ok(Self {
            encoder,
            classes,
            estimator,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, PipelineError> {
        let artifact: PipelineArtifact = serde_json::from_str(json).map_err(|source| PipelineError::Parse {
            origin: "<inline>".into(),
            source,
        })?;
        Self::from_artifact(artifact)
    }

    /// Reads and validates an artifact file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: PipelineArtifact = serde_json::from_str(&text).map_err(|source| PipelineError::Parse {
            origin: path.display().to_string(),
            source,
        })?;
        let pipeline = Self::from_artifact(artifact)?;
        info!(
            path = %path.display(),
            estimator = pipeline.estimator.name(),
            classes = ?pipeline.classes,
            "pipeline loaded"
        );
        Ok(pipeline)
    }

    /// Class labels in probability-column order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Input column names in the order rows must follow.
    pub fn schema(&self) -> Vec<&str> {
        self.encoder.columns().iter().map(|c| c.name.as_str()).collect()
    }

    /// Known categories of a categorical input column.
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.encoder
            .columns()
            .iter()
            .find(|c| c.name == column)
            .and_then(|c| match &c.kind {
                ColumnKind::Categorical { categories } => Some(categories.as_slice()),
                ColumnKind::Numeric { .. } => None,
            })
    }

    /// One probability row per input row, columns in `classes()` order.
    pub fn predict_proba(&self, rows: &[Vec<Cell>]) -> Result<Array2<f64>, PipelineError> {
        let mut out = Array2::zeros((rows.len(), self.classes.len()));
        for (i, row) in rows.iter().enumerate() {
            let features = self.encoder.encode(row)?;
            let proba = self.estimator.predict_proba(features.view())?;
            out.row_mut(i).assign(&proba);
        }
        Ok(out)
    }

    pub fn predict(&self, rows: &[Vec<Cell>]) -> Result<Vec<String>, PipelineError> {
        let proba = self.predict_proba(rows)?;
        proba
            .rows()
            .into_iter()
            .map(|p| {
                argmax(p)
                    .map(|idx| self.classes[idx].clone())
                    .ok_or_else(|| PipelineError::InvalidArtifact("undefined probabilities".into()))
            })
            .collect()
    }
}
