use std::path::{Path, PathBuf};
use std::sync::Arc;

use listings_helpers::argmax;
use ndarray::Array2;
use once_cell::sync::OnceCell;
use pipeline::{Pipeline, PipelineError};
use thiserror::Error;
use tracing::info;

use crate::predict::{PredictError, PredictionRequest};

#[derive(Error, Debug)]
pub enum ModelError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("pipeline expects columns {found:?}, the prediction form sends {expected:?}")]
    Schema { expected: Vec<String>, found: Vec<String> },
}

/// The seam between the prediction widget and whatever model backs it.
pub trait Classifier: Send + Sync {
    /// Class labels in probability-column order.
    fn classes(&self) -> &[String];

    fn predict_proba(&self, rows: &[PredictionRequest]) -> Result<Array2<f64>, PredictError>;

    /// Arg-max of `predict_proba` for each row.
    fn predict(&self, rows: &[PredictionRequest]) -> Result<Vec<String>, PredictError> {
        let proba = self.predict_proba(rows)?;
        proba
            .rows()
            .into_iter()
            .map(|p| {
                argmax(p)
                    .and_then(|idx| self.classes().get(idx).cloned())
                    .ok_or(PredictError::Empty)
            })
            .collect()
    }

    /// Categories the model knows for a categorical input column.
    fn categories(&self, _column: &str) -> Option<Vec<String>> {
        None
    }
}

impl Classifier for Pipeline {
    fn classes(&self) -> &[String] {
        Pipeline::classes(self)
    }

    fn predict_proba(&self, rows: &[PredictionRequest]) -> Result<Array2<f64>, PredictError> {
        let rows: Vec<_> = rows.iter().map(PredictionRequest::to_row).collect();
        Ok(Pipeline::predict_proba(self, &rows)?)
    }

    fn predict(&self, rows: &[PredictionRequest]) -> Result<Vec<String>, PredictError> {
        let rows: Vec<_> = rows.iter().map(PredictionRequest::to_row).collect();
        Ok(Pipeline::predict(self, &rows)?)
    }

    fn categories(&self, column: &str) -> Option<Vec<String>> {
        Pipeline::categories(self, column).map(<[String]>::to_vec)
    }
}

/// Loads the pipeline artifact and checks it was fitted on the form's schema.
pub fn load_pipeline(path: impl AsRef<Path>) -> Result<Pipeline, ModelError> {
    let pipeline = Pipeline::load(path)?;
    let found = pipeline.schema();
    if found != PredictionRequest::COLUMNS {
        return Err(ModelError::Schema {
            expected: PredictionRequest::COLUMNS.iter().map(|s| s.to_string()).collect(),
            found: found.iter().map(|s| s.to_string()).collect(),
        });
    }
    Ok(pipeline)
}

/// Holds the pipeline once it has been loaded; later calls reuse it.
#[derive(Debug)]
pub struct ModelCache {
    path: PathBuf,
    pipeline: OnceCell<Arc<Pipeline>>,
}

impl ModelCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pipeline: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> Result<Arc<Pipeline>, ModelError> {
        self.pipeline
            .get_or_try_init(|| {
                info!(path = %self.path.display(), "loading pipeline");
                load_pipeline(&self.path).map(Arc::new)
            })
            .cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.pipeline.get().is_some()
    }
}
