use std::path::PathBuf;

use k_nn::KnnError;
use softmax::SoftmaxError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to read pipeline artifact '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse pipeline artifact '{origin}': {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid pipeline artifact: {0}")]
    InvalidArtifact(String),
    #[error("Row has {found} cells, the pipeline expects {expected}")]
    RowWidth { expected: usize, found: usize },
    #[error("Column '{column}' expects a {expected} value")]
    CellType {
        column: String,
        expected: &'static str,
    },
    #[error("k-NN estimator: {0}")]
    Knn(#[from] KnnError),
    #[error("Softmax estimator: {0}")]
    Softmax(#[from] SoftmaxError),
}
