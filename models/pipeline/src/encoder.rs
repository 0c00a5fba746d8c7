use std::collections::HashSet;

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Cell, PipelineError};

/// How a single input column turns into features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnKind {
    /// One-hot over the categories seen at fit time; unseen values encode as all zeros.
    Categorical { categories: Vec<String> },
    /// `(x - mean) / scale`.
    Numeric {
        #[serde(default)]
        mean: f64,
        #[serde(default = "unit_scale")]
        scale: f64,
    },
}

fn unit_scale() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: ColumnKind,
}

impl ColumnSpec {
    fn width(&self) -> usize {
        match &self.kind {
            ColumnKind::Categorical { categories } => categories.len(),
            ColumnKind::Numeric { .. } => 1,
        }
    }
}

/// Fixed-schema row encoder, the preprocessing half of a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnEncoder {
    columns: Vec<ColumnSpec>,
    width: usize,
}

impl ColumnEncoder {
    pub fn new(columns: Vec<ColumnSpec>) -> Result<Self, PipelineError> {
        if columns.is_empty() {
            return Err(PipelineError::InvalidArtifact("no input columns".into()));
        }
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(PipelineError::InvalidArtifact(format!(
                    "duplicate column '{}'",
                    column.name
                )));
            }
            match &column.kind {
                ColumnKind::Categorical { categories } if categories.is_empty() => {
                    return Err(PipelineError::InvalidArtifact(format!(
                        "categorical column '{}' has no categories",
                        column.name
                    )));
                }
                ColumnKind::Numeric { scale, .. } if *scale == 0.0 || !scale.is_finite() => {
                    return Err(PipelineError::InvalidArtifact(format!(
                        "numeric column '{}' has unusable scale {scale}",
                        column.name
                    )));
                }
                _ => {}
            }
        }
        let width = columns.iter().map(ColumnSpec::width).sum();
        Ok(Self { columns, width })
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Number of features an encoded row has.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn encode(&self, row: &[Cell]) -> Result<Array1<f64>, PipelineError> {
        if row.len() != self.columns.len() {
            return Err(PipelineError::RowWidth {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        let mut features = Vec::with_capacity(self.width);
        for (column, cell) in self.columns.iter().zip(row) {
            match (&column.kind, cell) {
                (ColumnKind::Categorical { categories }, Cell::Text(value)) => {
                    let hit = categories.iter().position(|c| c == value);
                    if hit.is_none() {
                        debug!(column = %column.name, %value, "unseen category, encoding as zeros");
                    }
                    features.extend((0..categories.len()).map(|i| if Some(i) == hit { 1.0 } else { 0.0 }));
                }
                (ColumnKind::Numeric { mean, scale }, Cell::Number(value)) => {
                    features.push((value - mean) / scale);
                }
                (ColumnKind::Categorical { .. }, Cell::Number(_)) => {
                    return Err(PipelineError::CellType {
                        column: column.name.clone(),
                        expected: "text",
                    });
                }
                (ColumnKind::Numeric { .. }, Cell::Text(_)) => {
                    return Err(PipelineError::CellType {
                        column: column.name.clone(),
                        expected: "numeric",
                    });
                }
            }
        }
        Ok(Array1::from(features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn encoder() -> ColumnEncoder {
        ColumnEncoder::new(vec![
            ColumnSpec {
                name: "tipo".into(),
                kind: ColumnKind::Categorical {
                    categories: vec!["Apartment".into(), "House".into()],
                },
            },
            ColumnSpec {
                name: "capacidad".into(),
                kind: ColumnKind::Numeric { mean: 2.0, scale: 2.0 },
            },
        ])
        .unwrap()
    }

    #[test]
    fn one_hot_then_scaled_numeric() {
        let enc = encoder();
        assert_eq!(enc.width(), 3);
        let row = vec![Cell::Text("House".into()), Cell::Number(6.0)];
        assert_eq!(enc.encode(&row).unwrap(), array![0.0, 1.0, 2.0]);
    }

    #[test]
    fn unseen_category_is_all_zeros() {
        let row = vec![Cell::Text("Castle".into()), Cell::Number(2.0)];
        assert_eq!(encoder().encode(&row).unwrap(), array![0.0, 0.0, 0.0]);
    }

    #[test]
    fn rejects_wrong_width_and_types() {
        let enc = encoder();
        assert!(matches!(
            enc.encode(&[Cell::Number(1.0)]),
            Err(PipelineError::RowWidth { expected: 2, found: 1 })
        ));
        let swapped = vec![Cell::Number(1.0), Cell::Text("House".into())];
        assert!(matches!(
            enc.encode(&swapped),
            Err(PipelineError::CellType { expected: "text", .. })
        ));
    }

    #[test]
    fn rejects_duplicate_columns() {
        let spec = ColumnSpec {
            name: "x".into(),
            kind: ColumnKind::Numeric { mean: 0.0, scale: 1.0 },
        };
        assert!(ColumnEncoder::new(vec![spec.clone(), spec]).is_err());
    }

    #[test]
    fn numeric_defaults_from_json() {
        let spec: ColumnSpec = serde_json::from_str(r#"{"name":"x","kind":"numeric"}"#).unwrap();
        assert_eq!(spec.kind, ColumnKind::Numeric { mean: 0.0, scale: 1.0 });
    }
}
