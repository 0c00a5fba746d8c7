use std::ops::RangeInclusive;

use listings_helpers::YesNo;
use pipeline::{Cell, PipelineError};
use thiserror::Error;
use tracing::debug;

use crate::model::Classifier;
use crate::record::columns;

/// Response-time buckets offered when the model does not list its own.
pub const RESPONSE_TIMES: [&str; 4] = [
    "within an hour",
    "within a few hours",
    "within a day",
    "a few days or more",
];

/// Property types offered when the model does not list its own.
pub const PROPERTY_TYPES: [&str; 8] = [
    "Apartment",
    "House",
    "Condominium",
    "Loft",
    "Serviced apartment",
    "Townhouse",
    "Guest suite",
    "Bed and breakfast",
];

pub const CAPACITY_RANGE: RangeInclusive<u32> = 0..=16;
pub const SCORE_RANGE: RangeInclusive<u32> = 0..=10;

#[derive(Error, Debug)]
pub enum PredictError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("model returned {found} probabilities for {expected} classes")]
    Shape { expected: usize, found: usize },
    #[error("model returned no prediction")]
    Empty,
}

/// One request row, fields in the order the model was fitted on.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub response_time: String,
    pub superhost: u8,
    pub property_type: String,
    pub capacity: u32,
    pub communication_score: u32,
    pub location_score: u32,
    pub cable_tv: u8,
    pub air_conditioning: u8,
}

impl PredictionRequest {
    pub const COLUMNS: [&'static str; 8] = [
        columns::RESPONSE_TIME,
        columns::SUPERHOST,
        columns::PROPERTY_TYPE,
        columns::CAPACITY,
        columns::COMMUNICATION_SCORE,
        columns::LOCATION_SCORE,
        columns::CABLE_TV,
        columns::AIR_CONDITIONING,
    ];

    /// The request as pipeline cells, in `COLUMNS` order.
    pub fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::from(self.response_time.as_str()),
            Cell::from(self.superhost),
            Cell::from(self.property_type.as_str()),
            Cell::from(self.capacity),
            Cell::from(self.communication_score),
            Cell::from(self.location_score),
            Cell::from(self.cable_tv),
            Cell::from(self.air_conditioning),
        ]
    }
}

/// Choices for the two categorical selects.
#[derive(Debug, Clone, PartialEq)]
pub struct FormOptions {
    pub response_times: Vec<String>,
    pub property_types: Vec<String>,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            response_times: RESPONSE_TIMES.iter().map(|s| s.to_string()).collect(),
            property_types: PROPERTY_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FormOptions {
    /// Options the model was fitted with, falling back to the defaults.
    pub fn for_model(model: &dyn Classifier) -> Self {
        let defaults = Self::default();
        Self {
            response_times: model
                .categories(columns::RESPONSE_TIME)
                .unwrap_or(defaults.response_times),
            property_types: model
                .categories(columns::PROPERTY_TYPE)
                .unwrap_or(defaults.property_types),
        }
    }
}

/// The eight inputs of the prediction form.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionForm {
    pub response_time: String,
    pub superhost: YesNo,
    pub property_type: String,
    pub capacity: u32,
    pub communication_score: u32,
    pub location_score: u32,
    pub cable_tv: YesNo,
    pub air_conditioning: YesNo,
}

impl PredictionForm {
    pub fn new(options: &FormOptions) -> Self {
        Self {
            response_time: options.response_times.first().cloned().unwrap_or_default(),
            superhost: YesNo::OPTIONS[0],
            property_type: options.property_types.first().cloned().unwrap_or_default(),
            capacity: 5,
            communication_score: 5,
            location_score: 5,
            cable_tv: YesNo::OPTIONS[0],
            air_conditioning: YesNo::OPTIONS[0],
        }
    }

    /// Coerces the Si/No selects to 1/0 and lays the fields out in schema order.
    pub fn to_request(&self) -> PredictionRequest {
        PredictionRequest {
            response_time: self.response_time.clone(),
            superhost: self.superhost.to_flag(),
            property_type: self.property_type.clone(),
            capacity: self.capacity,
            communication_score: self.communication_score,
            location_score: self.location_score,
            cable_tv: self.cable_tv.to_flag(),
            air_conditioning: self.air_conditioning.to_flag(),
        }
    }
}

/// What the widget shows after "Predecir".
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub classes: Vec<String>,
    pub probabilities: Vec<f64>,
    pub label: String,
}

/// One-row table: class labels as header, probabilities as the row.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityTable {
    pub header: Vec<String>,
    pub values: Vec<f64>,
}

impl Prediction {
    pub fn result_line(&self) -> String {
        format!("Resultado: {}", self.label)
    }

    pub fn probability_table(&self) -> ProbabilityTable {
        ProbabilityTable {
            header: self.classes.clone(),
            values: self.probabilities.clone(),
        }
    }
}

/// Runs one request through the model.
pub fn predict_one(model: &dyn Classifier, request: &PredictionRequest) -> Result<Prediction, PredictError> {
    let rows = std::slice::from_ref(request);
    let proba = model.predict_proba(rows)?;
    let classes = model.classes().to_vec();
    if proba.ncols() != classes.len() {
        return Err(PredictError::Shape {
            expected: classes.len(),
            found: proba.ncols(),
        });
    }
    let probabilities = proba.rows().into_iter().next().ok_or(PredictError::Empty)?.to_vec();
    let label = model.predict(rows)?.into_iter().next().ok_or(PredictError::Empty)?;
    debug!(%label, ?probabilities, "prediction");
    Ok(Prediction {
        classes,
        probabilities,
        label,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array2, ArrayView1};

    /// Always answers with the same probabilities.
    struct StubModel {
        classes: Vec<String>,
        proba: Vec<f64>,
    }

    impl Classifier for StubModel {
        fn classes(&self) -> &[String] {
            &self.classes
        }

        fn predict_proba(&self, rows: &[PredictionRequest]) -> Result<Array2<f64>, PredictError> {
            let mut out = Array2::zeros((rows.len(), self.proba.len()));
            for mut row in out.rows_mut() {
                row.assign(&ArrayView1::from(self.proba.as_slice()));
            }
            Ok(out)
        }
    }

    fn stub() -> StubModel {
        StubModel {
            classes: vec!["Good".into(), "Bad".into()],
            proba: vec![0.7, 0.3],
        }
    }

    fn sample_form() -> PredictionForm {
        PredictionForm {
            response_time: "within an hour".into(),
            superhost: YesNo::Si,
            property_type: "Apartment".into(),
            capacity: 4,
            communication_score: 9,
            location_score: 8,
            cable_tv: YesNo::Si,
            air_conditioning: YesNo::Si,
        }
    }

    #[test]
    fn form_coerces_flags_in_schema_order() {
        let row = sample_form().to_request().to_row();
        let expected: Vec<Cell> = vec![
            "within an hour".into(),
            1u8.into(),
            "Apartment".into(),
            4u32.into(),
            9u32.into(),
            8u32.into(),
            1u8.into(),
            1u8.into(),
        ];
        assert_eq!(row, expected);

        let mut form = sample_form();
        form.cable_tv = YesNo::No;
        assert_eq!(form.to_request().cable_tv, 0);
    }

    #[test]
    fn stub_model_end_to_end() {
        let prediction = predict_one(&stub(), &sample_form().to_request()).unwrap();
        assert_eq!(prediction.label, "Good");
        assert_eq!(prediction.result_line(), "Resultado: Good");

        let table = prediction.probability_table();
        assert_eq!(table.header, vec!["Good", "Bad"]);
        assert_abs_diff_eq!(table.values[0], 0.7);
        assert_abs_diff_eq!(table.values[1], 0.3);
    }

    #[test]
    fn label_is_argmax_and_probabilities_sum_to_one() {
        let model = StubModel {
            classes: vec!["A".into(), "B".into(), "C".into()],
            proba: vec![0.1, 0.6, 0.3],
        };
        let prediction = predict_one(&model, &sample_form().to_request()).unwrap();
        assert_eq!(prediction.label, "B");
        assert_abs_diff_eq!(prediction.probabilities.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn probability_width_must_match_classes() {
        let model = StubModel {
            classes: vec!["Good".into()],
            proba: vec![0.7, 0.3],
        };
        assert!(matches!(
            predict_one(&model, &sample_form().to_request()),
            Err(PredictError::Shape { expected: 1, found: 2 })
        ));
    }

    #[test]
    fn default_form_uses_first_options() {
        let form = PredictionForm::new(&FormOptions::for_model(&stub()));
        assert_eq!(form.response_time, "within an hour");
        assert_eq!(form.property_type, "Apartment");
        assert_eq!(form.superhost, YesNo::Si);
        assert_eq!(form.capacity, 5);
        assert!(CAPACITY_RANGE.contains(&form.capacity));
        assert_eq!((form.communication_score, form.location_score), (5, 5));
    }
}
