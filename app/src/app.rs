use crate::ui;

use eframe::egui;
use eframe::{App, Frame};
use listings::{
    Classifier, CountryChoice, DashboardConfig, DatasetCache, FormOptions, ListingTable, LoadError, ModelCache,
    ModelError, Pipeline, Prediction, PredictionForm, PredictionRequest, YesNo, predict_one,
};
use std::sync::Arc;
use tracing::{info, warn};

/// The dashboard's state between frames.
/// Loaded resources sit in the caches; everything else is widget state.
pub struct DashboardApp {
    pub config: DashboardConfig,
    /// Tables loaded so far, keyed by path.
    pub datasets: DatasetCache,
    /// The prediction pipeline, loaded on first use.
    pub models: ModelCache,

    // --- Filter state ---
    pub capacity_threshold: u32,
    pub country: CountryChoice,
    /// Legend entry picked in the air-conditioning pie.
    pub ac_selection: Option<YesNo>,

    // --- Prediction widget state ---
    pub form_options: Option<FormOptions>,
    pub form: Option<PredictionForm>,
    /// Outcome of the last "Predecir" and the request it answered.
    pub last_prediction: Option<(PredictionRequest, Result<Prediction, String>)>,
}

impl DashboardApp {
    pub fn new(config: DashboardConfig) -> Self {
        let models = ModelCache::new(config.model_path.clone());
        Self {
            capacity_threshold: config.capacity.default,
            config,
            datasets: DatasetCache::new(),
            models,
            country: CountryChoice::All,
            ac_selection: None,
            form_options: None,
            form: None,
            last_prediction: None,
        }
    }

    pub fn table(&mut self) -> Result<Arc<ListingTable>, LoadError> {
        self.datasets.get(&self.config.data_path)
    }

    pub fn pipeline(&self) -> Result<Arc<Pipeline>, ModelError> {
        self.models.get()
    }

    /// Builds the form the first time a model is available, using the model's own categories.
    pub fn ensure_form(&mut self, model: &dyn Classifier) {
        if self.form.is_none() {
            let options = FormOptions::for_model(model);
            self.form = Some(PredictionForm::new(&options));
            self.form_options = Some(options);
        }
    }

    pub fn set_country(&mut self, choice: CountryChoice) {
        if choice != self.country {
            info!(country = %choice, "country filter changed");
            self.country = choice;
            self.ac_selection = None;
        }
    }

    /// Runs the current form through the pipeline and keeps the outcome for display.
    pub fn run_prediction(&mut self) {
        let Some(form) = &self.form else {
            warn!("prediction requested before the form exists");
            return;
        };
        let request = form.to_request();
        let outcome = self
            .pipeline()
            .map_err(|e| e.to_string())
            .and_then(|pipeline| predict_one(&*pipeline, &request).map_err(|e| e.to_string()));
        match &outcome {
            Ok(prediction) => info!(label = %prediction.label, "prediction done"),
            Err(e) => warn!(error = %e, "prediction failed"),
        }
        self.last_prediction = Some((request, outcome));
    }

    /// The last outcome, as long as the form still holds the inputs it was computed from.
    pub fn current_prediction(&self) -> Option<&Result<Prediction, String>> {
        let (request, outcome) = self.last_prediction.as_ref()?;
        let form = self.form.as_ref()?;
        (form.to_request() == *request).then_some(outcome)
    }
}

impl App for DashboardApp {
    /// Redraws every section top to bottom, like a script re-run.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        ui::draw_side_panel(self, ctx);
        ui::draw_central_panel(self, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn asset(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../assets").join(name)
    }

    fn demo_app() -> DashboardApp {
        DashboardApp::new(DashboardConfig {
            data_path: asset("Airbnb_Locations.csv"),
            model_path: asset("pipeline_model.json"),
            ..DashboardConfig::default()
        })
    }

    #[test]
    fn demo_assets_load() {
        let mut app = demo_app();
        let table = app.table().unwrap();
        assert!(!table.is_empty());
        let again = app.table().unwrap();
        assert!(Arc::ptr_eq(&table, &again));
        assert_eq!(app.capacity_threshold, 2);
    }

    #[test]
    fn prediction_round_trip_with_demo_pipeline() {
        let mut app = demo_app();
        let pipeline = app.pipeline().unwrap();
        app.ensure_form(&*pipeline);
        app.run_prediction();
        let prediction = app.current_prediction().cloned().unwrap().unwrap();
        assert_eq!(prediction.classes, pipeline.classes());
        assert!(prediction.classes.contains(&prediction.label));
        let total: f64 = prediction.probabilities.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn missing_model_is_reported_not_panicked() {
        let mut app = DashboardApp::new(DashboardConfig {
            model_path: PathBuf::from("/no/such/pipeline_model.json"),
            ..DashboardConfig::default()
        });
        app.form = Some(PredictionForm::new(&FormOptions::default()));
        app.run_prediction();
        assert!(matches!(app.current_prediction(), Some(Err(_))));
    }

    #[test]
    fn editing_the_form_hides_the_old_result() {
        let mut app = demo_app();
        let pipeline = app.pipeline().unwrap();
        app.ensure_form(&*pipeline);
        app.run_prediction();
        assert!(matches!(app.current_prediction(), Some(Ok(_))));

        let form = app.form.as_mut().unwrap();
        form.capacity = 16;
        form.communication_score = 0;
        assert!(app.current_prediction().is_none());

        app.run_prediction();
        let fresh = app.current_prediction().cloned().unwrap().unwrap();
        let expected = predict_one(&*pipeline, &app.form.as_ref().unwrap().to_request()).unwrap();
        assert_eq!(fresh, expected);
    }

    #[test]
    fn changing_country_clears_legend_selection() {
        let mut app = demo_app();
        app.ac_selection = Some(YesNo::No);
        app.set_country(CountryChoice::Named("Mexico".into()));
        assert_eq!(app.ac_selection, None);

        app.ac_selection = Some(YesNo::Si);
        app.set_country(CountryChoice::Named("Mexico".into()));
        assert_eq!(app.ac_selection, Some(YesNo::Si));
    }

    #[test]
    fn form_is_built_once() {
        let mut app = demo_app();
        let pipeline = app.pipeline().unwrap();
        app.ensure_form(&*pipeline);
        app.form.as_mut().unwrap().capacity = 9;
        app.ensure_form(&*pipeline);
        assert_eq!(app.form.as_ref().unwrap().capacity, 9);
    }
}
