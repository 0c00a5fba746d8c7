//! Airbnb listings dashboard core: loading, filtering, chart and map
//! planning, and the prediction widget's model plumbing. The `app` crate
//! draws all of it with egui.

pub mod charts;
pub mod config;
pub mod filter;
pub mod loader;
pub mod map;
pub mod model;
pub mod predict;
pub mod record;
pub mod table;

pub use config::{ConfigError, DashboardConfig, SliderConfig};
pub use filter::{ALL_COUNTRIES, CountryChoice, FilterOutcome, NO_DATA_MESSAGE};
pub use loader::{DatasetCache, LoadError, load_listings};
pub use map::{GeoBounds, GeoPoint, MapSettings, MapView, MarkerCluster};
pub use model::{Classifier, ModelCache, ModelError, load_pipeline};
pub use predict::{FormOptions, PredictError, Prediction, PredictionForm, PredictionRequest, predict_one};
pub use record::Listing;
pub use table::{ListingTable, ListingView};

pub use listings_helpers::YesNo;
pub use pipeline::Pipeline;
