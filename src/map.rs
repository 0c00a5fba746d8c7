//! Map planning: decides between the clustered world map and the plain
//! point map, and works out what each one needs to draw.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::table::ListingView;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min: GeoPoint,
    pub max: GeoPoint,
}

impl GeoBounds {
    fn around(points: &[GeoPoint]) -> Option<Self> {
        let first = *points.first()?;
        let mut bounds = GeoBounds { min: first, max: first };
        for p in &points[1..] {
            bounds.min.lat = bounds.min.lat.min(p.lat);
            bounds.min.lon = bounds.min.lon.min(p.lon);
            bounds.max.lat = bounds.max.lat.max(p.lat);
            bounds.max.lon = bounds.max.lon.max(p.lon);
        }
        Some(bounds)
    }

    /// Grows the box by `fraction` of its span on each side, at least `min_pad` degrees.
    pub fn padded(self, fraction: f64, min_pad: f64) -> Self {
        let pad_lat = ((self.max.lat - self.min.lat) * fraction).max(min_pad);
        let pad_lon = ((self.max.lon - self.min.lon) * fraction).max(min_pad);
        GeoBounds {
            min: GeoPoint::new((self.min.lat - pad_lat).max(-90.0), (self.min.lon - pad_lon).max(-180.0)),
            max: GeoPoint::new((self.max.lat + pad_lat).min(90.0), (self.max.lon + pad_lon).min(180.0)),
        }
    }

    pub fn contains(&self, p: GeoPoint) -> bool {
        (self.min.lat..=self.max.lat).contains(&p.lat) && (self.min.lon..=self.max.lon).contains(&p.lon)
    }
}

/// A group of nearby markers drawn as one bubble.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerCluster {
    pub position: GeoPoint,
    pub count: usize,
}

/// Map settings, see `MapConfig` in the dashboard configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    /// Zoom level of the clustered world map.
    pub zoom: u8,
    /// Clustering radius in screen pixels at that zoom.
    pub cluster_radius_px: f64,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            zoom: 2,
            cluster_radius_px: 80.0,
        }
    }
}

impl MapSettings {
    /// Grid cell size in degrees for the configured zoom (256 px world tile).
    pub fn cell_degrees(&self) -> f64 {
        self.cluster_radius_px * 360.0 / (256.0 * 2f64.powi(i32::from(self.zoom)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapView {
    /// Nothing to place on a map.
    Empty,
    /// Every country: clustered markers around the mean coordinate.
    Clustered {
        center: GeoPoint,
        zoom: u8,
        clusters: Vec<MarkerCluster>,
        total: usize,
    },
    /// A filtered subset: one marker per listing, framed by their bounds.
    Points { points: Vec<GeoPoint>, bounds: GeoBounds },
}

impl MapView {
    pub fn plan(view: &ListingView<'_>, is_all_data: bool, settings: &MapSettings) -> Self {
        let points: Vec<GeoPoint> = view.iter().map(|l| GeoPoint::new(l.latitude, l.longitude)).collect();
        let Some(bounds) = GeoBounds::around(&points) else {
            return MapView::Empty;
        };
        if is_all_data {
            let center = mean_center(&points);
            let clusters = grid_clusters(&points, settings.cell_degrees());
            debug!(points = points.len(), clusters = clusters.len(), "clustered map");
            MapView::Clustered {
                center,
                zoom: settings.zoom,
                clusters,
                total: points.len(),
            }
        } else {
            debug!(points = points.len(), "point map");
            MapView::Points { points, bounds }
        }
    }
}

/// Mean latitude and longitude. Callers guarantee `points` is not empty.
pub fn mean_center(points: &[GeoPoint]) -> GeoPoint {
    let n = points.len() as f64;
    let (lat, lon) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lon), p| (lat + p.lat, lon + p.lon));
    GeoPoint::new(lat / n, lon / n)
}

/// Buckets points into a `cell`-degree grid; each bucket becomes one
/// cluster at the mean of its members. Output is ordered by grid cell.
pub fn grid_clusters(points: &[GeoPoint], cell: f64) -> Vec<MarkerCluster> {
    let mut cells: BTreeMap<(i64, i64), Vec<GeoPoint>> = BTreeMap::new();
    for p in points {
        let key = ((p.lat / cell).floor() as i64, (p.lon / cell).floor() as i64);
        cells.entry(key).or_default().push(*p);
    }
    cells
        .into_values()
        .map(|members| MarkerCluster {
            position: mean_center(&members),
            count: members.len(),
        })
        .collect()
}
