//! Painters for the chart specs and the listings map.

use std::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{Align2, Color32, FontId, Mesh, Pos2, Rect, RichText, Sense, Shape, Stroke, Ui, Vec2, emath::RectTransform};
use ecolor::{Hsva, hex_color};
use egui_plot::{Bar, BarChart, Plot};
use listings::charts::{COUNT_FIELD, ChartSpec};
use listings::{GeoBounds, GeoPoint, MapSettings, MapView};

fn set2(index: usize) -> Color32 {
    let palette = [
        hex_color!("#66c2a5"),
        hex_color!("#fc8d62"),
        hex_color!("#8da0cb"),
        hex_color!("#e78ac3"),
        hex_color!("#a6d854"),
        hex_color!("#ffd92f"),
        hex_color!("#e5c494"),
        hex_color!("#b3b3b3"),
    ];
    palette[index % palette.len()]
}

/// A stable colour per category name.
pub fn category_color(category: &str) -> Color32 {
    let hash = category
        .bytes()
        .fold(0u32, |acc, byte| acc.wrapping_mul(31).wrapping_add(u32::from(byte)));
    let hue = (hash as f32 * 0.618_034).fract();
    Color32::from(Hsva { h: hue, s: 0.6, v: 0.85, a: 1.0 })
}

fn slice_color(spec: &ChartSpec, index: usize, category: &str) -> Color32 {
    match spec.color_scheme {
        Some("set2") => set2(index),
        _ => category_color(category),
    }
}

/// Horizontal bars, one per category, counts along x.
pub fn bar_chart(ui: &mut Ui, id: &str, spec: &ChartSpec) {
    if let Some(message) = spec.empty_message() {
        ui.label(message);
        return;
    }
    let labels: Vec<String> = spec.rows.iter().map(|r| r.category.clone()).collect();
    let bars: Vec<Bar> = spec
        .rows
        .iter()
        .enumerate()
        .map(|(i, r)| {
            Bar::new(i as f64, r.count as f64)
                .name(&r.category)
                .fill(category_color(&r.category))
        })
        .collect();

    Plot::new(id)
        .height(spec.height)
        .allow_zoom(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .x_axis_label(COUNT_FIELD)
        .y_axis_formatter(move |mark, _range| {
            let v = mark.value;
            if v < 0.0 || (v - v.round()).abs() > 1e-6 {
                return String::new();
            }
            labels.get(v.round() as usize).cloned().unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal());
        });
}

fn slice_mesh(center: Pos2, radius: f32, start: f32, sweep: f32, color: Color32) -> Mesh {
    let mut mesh = Mesh::default();
    let steps = ((sweep / TAU) * 96.0).ceil().max(1.0) as u32;
    mesh.colored_vertex(center, color);
    for s in 0..=steps {
        let angle = start + sweep * s as f32 / steps as f32;
        mesh.colored_vertex(center + radius * Vec2::angled(angle), color);
        if s > 0 {
            mesh.add_triangle(0, s, s + 1);
        }
    }
    mesh
}

/// Pie with a clickable legend. Returns the legend entry clicked this frame.
///
/// `opacity` is applied per category, so a caller can dim the slices outside
/// a selection.
pub fn pie_chart(ui: &mut Ui, spec: &ChartSpec, opacity: impl Fn(&str) -> f32) -> Option<String> {
    if let Some(message) = spec.empty_message() {
        ui.label(message);
        return None;
    }
    let total = spec.total();

    let mut clicked = None;
    ui.horizontal(|ui| {
        let side = spec.height.min(ui.available_width() * 0.6);
        let (response, painter) = ui.allocate_painter(Vec2::splat(side), Sense::hover());
        let center = response.rect.center();
        let radius = side * 0.45;

        let mut start = -FRAC_PI_2;
        for (i, row) in spec.rows.iter().enumerate() {
            let sweep = TAU * row.count as f32 / total as f32;
            let color = slice_color(spec, i, &row.category).gamma_multiply(opacity(&row.category));
            painter.add(Shape::mesh(slice_mesh(center, radius, start, sweep, color)));
            start += sweep;
        }

        ui.vertical(|ui| {
            if let Some(title) = spec.legend_title {
                ui.label(RichText::new(title).strong());
            }
            for (i, row) in spec.rows.iter().enumerate() {
                let alpha = opacity(&row.category);
                ui.horizontal(|ui| {
                    let (swatch, _) = ui.allocate_exact_size(Vec2::splat(12.0), Sense::hover());
                    ui.painter()
                        .rect_filled(swatch, 2.0, slice_color(spec, i, &row.category).gamma_multiply(alpha));
                    let text = format!("{} ({})", row.category, row.count);
                    if ui.selectable_label(false, text).clicked() {
                        clicked = Some(row.category.clone());
                    }
                });
            }
        });
    });
    clicked
}

/// Frame of the clustered world map: `zoom` around `center`, sized to the widget.
fn zoomed_frame(center: GeoPoint, zoom: u8, size: Vec2) -> GeoBounds {
    let degrees_per_px = 360.0 / (256.0 * 2f64.powi(i32::from(zoom)));
    let half_lon = f64::from(size.x) * degrees_per_px / 2.0;
    let half_lat = f64::from(size.y) * degrees_per_px / 2.0;
    GeoBounds {
        min: GeoPoint::new(center.lat - half_lat, center.lon - half_lon),
        max: GeoPoint::new(center.lat + half_lat, center.lon + half_lon),
    }
}

/// Grows the shorter side of `bounds` so it matches the widget's aspect ratio.
fn fit_aspect(bounds: GeoBounds, size: Vec2) -> GeoBounds {
    let lon_span = bounds.max.lon - bounds.min.lon;
    let lat_span = bounds.max.lat - bounds.min.lat;
    let aspect = f64::from(size.x / size.y);
    let (lon_span, lat_span) = if lon_span / lat_span < aspect {
        (lat_span * aspect, lat_span)
    } else {
        (lon_span, lon_span / aspect)
    };
    let mid_lat = (bounds.min.lat + bounds.max.lat) / 2.0;
    let mid_lon = (bounds.min.lon + bounds.max.lon) / 2.0;
    GeoBounds {
        min: GeoPoint::new(mid_lat - lat_span / 2.0, mid_lon - lon_span / 2.0),
        max: GeoPoint::new(mid_lat + lat_span / 2.0, mid_lon + lon_span / 2.0),
    }
}

fn to_pos(p: GeoPoint) -> Pos2 {
    Pos2::new(p.lon as f32, -p.lat as f32)
}

fn cluster_color(count: usize) -> Color32 {
    match count {
        0..10 => Color32::from_rgba_unmultiplied(110, 204, 57, 200),
        10..100 => Color32::from_rgba_unmultiplied(240, 194, 12, 200),
        _ => Color32::from_rgba_unmultiplied(241, 128, 23, 200),
    }
}

/// Equirectangular map: clustered bubbles or one dot per listing.
pub fn world_map(ui: &mut Ui, plan: &MapView, settings: &MapSettings, height: f32) {
    let size = Vec2::new(ui.available_width(), height);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let rect = response.rect;
    let painter = painter.with_clip_rect(rect);

    let frame = match plan {
        MapView::Empty => return,
        MapView::Clustered { center, zoom, .. } => zoomed_frame(*center, *zoom, size),
        MapView::Points { bounds, .. } => fit_aspect(bounds.padded(0.1, 0.5), size),
    };
    let data_rect = Rect::from_min_max(
        to_pos(GeoPoint::new(frame.max.lat, frame.min.lon)),
        to_pos(GeoPoint::new(frame.min.lat, frame.max.lon)),
    );
    let to_screen = RectTransform::from_to(data_rect, rect);

    painter.rect_filled(rect, 0.0, Color32::from_rgb(222, 236, 245));
    let grid = Stroke::new(0.5, Color32::from_gray(170));
    for lon in (-180..=180).step_by(30) {
        let top = to_screen * to_pos(GeoPoint::new(90.0, f64::from(lon)));
        let bottom = to_screen * to_pos(GeoPoint::new(-90.0, f64::from(lon)));
        painter.line_segment([top, bottom], grid);
    }
    for lat in (-90..=90).step_by(30) {
        let left = to_screen * to_pos(GeoPoint::new(f64::from(lat), -180.0));
        let right = to_screen * to_pos(GeoPoint::new(f64::from(lat), 180.0));
        painter.line_segment([left, right], grid);
    }

    match plan {
        MapView::Empty => {}
        MapView::Clustered { clusters, total, .. } => {
            for cluster in clusters {
                let at = to_screen * to_pos(cluster.position);
                let radius = 12.0 + 4.0 * (cluster.count as f32).ln();
                painter.circle_filled(at, radius, cluster_color(cluster.count));
                painter.circle_stroke(at, radius, Stroke::new(1.0, Color32::WHITE));
                painter.text(
                    at,
                    Align2::CENTER_CENTER,
                    cluster.count.to_string(),
                    FontId::proportional(12.0),
                    Color32::BLACK,
                );
            }
            painter.text(
                rect.left_bottom() + Vec2::new(6.0, -6.0),
                Align2::LEFT_BOTTOM,
                format!("{total} Airbnb, zoom {}", settings.zoom),
                FontId::proportional(11.0),
                Color32::DARK_GRAY,
            );
        }
        MapView::Points { points, .. } => {
            for point in points {
                let at = to_screen * to_pos(*point);
                painter.circle_filled(at, 4.0, Color32::from_rgb(255, 75, 75));
                painter.circle_stroke(at, 4.0, Stroke::new(1.0, Color32::WHITE));
            }
        }
    }
}
