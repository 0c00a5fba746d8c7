use crate::app::DashboardApp;
use crate::plots;

use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};
use listings::charts::{self, LinkedAirConditioning};
use listings::predict::{CAPACITY_RANGE, SCORE_RANGE};
use listings::{CountryChoice, FilterOutcome, Listing, ListingTable, ListingView, MapView, Prediction, YesNo, filter};
use serde_json::Value;
use std::fmt::Display;

const DESCRIPTION: &str = "Este dashboard muestra información sobre diferentes Airbnb en 10 ciudades.";

fn show_error(ui: &mut Ui, error: &dyn Display) {
    ui.colored_label(Color32::RED, error.to_string());
}

/// Draws the left panel with the capacity slider and the country select.
pub fn draw_side_panel(app: &mut DashboardApp, ctx: &egui::Context) {
    egui::SidePanel::left("filters_panel").show(ctx, |ui| {
        ui.heading("Filtros");
        ui.separator();

        let bounds = app.config.capacity;
        ui.label("Capacidad");
        ui.add(egui::Slider::new(&mut app.capacity_threshold, bounds.min..=bounds.max));
        ui.separator();

        // The select needs the table for its options.
        let table = match app.table() {
            Ok(table) => table,
            Err(e) => {
                show_error(ui, &e);
                return;
            }
        };
        let mut choice = app.country.clone();
        egui::ComboBox::from_label("Selecciona un pais")
            .selected_text(choice.label())
            .show_ui(ui, |ui| {
                for option in CountryChoice::options(&table) {
                    let text = option.label().to_string();
                    ui.selectable_value(&mut choice, option, text);
                }
            });
        app.set_country(choice);
    });
}

/// Draws every dashboard section in page order.
pub fn draw_central_panel(app: &mut DashboardApp, ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| {
        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.heading(RichText::new("Airbnb Demo").size(28.0));
            ui.label(DESCRIPTION);
            ui.add_space(8.0);

            let table = match app.table() {
                Ok(table) => table,
                Err(e) => {
                    show_error(ui, &e);
                    return;
                }
            };

            draw_data_preview(app, ui, &table);
            ui.separator();

            let filtered = filter::by_country(&table.view(), &app.country);
            ui.heading("Filtrar por país");
            match FilterOutcome::from(filtered.clone()) {
                FilterOutcome::Rows(view) => listing_table(ui, "filtered_table", &view),
                FilterOutcome::Empty { message } => {
                    ui.label(message);
                }
            }
            ui.separator();

            draw_map(app, ui, &filtered);
            ui.separator();
            draw_charts(app, ui, &filtered);
            ui.separator();
            draw_ml_zone(app, ui);
        });
    });
}

fn draw_data_preview(app: &DashboardApp, ui: &mut Ui, table: &ListingTable) {
    ui.label(RichText::new("Ver datos").strong());
    let view = filter::by_capacity(&table.view(), app.capacity_threshold);
    match FilterOutcome::from(view) {
        FilterOutcome::Rows(view) => listing_table(ui, "preview_table", &view),
        FilterOutcome::Empty { message } => {
            ui.label(message);
        }
    }
}

fn listing_table(ui: &mut Ui, id: &str, view: &ListingView<'_>) {
    ui.push_id(id, |ui| {
        let mut builder = TableBuilder::new(ui)
            .striped(true)
            .max_scroll_height(260.0)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center));
        for _ in Listing::HEADERS {
            builder = builder.column(Column::auto().resizable(true));
        }
        builder
            .header(20.0, |mut header| {
                for name in Listing::HEADERS {
                    header.col(|ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, view.len(), |mut row| {
                    let Some(listing) = view.rows().get(row.index()) else {
                        return;
                    };
                    for cell in listing.display_cells() {
                        row.col(|ui| {
                            ui.label(cell);
                        });
                    }
                });
            });
    });
}

fn draw_map(app: &DashboardApp, ui: &mut Ui, view: &ListingView<'_>) {
    ui.heading("Mapa de todos los Airbnb");
    let plan = MapView::plan(view, view.is_all_data(), &app.config.map);
    if plan == MapView::Empty {
        ui.label(listings::NO_DATA_MESSAGE);
        return;
    }
    plots::world_map(ui, &plan, &app.config.map, 500.0);
}

fn vega_lite_export(ui: &mut Ui, id: &str, document: &Value) {
    egui::CollapsingHeader::new("Vega-Lite")
        .id_salt(id)
        .default_open(false)
        .show(ui, |ui| match serde_json::to_string_pretty(document) {
            Ok(mut text) => {
                ui.add(
                    egui::TextEdit::multiline(&mut text)
                        .code_editor()
                        .desired_rows(8)
                        .interactive(false),
                );
            }
            Err(e) => show_error(ui, &e),
        });
}

fn draw_charts(app: &mut DashboardApp, ui: &mut Ui, view: &ListingView<'_>) {
    let response_times = charts::hosts_by_response_time(view);
    let superhosts = charts::listings_by_superhost(view);
    ui.columns(2, |cols| {
        cols[0].heading(response_times.title);
        plots::bar_chart(&mut cols[0], "response_time_bar", &response_times);
        vega_lite_export(&mut cols[0], "response_time_vl", &response_times.to_vega_lite());

        cols[1].heading(superhosts.title);
        plots::pie_chart(&mut cols[1], &superhosts, |_| 1.0);
        vega_lite_export(&mut cols[1], "superhost_vl", &superhosts.to_vega_lite());
    });
    ui.separator();

    let linked = LinkedAirConditioning::build(view, app.ac_selection);
    app.ac_selection = linked.selection;
    ui.heading(LinkedAirConditioning::TITLE);
    let mut clicked = None;
    ui.columns(2, |cols| {
        plots::bar_chart(&mut cols[0], "ac_property_bar", &linked.bar);
        clicked = plots::pie_chart(&mut cols[1], &linked.pie, |category| {
            YesNo::from_label(category).map_or(1.0, |label| linked.opacity(label))
        });
    });
    vega_lite_export(ui, "ac_linked_vl", &linked.to_vega_lite());

    if let Some(label) = clicked.and_then(|c| YesNo::from_label(&c).ok()) {
        app.ac_selection = charts::toggle_selection(app.ac_selection, label);
        tracing::debug!(selection = ?app.ac_selection, "air conditioning legend");
    }
}

fn select_text(ui: &mut Ui, label: &str, value: &mut String, options: &[String]) {
    egui::ComboBox::from_label(label)
        .selected_text(value.as_str())
        .show_ui(ui, |ui| {
            for option in options {
                ui.selectable_value(value, option.clone(), option);
            }
        });
}

fn select_yes_no(ui: &mut Ui, label: &str, value: &mut YesNo) {
    egui::ComboBox::from_label(label)
        .selected_text(value.label())
        .show_ui(ui, |ui| {
            for option in YesNo::OPTIONS {
                ui.selectable_value(value, option, option.label());
            }
        });
}

fn show_prediction(ui: &mut Ui, prediction: &Prediction) {
    ui.label(prediction.result_line());
    let table = prediction.probability_table();
    egui::Grid::new("probabilities").striped(true).show(ui, |ui| {
        for class in &table.header {
            ui.strong(class);
        }
        ui.end_row();
        for value in &table.values {
            ui.label(format!("{value:.4}"));
        }
        ui.end_row();
    });
}

fn draw_ml_zone(app: &mut DashboardApp, ui: &mut Ui) {
    let pipeline = match app.pipeline() {
        Ok(pipeline) => pipeline,
        Err(e) => {
            show_error(ui, &e);
            return;
        }
    };
    app.ensure_form(&*pipeline);

    ui.columns(2, |cols| {
        let predict = {
            let ui = &mut cols[0];
            ui.heading("Datos de entrada");
            if let (Some(form), Some(options)) = (app.form.as_mut(), app.form_options.as_ref()) {
                select_text(ui, "Tiempo de respuesta", &mut form.response_time, &options.response_times);
                select_yes_no(ui, "Es superhost", &mut form.superhost);
                select_text(ui, "Tipo Propiedad", &mut form.property_type, &options.property_types);
                ui.add(egui::Slider::new(&mut form.capacity, CAPACITY_RANGE).text("Capacidad"));
                ui.add(egui::Slider::new(&mut form.communication_score, SCORE_RANGE).text("Puntaje Comunicación"));
                ui.add(egui::Slider::new(&mut form.location_score, SCORE_RANGE).text("Puntaje Localización"));
                select_yes_no(ui, "Tiene TV Cable", &mut form.cable_tv);
                select_yes_no(ui, "Tiene Aire Acondicionado", &mut form.air_conditioning);
            }
            let width = ui.available_width();
            ui.add_sized([width, 28.0], egui::Button::new("Predecir")).clicked()
        };
        if predict {
            app.run_prediction();
        }

        let ui = &mut cols[1];
        ui.heading("Predicción");
        match app.current_prediction() {
            Some(Ok(prediction)) => show_prediction(ui, prediction),
            Some(Err(e)) => show_error(ui, e),
            None => {}
        }
    });
}
