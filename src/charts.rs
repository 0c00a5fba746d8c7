//! Chart builders. Each one groups and counts a view and returns a
//! declarative [`ChartSpec`]; drawing is left to the UI, and every spec can
//! also be exported as a Vega-Lite document.

use std::collections::{BTreeMap, HashSet};

use listings_helpers::YesNo;
use serde::Serialize;
use serde_json::{Value, json};

use crate::filter::NO_DATA_MESSAGE;
use crate::record::{Listing, columns};
use crate::table::ListingView;

/// Counts per category are shown under this field name.
pub const COUNT_FIELD: &str = "Cantidad";

/// Opacity of pie slices outside the active legend selection.
pub const DIMMED_OPACITY: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Bar,
    Arc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: &'static str,
    pub mark: Mark,
    pub category_field: &'static str,
    pub rows: Vec<CategoryCount>,
    pub color_scheme: Option<&'static str>,
    pub legend_title: Option<&'static str>,
    pub height: f32,
}

impl ChartSpec {
    fn new(title: &'static str, mark: Mark, category_field: &'static str, rows: Vec<CategoryCount>) -> Self {
        Self {
            title,
            mark,
            category_field,
            rows,
            color_scheme: None,
            legend_title: None,
            height: 300.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// What to show instead of the chart when there is nothing to draw.
    pub fn empty_message(&self) -> Option<&'static str> {
        (self.total() == 0).then_some(NO_DATA_MESSAGE)
    }

    pub fn total(&self) -> usize {
        self.rows.iter().map(|r| r.count).sum()
    }

    fn data_values(&self) -> Value {
        Value::Array(
            self.rows
                .iter()
                .map(|r| json!({ (self.category_field): r.category, (COUNT_FIELD): r.count }))
                .collect(),
        )
    }

    fn encoding(&self) -> Value {
        let category = format!("{}:N", self.category_field);
        match self.mark {
            Mark::Bar => json!({
                "x": { "field": COUNT_FIELD, "type": "quantitative" },
                "y": { "field": self.category_field, "type": "nominal", "axis": { "labelLimit": 200 } },
            }),
            Mark::Arc => {
                let mut color = json!({ "field": self.category_field, "type": "nominal" });
                if let Some(scheme) = self.color_scheme {
                    color["scale"] = json!({ "scheme": scheme });
                }
                if let Some(title) = self.legend_title {
                    color["legend"] = json!({ "title": title });
                }
                json!({
                    "theta": { "field": COUNT_FIELD, "type": "quantitative" },
                    "color": color,
                    "tooltip": [category, COUNT_FIELD],
                })
            }
        }
    }

    /// The chart as a standalone Vega-Lite v5 document.
    pub fn to_vega_lite(&self) -> Value {
        json!({
            "$schema": "https://vega.github.io/schema/vega-lite/v5.json",
            "title": self.title,
            "height": self.height,
            "data": { "values": self.data_values() },
            "mark": self.mark,
            "encoding": self.encoding(),
        })
    }
}

fn into_rows<K: ToString>(counts: BTreeMap<K, usize>) -> Vec<CategoryCount> {
    counts
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect()
}

/// Distinct hosts per response-time bucket; rows without a bucket are skipped.
pub fn hosts_by_response_time(view: &ListingView<'_>) -> ChartSpec {
    let mut hosts: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
    for listing in view.iter() {
        if let Some(bucket) = listing.response_time.as_deref() {
            hosts.entry(bucket).or_default().insert(listing.host.as_str());
        }
    }
    let counts = hosts.into_iter().map(|(k, v)| (k, v.len())).collect();
    ChartSpec::new(
        "Anfitriones por tiempo de respuesta",
        Mark::Bar,
        columns::RESPONSE_TIME,
        into_rows(counts),
    )
}

fn count_labels(view: &ListingView<'_>, label: impl Fn(&Listing) -> YesNo) -> BTreeMap<YesNo, usize> {
    let mut counts = BTreeMap::new();
    for listing in view.iter() {
        *counts.entry(label(listing)).or_insert(0) += 1;
    }
    counts
}

/// Listings per superhost label.
pub fn listings_by_superhost(view: &ListingView<'_>) -> ChartSpec {
    let counts = count_labels(view, |l| l.superhost);
    let mut spec = ChartSpec::new("Airbnb por superhost", Mark::Arc, columns::SUPERHOST, into_rows(counts));
    spec.color_scheme = Some("set2");
    spec
}

/// New legend selection after clicking `clicked`; clicking the active entry clears it.
pub fn toggle_selection(current: Option<YesNo>, clicked: YesNo) -> Option<YesNo> {
    if current == Some(clicked) { None } else { Some(clicked) }
}

/// Air-conditioning pie linked to a property-type bar through a legend selection.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedAirConditioning {
    pub pie: ChartSpec,
    pub bar: ChartSpec,
    pub selection: Option<YesNo>,
    /// Counts per (property type, air-conditioning label), unfiltered, for export.
    by_type_and_label: Vec<(String, YesNo, usize)>,
}

impl LinkedAirConditioning {
    pub const TITLE: &'static str = "Propiedad y servicio de aire acondicionado";

    pub fn build(view: &ListingView<'_>, selection: Option<YesNo>) -> Self {
        let ac_counts = count_labels(view, |l| l.air_conditioning);
        // A label with no slice has no legend entry to clear it from.
        let selection = selection.filter(|s| ac_counts.contains_key(s));
        let mut pie = ChartSpec::new(Self::TITLE, Mark::Arc, columns::AIR_CONDITIONING, into_rows(ac_counts));
        pie.color_scheme = Some("set2");
        pie.legend_title = Some("Aire");

        let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
        let mut by_type_and_label: BTreeMap<(&str, YesNo), usize> = BTreeMap::new();
        for listing in view.iter() {
            let property_type = listing.property_type.as_str();
            *by_type_and_label
                .entry((property_type, listing.air_conditioning))
                .or_insert(0) += 1;
            if selection.is_none_or(|s| listing.air_conditioning == s) {
                *by_type.entry(property_type).or_insert(0) += 1;
            }
        }
        let bar = ChartSpec::new(Self::TITLE, Mark::Bar, columns::PROPERTY_TYPE, into_rows(by_type));
        let by_type_and_label = by_type_and_label
            .into_iter()
            .map(|((t, l), n)| (t.to_string(), l, n))
            .collect();

        Self {
            pie,
            bar,
            selection,
            by_type_and_label,
        }
    }

    /// Opacity of a pie slice given the current selection.
    pub fn opacity(&self, label: YesNo) -> f32 {
        match self.selection {
            Some(selected) if selected != label => DIMMED_OPACITY,
            _ => 1.0,
        }
    }

    /// Bar and pie side by side, the legend selection filtering the bar.
    pub fn to_vega_lite(&self) -> Value {
        let param = "aire";
        let mut pie = self.pie.to_vega_lite();
        let mut bar = self.bar.to_vega_lite();
        for chart in [&mut pie, &mut bar] {
            if let Some(obj) = chart.as_object_mut() {
                obj.remove("$schema");
                obj.remove("title");
            }
        }
        pie["params"] = json!([{
            "name": param,
            "select": { "type": "point", "fields": [columns::AIR_CONDITIONING] },
            "bind": "legend",
        }]);
        pie["encoding"]["opacity"] = json!({
            "condition": { "param": param, "value": 1 },
            "value": DIMMED_OPACITY,
        });
        pie["width"] = json!(200);
        bar["width"] = json!(200);
        // The bar gets counts split by label; the selection does the filtering.
        let values: Vec<Value> = self
            .by_type_and_label
            .iter()
            .map(|(property_type, label, count)| {
                json!({
                    (columns::PROPERTY_TYPE): property_type,
                    (columns::AIR_CONDITIONING): label.label(),
                    (COUNT_FIELD): count,
                })
            })
            .collect();
        bar["data"] = json!({ "values": values });
        bar["encoding"]["x"] = json!({ "aggregate": "sum", "field": COUNT_FIELD, "type": "quantitative" });
        bar["transform"] = json!([{ "filter": { "param": param } }]);

        json!({
            "$schema": "https://vega.github.io/schema/vega-lite/v5.json",
            "title": Self::TITLE,
            "hconcat": [bar, pie],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::tests::sample_table;

    fn rows(spec: &ChartSpec) -> Vec<(&str, usize)> {
        spec.rows.iter().map(|r| (r.category.as_str(), r.count)).collect()
    }

    #[test]
    fn distinct_hosts_per_bucket() {
        let table = sample_table();
        let spec = hosts_by_response_time(&table.view());
        // Ana has two listings in "within an hour" but counts once; Marta has no bucket.
        assert_eq!(
            rows(&spec),
            vec![("within a day", 1), ("within a few hours", 1), ("within an hour", 1)]
        );
        assert_eq!(spec.mark, Mark::Bar);
    }

    #[test]
    fn superhost_pie_counts_listings() {
        let table = sample_table();
        let spec = listings_by_superhost(&table.view());
        assert_eq!(rows(&spec), vec![("No", 2), ("Si", 3)]);
        assert_eq!(spec.total(), table.len());
        let vl = spec.to_vega_lite();
        assert_eq!(vl["mark"], "arc");
        assert_eq!(vl["encoding"]["color"]["scale"]["scheme"], "set2");
        assert_eq!(vl["data"]["values"][1]["es_superhost"], "Si");
        assert_eq!(vl["data"]["values"][1]["Cantidad"], 3);
    }

    #[test]
    fn linked_view_without_selection_shows_every_type() {
        let table = sample_table();
        let linked = LinkedAirConditioning::build(&table.view(), None);
        assert_eq!(rows(&linked.pie), vec![("No", 2), ("Si", 3)]);
        assert_eq!(rows(&linked.bar), vec![("Apartment", 2), ("House", 2), ("Loft", 1)]);
        assert_eq!(linked.opacity(YesNo::No), 1.0);
    }

    #[test]
    fn legend_selection_filters_bar_only() {
        let table = sample_table();
        let linked = LinkedAirConditioning::build(&table.view(), Some(YesNo::No));
        assert_eq!(rows(&linked.pie), vec![("No", 2), ("Si", 3)]);
        assert_eq!(rows(&linked.bar), vec![("Apartment", 1), ("Loft", 1)]);
        assert_eq!(linked.opacity(YesNo::Si), DIMMED_OPACITY);
        assert_eq!(linked.opacity(YesNo::No), 1.0);
    }

    #[test]
    fn selection_without_a_slice_is_dropped() {
        let table = sample_table();
        let mexico = table.view().filter(|l| l.country == "Mexico");
        let linked = LinkedAirConditioning::build(&mexico, Some(YesNo::No));
        assert_eq!(rows(&linked.pie), vec![("Si", 1)]);
        assert_eq!(linked.selection, None);
        assert_eq!(rows(&linked.bar), vec![("House", 1)]);
        assert_eq!(linked.opacity(YesNo::Si), 1.0);
    }

    #[test]
    fn empty_view_gives_no_data_message() {
        let table = sample_table();
        let nobody = table.view().filter(|_| false);
        let linked = LinkedAirConditioning::build(&nobody, Some(YesNo::Si));
        assert!(linked.bar.is_empty());
        assert_eq!(linked.bar.empty_message(), Some(NO_DATA_MESSAGE));
        assert_eq!(hosts_by_response_time(&nobody).empty_message(), Some(NO_DATA_MESSAGE));
        assert_eq!(listings_by_superhost(&table.view()).empty_message(), None);
    }

    #[test]
    fn clicking_the_active_entry_clears_selection() {
        assert_eq!(toggle_selection(None, YesNo::Si), Some(YesNo::Si));
        assert_eq!(toggle_selection(Some(YesNo::Si), YesNo::No), Some(YesNo::No));
        assert_eq!(toggle_selection(Some(YesNo::Si), YesNo::Si), None);
    }

    #[test]
    fn linked_export_binds_selection_to_legend() {
        let table = sample_table();
        let vl = LinkedAirConditioning::build(&table.view(), None).to_vega_lite();
        let pie = &vl["hconcat"][1];
        assert_eq!(pie["params"][0]["bind"], "legend");
        assert_eq!(pie["encoding"]["color"]["legend"]["title"], "Aire");
        let bar = &vl["hconcat"][0];
        assert_eq!(bar["transform"][0]["filter"]["param"], "aire");
        assert_eq!(bar["data"]["values"].as_array().unwrap().len(), 4);
    }
}
