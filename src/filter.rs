use std::fmt::{Display, Formatter};

use tracing::debug;

use crate::table::{ListingTable, ListingView};

/// Shown instead of a table when a filter leaves nothing.
pub const NO_DATA_MESSAGE: &str = "Te quedaste sin datos :c";

/// Label of the pass-through country option.
pub const ALL_COUNTRIES: &str = "Todos";

/// The country select-box value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CountryChoice {
    #[default]
    All,
    Named(String),
}

impl CountryChoice {
    /// "Todos" followed by each country of the table, first-seen order.
    pub fn options(table: &ListingTable) -> Vec<CountryChoice> {
        std::iter::once(CountryChoice::All)
            .chain(table.countries().into_iter().map(|c| CountryChoice::Named(c.to_string())))
            .collect()
    }

    pub fn label(&self) -> &str {
        match self {
            CountryChoice::All => ALL_COUNTRIES,
            CountryChoice::Named(country) => country,
        }
    }
}

impl Display for CountryChoice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Rows with `capacity >= min_capacity`.
pub fn by_capacity<'a>(view: &ListingView<'a>, min_capacity: u32) -> ListingView<'a> {
    let filtered = view.filter(|r| r.capacity >= min_capacity);
    debug!(min_capacity, rows = filtered.len(), "capacity filter");
    filtered
}

/// Rows of the chosen country; `CountryChoice::All` passes everything through.
pub fn by_country<'a>(view: &ListingView<'a>, choice: &CountryChoice) -> ListingView<'a> {
    match choice {
        CountryChoice::All => view.clone(),
        CountryChoice::Named(country) => {
            let filtered = view.filter(|r| &r.country == country);
            debug!(%country, rows = filtered.len(), "country filter");
            filtered
        }
    }
}

/// A filtered view, or the message to show when it came out empty.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome<'a> {
    Rows(ListingView<'a>),
    Empty { message: &'static str },
}

impl<'a> From<ListingView<'a>> for FilterOutcome<'a> {
    fn from(view: ListingView<'a>) -> Self {
        if view.is_empty() {
            FilterOutcome::Empty {
                message: NO_DATA_MESSAGE,
            }
        } else {
            FilterOutcome::Rows(view)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::tests::sample_table;

    #[test]
    fn capacity_is_inclusive_threshold() {
        let table = sample_table();
        let max = table.rows().iter().map(|r| r.capacity).max().unwrap();
        for t in 0..=17 {
            let view = by_capacity(&table.view(), t);
            let expected: Vec<_> = table.rows().iter().filter(|r| r.capacity >= t).collect();
            assert_eq!(view.rows(), expected.as_slice(), "threshold {t}");
            if t > max {
                assert!(view.is_empty());
            }
        }
    }

    #[test]
    fn all_countries_is_identity() {
        let table = sample_table();
        let view = by_country(&table.view(), &CountryChoice::All);
        assert_eq!(view, table.view());
        assert!(view.is_all_data());
    }

    #[test]
    fn named_country_keeps_only_exact_matches() {
        let table = sample_table();
        let view = by_country(&table.view(), &CountryChoice::Named("Spain".into()));
        assert_eq!(view.len(), 3);
        assert!(view.iter().all(|r| r.country == "Spain"));
        assert!(!view.is_all_data());

        let lower = by_country(&table.view(), &CountryChoice::Named("spain".into()));
        assert!(lower.is_empty());
    }

    #[test]
    fn filters_compose() {
        let table = sample_table();
        let spain = by_country(&table.view(), &CountryChoice::Named("Spain".into()));
        let big = by_capacity(&spain, 3);
        assert_eq!(big.len(), 1);
        assert_eq!(big.rows()[0].capacity, 4);
    }

    #[test]
    fn empty_view_becomes_no_data_message() {
        let table = sample_table();
        let absent = by_country(&table.view(), &CountryChoice::Named("Peru".into()));
        assert_eq!(
            FilterOutcome::from(absent),
            FilterOutcome::Empty {
                message: NO_DATA_MESSAGE
            }
        );
        let some = by_capacity(&table.view(), 2);
        assert!(matches!(FilterOutcome::from(some), FilterOutcome::Rows(v) if v.len() == 4));
    }

    #[test]
    fn options_start_with_all() {
        let labels: Vec<String> = CountryChoice::options(&sample_table())
            .iter()
            .map(|c| c.label().to_string())
            .collect();
        assert_eq!(labels, vec!["Todos", "Spain", "Mexico", "Brazil"]);
    }
}
