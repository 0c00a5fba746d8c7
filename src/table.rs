use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::record::Listing;

/// The loaded dataset. Never mutated after load.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingTable {
    source: PathBuf,
    rows: Vec<Listing>,
}

impl ListingTable {
    pub fn new(source: impl Into<PathBuf>, rows: Vec<Listing>) -> Self {
        Self {
            source: source.into(),
            rows,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn rows(&self) -> &[Listing] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A view over every row, in file order.
    pub fn view(&self) -> ListingView<'_> {
        ListingView {
            rows: self.rows.iter().collect(),
            table_len: self.rows.len(),
        }
    }

    /// Distinct countries in order of first appearance.
    pub fn countries(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .map(|r| r.country.as_str())
            .filter(|c| seen.insert(*c))
            .collect()
    }
}

/// A read-only subset of a [`ListingTable`], source order preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingView<'a> {
    rows: Vec<&'a Listing>,
    table_len: usize,
}

impl<'a> ListingView<'a> {
    pub fn rows(&self) -> &[&'a Listing] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Listing> + '_ {
        self.rows.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True when the view still holds as many rows as the whole table.
    pub fn is_all_data(&self) -> bool {
        self.rows.len() == self.table_len
    }

    /// Keeps the rows matching `predicate` in a new view.
    pub fn filter(&self, predicate: impl Fn(&Listing) -> bool) -> ListingView<'a> {
        ListingView {
            rows: self.rows.iter().copied().filter(|r| predicate(r)).collect(),
            table_len: self.table_len,
        }
    }
}
