use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use csv::ReaderBuilder;
use listings_helpers::FlagError;
use thiserror::Error;
use tracing::{debug, info};

use crate::record::RawListing;
use crate::table::ListingTable;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to open data file '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed data file '{}': {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("'{}' row {row}, column '{column}': {source}", path.display())]
    Flag {
        path: PathBuf,
        row: usize,
        column: &'static str,
        #[source]
        source: FlagError,
    },
}

/// Reads the listings CSV and remaps the superhost and air-conditioning flags.
///
/// # Errors
///
/// A missing file, a row that does not fit the expected columns, or a flag
/// that is not 0/1 all fail the load; there is no partial table.
pub fn load_listings(path: impl AsRef<Path>) -> Result<ListingTable, LoadError> {
    let path = path.as_ref();
    info!(path = %path.display(), "Cargando datos");

    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize::<RawListing>().enumerate() {
        let raw = record.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let listing = raw.remap().map_err(|(column, source)| LoadError::Flag {
            path: path.to_path_buf(),
            row: idx + 1,
            column,
            source,
        })?;
        rows.push(listing);
    }

    info!(path = %path.display(), rows = rows.len(), "data loaded");
    Ok(ListingTable::new(path, rows))
}

/// Loaded tables keyed by path, so repeated requests skip the file system.
#[derive(Debug, Default)]
pub struct DatasetCache {
    tables: HashMap<PathBuf, Arc<ListingTable>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached table for `path`, loading it on first use.
    ///
    /// Failed loads are not cached; the next call tries again.
    pub fn get(&mut self, path: impl AsRef<Path>) -> Result<Arc<ListingTable>, LoadError> {
        let path = path.as_ref();
        if let Some(table) = self.tables.get(path) {
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(load_listings(path)?);
        self.tables.insert(path.to_path_buf(), Arc::clone(&table));
        debug!(cached = self.tables.len(), "dataset cache updated");
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use listings_helpers::YesNo;
    use std::io::Write;
    use tempfile::NamedTempFile;

    pub(crate) const HEADER: &str = "anfitrión/a,pais,capacidad,latitud,longitud,es_superhost,servicio_aire_acondicionado,servicio_tv_cable,tiempo_respuesta,tipo_propiedad,puntaje_promedio_comunicación,puntaje_promedio_localización";

    pub(crate) const SAMPLE: &str = "\
Ana,Spain,4,41.38,2.17,1,0,1,within an hour,Apartment,10,9
Ana,Spain,2,41.40,2.15,1,1,0,within an hour,Apartment,9,9
Luis,Mexico,6,19.43,-99.13,0,1,0,within a day,House,8,10
Marta,Spain,1,40.41,-3.70,0,0,1,,Loft,,
Joao,Brazil,8,-22.90,-43.17,1,1,1,within a few hours,House,10,8
";

    pub(crate) fn write_csv(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    pub(crate) fn sample_table() -> ListingTable {
        let file = write_csv(SAMPLE);
        load_listings(file.path()).unwrap()
    }

    #[test]
    fn loads_and_remaps_flags() {
        let table = sample_table();
        assert_eq!(table.len(), 5);
        let first = &table.rows()[0];
        assert_eq!(first.host, "Ana");
        assert_eq!(first.superhost, YesNo::Si);
        assert_eq!(first.air_conditioning, YesNo::No);
        assert_eq!(first.response_time.as_deref(), Some("within an hour"));

        let marta = &table.rows()[3];
        assert_eq!(marta.response_time, None);
        assert_eq!(marta.communication_score, None);
    }

    #[test]
    fn flag_round_trip_restores_raw_column() {
        let table = sample_table();
        let restored: Vec<u8> = table.rows().iter().map(|r| r.superhost.to_flag()).collect();
        assert_eq!(restored, vec![1, 1, 0, 0, 1]);
    }

    #[test]
    fn countries_in_first_seen_order() {
        assert_eq!(sample_table().countries(), vec!["Spain", "Mexico", "Brazil"]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = load_listings("/no/such/Airbnb_Locations.csv");
        assert!(matches!(result, Err(LoadError::Open { .. })));
    }

    #[test]
    fn bad_flag_names_row_and_column() {
        let file = write_csv("Ana,Spain,4,41.38,2.17,1,0,1,within an hour,Apartment,10,9\nBo,Spain,2,41.0,2.0,1,,0,within a day,Loft,9,9\n");
        match load_listings(file.path()) {
            Err(LoadError::Flag { row, column, source, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(column, "servicio_aire_acondicionado");
                assert_eq!(source, FlagError::Missing);
            }
            other => panic!("expected flag error, got {other:?}"),
        }

        let file = write_csv("Ana,Spain,4,41.38,2.17,2,0,1,within an hour,Apartment,10,9\n");
        assert!(matches!(
            load_listings(file.path()),
            Err(LoadError::Flag { column: "es_superhost", .. })
        ));
    }

    #[test]
    fn malformed_row_is_an_error() {
        let file = write_csv("Ana,Spain,lots,41.38,2.17,1,0,1,within an hour,Apartment,10,9\n");
        assert!(matches!(load_listings(file.path()), Err(LoadError::Csv { .. })));
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "pais,capacidad").unwrap();
        writeln!(file, "Spain,4").unwrap();
        assert!(matches!(load_listings(file.path()), Err(LoadError::Csv { .. })));
    }

    #[test]
    fn cache_returns_same_table_without_rereading() {
        let file = write_csv(SAMPLE);
        let path = file.path().to_path_buf();
        let mut cache = DatasetCache::new();
        let first = cache.get(&path).unwrap();

        // Gone from disk, still served from the cache.
        drop(file);
        let second = cache.get(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cache_does_not_keep_failures() {
        let mut cache = DatasetCache::new();
        assert!(cache.get("/no/such/file.csv").is_err());
        assert!(cache.is_empty());
    }
}
