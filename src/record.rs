use listings_helpers::{FlagError, YesNo};
use serde::Deserialize;

/// Column names of the source CSV.
pub mod columns {
    pub const HOST: &str = "anfitrión/a";
    pub const COUNTRY: &str = "pais";
    pub const CAPACITY: &str = "capacidad";
    pub const LATITUDE: &str = "latitud";
    pub const LONGITUDE: &str = "longitud";
    pub const SUPERHOST: &str = "es_superhost";
    pub const AIR_CONDITIONING: &str = "servicio_aire_acondicionado";
    pub const CABLE_TV: &str = "servicio_tv_cable";
    pub const RESPONSE_TIME: &str = "tiempo_respuesta";
    pub const PROPERTY_TYPE: &str = "tipo_propiedad";
    pub const COMMUNICATION_SCORE: &str = "puntaje_promedio_comunicación";
    pub const LOCATION_SCORE: &str = "puntaje_promedio_localización";
}

/// A CSV row as it sits on disk, flags still raw.
#[derive(Debug, Deserialize)]
pub(crate) struct RawListing {
    #[serde(rename = "anfitrión/a")]
    host: String,
    #[serde(rename = "pais")]
    country: String,
    #[serde(rename = "capacidad")]
    capacity: u32,
    #[serde(rename = "latitud")]
    latitude: f64,
    #[serde(rename = "longitud")]
    longitude: f64,
    #[serde(rename = "es_superhost")]
    superhost: String,
    #[serde(rename = "servicio_aire_acondicionado")]
    air_conditioning: String,
    #[serde(rename = "servicio_tv_cable", default)]
    cable_tv: Option<f64>,
    #[serde(rename = "tiempo_respuesta", default)]
    response_time: Option<String>,
    #[serde(rename = "tipo_propiedad")]
    property_type: String,
    #[serde(rename = "puntaje_promedio_comunicación", default)]
    communication_score: Option<f64>,
    #[serde(rename = "puntaje_promedio_localización", default)]
    location_score: Option<f64>,
}

/// One listing after the load-time remap of the two flag columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub host: String,
    pub country: String,
    pub capacity: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub superhost: YesNo,
    pub air_conditioning: YesNo,
    pub cable_tv: Option<f64>,
    pub response_time: Option<String>,
    pub property_type: String,
    pub communication_score: Option<f64>,
    pub location_score: Option<f64>,
}

impl RawListing {
    /// Applies the flag remap; the error names the offending column.
    pub(crate) fn remap(self) -> Result<Listing, (&'static str, FlagError)> {
        let superhost = YesNo::from_raw(&self.superhost).map_err(|e| (columns::SUPERHOST, e))?;
        let air_conditioning =
            YesNo::from_raw(&self.air_conditioning).map_err(|e| (columns::AIR_CONDITIONING, e))?;
        Ok(Listing {
            host: self.host,
            country: self.country,
            capacity: self.capacity,
            latitude: self.latitude,
            longitude: self.longitude,
            superhost,
            air_conditioning,
            cable_tv: self.cable_tv,
            response_time: self.response_time.filter(|s| !s.is_empty()),
            property_type: self.property_type,
            communication_score: self.communication_score,
            location_score: self.location_score,
        })
    }
}

impl Listing {
    /// Cells for the table widget, in `Listing::HEADERS` order.
    pub fn display_cells(&self) -> [String; 11] {
        let opt = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
        [
            self.host.clone(),
            self.country.clone(),
            self.capacity.to_string(),
            self.property_type.clone(),
            self.response_time.clone().unwrap_or_default(),
            self.superhost.to_string(),
            self.air_conditioning.to_string(),
            opt(self.cable_tv),
            opt(self.communication_score),
            opt(self.location_score),
            format!("{:.4}, {:.4}", self.latitude, self.longitude),
        ]
    }

    pub const HEADERS: [&'static str; 11] = [
        columns::HOST,
        columns::COUNTRY,
        columns::CAPACITY,
        columns::PROPERTY_TYPE,
        columns::RESPONSE_TIME,
        columns::SUPERHOST,
        columns::AIR_CONDITIONING,
        columns::CABLE_TV,
        columns::COMMUNICATION_SCORE,
        columns::LOCATION_SCORE,
        "latitud, longitud",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::tests::sample_table;

    #[test]
    fn table_cells_cover_every_column() {
        let table = sample_table();
        let cells = table.rows()[1].display_cells();
        assert_eq!(cells.len(), Listing::HEADERS.len());
        let cable = Listing::HEADERS.iter().position(|h| *h == columns::CABLE_TV).unwrap();
        assert_eq!(cells[cable], "0");
        assert_eq!(cells[0], "Ana");
        assert_eq!(cells[6], "Si");

        // Empty optional cells stay blank.
        let marta = table.rows()[3].display_cells();
        let score = Listing::HEADERS.iter().position(|h| *h == columns::COMMUNICATION_SCORE).unwrap();
        assert_eq!(marta[score], "");
        assert_eq!(marta[cable], "1");
    }
}
