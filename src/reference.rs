//! County coordinate lookup used by the geographic join.
//!
//! [`CountyGeo`] maps a county name to a single [`Coordinates`] pair. Names are
//! matched case-insensitively after trimming. The table ships with New York's 62
//! counties and can be replaced by a file:
//!
//! ```text
//! county,latitude,longitude
//! Albany,42.6511674,-73.754968
//! ```
//!
//! or a JSON object:
//!
//! ```json
//! { "Albany": { "latitude": 42.6511674, "longitude": -73.754968 } }
//! ```

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SurveyError};

const BUILTIN_COUNTIES: &str = include_str!("../data/ny_counties.csv");

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

#[derive(Debug, Deserialize)]
struct CountyRow {
    county: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CountyGeo {
    // lowercase name -> (display name, coordinates)
    entries: BTreeMap<String, (String, Coordinates)>,
}

impl CountyGeo {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bundled New York county table.
    pub fn builtin() -> Result<Self> {
        Self::from_csv_reader(BUILTIN_COUNTIES.as_bytes())
    }

    /// Loads the table from `path`: JSON when the extension is `.json`, CSV otherwise.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SurveyError::io(path, e))?;
        let geo = if path.extension().and_then(|e| e.to_str()) == Some("json") {
            Self::from_json_str(&content)?
        } else {
            Self::from_csv_reader(content.as_bytes())?
        };
        debug!(path = %path.display(), counties = geo.len(), "County coordinates loaded");
        Ok(geo)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = rdr.headers()?.clone();
        let mut geo = Self::new();

        for result in rdr.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let row: CountyRow =
                record
                    .deserialize(Some(&headers))
                    .map_err(|e| SurveyError::ReferenceData {
                        line,
                        message: e.to_string(),
                    })?;
            geo.insert_checked(
                &row.county,
                Coordinates {
                    latitude: row.latitude,
                    longitude: row.longitude,
                },
                line,
            )?;
        }
        Ok(geo)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: BTreeMap<String, Coordinates> = serde_json::from_str(content)?;
        let mut geo = Self::new();
        for (name, coords) in raw {
            geo.insert_checked(&name, coords, 0)?;
        }
        Ok(geo)
    }

    /// Adds or replaces a county.
    pub fn insert(&mut self, name: &str, coords: Coordinates) {
        let display = name.trim().to_string();
        self.entries.insert(display.to_lowercase(), (display, coords));
    }

    fn insert_checked(&mut self, name: &str, coords: Coordinates, line: u64) -> Result<()> {
        if name.trim().is_empty() {
            return Err(SurveyError::ReferenceData {
                line,
                message: "empty county name".to_string(),
            });
        }
        if !coords.is_valid() {
            return Err(SurveyError::ReferenceData {
                line,
                message: format!(
                    "coordinates out of range for {}: ({}, {})",
                    name, coords.latitude, coords.longitude
                ),
            });
        }
        self.insert(name, coords);
        Ok(())
    }

    /// The table's own spelling of `name` and its coordinates.
    pub fn get(&self, name: &str) -> Option<(&str, Coordinates)> {
        self.entries
            .get(&name.trim().to_lowercase())
            .map(|(display, coords)| (display.as_str(), *coords))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    #[test]
    fn test_builtin_has_all_new_york_counties() {
        let geo = CountyGeo::builtin().unwrap();
        assert_eq!(geo.len(), 62);
        let (name, albany) = geo.get("albany").unwrap();
        assert_eq!(name, "Albany");
        assert_eq!(albany.latitude, 42.6511674);
        assert_eq!(albany.longitude, -73.754968);
        assert!(geo.get("St. Lawrence").is_some());
        assert!(geo.get("New York").is_some());
    }

    #[test]
    fn test_lookup_ignores_case_and_padding() {
        let geo = CountyGeo::builtin().unwrap();
        assert_eq!(geo.get(" kings "), geo.get("Kings"));
        assert!(geo.get("Atlantis").is_none());
    }

    #[test]
    fn test_csv_rejects_out_of_range_coordinates() {
        let csv = "county,latitude,longitude\nNowhere,123.0,0.0\n";
        let result = CountyGeo::from_csv_reader(csv.as_bytes());
        assert!(matches!(
            result,
            Err(SurveyError::ReferenceData { line: 2, .. })
        ));
    }

    #[test]
    fn test_csv_rejects_non_numeric_latitude() {
        let csv = "county,latitude,longitude\nAlbany,north,-73.7\n";
        assert!(CountyGeo::from_csv_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_json_table() {
        let geo = CountyGeo::from_json_str(
            r#"{"Albany": {"latitude": 42.65, "longitude": -73.75}, "Erie": {"latitude": 42.9, "longitude": -78.8}}"#,
        )
        .unwrap();
        assert_eq!(geo.len(), 2);
        assert_eq!(geo.get("ERIE").map(|(name, _)| name), Some("Erie"));
    }

    #[test]
    fn test_load_from_file() {
        let path = env::temp_dir().join("survey_report_test_counties.csv");
        fs::write(&path, "county,latitude,longitude\nAlbany,42.65,-73.75\n").unwrap();

        let geo = CountyGeo::load(&path).unwrap();
        assert_eq!(geo.len(), 1);

        fs::remove_file(&path).unwrap();
    }
}
