use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

use crate::errors::ApiError;

// National holidays offered no slots by default
const DEFAULT_HOLIDAYS: [&str; 9] = [
    "2025-01-01",
    "2025-02-12",
    "2025-03-24",
    "2025-04-18",
    "2025-05-01",
    "2025-05-25",
    "2025-06-20",
    "2025-07-09",
    "2025-12-25",
];

#[derive(Debug, Deserialize)]
struct HolidayRecord {
    fecha: String,
    #[serde(default)]
    nombre: Option<String>,
}

/// Calendar dates on which no slot is ever offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolidaySet {
    dates: BTreeSet<NaiveDate>,
}

impl HolidaySet {
    pub fn empty() -> Self {
        Self {
            dates: BTreeSet::new(),
        }
    }

    pub fn from_dates<I: IntoIterator<Item = NaiveDate>>(dates: I) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    /// Load holidays from a CSV file with a `fecha,nombre` header.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, ApiError> {
        let path = path.as_ref();
        info!("Loading holidays from {}", path.display());

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| ApiError::Validation(format!("cannot read {}: {}", path.display(), e)))?;

        let mut dates = BTreeSet::new();
        for row in reader.deserialize::<HolidayRecord>() {
            let record = row.map_err(|e| ApiError::Validation(format!("bad holiday row: {}", e)))?;
            let date = NaiveDate::parse_from_str(&record.fecha, "%Y-%m-%d").map_err(|_| {
                ApiError::Validation(format!("bad holiday date: {}", record.fecha))
            })?;
            debug!(
                "Holiday {} ({})",
                date,
                record.nombre.as_deref().unwrap_or("sin nombre")
            );
            dates.insert(date);
        }

        info!("Loaded {} holidays", dates.len());
        Ok(Self { dates })
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.dates.contains(date)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

impl Default for HolidaySet {
    fn default() -> Self {
        Self::from_dates(
            DEFAULT_HOLIDAYS
                .iter()
                .filter_map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
        )
    }
}
