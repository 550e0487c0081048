use std::collections::BTreeSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, Timelike};

// ---------------------------------------------------------------------------
// RawTable – untyped ingestion result
// ---------------------------------------------------------------------------

/// A header row plus text cells, as delivered by any of the loaders.
/// Empty cells stand for missing values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

// ---------------------------------------------------------------------------
// FireRecord – one detection
// ---------------------------------------------------------------------------

/// A single wildfire detection after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct FireRecord {
    pub timestamp: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    pub region_name: String,
    pub municipality_name: String,
    pub biome: String,
    /// Consecutive days without rain; `None` when unknown.
    pub rain_free_days: Option<f64>,
    pub fire_risk_index: f64,
    /// Fire radiative power (MW).
    pub frp: Option<f64>,
    /// Precipitation in millimeters.
    pub precipitation: Option<f64>,
}

impl FireRecord {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Fractional hour of day, `hour + minute / 60`. Seconds are ignored.
    pub fn hour_of_day(&self) -> f64 {
        self.timestamp.hour() as f64 + self.timestamp.minute() as f64 / 60.0
    }
}

// ---------------------------------------------------------------------------
// Field / dimension selectors
// ---------------------------------------------------------------------------

/// Numeric columns usable in threshold rules and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NumericField {
    RiskIndex,
    RainFreeDays,
    Frp,
    Precipitation,
    Latitude,
    Longitude,
}

impl NumericField {
    pub const ALL: [NumericField; 6] = [
        NumericField::RiskIndex,
        NumericField::RainFreeDays,
        NumericField::Frp,
        NumericField::Precipitation,
        NumericField::Latitude,
        NumericField::Longitude,
    ];

    pub fn value(self, record: &FireRecord) -> Option<f64> {
        match self {
            NumericField::RiskIndex => Some(record.fire_risk_index),
            NumericField::RainFreeDays => record.rain_free_days,
            NumericField::Frp => record.frp,
            NumericField::Precipitation => record.precipitation,
            NumericField::Latitude => Some(record.latitude),
            NumericField::Longitude => Some(record.longitude),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NumericField::RiskIndex => "Risco de fogo",
            NumericField::RainFreeDays => "Dias sem chuva",
            NumericField::Frp => "FRP",
            NumericField::Precipitation => "Precipitação (mm)",
            NumericField::Latitude => "Latitude",
            NumericField::Longitude => "Longitude",
        }
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Categorical columns used for grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Region,
    Municipality,
    Biome,
}

impl Dimension {
    pub fn key(self, record: &FireRecord) -> &str {
        match self {
            Dimension::Region => &record.region_name,
            Dimension::Municipality => &record.municipality_name,
            Dimension::Biome => &record.biome,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dimension::Region => "Estado",
            Dimension::Municipality => "Município",
            Dimension::Biome => "Bioma",
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// Which optional source columns were present at load time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Schema {
    pub has_frp: bool,
    pub has_precipitation: bool,
}

impl Schema {
    pub fn has_field(&self, field: NumericField) -> bool {
        match field {
            NumericField::Frp => self.has_frp,
            NumericField::Precipitation => self.has_precipitation,
            _ => true,
        }
    }
}

/// An immutable collection of detections plus pre-computed lookup values
/// for the filter widgets.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<FireRecord>,
    schema: Schema,
    regions: BTreeSet<String>,
    biomes: BTreeSet<String>,
    date_bounds: Option<(NaiveDate, NaiveDate)>,
}

impl Dataset {
    pub fn new(records: Vec<FireRecord>, schema: Schema) -> Self {
        let mut regions = BTreeSet::new();
        let mut biomes = BTreeSet::new();
        let mut date_bounds: Option<(NaiveDate, NaiveDate)> = None;

        for rec in &records {
            if !regions.contains(&rec.region_name) {
                regions.insert(rec.region_name.clone());
            }
            if !biomes.contains(&rec.biome) {
                biomes.insert(rec.biome.clone());
            }
            let d = rec.date();
            date_bounds = Some(match date_bounds {
                Some((lo, hi)) => (lo.min(d), hi.max(d)),
                None => (d, d),
            });
        }

        Dataset {
            records,
            schema,
            regions,
            biomes,
            date_bounds,
        }
    }

    pub fn empty(schema: Schema) -> Self {
        Self::new(Vec::new(), schema)
    }

    /// Build a new dataset with the same schema from the records matching `keep`.
    pub fn derive<F>(&self, mut keep: F) -> Dataset
    where
        F: FnMut(&FireRecord) -> bool,
    {
        let records = self.records.iter().filter(|r| keep(*r)).cloned().collect();
        Dataset::new(records, self.schema)
    }

    pub fn records(&self) -> &[FireRecord] {
        &self.records
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    /// Sorted distinct region names.
    pub fn regions(&self) -> &BTreeSet<String> {
        &self.regions
    }

    /// Sorted distinct biomes.
    pub fn biomes(&self) -> &BTreeSet<String> {
        &self.biomes
    }

    /// Earliest and latest calendar date present.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.date_bounds
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
