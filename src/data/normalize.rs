use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use super::error::LoadError;
use super::model::{Dataset, FireRecord, RawTable, Schema};

// ---------------------------------------------------------------------------
// Source column names
// ---------------------------------------------------------------------------

pub const COL_TIMESTAMP: &str = "DataHora";
pub const COL_LATITUDE: &str = "Latitude";
pub const COL_LONGITUDE: &str = "Longitude";
pub const COL_REGION: &str = "Estado";
pub const COL_MUNICIPALITY: &str = "Municipio";
pub const COL_BIOME: &str = "Bioma";
pub const COL_RAIN_FREE_DAYS: &str = "DiaSemChuva";
pub const COL_RISK: &str = "RiscoFogo";
pub const COL_FRP: &str = "FRP";
pub const COL_PRECIPITATION: &str = "Precipitacao";

/// Columns every source file must carry (exact name and casing).
pub const REQUIRED_COLUMNS: [&str; 8] = [
    COL_TIMESTAMP,
    COL_LATITUDE,
    COL_LONGITUDE,
    COL_REGION,
    COL_MUNICIPALITY,
    COL_BIOME,
    COL_RAIN_FREE_DAYS,
    COL_RISK,
];

/// Marker the source uses for "rain-free days unknown".
const RAIN_FREE_DAYS_UNKNOWN: f64 = -999.0;

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Resolved positions of the source columns in a [`RawTable`].
struct ColumnMap {
    timestamp: usize,
    latitude: usize,
    longitude: usize,
    region: usize,
    municipality: usize,
    biome: usize,
    rain_free_days: usize,
    risk: usize,
    frp: Option<usize>,
    precipitation: Option<usize>,
}

impl ColumnMap {
    fn resolve(table: &RawTable) -> Result<Self, LoadError> {
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| table.column_index(c).is_none())
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::Schema { missing });
        }

        let idx = |name: &str| table.column_index(name).unwrap_or_default();
        Ok(ColumnMap {
            timestamp: idx(COL_TIMESTAMP),
            latitude: idx(COL_LATITUDE),
            longitude: idx(COL_LONGITUDE),
            region: idx(COL_REGION),
            municipality: idx(COL_MUNICIPALITY),
            biome: idx(COL_BIOME),
            rain_free_days: idx(COL_RAIN_FREE_DAYS),
            risk: idx(COL_RISK),
            frp: table.column_index(COL_FRP),
            precipitation: table.column_index(COL_PRECIPITATION),
        })
    }

    fn schema(&self) -> Schema {
        Schema {
            has_frp: self.frp.is_some(),
            has_precipitation: self.precipitation.is_some(),
        }
    }
}

/// Validate and coerce a raw table into the canonical [`Dataset`].
///
/// Fails only when a required column is missing. Rows whose timestamp,
/// coordinates or risk index cannot be parsed are dropped.
pub fn normalize(table: &RawTable) -> Result<Dataset, LoadError> {
    let cols = ColumnMap::resolve(table)?;

    let records: Vec<FireRecord> = table
        .rows
        .iter()
        .filter_map(|row| normalize_row(row, &cols))
        .collect();

    let dropped = table.rows.len() - records.len();
    if dropped > 0 {
        log::info!(
            "Normalized {} detections, dropped {dropped} invalid rows",
            records.len()
        );
    } else {
        log::info!("Normalized {} detections", records.len());
    }

    Ok(Dataset::new(records, cols.schema()))
}

fn normalize_row(row: &[String], cols: &ColumnMap) -> Option<FireRecord> {
    let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("");
    let opt_cell = |i: Option<usize>| i.map(cell).unwrap_or("");

    Some(FireRecord {
        timestamp: parse_timestamp(cell(cols.timestamp))?,
        latitude: parse_number(cell(cols.latitude))?,
        longitude: parse_number(cell(cols.longitude))?,
        fire_risk_index: parse_number(cell(cols.risk))?,
        region_name: cell(cols.region).to_string(),
        municipality_name: cell(cols.municipality).to_string(),
        biome: cell(cols.biome).to_string(),
        rain_free_days: parse_rain_free_days(cell(cols.rain_free_days)),
        frp: parse_number(opt_cell(cols.frp)),
        precipitation: parse_number(opt_cell(cols.precipitation)),
    })
}

// ---------------------------------------------------------------------------
// Cell coercion
// ---------------------------------------------------------------------------

/// Parse a numeric cell; blanks, garbage and NaN become `None`.
pub fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

fn parse_rain_free_days(s: &str) -> Option<f64> {
    parse_number(s).filter(|v| *v != RAIN_FREE_DAYS_UNKNOWN)
}

/// Parse the timestamp shapes seen in detection exports. Offsets are dropped
/// and the wall-clock time is kept as-is.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    const HEADERS: [&str; 10] = [
        "DataHora",
        "Latitude",
        "Longitude",
        "Estado",
        "Municipio",
        "Bioma",
        "DiaSemChuva",
        "RiscoFogo",
        "FRP",
        "Precipitacao",
    ];

    #[test]
    fn test_missing_columns_reported() {
        let t = table(&["DataHora", "Latitude", "Estado"], &[]);
        match normalize(&t) {
            Err(LoadError::Schema { missing }) => {
                assert_eq!(
                    missing,
                    vec![
                        "Longitude",
                        "Municipio",
                        "Bioma",
                        "DiaSemChuva",
                        "RiscoFogo"
                    ]
                );
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_column_names_are_case_sensitive() {
        let mut headers = HEADERS.to_vec();
        headers[7] = "riscofogo";
        let err = normalize(&table(&headers, &[])).unwrap_err();
        assert!(err.to_string().contains("RiscoFogo"));
    }

    #[test]
    fn test_valid_row_maps_to_record() {
        let t = table(
            &HEADERS,
            &[&[
                "2024-08-15 14:30:00",
                "-9.5",
                "-40.2",
                "PERNAMBUCO",
                "PETROLINA",
                "Caatinga",
                "12",
                "0.87",
                "35.2",
                "0.0",
            ]],
        );
        let ds = normalize(&t).unwrap();
        assert_eq!(ds.len(), 1);
        let r = &ds.records()[0];
        assert_eq!(r.region_name, "PERNAMBUCO");
        assert_eq!(r.municipality_name, "PETROLINA");
        assert_eq!(r.biome, "Caatinga");
        assert_eq!(r.latitude, -9.5);
        assert_eq!(r.rain_free_days, Some(12.0));
        assert_eq!(r.fire_risk_index, 0.87);
        assert_eq!(r.frp, Some(35.2));
        assert_eq!(r.precipitation, Some(0.0));
        assert!(ds.schema().has_frp && ds.schema().has_precipitation);
    }

    #[test]
    fn test_rain_free_days_sentinel_becomes_absent() {
        let t = table(
            &HEADERS,
            &[
                &["2024-01-01 10:00", "-9", "-40", "PE", "A", "Caatinga", "-999", "0.5", "", ""],
                &["2024-01-01 10:00", "-9", "-40", "PE", "A", "Caatinga", "-999.0", "0.5", "", ""],
                &["2024-01-01 10:00", "-9", "-40", "PE", "A", "Caatinga", "abc", "0.5", "", ""],
            ],
        );
        let ds = normalize(&t).unwrap();
        assert_eq!(ds.len(), 3);
        assert!(ds.records().iter().all(|r| r.rain_free_days.is_none()));
        assert!(ds.records().iter().all(|r| r.frp.is_none()));
    }

    #[test]
    fn test_invalid_rows_dropped() {
        let t = table(
            &HEADERS,
            &[
                &["2024-01-01 10:00", "-9", "-40", "PE", "A", "Caatinga", "3", "N/A", "", ""],
                &["not a date", "-9", "-40", "PE", "B", "Caatinga", "3", "0.5", "", ""],
                &["2024-01-01 10:00", "", "-40", "PE", "C", "Caatinga", "3", "0.5", "", ""],
                &["2024-01-01 10:00", "-9", "NaN", "PE", "D", "Caatinga", "3", "0.5", "", ""],
                &["2024-01-01 10:00", "-9", "-40", "PE", "E", "Caatinga", "3", "0.5", "", ""],
            ],
        );
        let ds = normalize(&t).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records()[0].municipality_name, "E");
    }

    #[test]
    fn test_optional_columns_absent() {
        let t = table(
            &HEADERS[..8],
            &[&["2024-01-01", "-9", "-40", "PE", "A", "Cerrado", "", "0.1"]],
        );
        let ds = normalize(&t).unwrap();
        assert!(!ds.schema().has_frp);
        assert!(!ds.schema().has_precipitation);
        assert_eq!(ds.records()[0].frp, None);
    }

    #[test]
    fn test_timestamp_shapes() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(7, 45, 0)
            .unwrap();
        for s in [
            "2024-03-05 07:45:00",
            "2024-03-05 07:45",
            "2024/03/05 07:45:00",
            "2024-03-05T07:45:00",
            "2024-03-05T07:45:00.000",
            "2024-03-05T07:45:00-03:00",
            " 2024-03-05 07:45:00 ",
        ] {
            assert_eq!(parse_timestamp(s), Some(expected), "failed on {s:?}");
        }
        assert_eq!(
            parse_timestamp("2024-03-05"),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_timestamp("05/03/2024 xx"), None);
        assert_eq!(parse_timestamp(""), None);
    }
}
