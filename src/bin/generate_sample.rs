//! Writes a synthetic detections file (`sample_focos.csv` and
//! `sample_focos.parquet`) for trying the dashboard offline.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use parquet::arrow::ArrowWriter;

const DETECTIONS: usize = 2_000;
const DAYS: i64 = 30;

/// (state, municipality, biome, latitude, longitude)
const PLACES: [(&str, &str, &str, f64, f64); 10] = [
    ("PE", "Petrolina", "Caatinga", -9.39, -40.50),
    ("PE", "Recife", "Mata Atlântica", -8.05, -34.90),
    ("BA", "Juazeiro", "Caatinga", -9.41, -40.49),
    ("BA", "Barreiras", "Cerrado", -12.15, -45.00),
    ("MT", "Sinop", "Amazônia", -11.86, -55.50),
    ("MT", "Poconé", "Pantanal", -16.26, -56.62),
    ("PA", "Altamira", "Amazônia", -3.20, -52.21),
    ("TO", "Palmas", "Cerrado", -10.18, -48.33),
    ("MS", "Corumbá", "Pantanal", -19.01, -57.65),
    ("RS", "Bagé", "Pampa", -31.33, -54.10),
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

struct Detection {
    timestamp: NaiveDateTime,
    latitude: f64,
    longitude: f64,
    region: &'static str,
    municipality: &'static str,
    biome: &'static str,
    rain_free_days: f64,
    /// `None` is written as "N/A" (CSV) or null (Parquet).
    risk: Option<f64>,
    frp: Option<f64>,
    precipitation: f64,
}

fn generate(rng: &mut SimpleRng) -> Result<Vec<Detection>> {
    let start = NaiveDate::from_ymd_opt(2024, 8, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid start date")?;

    let detections = (0..DETECTIONS)
        .map(|_| {
            // Skew towards the first places so rankings are not flat.
            let place = rng.below(PLACES.len()).min(rng.below(PLACES.len()));
            let (region, municipality, biome, lat, lon) = PLACES[place];
            let offset = Duration::minutes((rng.next_f64() * (DAYS * 24 * 60) as f64) as i64);
            let dry = rng.next_f64() < 0.05;

            Detection {
                timestamp: start + offset,
                latitude: rng.gauss(lat, 0.3),
                longitude: rng.gauss(lon, 0.3),
                region,
                municipality,
                biome,
                rain_free_days: if dry { -999.0 } else { rng.below(60) as f64 },
                risk: (rng.next_f64() >= 0.02).then(|| rng.next_f64()),
                frp: (rng.next_f64() >= 0.1).then(|| rng.gauss(40.0, 20.0).abs()),
                precipitation: (rng.gauss(0.0, 2.0)).max(0.0),
            }
        })
        .collect();
    Ok(detections)
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

fn write_csv(path: &str, detections: &[Detection]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("Failed to create {path}"))?;
    writer.write_record(HEADERS)?;
    for d in detections {
        writer.write_record([
            d.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            format!("{:.5}", d.latitude),
            format!("{:.5}", d.longitude),
            d.region.to_string(),
            d.municipality.to_string(),
            d.biome.to_string(),
            d.rain_free_days.to_string(),
            d.risk.map_or_else(|| "N/A".to_string(), |r| format!("{r:.3}")),
            d.frp.map_or_else(String::new, |f| format!("{f:.1}")),
            format!("{:.1}", d.precipitation),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &str, detections: &[Detection]) -> Result<()> {
    let text = |f: fn(&Detection) -> String| -> ArrayRef {
        Arc::new(StringArray::from(detections.iter().map(f).collect::<Vec<_>>()))
    };
    let number = |f: fn(&Detection) -> Option<f64>| -> ArrayRef {
        Arc::new(Float64Array::from(detections.iter().map(f).collect::<Vec<_>>()))
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new(HEADERS[0], DataType::Utf8, false),
        Field::new(HEADERS[1], DataType::Float64, true),
        Field::new(HEADERS[2], DataType::Float64, true),
        Field::new(HEADERS[3], DataType::Utf8, false),
        Field::new(HEADERS[4], DataType::Utf8, false),
        Field::new(HEADERS[5], DataType::Utf8, false),
        Field::new(HEADERS[6], DataType::Float64, true),
        Field::new(HEADERS[7], DataType::Float64, true),
        Field::new(HEADERS[8], DataType::Float64, true),
        Field::new(HEADERS[9], DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            text(|d| d.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()),
            number(|d| Some(d.latitude)),
            number(|d| Some(d.longitude)),
            text(|d| d.region.to_string()),
            text(|d| d.municipality.to_string()),
            text(|d| d.biome.to_string()),
            number(|d| Some(d.rain_free_days)),
            number(|d| d.risk),
            number(|d| d.frp),
            number(|d| Some(d.precipitation)),
        ],
    )
    .context("Failed to create RecordBatch")?;

    let file = std::fs::File::create(path).with_context(|| format!("Failed to create {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("Failed to create writer")?;
    writer.write(&batch).context("Failed to write batch")?;
    writer.close().context("Failed to close writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let detections = generate(&mut rng)?;

    write_csv("sample_focos.csv", &detections)?;
    write_parquet("sample_focos.parquet", &detections)?;

    println!(
        "Wrote {} detections over {DAYS} days to sample_focos.csv and sample_focos.parquet",
        detections.len()
    );
    Ok(())
}
