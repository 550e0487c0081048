//! Group-by reductions over an already-filtered dataset.
//!
//! Every grouping goes through an explicit key function into an ordered map,
//! so results never depend on input order.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::model::{Dataset, Dimension, FireRecord, NumericField};

/// Number of critical regions reported when the caller has no preference.
pub const DEFAULT_CRITICAL_REGIONS: usize = 5;

/// Critical score weights: `0.6·count + 0.25·(100·mean_risk) + 0.15·mean_frp`.
const WEIGHT_COUNT: f64 = 0.6;
const WEIGHT_RISK: f64 = 0.25;
const RISK_SCALE: f64 = 100.0;
const WEIGHT_FRP: f64 = 0.15;

// ---------------------------------------------------------------------------
// Result rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub category: String,
    pub count: usize,
}

/// One (region, municipality, biome) group of the critical-region ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct CriticalRegion {
    pub region_name: String,
    pub municipality_name: String,
    pub biome: String,
    pub count: usize,
    pub mean_risk: f64,
    pub mean_frp: Option<f64>,
    pub max_frp: Option<f64>,
    pub mean_precipitation: Option<f64>,
    pub mean_rain_free_days: Option<f64>,
    pub mean_latitude: f64,
    pub mean_longitude: f64,
    pub score: f64,
}

/// Headline numbers of the summary tab.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub top_municipality: Option<String>,
    pub municipalities: usize,
    pub mean_rain_free_days: Option<f64>,
}

/// Descriptive statistics of one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldStats {
    pub field: NumericField,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` below two values.
    pub std_dev: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Accumulators
// ---------------------------------------------------------------------------

/// Running mean over optional values; absent values are skipped.
#[derive(Debug, Clone, Copy, Default)]
struct Mean {
    sum: f64,
    n: usize,
}

impl Mean {
    fn push(&mut self, v: Option<f64>) {
        if let Some(v) = v {
            self.sum += v;
            self.n += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        (self.n > 0).then(|| self.sum / self.n as f64)
    }
}

#[derive(Debug, Default)]
struct CriticalAcc {
    count: usize,
    risk: Mean,
    frp: Mean,
    max_frp: Option<f64>,
    precipitation: Mean,
    rain_free_days: Mean,
    latitude: Mean,
    longitude: Mean,
}

impl CriticalAcc {
    fn push(&mut self, r: &FireRecord) {
        self.count += 1;
        self.risk.push(Some(r.fire_risk_index));
        self.frp.push(r.frp);
        if let Some(frp) = r.frp {
            self.max_frp = Some(self.max_frp.map_or(frp, |m| m.max(frp)));
        }
        self.precipitation.push(r.precipitation);
        self.rain_free_days.push(r.rain_free_days);
        self.latitude.push(Some(r.latitude));
        self.longitude.push(Some(r.longitude));
    }
}

// ---------------------------------------------------------------------------
// Reductions
// ---------------------------------------------------------------------------

fn count_by<'a, K, F>(records: &'a [FireRecord], key: F) -> BTreeMap<K, usize>
where
    K: Ord,
    F: Fn(&'a FireRecord) -> K,
{
    let mut counts = BTreeMap::new();
    for r in records {
        *counts.entry(key(r)).or_insert(0) += 1;
    }
    counts
}

/// Detections per calendar date, ascending by date.
pub fn by_day(dataset: &Dataset) -> Vec<DayCount> {
    count_by(dataset.records(), FireRecord::date)
        .into_iter()
        .map(|(date, count)| DayCount { date, count })
        .collect()
}

/// Detections per category, most frequent first; ties by name ascending.
pub fn by_category(dataset: &Dataset, dimension: Dimension) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = count_by(dataset.records(), |r| dimension.key(r))
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect();
    // Stable sort over name-ordered input keeps name ascending within a count.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// The `n` most frequent categories.
pub fn top_n(dataset: &Dataset, dimension: Dimension, n: usize) -> Vec<CategoryCount> {
    let mut counts = by_category(dataset, dimension);
    counts.truncate(n);
    counts
}

/// Daily counts per category, ordered by date then category.
pub fn series_by_dimension(dataset: &Dataset, dimension: Dimension) -> Vec<SeriesPoint> {
    count_by(dataset.records(), |r| (r.date(), dimension.key(r)))
        .into_iter()
        .map(|((date, category), count)| SeriesPoint {
            date,
            category: category.to_string(),
            count,
        })
        .collect()
}

/// Composite severity score. An absent FRP mean contributes nothing.
pub fn critical_score(count: usize, mean_risk: f64, mean_frp: Option<f64>) -> f64 {
    WEIGHT_COUNT * count as f64
        + WEIGHT_RISK * (RISK_SCALE * mean_risk)
        + WEIGHT_FRP * mean_frp.unwrap_or(0.0)
}

/// Rank (region, municipality, biome) groups by [`critical_score`].
///
/// Sorted by score, count and mean FRP (all descending), then by the group
/// key ascending so ties are reproducible.
pub fn critical_regions(dataset: &Dataset, top: usize) -> Vec<CriticalRegion> {
    let mut groups: BTreeMap<(&str, &str, &str), CriticalAcc> = BTreeMap::new();
    for r in dataset.records() {
        groups
            .entry((
                r.region_name.as_str(),
                r.municipality_name.as_str(),
                r.biome.as_str(),
            ))
            .or_default()
            .push(r);
    }

    let mut ranked: Vec<CriticalRegion> = groups
        .into_iter()
        .map(|((region, municipality, biome), acc)| {
            let mean_risk = acc.risk.value().unwrap_or_default();
            let mean_frp = acc.frp.value();
            CriticalRegion {
                region_name: region.to_string(),
                municipality_name: municipality.to_string(),
                biome: biome.to_string(),
                count: acc.count,
                mean_risk,
                mean_frp,
                max_frp: acc.max_frp,
                mean_precipitation: acc.precipitation.value(),
                mean_rain_free_days: acc.rain_free_days.value(),
                mean_latitude: acc.latitude.value().unwrap_or_default(),
                mean_longitude: acc.longitude.value().unwrap_or_default(),
                score: critical_score(acc.count, mean_risk, mean_frp),
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.count.cmp(&a.count))
            .then_with(|| frp_key(b).total_cmp(&frp_key(a)))
            .then_with(|| a.region_name.cmp(&b.region_name))
            .then_with(|| a.municipality_name.cmp(&b.municipality_name))
            .then_with(|| a.biome.cmp(&b.biome))
    });
    ranked.truncate(top);
    ranked
}

fn frp_key(c: &CriticalRegion) -> f64 {
    c.mean_frp.unwrap_or(f64::NEG_INFINITY)
}

pub fn summary(dataset: &Dataset) -> Summary {
    let municipalities = by_category(dataset, Dimension::Municipality);
    let mut rain = Mean::default();
    for r in dataset.records() {
        rain.push(r.rain_free_days);
    }
    Summary {
        total: dataset.len(),
        top_municipality: municipalities.first().map(|c| c.category.clone()),
        municipalities: municipalities.len(),
        mean_rain_free_days: rain.value(),
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

fn sorted_values(dataset: &Dataset, field: NumericField) -> Vec<f64> {
    let mut values: Vec<f64> = dataset
        .records()
        .iter()
        .filter_map(|r| field.value(r))
        .collect();
    values.sort_by(f64::total_cmp);
    values
}

/// Linear-interpolated quantile of sorted, non-empty values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Describe one column; `None` when it has no values.
pub fn describe(dataset: &Dataset, field: NumericField) -> Option<FieldStats> {
    let values = sorted_values(dataset, field);
    let (&min, &max) = (values.first()?, values.last()?);
    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let std_dev = (n > 1).then(|| {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    });
    Some(FieldStats {
        field,
        count: n,
        mean,
        std_dev,
        min,
        q1: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q3: quantile(&values, 0.75),
        max,
    })
}

/// Stats for every column the dataset carries values for.
pub fn describe_all(dataset: &Dataset) -> Vec<FieldStats> {
    NumericField::ALL
        .iter()
        .filter(|f| dataset.schema().has_field(**f))
        .filter_map(|f| describe(dataset, *f))
        .collect()
}

/// Equal-width histogram between the column's min and max. The last bin is
/// closed on the right.
pub fn histogram(dataset: &Dataset, field: NumericField, bins: usize) -> Vec<HistogramBin> {
    let values = sorted_values(dataset, field);
    let (Some(&min), Some(&max)) = (values.first(), values.last()) else {
        return Vec::new();
    };
    let bins = bins.max(1);
    let width = if max > min { (max - min) / bins as f64 } else { 1.0 };

    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for v in values {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::test_support::{dataset, record};

    fn rec(region: &str, muni: &str, biome: &str, ts: &str, risk: f64, frp: Option<f64>) -> FireRecord {
        let mut r = record(region, muni, biome, ts);
        r.fire_risk_index = risk;
        r.frp = frp;
        r
    }

    fn sample() -> Dataset {
        dataset(vec![
            rec("PE", "Petrolina", "Caatinga", "2024-01-01 10:00", 0.9, Some(40.0)),
            rec("PE", "Petrolina", "Caatinga", "2024-01-01 14:00", 0.7, Some(20.0)),
            rec("PE", "Petrolina", "Caatinga", "2024-01-02 09:00", 0.8, None),
            rec("PE", "Recife", "Mata Atlântica", "2024-01-02 11:00", 0.2, Some(5.0)),
            rec("BA", "Juazeiro", "Caatinga", "2024-01-03 16:00", 1.0, Some(90.0)),
            rec("BA", "Barreiras", "Cerrado", "2024-01-03 17:00", 0.6, Some(10.0)),
            rec("BA", "Barreiras", "Cerrado", "2024-01-01 08:00", 0.6, Some(10.0)),
        ])
    }

    #[test]
    fn test_by_day() {
        let days = by_day(&sample());
        let d = |dd| NaiveDate::from_ymd_opt(2024, 1, dd).unwrap();
        assert_eq!(
            days,
            vec![
                DayCount { date: d(1), count: 3 },
                DayCount { date: d(2), count: 2 },
                DayCount { date: d(3), count: 2 },
            ]
        );
    }

    #[test]
    fn test_by_category_desc_with_name_ties() {
        let biomes = by_category(&sample(), Dimension::Biome);
        let names: Vec<_> = biomes.iter().map(|c| (c.category.as_str(), c.count)).collect();
        assert_eq!(
            names,
            vec![("Caatinga", 4), ("Cerrado", 2), ("Mata Atlântica", 1)]
        );

        let munis = by_category(&sample(), Dimension::Municipality);
        let names: Vec<_> = munis.iter().map(|c| c.category.as_str()).collect();
        // Juazeiro and Recife tie at one; name ascending.
        assert_eq!(names, vec!["Petrolina", "Barreiras", "Juazeiro", "Recife"]);
        assert!(munis.windows(2).all(|w| w[0].count >= w[1].count));
    }

    #[test]
    fn test_top_n_bounds() {
        let ds = sample();
        let all = by_category(&ds, Dimension::Municipality);
        for n in 0..6 {
            let top = top_n(&ds, Dimension::Municipality, n);
            assert_eq!(top.len(), n.min(all.len()));
            let excluded_max = all[top.len()..].iter().map(|c| c.count).max().unwrap_or(0);
            assert!(top.iter().all(|c| c.count >= excluded_max));
        }
    }

    #[test]
    fn test_series_by_dimension() {
        let series = series_by_dimension(&sample(), Dimension::Region);
        let rows: Vec<_> = series
            .iter()
            .map(|p| (p.date.format("%d").to_string(), p.category.as_str(), p.count))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("01".to_string(), "BA", 1),
                ("01".to_string(), "PE", 2),
                ("02".to_string(), "PE", 2),
                ("03".to_string(), "BA", 2),
            ]
        );
    }

    #[test]
    fn test_critical_score_weights() {
        let s = critical_score(10, 0.5, Some(20.0));
        assert!((s - (6.0 + 12.5 + 3.0)).abs() < 1e-9);
        assert!((critical_score(1, 0.0, None) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_critical_regions_ranking() {
        let weather = [(Some(2.0), Some(10.0)), (None, Some(20.0)), (Some(4.0), None)];
        let mut records = sample().records().to_vec();
        for (r, (precipitation, dry_days)) in records.iter_mut().zip(weather) {
            r.precipitation = precipitation;
            r.rain_free_days = dry_days;
        }
        let ranked = critical_regions(&dataset(records), DEFAULT_CRITICAL_REGIONS);
        assert_eq!(ranked.len(), 4);

        let top = &ranked[0];
        assert_eq!(top.municipality_name, "Juazeiro");
        assert_eq!(top.count, 1);
        // 0.6 + 25 + 13.5
        assert!((top.score - 39.1).abs() < 1e-9);

        let petrolina = &ranked[1];
        assert_eq!(petrolina.municipality_name, "Petrolina");
        assert_eq!(petrolina.count, 3);
        assert!((petrolina.mean_risk - 0.8).abs() < 1e-9);
        assert_eq!(petrolina.mean_frp, Some(30.0));
        assert_eq!(petrolina.max_frp, Some(40.0));
        assert!((petrolina.score - (1.8 + 20.0 + 4.5)).abs() < 1e-9);
        assert_eq!(petrolina.mean_precipitation, Some(3.0));
        assert_eq!(petrolina.mean_rain_free_days, Some(15.0));
        assert_eq!(top.mean_precipitation, None);
        assert_eq!(top.mean_rain_free_days, None);

        assert_eq!(ranked[2].municipality_name, "Barreiras");
        assert_eq!(ranked[3].municipality_name, "Recife");
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_critical_regions_deterministic() {
        let ds = sample();
        let first = critical_regions(&ds, 3);
        for _ in 0..5 {
            let again = critical_regions(&ds, 3);
            assert_eq!(again.len(), first.len());
            for (a, b) in first.iter().zip(&again) {
                assert_eq!(a, b);
                assert_eq!(a.score.to_bits(), b.score.to_bits());
            }
        }

        // Reversed input order gives the same ranking.
        let reversed = dataset(ds.records().iter().rev().cloned().collect());
        let keys = |v: &[CriticalRegion]| -> Vec<String> {
            v.iter().map(|c| c.municipality_name.clone()).collect()
        };
        assert_eq!(keys(&critical_regions(&reversed, 3)), keys(&first));
    }

    #[test]
    fn test_critical_regions_tie_break_by_key() {
        let ds = dataset(vec![
            rec("SP", "B", "Cerrado", "2024-01-01 10:00", 0.5, Some(1.0)),
            rec("SP", "A", "Cerrado", "2024-01-01 10:00", 0.5, Some(1.0)),
        ]);
        let ranked = critical_regions(&ds, 5);
        assert_eq!(ranked[0].municipality_name, "A");
        assert_eq!(ranked[1].municipality_name, "B");
    }

    #[test]
    fn test_summary() {
        let s = summary(&sample());
        assert_eq!(s.total, 7);
        assert_eq!(s.top_municipality.as_deref(), Some("Petrolina"));
        assert_eq!(s.municipalities, 4);
        assert_eq!(s.mean_rain_free_days, None);

        let empty = summary(&dataset(Vec::new()));
        assert_eq!(empty.total, 0);
        assert_eq!(empty.top_municipality, None);
    }

    #[test]
    fn test_describe() {
        let stats = describe(&sample(), NumericField::Frp).unwrap();
        // 5, 10, 10, 20, 40, 90
        assert_eq!(stats.count, 6);
        assert_eq!(stats.min, 5.0);
        assert_eq!(stats.max, 90.0);
        assert!((stats.mean - 175.0 / 6.0).abs() < 1e-9);
        assert!((stats.median - 15.0).abs() < 1e-9);
        assert!((stats.q1 - 10.0).abs() < 1e-9);
        assert!((stats.q3 - 35.0).abs() < 1e-9);
        assert!(stats.std_dev.is_some());

        assert!(describe(&sample(), NumericField::Precipitation).is_none());
    }

    #[test]
    fn test_histogram() {
        let bins = histogram(&sample(), NumericField::RiskIndex, 4);
        assert_eq!(bins.len(), 4);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 7);
        // Max lands in the last bin.
        assert!(bins[3].count >= 1);
        assert!((bins[0].lower - 0.2).abs() < 1e-12);
        assert!((bins[3].upper - 1.0).abs() < 1e-12);

        assert!(histogram(&sample(), NumericField::Precipitation, 4).is_empty());
    }

    #[test]
    fn test_unparseable_risk_never_aggregated() {
        use crate::data::model::RawTable;
        use crate::data::normalize::normalize;

        let row = |muni: &str, risk: &str| {
            vec![
                "2024-01-01 10:00".to_string(),
                "-9".to_string(),
                "-40".to_string(),
                "PE".to_string(),
                muni.to_string(),
                "Caatinga".to_string(),
                "2".to_string(),
                risk.to_string(),
            ]
        };
        let table = RawTable {
            headers: [
                "DataHora",
                "Latitude",
                "Longitude",
                "Estado",
                "Municipio",
                "Bioma",
                "DiaSemChuva",
                "RiscoFogo",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            rows: vec![row("Kept", "0.4"), row("Ghost", "N/A")],
        };
        let ds = normalize(&table).unwrap();

        assert!(by_category(&ds, Dimension::Municipality)
            .iter()
            .all(|c| c.category != "Ghost"));
        assert!(critical_regions(&ds, 5)
            .iter()
            .all(|c| c.municipality_name != "Ghost"));
        assert_eq!(by_day(&ds)[0].count, 1);
        assert_eq!(summary(&ds).total, 1);
        assert!(!ds.records().iter().any(|r| r.municipality_name == "Ghost"));
    }
}
