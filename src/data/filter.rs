use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Days, NaiveDate, NaiveTime, Timelike};

use super::error::FilterError;
use super::model::{Dataset, NumericField};

// ---------------------------------------------------------------------------
// Criteria types
// ---------------------------------------------------------------------------

/// Label of the "every region" entry in the region selector.
pub const ALL_REGIONS: &str = "Todos";

/// Region selector: wildcard or exact (case-sensitive) name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RegionSelector {
    #[default]
    All,
    Only(String),
}

impl fmt::Display for RegionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionSelector::All => f.write_str(ALL_REGIONS),
            RegionSelector::Only(name) => f.write_str(name),
        }
    }
}

/// Inclusive calendar-date range; the end day is covered entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Named time-of-day shift ("turno").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    Madrugada,
    Manha,
    Tarde,
    Noite,
}

impl Shift {
    pub const ALL: [Shift; 4] = [Shift::Madrugada, Shift::Manha, Shift::Tarde, Shift::Noite];

    /// Half-open `[start, end)` hour interval.
    pub fn hours(self) -> (f64, f64) {
        match self {
            Shift::Madrugada => (0.0, 6.0),
            Shift::Manha => (6.0, 12.0),
            Shift::Tarde => (12.0, 18.0),
            Shift::Noite => (18.0, 24.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Shift::Madrugada => "Madrugada (00h–06h)",
            Shift::Manha => "Manhã (06h–12h)",
            Shift::Tarde => "Tarde (12h–18h)",
            Shift::Noite => "Noite (18h–24h)",
        }
    }
}

/// At most one time-of-day restriction is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeOfDay {
    #[default]
    Any,
    Preset(Shift),
    /// Custom clock range; wraps past midnight when `start > end`.
    Custom { start: NaiveTime, end: NaiveTime },
}

/// Comparison operator of a numeric rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Operator {
    #[default]
    None,
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
    Between,
}

impl Operator {
    pub const ALL: [Operator; 7] = [
        Operator::None,
        Operator::Eq,
        Operator::Lt,
        Operator::Gt,
        Operator::Le,
        Operator::Ge,
        Operator::Between,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::None => "—",
            Operator::Eq => "=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Le => "≤",
            Operator::Ge => "≥",
            Operator::Between => "entre",
        }
    }
}

/// A threshold rule on one numeric column.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NumericRule {
    pub op: Operator,
    pub first: Option<f64>,
    pub second: Option<f64>,
}

impl NumericRule {
    pub fn new(op: Operator, first: Option<f64>, second: Option<f64>) -> Self {
        Self { op, first, second }
    }

    pub fn between(a: f64, b: f64) -> Self {
        Self::new(Operator::Between, Some(a), Some(b))
    }

    /// A rule that selects every row: no operator, or a missing operand.
    pub fn is_noop(&self) -> bool {
        match self.op {
            Operator::None => true,
            Operator::Between => self.first.is_none() || self.second.is_none(),
            _ => self.first.is_none(),
        }
    }

    /// Test a single cell. Absent values never satisfy an active rule.
    pub fn matches(&self, value: Option<f64>) -> bool {
        if self.is_noop() {
            return true;
        }
        let Some(v) = value else {
            return false;
        };
        let a = self.first.unwrap_or_default();
        match self.op {
            Operator::None => true,
            Operator::Eq => v == a,
            Operator::Lt => v < a,
            Operator::Gt => v > a,
            Operator::Le => v <= a,
            Operator::Ge => v >= a,
            Operator::Between => {
                let b = self.second.unwrap_or_default();
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                lo <= v && v <= hi
            }
        }
    }
}

/// Numeric rules keyed by column; all of them must hold.
pub type NumericRules = BTreeMap<NumericField, NumericRule>;

/// One user interaction's worth of filter settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub region: RegionSelector,
    /// `None` leaves the dates unrestricted.
    pub dates: Option<DateRange>,
    /// Empty means every biome.
    pub biomes: BTreeSet<String>,
    pub time_of_day: TimeOfDay,
    pub numeric_rules: NumericRules,
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

pub fn filter_region(dataset: &Dataset, selector: &RegionSelector) -> Dataset {
    match selector {
        RegionSelector::All => dataset.clone(),
        RegionSelector::Only(name) => dataset.derive(|r| r.region_name == *name),
    }
}

/// Keep `start <= timestamp < end + 1 day`.
pub fn filter_date_range(dataset: &Dataset, range: &DateRange) -> Dataset {
    let lower = range.start.and_time(NaiveTime::MIN);
    let upper = range
        .end
        .checked_add_days(Days::new(1))
        .map(|d| d.and_time(NaiveTime::MIN));
    dataset.derive(|r| r.timestamp >= lower && upper.map_or(true, |u| r.timestamp < u))
}

pub fn filter_biomes(dataset: &Dataset, biomes: &BTreeSet<String>) -> Dataset {
    if biomes.is_empty() {
        return dataset.clone();
    }
    dataset.derive(|r| biomes.contains(&r.biome))
}

pub fn filter_time_of_day(dataset: &Dataset, time_of_day: &TimeOfDay) -> Dataset {
    let (start, end) = match *time_of_day {
        TimeOfDay::Any => return dataset.clone(),
        TimeOfDay::Preset(shift) => shift.hours(),
        TimeOfDay::Custom { start, end } => (clock_hours(start), clock_hours(end)),
    };
    dataset.derive(|r| hour_in_range(r.hour_of_day(), start, end))
}

/// Apply every rule and keep the rows satisfying all of them.
///
/// Returns [`FilterError::MissingColumn`] when a rule targets an optional
/// column the dataset was loaded without.
pub fn filter_numeric(dataset: &Dataset, rules: &NumericRules) -> Result<Dataset, FilterError> {
    let schema = dataset.schema();
    if let Some(field) = rules.keys().find(|f| !schema.has_field(**f)) {
        return Err(FilterError::MissingColumn(*field));
    }

    let active: Vec<(NumericField, NumericRule)> = rules
        .iter()
        .filter(|(_, rule)| !rule.is_noop())
        .map(|(f, r)| (*f, *r))
        .collect();
    if active.is_empty() {
        return Ok(dataset.clone());
    }

    Ok(dataset.derive(|r| {
        active
            .iter()
            .all(|(field, rule)| rule.matches(field.value(r)))
    }))
}

/// Run the whole chain: region → date → biome → time-of-day → numeric rules.
pub fn apply(dataset: &Dataset, criteria: &FilterCriteria) -> Result<Dataset, FilterError> {
    let mut out = filter_region(dataset, &criteria.region);
    if let Some(range) = &criteria.dates {
        out = filter_date_range(&out, range);
    }
    out = filter_biomes(&out, &criteria.biomes);
    out = filter_time_of_day(&out, &criteria.time_of_day);
    filter_numeric(&out, &criteria.numeric_rules)
}

fn clock_hours(t: NaiveTime) -> f64 {
    t.hour() as f64 + t.minute() as f64 / 60.0
}

fn hour_in_range(hour: f64, start: f64, end: f64) -> bool {
    if start <= end {
        start <= hour && hour < end
    } else {
        hour >= start || hour < end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::test_support::{dataset, record};
    use crate::data::model::Schema;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn clock(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn municipalities(ds: &Dataset) -> Vec<&str> {
        ds.records()
            .iter()
            .map(|r| r.municipality_name.as_str())
            .collect()
    }

    fn sample() -> Dataset {
        dataset(vec![
            record("PE", "Recife", "Mata Atlântica", "2024-01-01 00:00"),
            record("PE", "Petrolina", "Caatinga", "2024-01-03 23:30"),
            record("BA", "Juazeiro", "Caatinga", "2024-01-02 10:00"),
            record("pe", "Olinda", "Mata Atlântica", "2024-01-02 02:00"),
        ])
    }

    #[test]
    fn test_region_wildcard_is_identity() {
        let ds = sample();
        assert_eq!(filter_region(&ds, &RegionSelector::All), ds);
    }

    #[test]
    fn test_region_exact_match() {
        let out = filter_region(&sample(), &RegionSelector::Only("PE".into()));
        assert_eq!(out.len(), 2);
        assert!(out.records().iter().all(|r| r.region_name == "PE"));

        let none = filter_region(&sample(), &RegionSelector::Only("SP".into()));
        assert!(none.is_empty());
    }

    #[test]
    fn test_date_range_end_day_inclusive() {
        let range = DateRange {
            start: day(2024, 1, 2),
            end: day(2024, 1, 3),
        };
        let out = filter_date_range(&sample(), &range);
        assert_eq!(municipalities(&out), vec!["Petrolina", "Juazeiro", "Olinda"]);

        let lower = range.start.and_time(NaiveTime::MIN);
        let upper = day(2024, 1, 4).and_time(NaiveTime::MIN);
        assert!(out
            .records()
            .iter()
            .all(|r| r.timestamp >= lower && r.timestamp < upper));
    }

    #[test]
    fn test_date_range_idempotent() {
        let range = DateRange {
            start: day(2024, 1, 1),
            end: day(2024, 1, 2),
        };
        let once = filter_date_range(&sample(), &range);
        let twice = filter_date_range(&once, &range);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
    }

    #[test]
    fn test_biome_filter() {
        let ds = sample();
        assert_eq!(filter_biomes(&ds, &BTreeSet::new()), ds);

        let only: BTreeSet<String> = ["Caatinga".to_string()].into();
        let out = filter_biomes(&ds, &only);
        assert_eq!(municipalities(&out), vec!["Petrolina", "Juazeiro"]);
    }

    #[test]
    fn test_shift_presets() {
        let ds = sample();
        let madrugada = filter_time_of_day(&ds, &TimeOfDay::Preset(Shift::Madrugada));
        assert_eq!(municipalities(&madrugada), vec!["Recife", "Olinda"]);

        let manha = filter_time_of_day(&ds, &TimeOfDay::Preset(Shift::Manha));
        assert_eq!(municipalities(&manha), vec!["Juazeiro"]);

        let noite = filter_time_of_day(&ds, &TimeOfDay::Preset(Shift::Noite));
        assert_eq!(municipalities(&noite), vec!["Petrolina"]);

        assert!(filter_time_of_day(&ds, &TimeOfDay::Preset(Shift::Tarde)).is_empty());
        assert_eq!(filter_time_of_day(&ds, &TimeOfDay::Any), ds);
    }

    #[test]
    fn test_custom_range_wraps_midnight() {
        let ds = dataset(vec![
            record("PE", "late", "Caatinga", "2024-01-01 23:30"),
            record("PE", "morning", "Caatinga", "2024-01-01 10:00"),
            record("PE", "edge", "Caatinga", "2024-01-01 02:00"),
            record("PE", "early", "Caatinga", "2024-01-01 01:59"),
            record("PE", "start", "Caatinga", "2024-01-01 22:00"),
        ]);
        let tod = TimeOfDay::Custom {
            start: clock(22, 0),
            end: clock(2, 0),
        };
        let out = filter_time_of_day(&ds, &tod);
        assert_eq!(municipalities(&out), vec!["late", "early", "start"]);
    }

    #[test]
    fn test_custom_range_plain() {
        let ds = sample();
        let tod = TimeOfDay::Custom {
            start: clock(9, 30),
            end: clock(10, 0),
        };
        assert!(filter_time_of_day(&ds, &tod).is_empty());

        let tod = TimeOfDay::Custom {
            start: clock(9, 30),
            end: clock(10, 1),
        };
        assert_eq!(municipalities(&filter_time_of_day(&ds, &tod)), vec!["Juazeiro"]);
    }

    #[test]
    fn test_rule_operators() {
        let v = Some(0.5);
        assert!(NumericRule::new(Operator::None, None, None).matches(v));
        assert!(NumericRule::new(Operator::Eq, Some(0.5), None).matches(v));
        assert!(!NumericRule::new(Operator::Lt, Some(0.5), None).matches(v));
        assert!(NumericRule::new(Operator::Le, Some(0.5), None).matches(v));
        assert!(!NumericRule::new(Operator::Gt, Some(0.5), None).matches(v));
        assert!(NumericRule::new(Operator::Ge, Some(0.5), None).matches(v));
        assert!(NumericRule::between(0.5, 0.5).matches(v));
        // Active rule, absent cell.
        assert!(!NumericRule::new(Operator::Ge, Some(0.0), None).matches(None));
    }

    #[test]
    fn test_between_is_order_independent() {
        for x in [0.0, 1.0, 3.0, 5.0, 5.5] {
            assert_eq!(
                NumericRule::between(5.0, 1.0).matches(Some(x)),
                NumericRule::between(1.0, 5.0).matches(Some(x)),
            );
        }
        assert!(NumericRule::between(5.0, 1.0).matches(Some(1.0)));
        assert!(NumericRule::between(5.0, 1.0).matches(Some(5.0)));
        assert!(!NumericRule::between(5.0, 1.0).matches(Some(5.5)));
    }

    #[test]
    fn test_missing_operand_is_noop() {
        let rule = NumericRule::new(Operator::Between, Some(1.0), None);
        assert!(rule.is_noop());
        assert!(rule.matches(None));
        assert!(NumericRule::new(Operator::Gt, None, Some(3.0)).is_noop());
    }

    #[test]
    fn test_numeric_rules_conjoined() {
        let mut a = record("PE", "a", "Caatinga", "2024-01-01 10:00");
        a.fire_risk_index = 0.9;
        a.frp = Some(50.0);
        let mut b = record("PE", "b", "Caatinga", "2024-01-01 10:00");
        b.fire_risk_index = 0.9;
        b.frp = Some(5.0);
        let mut c = record("PE", "c", "Caatinga", "2024-01-01 10:00");
        c.fire_risk_index = 0.2;
        c.frp = Some(80.0);
        let d = record("PE", "d", "Caatinga", "2024-01-01 10:00");
        let ds = dataset(vec![a, b, c, d]);

        let mut rules = NumericRules::new();
        rules.insert(
            NumericField::RiskIndex,
            NumericRule::new(Operator::Ge, Some(0.8), None),
        );
        rules.insert(NumericField::Frp, NumericRule::between(100.0, 10.0));
        rules.insert(NumericField::Precipitation, NumericRule::default());

        let out = filter_numeric(&ds, &rules).unwrap();
        assert_eq!(municipalities(&out), vec!["a"]);
    }

    #[test]
    fn test_rule_on_missing_column_fails() {
        let ds = Dataset::new(
            vec![record("PE", "a", "Caatinga", "2024-01-01 10:00")],
            Schema::default(),
        );
        let mut rules = NumericRules::new();
        rules.insert(NumericField::Frp, NumericRule::default());
        assert_eq!(
            filter_numeric(&ds, &rules),
            Err(FilterError::MissingColumn(NumericField::Frp))
        );
    }

    #[test]
    fn test_region_and_date_scenario() {
        let ds = dataset(vec![
            record("PE", "first", "Caatinga", "2024-01-01 00:00"),
            record("PE", "second", "Caatinga", "2024-01-03 00:00"),
            record("BA", "third", "Caatinga", "2024-01-02 00:00"),
        ]);
        let criteria = FilterCriteria {
            region: RegionSelector::Only("PE".into()),
            dates: Some(DateRange {
                start: day(2024, 1, 1),
                end: day(2024, 1, 2),
            }),
            ..Default::default()
        };
        let out = apply(&ds, &criteria).unwrap();
        assert_eq!(municipalities(&out), vec!["first"]);
    }

    #[test]
    fn test_default_criteria_pass_everything() {
        let ds = sample();
        assert_eq!(apply(&ds, &FilterCriteria::default()).unwrap(), ds);
    }
}
