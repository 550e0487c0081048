use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};

use crate::color::ColorMap;
use crate::config::AnalysisConfig;
use crate::data::aggregate::{
    self, CategoryCount, CriticalRegion, DayCount, FieldStats, HistogramBin, SeriesPoint, Summary,
};
use crate::data::filter::{
    self, DateRange, FilterCriteria, NumericRule, Operator, RegionSelector, Shift, TimeOfDay,
};
use crate::data::model::{Dataset, Dimension, NumericField};

// ---------------------------------------------------------------------------
// Sidebar inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeMode {
    Any,
    Preset,
    Custom,
}

/// Editable threshold for one numeric column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleInput {
    pub op: Operator,
    pub first: f64,
    pub second: f64,
}

impl RuleInput {
    fn rule(&self) -> NumericRule {
        NumericRule::new(self.op, Some(self.first), Some(self.second))
    }
}

/// Raw widget values; turned into [`FilterCriteria`] on "Analisar".
#[derive(Debug, Clone, PartialEq)]
pub struct SidebarInputs {
    pub region: RegionSelector,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub biomes: BTreeSet<String>,
    pub time_mode: TimeMode,
    pub shift: Shift,
    /// Custom range as (hour, minute) pairs.
    pub custom_start: (u32, u32),
    pub custom_end: (u32, u32),
    pub rules: BTreeMap<NumericField, RuleInput>,
}

impl SidebarInputs {
    /// Widgets reset to the full extent of `dataset`.
    pub fn for_dataset(dataset: &Dataset) -> Self {
        let today = chrono::Local::now().date_naive();
        let (start, end) = dataset.date_bounds().unwrap_or((today, today));

        let rules = NumericField::ALL
            .iter()
            .filter(|f| dataset.schema().has_field(**f))
            .map(|f| {
                let input = RuleInput {
                    op: Operator::None,
                    first: 0.0,
                    second: 0.0,
                };
                (*f, input)
            })
            .collect();

        Self {
            region: RegionSelector::All,
            start,
            end,
            biomes: BTreeSet::new(),
            time_mode: TimeMode::Any,
            shift: Shift::Madrugada,
            custom_start: (22, 0),
            custom_end: (2, 0),
            rules,
        }
    }

    pub fn criteria(&self) -> FilterCriteria {
        let time_of_day = match self.time_mode {
            TimeMode::Any => TimeOfDay::Any,
            TimeMode::Preset => TimeOfDay::Preset(self.shift),
            TimeMode::Custom => match (clock(self.custom_start), clock(self.custom_end)) {
                (Some(start), Some(end)) => TimeOfDay::Custom { start, end },
                _ => TimeOfDay::Any,
            },
        };

        FilterCriteria {
            region: self.region.clone(),
            dates: Some(DateRange {
                start: self.start,
                end: self.end,
            }),
            biomes: self.biomes.clone(),
            time_of_day,
            numeric_rules: self
                .rules
                .iter()
                .map(|(field, input)| (*field, input.rule()))
                .collect(),
        }
    }
}

fn clock((h, m): (u32, u32)) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(h, m, 0)
}

// ---------------------------------------------------------------------------
// Analysis – everything the tabs render
// ---------------------------------------------------------------------------

/// Aggregates computed once per "Analisar" click.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub region: RegionSelector,
    pub dates: DateRange,
    pub dataset: Dataset,
    pub summary: Summary,
    pub critical: Vec<CriticalRegion>,
    pub by_day: Vec<DayCount>,
    pub series_by_region: Vec<SeriesPoint>,
    pub series_by_biome: Vec<SeriesPoint>,
    pub by_biome: Vec<CategoryCount>,
    pub top_municipalities: Vec<CategoryCount>,
    pub stats: Vec<FieldStats>,
    pub risk_histogram: Vec<HistogramBin>,
    pub biome_colors: ColorMap,
    pub region_colors: ColorMap,
}

impl Analysis {
    pub fn compute(
        dataset: Dataset,
        region: RegionSelector,
        dates: DateRange,
        config: &AnalysisConfig,
    ) -> Self {
        let by_biome = aggregate::by_category(&dataset, Dimension::Biome);
        Analysis {
            summary: aggregate::summary(&dataset),
            critical: aggregate::critical_regions(&dataset, config.critical_regions),
            by_day: aggregate::by_day(&dataset),
            series_by_region: aggregate::series_by_dimension(&dataset, Dimension::Region),
            series_by_biome: aggregate::series_by_dimension(&dataset, Dimension::Biome),
            top_municipalities: aggregate::top_n(
                &dataset,
                Dimension::Municipality,
                config.top_municipalities,
            ),
            stats: aggregate::describe_all(&dataset),
            risk_histogram: aggregate::histogram(
                &dataset,
                NumericField::RiskIndex,
                config.histogram_bins,
            ),
            biome_colors: ColorMap::new(dataset.biomes()),
            region_colors: ColorMap::new(dataset.regions()),
            by_biome,
            region,
            dates,
            dataset,
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Summary,
    TimeSeries,
    BiomeMunicipality,
    Statistics,
    Prevention,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Summary,
        Tab::TimeSeries,
        Tab::BiomeMunicipality,
        Tab::Statistics,
        Tab::Prevention,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Summary => "🗺 Mapa e Métricas",
            Tab::TimeSeries => "📈 Séries Temporais",
            Tab::BiomeMunicipality => "🌳 Bioma & Município",
            Tab::Statistics => "📊 Estatística",
            Tab::Prevention => "💡 Prevenção",
        }
    }
}

/// What the central panel should show.
#[derive(Debug)]
pub enum DashboardView<'a> {
    /// The dataset could not be loaded.
    LoadFailed(&'a str),
    /// Loaded, waiting for the user to run an analysis.
    AwaitingAnalysis,
    /// The filters matched nothing.
    NoMatches,
    Ready(&'a Analysis),
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub analysis_config: AnalysisConfig,

    /// Loaded dataset (empty after a failed load).
    pub dataset: Arc<Dataset>,

    /// Where the dataset came from (URL or file path).
    pub source_label: Option<String>,

    /// Set when the last load attempt failed.
    pub load_error: Option<String>,

    pub inputs: SidebarInputs,

    /// Result of the last "Analisar" click; `None` before the first one.
    pub analysis: Option<Analysis>,

    pub tab: Tab,

    pub show_raw_data: bool,

    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(analysis_config: AnalysisConfig) -> Self {
        let dataset = Arc::new(Dataset::empty(Default::default()));
        let inputs = SidebarInputs::for_dataset(&dataset);
        Self {
            analysis_config,
            dataset,
            source_label: None,
            load_error: None,
            inputs,
            analysis: None,
            tab: Tab::Summary,
            show_raw_data: false,
            status_message: None,
        }
    }

    /// Ingest a newly loaded dataset and reset the filters to its extent.
    pub fn set_dataset(&mut self, dataset: Arc<Dataset>, source: String) {
        self.inputs = SidebarInputs::for_dataset(&dataset);
        self.dataset = dataset;
        self.source_label = Some(source);
        self.load_error = None;
        self.analysis = None;
        self.status_message = None;
    }

    /// Record a failed load; downstream views see an empty dataset.
    pub fn set_load_error(&mut self, message: String) {
        self.dataset = Arc::new(Dataset::empty(Default::default()));
        self.inputs = SidebarInputs::for_dataset(&self.dataset);
        self.load_error = Some(message);
        self.analysis = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.load_error.is_none() && !self.dataset.is_empty()
    }

    /// Run the filter chain and all aggregators for the current inputs.
    pub fn run_analysis(&mut self) {
        let criteria = self.inputs.criteria();
        match filter::apply(&self.dataset, &criteria) {
            Ok(filtered) => {
                log::info!(
                    "Analysis for {}: {} of {} detections match",
                    criteria.region,
                    filtered.len(),
                    self.dataset.len()
                );
                let dates = DateRange {
                    start: self.inputs.start,
                    end: self.inputs.end,
                };
                self.analysis = Some(Analysis::compute(
                    filtered,
                    criteria.region,
                    dates,
                    &self.analysis_config,
                ));
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Filter failed: {e}");
                self.status_message = Some(format!("Erro: {e}"));
                self.analysis = None;
            }
        }
    }

    pub fn view(&self) -> DashboardView<'_> {
        if let Some(err) = &self.load_error {
            return DashboardView::LoadFailed(err);
        }
        match &self.analysis {
            None => DashboardView::AwaitingAnalysis,
            Some(a) if a.dataset.is_empty() => DashboardView::NoMatches,
            Some(a) => DashboardView::Ready(a),
        }
    }
}
