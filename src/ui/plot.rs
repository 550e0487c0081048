use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};
use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, MarkerShape, Plot, PlotPoints, Points};

use crate::color::{red_yellow_green, ColorMap};
use crate::data::aggregate::{CategoryCount, CriticalRegion, DayCount, HistogramBin, SeriesPoint};
use crate::data::model::Dataset;

const PLOT_HEIGHT: f32 = 320.0;

// ---------------------------------------------------------------------------
// Date axis helpers
// ---------------------------------------------------------------------------

/// Dates are plotted as days since the common era.
fn date_x(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

fn format_date_mark(mark: GridMark, _range: &RangeInclusive<f64>) -> String {
    let days = mark.value.round();
    if (mark.value - days).abs() > 1e-6 || days < i32::MIN as f64 || days > i32::MAX as f64 {
        return String::new();
    }
    NaiveDate::from_num_days_from_ce_opt(days as i32)
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}

fn date_plot(id: &str) -> Plot<'static> {
    Plot::new(id.to_owned())
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .x_axis_formatter(format_date_mark)
        .y_axis_label("Focos")
        .allow_scroll(false)
}

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

/// Scatter of detections in lon/lat, coloured by biome. The most critical
/// groups are overlaid as larger diamonds.
pub fn fire_map(ui: &mut Ui, dataset: &Dataset, colors: &ColorMap, critical: &[CriticalRegion]) {
    let mut by_biome: BTreeMap<&str, Vec<[f64; 2]>> = BTreeMap::new();
    for r in dataset.records() {
        by_biome
            .entry(r.biome.as_str())
            .or_default()
            .push([r.longitude, r.latitude]);
    }

    Plot::new("fire_map")
        .height(PLOT_HEIGHT * 1.4)
        .data_aspect(1.0)
        .legend(Legend::default())
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .show(ui, |plot_ui| {
            for (biome, coords) in by_biome {
                plot_ui.points(
                    Points::new(PlotPoints::from(coords))
                        .name(biome)
                        .color(colors.color_for(biome))
                        .radius(2.0),
                );
            }

            let n = critical.len().max(1) as f32;
            for (rank, c) in critical.iter().enumerate() {
                plot_ui.points(
                    Points::new(vec![[c.mean_longitude, c.mean_latitude]])
                        .name(format!("#{} {} ({})", rank + 1, c.municipality_name, c.region_name))
                        .shape(MarkerShape::Diamond)
                        .color(red_yellow_green(rank as f32 / n))
                        .radius(7.0),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Time series
// ---------------------------------------------------------------------------

pub fn daily_counts(ui: &mut Ui, days: &[DayCount], accent: Color32) {
    let points: PlotPoints = days
        .iter()
        .map(|d| [date_x(d.date), d.count as f64])
        .collect();

    date_plot("daily_counts").show(ui, |plot_ui| {
        plot_ui.line(Line::new(points).name("Focos por dia").color(accent).width(2.0));
    });
}

/// One line per category (region or biome).
pub fn series(ui: &mut Ui, id: &str, points: &[SeriesPoint], colors: &ColorMap) {
    let mut lines: BTreeMap<&str, Vec<[f64; 2]>> = BTreeMap::new();
    for p in points {
        lines
            .entry(p.category.as_str())
            .or_default()
            .push([date_x(p.date), p.count as f64]);
    }

    date_plot(id).show(ui, |plot_ui| {
        for (category, coords) in lines {
            plot_ui.line(
                Line::new(PlotPoints::from(coords))
                    .name(category)
                    .color(colors.color_for(category))
                    .width(1.5),
            );
        }
    });
}

// ---------------------------------------------------------------------------
// Bars
// ---------------------------------------------------------------------------

/// Horizontal bars, first category on top.
pub fn category_bars(ui: &mut Ui, id: &str, counts: &[CategoryCount], colors: Option<&ColorMap>, accent: Color32) {
    let n = counts.len();
    let bars: Vec<Bar> = counts
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let color = colors.map_or(accent, |m| m.color_for(&c.category));
            Bar::new((n - i) as f64, c.count as f64)
                .name(&c.category)
                .fill(color)
                .width(0.7)
        })
        .collect();

    let labels: Vec<String> = counts.iter().map(|c| c.category.clone()).collect();

    Plot::new(id.to_owned())
        .height((n as f32 * 28.0).clamp(120.0, PLOT_HEIGHT * 1.5))
        .x_axis_label("Focos")
        .y_axis_formatter(move |mark, _range| {
            let pos = mark.value.round();
            if (mark.value - pos).abs() > 1e-6 || pos < 1.0 || pos > n as f64 {
                return String::new();
            }
            labels.get(n - pos as usize).cloned().unwrap_or_default()
        })
        .allow_scroll(false)
        .allow_drag(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal());
        });
}

pub fn risk_histogram(ui: &mut Ui, bins: &[HistogramBin], accent: Color32) {
    let bars: Vec<Bar> = bins
        .iter()
        .map(|b| {
            Bar::new((b.lower + b.upper) / 2.0, b.count as f64)
                .width(b.upper - b.lower)
                .name(format!("{:.2} – {:.2}", b.lower, b.upper))
        })
        .collect();

    Plot::new("risk_histogram")
        .height(PLOT_HEIGHT)
        .x_axis_label("Risco de Fogo")
        .y_axis_label("Focos")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(accent).name("Distribuição"));
        });
}
