use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::aggregate::{CriticalRegion, FieldStats};
use crate::data::model::{Dataset, Dimension, FireRecord};
use crate::state::{Analysis, AppState, DashboardView, Tab};
use crate::ui::{plot, theme};

const ROW_HEIGHT: f32 = 18.0;

const PREVENTION_TIPS: [(&str, &str); 6] = [
    ("🚭 Não jogue bitucas de cigarro", "pela janela do carro ou em áreas de vegetação."),
    ("🗑 Não queime lixo", "em quintais, terrenos ou qualquer área com vegetação. A prática é ilegal e perigosa."),
    ("🏕 Cuidado com fogueiras:", "se precisar acender uma, escolha um local limpo, longe de árvores e vegetação seca. Apague completamente com água e terra antes de sair."),
    ("🎈 Não solte balões:", "além de ser crime, balões podem cair em florestas e iniciar grandes incêndios."),
    ("🏡 Manutenção de terrenos:", "mantenha seu terreno limpo, criando uma faixa livre de vegetação seca (aceiro) ao redor de sua propriedade."),
    ("📞 Avise sobre focos de incêndio:", "se avistar um foco, ligue imediatamente para o Corpo de Bombeiros (193) ou para a Defesa Civil (199)."),
];

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

pub fn central(ui: &mut Ui, state: &mut AppState, accent: Color32) {
    ui.heading(RichText::new("🔥 Painel de Análise de Queimadas no Brasil").color(theme::HEADING).size(26.0));
    ui.label("Este painel realiza uma análise interativa de focos de queimadas com base em um arquivo de dados da web.");
    ui.add_space(8.0);

    // Tab and expander state are written after the immutable view is done.
    let mut tab = state.tab;
    let mut show_raw = state.show_raw_data;

    match state.view() {
        DashboardView::LoadFailed(err) => {
            ui.label(RichText::new(format!("Erro ao carregar os dados: {err}")).color(Color32::RED));
            ui.label(
                RichText::new("Os dados não puderam ser carregados. Verifique os erros acima.")
                    .color(Color32::YELLOW),
            );
        }
        DashboardView::AwaitingAnalysis => {
            ui.label(
                RichText::new("⬅️ Selecione os filtros na barra lateral e clique em 'Analisar' para começar.")
                    .color(Color32::LIGHT_BLUE),
            );
        }
        DashboardView::NoMatches => {
            ui.label(
                RichText::new("Nenhum foco de queimada foi encontrado para os filtros selecionados.")
                    .color(Color32::YELLOW),
            );
        }
        DashboardView::Ready(analysis) => {
            ready(ui, analysis, &mut tab, &mut show_raw, accent);
        }
    }

    state.tab = tab;
    state.show_raw_data = show_raw;
}

fn ready(ui: &mut Ui, a: &Analysis, tab: &mut Tab, show_raw: &mut bool, accent: Color32) {
    ui.label(
        RichText::new(format!(
            "Análise concluída para {} entre {} e {}!",
            a.region,
            a.dates.start.format("%d/%m/%Y"),
            a.dates.end.format("%d/%m/%Y"),
        ))
        .color(Color32::LIGHT_GREEN)
        .strong(),
    );
    ui.add_space(8.0);

    ui.push_id("critical_regions", |ui: &mut Ui| critical_table(ui, &a.critical));
    ui.add_space(8.0);

    ui.horizontal(|ui: &mut Ui| {
        for t in Tab::ALL {
            ui.selectable_value(tab, t, t.label());
        }
    });
    ui.separator();

    match tab {
        Tab::Summary => {
            ui.heading(format!("Resumo para {}", a.region));
            metrics(ui, a);
            ui.add_space(8.0);
            ui.heading("Mapa de Distribuição dos Focos");
            plot::fire_map(ui, &a.dataset, &a.biome_colors, &a.critical);
        }
        Tab::TimeSeries => {
            ui.heading("Focos de Queimada ao Longo do Tempo");
            plot::daily_counts(ui, &a.by_day, accent);
            ui.heading(format!("Focos diários por {}", Dimension::Region.label()));
            plot::series(ui, "series_by_region", &a.series_by_region, &a.region_colors);
            ui.heading(format!("Focos diários por {}", Dimension::Biome.label()));
            plot::series(ui, "series_by_biome", &a.series_by_biome, &a.biome_colors);
        }
        Tab::BiomeMunicipality => {
            ui.heading("Distribuição de Focos por Bioma");
            plot::category_bars(ui, "biome_bars", &a.by_biome, Some(&a.biome_colors), accent);
            ui.heading(format!("Top {} Municípios com Mais Focos", a.top_municipalities.len()));
            plot::category_bars(ui, "municipality_bars", &a.top_municipalities, None, accent);
        }
        Tab::Statistics => {
            ui.heading("Estatística Descritiva");
            stats_grid(ui, &a.stats);
            ui.add_space(8.0);
            ui.heading("Distribuição do Risco de Fogo");
            plot::risk_histogram(ui, &a.risk_histogram, accent);
        }
        Tab::Prevention => prevention(ui),
    }

    ui.add_space(12.0);
    let raw = egui::CollapsingHeader::new(RAW_DATA_TITLE)
        .id_salt("raw_data")
        .open(Some(*show_raw))
        .show(ui, |ui: &mut Ui| raw_table(ui, &a.dataset));
    if raw.header_response.clicked() {
        *show_raw = !*show_raw;
    }
}

// ---------------------------------------------------------------------------
// Widgets
// ---------------------------------------------------------------------------

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(label).small());
        ui.label(RichText::new(value).size(22.0).color(theme::HEADING));
    });
}

fn metrics(ui: &mut Ui, a: &Analysis) {
    let s = &a.summary;
    ui.columns(4, |cols| {
        metric(&mut cols[0], "Total de Focos no Período", format!("{} 🔥", s.total));
        metric(
            &mut cols[1],
            "Município com Mais Focos",
            s.top_municipality.clone().unwrap_or_else(|| "N/A".into()),
        );
        metric(&mut cols[2], "Nº de Municípios Afetados", s.municipalities.to_string());
        metric(
            &mut cols[3],
            "Média de Dias Sem Chuva",
            s.mean_rain_free_days
                .map_or_else(|| "N/A".into(), |d| format!("{d:.1} dias")),
        );
    });
}

fn opt(v: Option<f64>, decimals: usize) -> String {
    v.map_or_else(|| "–".into(), |v| format!("{v:.decimals$}"))
}

const CRITICAL_COLUMNS: [&str; 11] = [
    "#",
    "Estado",
    "Município",
    "Bioma",
    "Focos",
    "Risco médio",
    "FRP médio",
    "FRP máx.",
    "Precipitação média",
    "Dias sem chuva (média)",
    "Pontuação",
];

fn critical_table(ui: &mut Ui, critical: &[CriticalRegion]) {
    ui.heading("Regiões Críticas");
    if critical.is_empty() {
        return;
    }

    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::auto())
        .columns(Column::auto().at_least(80.0), 3)
        .columns(Column::auto(), CRITICAL_COLUMNS.len() - 4)
        .header(ROW_HEIGHT + 2.0, |mut header| {
            for title in CRITICAL_COLUMNS {
                header.col(|ui: &mut Ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for (rank, c) in critical.iter().enumerate() {
                let cells = critical_cells(rank, c);
                let last = cells.len() - 1;
                body.row(ROW_HEIGHT, |mut row| {
                    for (i, cell) in cells.iter().enumerate() {
                        row.col(|ui: &mut Ui| {
                            if i == last {
                                ui.strong(cell.as_str());
                            } else {
                                ui.label(cell.as_str());
                            }
                        });
                    }
                });
            }
        });
}

/// One table row, in [`CRITICAL_COLUMNS`] order.
fn critical_cells(rank: usize, c: &CriticalRegion) -> [String; CRITICAL_COLUMNS.len()] {
    [
        (rank + 1).to_string(),
        c.region_name.clone(),
        c.municipality_name.clone(),
        c.biome.clone(),
        c.count.to_string(),
        format!("{:.2}", c.mean_risk),
        opt(c.mean_frp, 1),
        opt(c.max_frp, 1),
        opt(c.mean_precipitation, 1),
        opt(c.mean_rain_free_days, 1),
        format!("{:.1}", c.score),
    ]
}

fn stats_grid(ui: &mut Ui, stats: &[FieldStats]) {
    if stats.is_empty() {
        ui.label("Sem valores numéricos no filtro atual.");
        return;
    }

    egui::Grid::new("stats_grid")
        .striped(true)
        .num_columns(9)
        .show(ui, |ui: &mut Ui| {
            for title in ["", "N", "Média", "Desvio", "Mín", "25%", "Mediana", "75%", "Máx"] {
                ui.strong(title);
            }
            ui.end_row();

            for s in stats {
                ui.label(s.field.label());
                ui.label(s.count.to_string());
                ui.label(format!("{:.3}", s.mean));
                ui.label(opt(s.std_dev, 3));
                for v in [s.min, s.q1, s.median, s.q3, s.max] {
                    ui.label(format!("{v:.3}"));
                }
                ui.end_row();
            }
        });
}

fn prevention(ui: &mut Ui) {
    ui.heading("Como Prevenir Queimadas");
    ui.label(
        "A prevenção é a forma mais eficaz de combater os incêndios florestais. \
         A maioria deles começa por descuidos humanos. Siga estas dicas:",
    );
    ui.add_space(4.0);
    for (title, body) in PREVENTION_TIPS {
        ui.horizontal_wrapped(|ui: &mut Ui| {
            ui.label("•");
            ui.strong(title);
            ui.label(body);
        });
    }
}

// ---------------------------------------------------------------------------
// Raw data
// ---------------------------------------------------------------------------

const RAW_DATA_TITLE: &str = "Ver dados brutos (colunas normalizadas)";

const RAW_COLUMNS: [&str; 10] = [
    "Data/Hora",
    "Latitude",
    "Longitude",
    "Estado",
    "Município",
    "Bioma",
    "DiaSemChuva",
    "RiscoFogo",
    "FRP",
    "Precipitacao",
];

fn raw_cell(r: &FireRecord, col: usize) -> String {
    match col {
        0 => r.timestamp.format("%d/%m/%Y %H:%M").to_string(),
        1 => format!("{:.4}", r.latitude),
        2 => format!("{:.4}", r.longitude),
        3 => r.region_name.clone(),
        4 => r.municipality_name.clone(),
        5 => r.biome.clone(),
        6 => opt(r.rain_free_days, 0),
        7 => format!("{:.2}", r.fire_risk_index),
        8 => opt(r.frp, 1),
        _ => opt(r.precipitation, 1),
    }
}

fn raw_table(ui: &mut Ui, dataset: &Dataset) {
    let records = dataset.records();
    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(400.0)
        .columns(Column::auto().at_least(60.0), RAW_COLUMNS.len())
        .header(ROW_HEIGHT + 2.0, |mut header| {
            for title in RAW_COLUMNS {
                header.col(|ui: &mut Ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, records.len(), |mut row| {
                let r = &records[row.index()];
                for col in 0..RAW_COLUMNS.len() {
                    row.col(|ui: &mut Ui| {
                        ui.label(raw_cell(r, col));
                    });
                }
            });
        });
}
