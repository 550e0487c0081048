use std::path::PathBuf;
use std::sync::Arc;

use eframe::egui::{self, Color32, DragValue, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::filter::{Operator, RegionSelector, Shift, ALL_REGIONS};
use crate::state::{AppState, TimeMode};
use crate::ui::theme;

/// Requests from the top bar that need the app (cache, config) to handle.
pub enum UiAction {
    OpenFile(PathBuf),
    Reload,
}

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the filter sidebar. Returns `true` when "Analisar" was clicked.
pub fn side_panel(ui: &mut Ui, state: &mut AppState, logo: Option<&Arc<[u8]>>, accent: Color32) -> bool {
    // ---- Logo (centered) ----
    match logo {
        Some(bytes) => {
            ui.vertical_centered(|ui: &mut Ui| {
                ui.add(
                    egui::Image::from_bytes("bytes://vigia-logo", Arc::clone(bytes))
                        .max_width(ui.available_width() * 0.8)
                        .max_height(120.0),
                );
            });
        }
        None => {
            ui.label(RichText::new("Não foi possível carregar o logotipo.").color(Color32::YELLOW));
        }
    }
    ui.add_space(4.0);

    ui.heading(RichText::new("Filtros de Análise").color(theme::HEADING));
    ui.separator();

    if !state.is_loaded() {
        ui.add_enabled_ui(false, |ui: &mut Ui| {
            egui::ComboBox::from_id_salt("region_disabled")
                .selected_text("Dados não carregados")
                .show_ui(ui, |_ui: &mut Ui| {});
        });
        return false;
    }

    // Cheap clone so the widgets below can mutate `state.inputs`.
    let dataset = Arc::clone(&state.dataset);
    let mut analyze = false;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Region ----
            ui.strong("Selecione um Estado");
            egui::ComboBox::from_id_salt("region")
                .selected_text(state.inputs.region.to_string())
                .width(ui.available_width() - 8.0)
                .show_ui(ui, |ui: &mut Ui| {
                    ui.selectable_value(&mut state.inputs.region, RegionSelector::All, ALL_REGIONS);
                    for region in dataset.regions() {
                        ui.selectable_value(
                            &mut state.inputs.region,
                            RegionSelector::Only(region.clone()),
                            region.as_str(),
                        );
                    }
                });
            ui.add_space(6.0);

            // ---- Dates ----
            let (min_date, max_date) = dataset
                .date_bounds()
                .unwrap_or((state.inputs.start, state.inputs.end));
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Data de Início");
                ui.add(DatePickerButton::new(&mut state.inputs.start).id_salt("start_date"));
            });
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Data de Fim");
                ui.add(DatePickerButton::new(&mut state.inputs.end).id_salt("end_date"));
            });
            state.inputs.start = state.inputs.start.clamp(min_date, max_date);
            state.inputs.end = state.inputs.end.clamp(state.inputs.start, max_date);
            ui.add_space(6.0);

            // ---- Biomes ----
            let header = if state.inputs.biomes.is_empty() {
                "Biomas (todos)".to_string()
            } else {
                format!("Biomas ({}/{})", state.inputs.biomes.len(), dataset.biomes().len())
            };
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("biomes")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    if ui.small_button("Limpar").clicked() {
                        state.inputs.biomes.clear();
                    }
                    for biome in dataset.biomes() {
                        let mut checked = state.inputs.biomes.contains(biome);
                        if ui.checkbox(&mut checked, biome.as_str()).changed() {
                            if checked {
                                state.inputs.biomes.insert(biome.clone());
                            } else {
                                state.inputs.biomes.remove(biome);
                            }
                        }
                    }
                });

            // ---- Time of day ----
            egui::CollapsingHeader::new(RichText::new("Turno").strong())
                .id_salt("turno")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    time_of_day_widgets(ui, state);
                });

            // ---- Numeric rules ----
            egui::CollapsingHeader::new(RichText::new("Regras numéricas").strong())
                .id_salt("numeric_rules")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    numeric_rule_widgets(ui, state);
                });

            ui.add_space(10.0);
            let button = egui::Button::new(RichText::new("Analisar").strong().color(Color32::WHITE))
                .fill(accent)
                .min_size(egui::vec2(ui.available_width(), 28.0));
            if ui.add(button).clicked() {
                analyze = true;
            }
        });

    analyze
}

fn time_of_day_widgets(ui: &mut Ui, state: &mut AppState) {
    let inputs = &mut state.inputs;
    ui.radio_value(&mut inputs.time_mode, TimeMode::Any, "Qualquer horário");
    ui.radio_value(&mut inputs.time_mode, TimeMode::Preset, "Turno pré-definido");
    ui.radio_value(&mut inputs.time_mode, TimeMode::Custom, "Intervalo personalizado");

    match inputs.time_mode {
        TimeMode::Any => {}
        TimeMode::Preset => {
            egui::ComboBox::from_id_salt("shift")
                .selected_text(inputs.shift.label())
                .show_ui(ui, |ui: &mut Ui| {
                    for shift in Shift::ALL {
                        ui.selectable_value(&mut inputs.shift, shift, shift.label());
                    }
                });
        }
        TimeMode::Custom => {
            ui.horizontal(|ui: &mut Ui| {
                ui.label("De");
                ui.add(DragValue::new(&mut inputs.custom_start.0).range(0..=23).suffix("h"));
                ui.add(DragValue::new(&mut inputs.custom_start.1).range(0..=59).suffix("min"));
            });
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Até");
                ui.add(DragValue::new(&mut inputs.custom_end.0).range(0..=23).suffix("h"));
                ui.add(DragValue::new(&mut inputs.custom_end.1).range(0..=59).suffix("min"));
            });
            if inputs.custom_start > inputs.custom_end {
                ui.small("Intervalo atravessa a meia-noite.");
            }
        }
    }
}

fn numeric_rule_widgets(ui: &mut Ui, state: &mut AppState) {
    for (field, input) in state.inputs.rules.iter_mut() {
        ui.label(field.label());
        ui.horizontal(|ui: &mut Ui| {
            egui::ComboBox::from_id_salt(("rule_op", *field))
                .width(60.0)
                .selected_text(input.op.symbol())
                .show_ui(ui, |ui: &mut Ui| {
                    for op in Operator::ALL {
                        ui.selectable_value(&mut input.op, op, op.symbol());
                    }
                });
            if input.op != Operator::None {
                ui.add(DragValue::new(&mut input.first).speed(0.1));
            }
            if input.op == Operator::Between {
                ui.label("e");
                ui.add(DragValue::new(&mut input.second).speed(0.1));
            }
        });
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &AppState) -> Option<UiAction> {
    let mut action = None;

    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("Arquivo", |ui: &mut Ui| {
            if ui.button("Abrir arquivo local…").clicked() {
                action = pick_file().map(UiAction::OpenFile);
                ui.close_menu();
            }
            if ui.button("Recarregar da web").clicked() {
                action = Some(UiAction::Reload);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(src) = &state.source_label {
            ui.label(format!("{} focos carregados de {src}", state.dataset.len()));
        }
        if let Some(a) = &state.analysis {
            ui.separator();
            ui.label(format!("{} no filtro atual", a.dataset.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });

    action
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

fn pick_file() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Abrir focos de queimada")
        .add_filter("Arquivos suportados", &["csv", "parquet", "pq", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file()
}
