use std::path::Path;
use std::sync::Arc;

use eframe::egui::{self, Color32};

use crate::cache::TtlCache;
use crate::color;
use crate::config::Config;
use crate::data::error::LoadError;
use crate::data::model::Dataset;
use crate::data::{loader, normalize};
use crate::ingest;
use crate::state::AppState;
use crate::ui::panels::{self, UiAction};
use crate::ui::{sections, theme};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct VigiaApp {
    pub state: AppState,
    config: Config,
    datasets: TtlCache<String, Arc<Dataset>>,
    logos: TtlCache<String, Arc<[u8]>>,
    logo: Option<Arc<[u8]>>,
    pub accent: Color32,
}

impl VigiaApp {
    pub fn new(config: Config) -> Self {
        let accent = color::parse_hex(&config.ui.primary_color).unwrap_or_else(|| {
            log::warn!(
                "Invalid primary colour {:?}, using the default",
                config.ui.primary_color
            );
            color::TOMATO
        });

        let mut app = Self {
            state: AppState::new(config.analysis.clone()),
            config,
            datasets: TtlCache::new(),
            logos: TtlCache::new(),
            logo: None,
            accent,
        };
        app.load_logo();
        app.load_remote();
        app
    }

    fn load_logo(&mut self) {
        let source = &self.config.source;
        let result = self
            .logos
            .get_or_fetch(&source.logo_url, source.cache_ttl(), |url| {
                ingest::download_bytes(url, source.timeout()).map(Arc::from)
            });
        self.logo = match result {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!("Could not load logo: {e}");
                None
            }
        };
    }

    /// Fetch (or reuse) the remote dataset and hand it to the state.
    fn load_remote(&mut self) {
        let source = &self.config.source;
        let url = source.url.clone();
        let result = self
            .datasets
            .get_or_fetch(&url, source.cache_ttl(), |url| {
                fetch_dataset(url, source.timeout())
            });

        match result {
            Ok(ds) => {
                log::info!("Dataset ready: {} detections", ds.len());
                self.state.set_dataset(ds, url);
            }
            Err(e) => {
                log::error!("Failed to load {url}: {e}");
                self.state.set_load_error(e.to_string());
            }
        }
    }

    fn reload_remote(&mut self) {
        self.datasets.invalidate(&self.config.source.url);
        self.load_remote();
    }

    fn load_local(&mut self, path: &Path) {
        match loader::load_file(path).and_then(|table| normalize::normalize(&table)) {
            Ok(ds) => {
                log::info!("Loaded {} detections from {}", ds.len(), path.display());
                self.state.set_dataset(Arc::new(ds), path.display().to_string());
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.state.status_message = Some(format!("Erro: {e}"));
            }
        }
    }
}

fn fetch_dataset(url: &str, timeout: std::time::Duration) -> Result<Arc<Dataset>, LoadError> {
    let text = ingest::download_text(url, timeout)?;
    let table = loader::parse_csv_text(&text)?;
    Ok(Arc::new(normalize::normalize(&table)?))
}

impl eframe::App for VigiaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        let action = egui::TopBottomPanel::top("top_bar")
            .show(ctx, |ui| panels::top_bar(ui, &self.state))
            .inner;
        match action {
            Some(UiAction::OpenFile(path)) => self.load_local(&path),
            Some(UiAction::Reload) => self.reload_remote(),
            None => {}
        }

        // ---- Left side panel: filters ----
        let accent = self.accent;
        let analyze = egui::SidePanel::left("filter_panel")
            .default_width(280.0)
            .resizable(true)
            .frame(egui::Frame::side_top_panel(&ctx.style()).fill(theme::SIDEBAR))
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state, self.logo.as_ref(), accent)
            })
            .inner;
        if analyze {
            self.state.run_analysis();
        }

        // ---- Central panel: dashboard ----
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| sections::central(ui, &mut self.state, accent));
        });
    }
}
