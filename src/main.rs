mod app;
mod cache;
mod color;
mod config;
mod data;
mod ingest;
mod state;
mod ui;

use anyhow::anyhow;
use app::VigiaApp;
use config::Config;
use eframe::egui;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::discover()?;
    log::debug!("Using source {}", config.source.url);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Painel de Queimadas")
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Vigia – Painel de Queimadas",
        options,
        Box::new(move |cc| {
            // Install image loaders so egui can render the png/jpg logo.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            let app = VigiaApp::new(config);
            ui::theme::apply(&cc.egui_ctx, app.accent);
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow!("eframe failed: {e}"))
}
