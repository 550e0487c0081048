use eframe::egui::{self, Color32};

pub const BACKGROUND: Color32 = Color32::from_rgb(0x1a, 0x1a, 0x1a);
pub const SIDEBAR: Color32 = Color32::from_rgb(0x26, 0x27, 0x30);
pub const HEADING: Color32 = Color32::from_rgb(0xf0, 0xf2, 0xf6);
pub const TEXT: Color32 = Color32::from_rgb(0xd1, 0xd1, 0xd1);

/// Dark theme with the accent colour on selections and links.
pub fn apply(ctx: &egui::Context, accent: Color32) {
    let mut visuals = egui::Visuals::dark();
    visuals.panel_fill = BACKGROUND;
    visuals.window_fill = SIDEBAR;
    visuals.extreme_bg_color = Color32::from_rgb(0x12, 0x12, 0x12);
    visuals.override_text_color = Some(TEXT);
    visuals.hyperlink_color = accent;
    visuals.selection.bg_fill = accent.gamma_multiply(0.6);
    visuals.selection.stroke.color = HEADING;
    ctx.set_visuals(visuals);
}
