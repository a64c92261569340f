// src/main.rs
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
mod config;
mod drivers;
mod engine;
mod gui;
mod types;
use config::PanelConfig;
use eframe::egui;
// 入口函数
fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = PanelConfig::load()?;
    log::info!("Starting with {:?}", config);
    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1280.0, 760.0])
        .with_min_inner_size([900.0, 560.0])
        .with_title("Seismic Panel");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "SeismicPanel",
        options,
        Box::new(move |cc| Box::new(gui::SeismicPanelApp::new(cc.egui_ctx.clone(), config))),
    )
    .map_err(|e| anyhow::anyhow!("failed to start the panel window: {e}"))
}
