// src/main.rs
#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod camera;
mod config;
mod detector;
mod display;
mod fps;
mod labels;
mod overlay;
mod slot;
mod ui;
mod worker;

use anyhow::anyhow;

use crate::config::AppConfig;

type AppResult = Result<Box<dyn eframe::App>, Box<dyn std::error::Error + Send + Sync>>;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Starting Object Detection App");

    let config = AppConfig::default();
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(config.title.clone())
            .with_inner_size(config.window_size())
            .with_resizable(false),
        ..Default::default()
    };

    let title = config.title.clone();
    eframe::run_native(
        &title,
        native_options,
        Box::new(move |cc| -> AppResult {
            Ok(Box::new(ui::ObjectDetectionApp::new(cc, config)?))
        }),
    )
    .map_err(|e| anyhow!("{}", e))
}
