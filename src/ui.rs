// src/ui.rs
use std::time::Duration;

use anyhow::{Context, Result};
use egui::{Align, Color32, ImageData, Layout, Sense, TextureHandle, TextureOptions, Vec2};
use log::{debug, info};

use crate::{
    camera::NokhwaCapture,
    config::{AppConfig, CameraConfig, ModelConfig},
    detector::YoloDetector,
    labels::ClassNameTable,
    overlay::OverlayRenderer,
    worker::{DetectionWorker, Pipeline, WorkerEvent, WorkerState},
};

/// Which of the Start / Stop buttons accept clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Controls {
    start_enabled: bool,
    stop_enabled: bool,
}

/// Start and Stop are enabled complementarily; a dead worker takes Start away.
fn controls(detecting: bool, worker_alive: bool) -> Controls {
    Controls {
        start_enabled: !detecting && worker_alive,
        stop_enabled: detecting,
    }
}

/// The video surface is polled only while a session is active.
fn should_schedule_refresh(detecting: bool) -> bool {
    detecting
}

pub struct ObjectDetectionApp {
    texture: Option<TextureHandle>,
    worker: DetectionWorker,
    display_size: Vec2,
    refresh_interval: Duration,
    status: Option<String>,
}

impl ObjectDetectionApp {
    /// Opens the camera and loads the model on the worker thread. Either
    /// failing aborts startup.
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig) -> Result<Self> {
        info!("Initializing ObjectDetectionApp");
        let camera_config = config.camera.clone();
        let model_config = config.model.clone();
        let worker = DetectionWorker::spawn(
            move || open_pipeline(&camera_config, &model_config),
            config.display_size(),
            cc.egui_ctx.clone(),
        )?;

        Ok(Self {
            texture: None,
            worker,
            display_size: Vec2::new(config.display_width as f32, config.display_height as f32),
            refresh_interval: config.refresh_interval,
            status: None,
        })
    }

    fn start_detection(&mut self) {
        if self.worker.start() {
            self.status = None;
        }
    }

    fn stop_detection(&mut self) {
        self.worker.stop();
    }

    fn quit(&mut self, ctx: &egui::Context) {
        info!("Quit requested.");
        self.worker.shutdown();
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    /// Pulls whatever the worker published last into the video texture.
    fn refresh_frame(&mut self, ctx: &egui::Context) {
        let Some(frame) = self.worker.take_latest_frame() else {
            return;
        };
        match self.texture {
            Some(ref mut texture) => {
                texture.set(ImageData::Color(frame), TextureOptions::LINEAR);
            }
            None => {
                debug!("Creating texture with size: {:?}", frame.size);
                self.texture = Some(ctx.load_texture(
                    "webcam_stream",
                    ImageData::Color(frame),
                    TextureOptions::LINEAR,
                ));
            }
        }
    }

    fn collect_status(&mut self) {
        for event in self.worker.drain_events() {
            self.status = Some(match event {
                WorkerEvent::StreamEnded => {
                    "Video stream ended or unable to read a frame.".to_string()
                }
                WorkerEvent::DetectorFailed(err) => format!("Detection failed: {}", err),
            });
        }
        if let Some(msg) = self.worker.reap_if_finished() {
            self.status = Some(msg);
        }
    }
}

impl eframe::App for ObjectDetectionApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.collect_status();
        self.refresh_frame(ctx);

        let buttons = controls(self.worker.is_detecting(), self.worker.is_alive());

        egui::TopBottomPanel::bottom("status_panel")
            .resizable(false)
            .show(ctx, |ui| {
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    let (w, h) = self.worker.camera_resolution();
                    ui.label(format!("Cam Res: {}x{}", w, h));
                    ui.add_space(10.0);
                    ui.label(match self.worker.state() {
                        WorkerState::Idle => "Idle",
                        WorkerState::Running => "Detecting",
                        WorkerState::Stopping => "Stopping...",
                    });
                    if let Some(status) = &self.status {
                        ui.add_space(10.0);
                        ui.colored_label(Color32::YELLOW, status);
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                match &self.texture {
                    Some(texture) => {
                        ui.add(egui::Image::new(texture).fit_to_exact_size(self.display_size));
                    }
                    None => {
                        let (rect, _) = ui.allocate_exact_size(self.display_size, Sense::hover());
                        ui.painter().rect_filled(rect, 0.0, Color32::BLACK);
                    }
                }
                ui.add_space(10.0);

                ui.horizontal(|ui| {
                    // Rough centering of the two-button row.
                    ui.add_space((ui.available_width() - 260.0).max(0.0) / 2.0);
                    if ui
                        .add_enabled(buttons.start_enabled, egui::Button::new("Start Detection"))
                        .clicked()
                    {
                        self.start_detection();
                    }
                    ui.add_space(5.0);
                    if ui
                        .add_enabled(buttons.stop_enabled, egui::Button::new("Stop Detection"))
                        .clicked()
                    {
                        self.stop_detection();
                    }
                });
                ui.add_space(5.0);
                if ui.button("Quit").clicked() {
                    self.quit(ctx);
                }
            });
        });

        if should_schedule_refresh(self.worker.is_detecting()) {
            ctx.request_repaint_after(self.refresh_interval);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Exit requested. Stopping detection worker...");
        self.worker.shutdown();
    }
}

fn open_pipeline(camera: &CameraConfig, model: &ModelConfig) -> Result<Pipeline> {
    let capture = NokhwaCapture::open(camera).context("Failed to open camera")?;
    let detector = YoloDetector::new(model, ClassNameTable::coco())
        .context("Failed to load detection model")?;
    let renderer = OverlayRenderer::new(ClassNameTable::coco())?;
    Ok(Pipeline {
        capture: Box::new(capture),
        detector: Box::new(detector),
        renderer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_is_disabled_at_startup() {
        let c = controls(false, true);
        assert!(c.start_enabled);
        assert!(!c.stop_enabled);
    }

    #[test]
    fn start_and_stop_toggle_complementarily() {
        for detecting in [false, true] {
            let c = controls(detecting, true);
            assert_ne!(c.start_enabled, c.stop_enabled);
            assert_eq!(c.stop_enabled, detecting);
        }
    }

    #[test]
    fn dead_worker_disables_start() {
        assert_eq!(
            controls(false, false),
            Controls {
                start_enabled: false,
                stop_enabled: false,
            }
        );
    }

    #[test]
    fn refresh_is_scheduled_only_while_detecting() {
        assert!(should_schedule_refresh(true));
        assert!(!should_schedule_refresh(false));
    }
}
