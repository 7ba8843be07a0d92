// src/config.rs
use std::{path::PathBuf, time::Duration};

// --- Defaults ---
const DISPLAY_WIDTH: u32 = 800;
const DISPLAY_HEIGHT: u32 = 600;
const REQUESTED_WIDTH: u32 = 1280;
const REQUESTED_HEIGHT: u32 = 720;
const REQUESTED_FPS: u32 = 30;
const MODEL_PATH: &str = "../Yolo-Weights/yolov8x.onnx";
const REFRESH_INTERVAL: Duration = Duration::from_millis(10);

/// Everything the app needs at startup. Compiled in; nothing is read from
/// the command line or the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    pub display_width: u32,
    pub display_height: u32,
    pub refresh_interval: Duration,
    pub camera: CameraConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone)]
pub struct CameraConfig {
    pub device_index: u32,
    pub requested_width: u32,
    pub requested_height: u32,
    pub requested_fps: u32,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model_path: PathBuf,
    pub device: String,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Object Detection App".to_string(),
            display_width: DISPLAY_WIDTH,
            display_height: DISPLAY_HEIGHT,
            refresh_interval: REFRESH_INTERVAL,
            camera: CameraConfig::default(),
            model: ModelConfig::default(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            requested_width: REQUESTED_WIDTH,
            requested_height: REQUESTED_HEIGHT,
            requested_fps: REQUESTED_FPS,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(MODEL_PATH),
            device: "cpu".to_string(),
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
        }
    }
}

impl AppConfig {
    pub fn display_size(&self) -> (u32, u32) {
        (self.display_width, self.display_height)
    }

    /// Window inner size: the video surface plus padding and the button rows.
    pub fn window_size(&self) -> [f32; 2] {
        [
            self.display_width as f32 + 20.0,
            self.display_height as f32 + 110.0,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_setup() {
        let config = AppConfig::default();
        assert_eq!(config.display_size(), (800, 600));
        assert_eq!(config.camera.requested_width, 1280);
        assert_eq!(config.camera.requested_height, 720);
        assert_eq!(config.refresh_interval, Duration::from_millis(10));
        assert!(config.model.model_path.ends_with("yolov8x.onnx"));
    }

    #[test]
    fn window_leaves_room_for_controls() {
        let config = AppConfig::default();
        let [w, h] = config.window_size();
        assert!(w >= config.display_width as f32);
        assert!(h > config.display_height as f32);
    }
}
