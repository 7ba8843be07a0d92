// src/detector.rs
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use image::{DynamicImage, RgbImage};
use log::{debug, info, warn};
use usls::{models::YOLO, Options};

use crate::{config::ModelConfig, labels::ClassNameTable};

/// One model output in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub class_id: usize,
    pub confidence: f32,
}

impl Detection {
    /// Box corners truncated to whole pixels.
    pub fn corners(&self) -> (i32, i32, i32, i32) {
        (self.x1 as i32, self.y1 as i32, self.x2 as i32, self.y2 as i32)
    }
}

/// Anything that turns a frame into detections. Called serially from the
/// worker thread, one frame at a time.
pub trait Detector {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<Detection>>;
}

/// Pretrained YOLO detector backed by `usls`.
pub struct YoloDetector {
    model: YOLO,
}

impl YoloDetector {
    pub fn new(config: &ModelConfig, class_names: ClassNameTable) -> Result<Self> {
        if !config.model_path.exists() {
            return Err(anyhow!(
                "Model weights not found: {}",
                config.model_path.display()
            ));
        }
        let model_file = config
            .model_path
            .to_str()
            .ok_or_else(|| anyhow!("Model path is not valid UTF-8: {:?}", config.model_path))?;

        let options = Options::yolo_detect()
            .with_model_file(model_file)
            .with_model_device(
                config
                    .device
                    .as_str()
                    .try_into()
                    .map_err(|e| anyhow!("Invalid model device {:?}: {:?}", config.device, e))?,
            )
            .with_nc(class_names.len())
            .with_class_confs(&[config.confidence_threshold])
            .with_iou(config.iou_threshold)
            .with_class_names(class_names.names());

        let model = YOLO::new(options)
            .with_context(|| format!("Failed to load YOLO model from {}", model_file))?;
        info!("Detection model loaded from {}", model_file);
        Ok(Self { model })
    }
}

impl Detector for YoloDetector {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<Detection>> {
        let start = Instant::now();
        let input = DynamicImage::ImageRgb8(frame.clone());
        let ys = self
            .model
            .forward(&[input])
            .map_err(|e| anyhow!("Model forward pass failed: {}", e))?;
        debug!("Model forward took {:?}", start.elapsed());

        let Some(y) = ys.get(0) else {
            warn!("Model output Ys was empty.");
            return Ok(Vec::new());
        };
        let detections = y
            .bboxes()
            .map(|bboxes| {
                bboxes
                    .iter()
                    .filter(|bbox| bbox.id() >= 0)
                    .map(|bbox| Detection {
                        x1: bbox.xmin(),
                        y1: bbox.ymin(),
                        x2: bbox.xmax(),
                        y2: bbox.ymax(),
                        class_id: bbox.id() as usize,
                        confidence: bbox.confidence(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(detections)
    }
}
