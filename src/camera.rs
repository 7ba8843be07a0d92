// src/camera.rs
use image::RgbImage;
use log::{error, info, warn};
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution},
    Camera, NokhwaError,
};
use thiserror::Error;

use crate::config::CameraConfig;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera {index} is unavailable: {source}")]
    DeviceUnavailable {
        index: u32,
        #[source]
        source: NokhwaError,
    },
    #[error("failed to open camera stream: {0}")]
    StreamUnavailable(#[source] NokhwaError),
}

/// Pull-based frame source. Created and used on the worker thread.
pub trait CaptureSource {
    /// Next frame, or `None` when the stream ended or the read failed.
    /// Always `None` after [`CaptureSource::release`].
    fn read_frame(&mut self) -> Option<RgbImage>;

    /// Gives the device back. Safe to call more than once.
    fn release(&mut self);

    /// Native (negotiated) frame size.
    fn resolution(&self) -> (u32, u32);
}

pub struct NokhwaCapture {
    camera: Camera,
    resolution: Resolution,
    released: bool,
}

impl NokhwaCapture {
    /// Opens the device and starts streaming. The requested resolution is a
    /// hint; the camera may pick something else.
    pub fn open(config: &CameraConfig) -> Result<Self, CaptureError> {
        let requested_resolution =
            Resolution::new(config.requested_width, config.requested_height);
        let requested_cam_format =
            CameraFormat::new(requested_resolution, FrameFormat::MJPEG, config.requested_fps);
        let requested_format =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(requested_cam_format));
        info!("Requested camera format: {:?}", requested_format);

        let mut camera = Camera::new(CameraIndex::Index(config.device_index), requested_format)
            .map_err(|source| CaptureError::DeviceUnavailable {
                index: config.device_index,
                source,
            })?;

        let camera_format = camera.camera_format();
        info!("Actual camera format received: {:?}", camera_format);
        info!("Camera description: {:?}", camera.info().description());

        camera.open_stream().map_err(CaptureError::StreamUnavailable)?;
        info!("Camera stream opened successfully.");

        Ok(Self {
            camera,
            resolution: camera_format.resolution(),
            released: false,
        })
    }
}

impl CaptureSource for NokhwaCapture {
    fn read_frame(&mut self) -> Option<RgbImage> {
        if self.released {
            warn!("read_frame called on a released camera");
            return None;
        }
        let frame = match self.camera.frame() {
            Ok(frame) => frame,
            Err(err) => {
                warn!("Failed to capture frame: {}", err);
                return None;
            }
        };
        match frame.decode_image::<RgbFormat>() {
            Ok(image) => Some(image),
            Err(err) => {
                warn!("Failed to decode frame to RGB: {}", err);
                None
            }
        }
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.camera.stop_stream() {
            error!("Failed to stop camera stream cleanly: {}", e);
        } else {
            info!("Camera released.");
        }
    }

    fn resolution(&self) -> (u32, u32) {
        (self.resolution.width(), self.resolution.height())
    }
}

impl Drop for NokhwaCapture {
    fn drop(&mut self) {
        self.release();
    }
}
