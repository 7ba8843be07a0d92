// src/display.rs
use egui::ColorImage;
use image::{imageops::FilterType, RgbImage};

/// Resizes to the display surface and converts to egui's RGBA layout.
pub fn to_display_image(frame: &RgbImage, (width, height): (u32, u32)) -> ColorImage {
    let resized;
    let frame = if frame.dimensions() == (width, height) {
        frame
    } else {
        resized = image::imageops::resize(frame, width, height, FilterType::Triangle);
        &resized
    };
    ColorImage::from_rgb([width as usize, height as usize], frame.as_raw())
}
