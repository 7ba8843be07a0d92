// src/slot.rs
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use egui::ColorImage;
use log::debug;

/// Single-slot hand-off where a newer frame replaces one nobody read yet.
#[derive(Clone)]
pub struct FrameSlot {
    tx: Sender<Arc<ColorImage>>,
    rx: Receiver<Arc<ColorImage>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        let (tx, rx) = bounded(1);
        Self { tx, rx }
    }

    /// Publishes `frame`, evicting the unread one if the slot is full.
    pub fn publish(&self, frame: Arc<ColorImage>) {
        let mut frame = frame;
        loop {
            match self.tx.try_send(frame) {
                Ok(()) => return,
                Err(TrySendError::Full(back)) => {
                    if self.rx.try_recv().is_ok() {
                        debug!("Replacing unread frame in slot.");
                    }
                    frame = back;
                }
                // Both ends live in `self`.
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }

    pub fn take_latest(&self) -> Option<Arc<ColorImage>> {
        self.rx.try_recv().ok()
    }
}

impl Default for FrameSlot {
    fn default() -> Self {
        Self::new()
    }
}
