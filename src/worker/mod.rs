// src/worker/mod.rs
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Instant,
};

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use egui::ColorImage;
use log::{debug, error, info, warn};

use crate::{
    camera::CaptureSource, detector::Detector, display::to_display_image, fps::FpsMeter,
    overlay::OverlayRenderer, slot::FrameSlot,
};

/// Everything one detection pass needs. Built on the worker thread and
/// owned by it until shutdown.
pub struct Pipeline {
    pub capture: Box<dyn CaptureSource>,
    pub detector: Box<dyn Detector>,
    pub renderer: OverlayRenderer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    /// Stop requested, the in-flight iteration has not finished yet.
    Stopping,
}

/// Why a detection run ended without a stop request.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    StreamEnded,
    DetectorFailed(String),
}

enum Command {
    Start,
    Quit,
}

/// Controller side of the background detection thread.
///
/// The thread owns the capture source and the model for the life of the app
/// and runs at most one detection loop at a time. `is_detecting` is the
/// cancellation signal: the loop checks it once per iteration.
pub struct DetectionWorker {
    is_detecting: Arc<AtomicBool>,
    in_loop: Arc<AtomicBool>,
    commands: Sender<Command>,
    events: Receiver<WorkerEvent>,
    slot: FrameSlot,
    handle: Option<JoinHandle<()>>,
    resolution: (u32, u32),
}

impl DetectionWorker {
    /// Spawns the worker thread and waits until `build` has produced the
    /// pipeline. A failing `build` is returned as the error.
    pub fn spawn<F>(build: F, display_size: (u32, u32), ctx: egui::Context) -> Result<Self>
    where
        F: FnOnce() -> Result<Pipeline> + Send + 'static,
    {
        info!("Spawning detection worker thread");
        let is_detecting = Arc::new(AtomicBool::new(false));
        let in_loop = Arc::new(AtomicBool::new(false));
        let (command_tx, command_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();
        let (ready_tx, ready_rx) = bounded(1);
        let slot = FrameSlot::new();

        let thread_ctx = WorkerContext {
            is_detecting: is_detecting.clone(),
            in_loop: in_loop.clone(),
            events: event_tx,
            slot: slot.clone(),
            display_size,
            ctx,
        };
        let handle = thread::spawn(move || {
            let pipeline = match build() {
                Ok(pipeline) => {
                    let _ = ready_tx.send(Ok(pipeline.capture.resolution()));
                    pipeline
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            worker_thread(pipeline, command_rx, thread_ctx);
        });

        let resolution = match ready_rx.recv() {
            Ok(Ok(resolution)) => resolution,
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                let _ = handle.join();
                return Err(anyhow!("Detection worker exited during startup"));
            }
        };
        info!("Detection worker ready, camera resolution {:?}", resolution);

        Ok(Self {
            is_detecting,
            in_loop,
            commands: command_tx,
            events: event_rx,
            slot,
            handle: Some(handle),
            resolution,
        })
    }

    /// Begins detecting. Returns false when already running or when the
    /// worker is gone.
    pub fn start(&mut self) -> bool {
        if self.handle.as_ref().map_or(true, |h| h.is_finished()) {
            warn!("Start ignored: detection worker is not alive.");
            return false;
        }
        if self.is_detecting.swap(true, Ordering::SeqCst) {
            debug!("Start ignored: already detecting.");
            return false;
        }
        if self.commands.send(Command::Start).is_err() {
            error!("Detection worker stopped listening.");
            self.is_detecting.store(false, Ordering::SeqCst);
            return false;
        }
        info!("Detection started.");
        true
    }

    /// Asks the loop to exit after its current iteration. Does not wait.
    pub fn stop(&self) {
        if self.is_detecting.swap(false, Ordering::SeqCst) {
            info!("Detection stop requested.");
        }
    }

    /// Stops the loop, waits for the thread, which releases the camera on
    /// its way out. Idempotent.
    pub fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        info!("Shutting down detection worker...");
        self.is_detecting.store(false, Ordering::SeqCst);
        let _ = self.commands.send(Command::Quit);
        match handle.join() {
            Ok(()) => info!("Detection worker joined successfully."),
            Err(e) => error!("Detection worker panicked: {:?}", e),
        }
    }

    /// Joins a thread that died on its own (a panic in the model, say).
    /// Returns a description when that happened.
    pub fn reap_if_finished(&mut self) -> Option<String> {
        if !self.handle.as_ref().is_some_and(|h| h.is_finished()) {
            return None;
        }
        let handle = self.handle.take()?;
        self.is_detecting.store(false, Ordering::SeqCst);
        self.in_loop.store(false, Ordering::SeqCst);
        let msg = match handle.join() {
            Ok(()) => "Detection worker exited unexpectedly.".to_string(),
            Err(e) => format!("Detection worker panicked: {:?}", e),
        };
        error!("{}", msg);
        Some(msg)
    }

    pub fn state(&self) -> WorkerState {
        if self.is_detecting.load(Ordering::SeqCst) {
            WorkerState::Running
        } else if self.in_loop.load(Ordering::SeqCst) {
            WorkerState::Stopping
        } else {
            WorkerState::Idle
        }
    }

    pub fn is_detecting(&self) -> bool {
        self.is_detecting.load(Ordering::SeqCst)
    }

    pub fn is_alive(&self) -> bool {
        self.handle.is_some()
    }

    pub fn take_latest_frame(&self) -> Option<Arc<ColorImage>> {
        self.slot.take_latest()
    }

    pub fn drain_events(&self) -> Vec<WorkerEvent> {
        self.events.try_iter().collect()
    }

    pub fn camera_resolution(&self) -> (u32, u32) {
        self.resolution
    }
}

impl Drop for DetectionWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct WorkerContext {
    is_detecting: Arc<AtomicBool>,
    in_loop: Arc<AtomicBool>,
    events: Sender<WorkerEvent>,
    slot: FrameSlot,
    display_size: (u32, u32),
    ctx: egui::Context,
}

fn worker_thread(mut pipeline: Pipeline, commands: Receiver<Command>, wctx: WorkerContext) {
    let mut fps = FpsMeter::default();

    for command in commands.iter() {
        match command {
            Command::Start => {
                // A start that was already cancelled, or a leftover from a
                // stop/start made while the previous loop was still running.
                if !wctx.is_detecting.load(Ordering::SeqCst) {
                    debug!("Skipping stale start command.");
                    continue;
                }
                wctx.in_loop.store(true, Ordering::SeqCst);
                detection_loop(&mut pipeline, &mut fps, &wctx);
                wctx.in_loop.store(false, Ordering::SeqCst);
                wctx.ctx.request_repaint();
            }
            Command::Quit => break,
        }
    }

    pipeline.capture.release();
    info!("Detection worker finished.");
}

fn detection_loop(pipeline: &mut Pipeline, fps: &mut FpsMeter, wctx: &WorkerContext) {
    info!("Detection loop started.");
    while wctx.is_detecting.load(Ordering::SeqCst) {
        let loop_start = Instant::now();
        let frame_fps = fps.tick();

        let Some(mut frame) = pipeline.capture.read_frame() else {
            warn!("Video stream ended or unable to read a frame.");
            wctx.is_detecting.store(false, Ordering::SeqCst);
            let _ = wctx.events.send(WorkerEvent::StreamEnded);
            break;
        };

        let detections = match pipeline.detector.detect(&frame) {
            Ok(detections) => detections,
            Err(e) => {
                error!("Detector failed: {:#}", e);
                wctx.is_detecting.store(false, Ordering::SeqCst);
                let _ = wctx.events.send(WorkerEvent::DetectorFailed(format!("{:#}", e)));
                break;
            }
        };
        for detection in &detections {
            pipeline.renderer.draw(&mut frame, detection);
        }

        info!("FPS: {}", frame_fps);

        let display = to_display_image(&frame, wctx.display_size);
        wctx.slot.publish(Arc::new(display));
        wctx.ctx.request_repaint();
        debug!(
            "Processed frame with {} detections in {:?}",
            detections.len(),
            loop_start.elapsed()
        );
    }
    info!("Detection loop finished.");
}
