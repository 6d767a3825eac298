//! The per-frame protocol.
//!
//! A [`PointCloud`] owns a backend and the host-side parameters. Progress and
//! resize events land in single-slot inboxes and are applied together at the
//! start of the next [`tick`](PointCloud::tick), never between the compute
//! and render halves of a frame.
//!
//! Per tick:
//!
//! 1. apply the pending resize, then the pending progress
//! 2. advance the state if the clamped `dt` is positive
//! 3. render the current state
//!
//! A failure in step 2 or 3 skips the rest of the frame; the next tick tries
//! again.

use log::{debug, info, warn};

use crate::backend::{CloudBackend, FrameInput, StepInput};
use crate::camera::Camera;
use crate::config::CloudConfig;
use crate::error::CloudError;
use crate::flow::{self, SimulationParameters, MAX_STEP_SECONDS};
use crate::layout::StateLayout;
use crate::params::{DerivedVisualParameters, ParameterController};
use crate::state::InitialState;
use crate::viewport::Viewport;

/// Holds at most one value; posting replaces whatever is pending.
#[derive(Debug)]
pub struct Mailbox<T> {
    pending: Option<T>,
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self { pending: None }
    }

    /// Store `value`, dropping any value not yet taken.
    pub fn post(&mut self, value: T) {
        self.pending = Some(value);
    }

    pub fn take(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_none()
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// What a tick managed to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameOutcome {
    /// The state advanced and the ping-pong pair flipped.
    pub advanced: bool,
    /// A frame was rendered.
    pub rendered: bool,
}

/// GPU-style feedback point cloud driven by external ticks.
pub struct PointCloud<B: CloudBackend> {
    backend: B,
    layout: StateLayout,
    params: SimulationParameters,
    controller: ParameterController,
    camera: Camera,
    viewport: Viewport,
    progress_inbox: Mailbox<f32>,
    resize_inbox: Mailbox<Viewport>,
    frames: u64,
    skipped_frames: u64,
}

impl<B: CloudBackend> PointCloud<B> {
    /// Seed the state from `config` and upload it to `backend`.
    ///
    /// Fails without producing a cloud if the geometry is empty, the jitter
    /// is not finite or the backend cannot take the state.
    pub fn new(config: &CloudConfig, mut backend: B, viewport: Viewport) -> Result<Self, CloudError> {
        if !config.jitter.is_finite() {
            return Err(CloudError::InvalidConfig(format!(
                "jitter must be finite, got {}",
                config.jitter
            )));
        }
        let geometry = config.geometry.build();
        if geometry.is_empty() {
            return Err(CloudError::EmptyGeometry);
        }

        let mut rng = config.rng();
        let initial = InitialState::generate(geometry.positions(), config.jitter, &mut rng);
        info!(
            "Point cloud: {} particles in a {}x{} state texture",
            initial.layout.count(),
            initial.layout.side(),
            initial.layout.side()
        );

        backend.upload(&initial)?;
        backend.resize(viewport);

        Ok(Self {
            backend,
            layout: initial.layout,
            params: config.simulation.sanitized(),
            controller: ParameterController::new(config.visual),
            camera: config.camera,
            viewport,
            progress_inbox: Mailbox::new(),
            resize_inbox: Mailbox::new(),
            frames: 0,
            skipped_frames: 0,
        })
    }

    /// Queue a progress value for the next tick.
    pub fn set_progress(&mut self, progress: f32) {
        self.progress_inbox.post(progress);
    }

    /// Queue a viewport change for the next tick.
    pub fn resize(&mut self, width: u32, height: u32, pixel_ratio: f32) {
        self.resize_inbox.post(Viewport::new(width, height, pixel_ratio));
    }

    /// Run one frame.
    pub fn tick(&mut self, elapsed: f64, delta: f64) -> FrameOutcome {
        self.apply_pending();
        self.frames += 1;

        let mut outcome = FrameOutcome::default();
        if let Some(dt) = flow::clamp_step(delta as f32) {
            if delta as f32 > MAX_STEP_SECONDS {
                warn!("Frame delta {:.3}s clamped to {:.3}s", delta, dt);
            }
            let step = StepInput {
                time: elapsed as f32,
                delta: dt,
                params: self.params,
            };
            if let Err(e) = self.backend.advance(&step) {
                warn!("Skipping frame {}: {}", self.frames, e);
                self.skipped_frames += 1;
                return outcome;
            }
            outcome.advanced = true;
        } else if delta != 0.0 {
            warn!("Ignoring anomalous frame delta {}", delta);
        }

        let frame = FrameInput {
            visual: self.controller.derived(),
            visual_config: *self.controller.config(),
            viewport: self.viewport,
            camera: self.camera,
        };
        match self.backend.render(&frame) {
            Ok(()) => outcome.rendered = true,
            Err(e) => {
                warn!("Skipping frame {}: {}", self.frames, e);
                self.skipped_frames += 1;
            }
        }
        outcome
    }

    fn apply_pending(&mut self) {
        if let Some(viewport) = self.resize_inbox.take() {
            if viewport != self.viewport {
                debug!(
                    "Resize to {}x{} @ {}x",
                    viewport.width, viewport.height, viewport.pixel_ratio
                );
                self.viewport = viewport;
            }
            // Backends may track output sizes the viewport does not carry.
            self.backend.resize(viewport);
        }
        if let Some(progress) = self.progress_inbox.take() {
            let derived = self.controller.on_progress(progress);
            debug!(
                "Progress {:.3}: radius {:.4}, opacity {:.3}",
                self.controller.progress(),
                derived.radius,
                derived.canvas_opacity
            );
        }
    }

    /// Opacity the host should composite the output with.
    pub fn canvas_opacity(&self) -> f32 {
        self.controller.derived().canvas_opacity
    }

    /// Visual parameters as of the last tick.
    pub fn visual(&self) -> DerivedVisualParameters {
        self.controller.derived()
    }

    pub fn progress(&self) -> f32 {
        self.controller.progress()
    }

    pub fn layout(&self) -> StateLayout {
        self.layout
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Ticks run so far, skipped ones included.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn skipped_frames(&self) -> u64 {
        self.skipped_frames
    }
}
