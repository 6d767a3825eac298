//! Backends execute the compute and render halves of a frame.
//!
//! [`PointCloud`](crate::cloud::PointCloud) owns the frame protocol and talks
//! to a backend through [`CloudBackend`]. The GPU implementation lives in
//! [`gpu`](crate::gpu); [`CpuBackend`] runs the same step on the host and
//! records what it would draw, which is what the tests drive.

use glam::{Vec2, Vec3};

use crate::camera::Camera;
use crate::error::{CloudError, FrameError};
use crate::flow::{self, SimulationParameters};
use crate::layout::StateLayout;
use crate::params::{DerivedVisualParameters, VisualConfig};
use crate::state::{InitialState, PingPong, StateTexels};
use crate::viewport::Viewport;

/// Inputs of one compute step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepInput {
    /// Elapsed time in seconds.
    pub time: f32,
    /// Step length in seconds, already clamped and positive.
    pub delta: f32,
    pub params: SimulationParameters,
}

/// Inputs of one render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    pub visual: DerivedVisualParameters,
    pub visual_config: VisualConfig,
    pub viewport: Viewport,
    pub camera: Camera,
}

/// Compute and presentation backend for a point cloud.
///
/// Calls arrive in frame order from a single thread: `upload` once, then per
/// tick an optional `resize`, an optional `advance` and a `render`.
pub trait CloudBackend {
    /// Create the state textures, anchors and size factors.
    fn upload(&mut self, state: &InitialState) -> Result<(), CloudError>;

    /// Write the successor of the current state into the other texture and
    /// make it current.
    fn advance(&mut self, step: &StepInput) -> Result<(), FrameError>;

    /// Draw the first `N` particles of the current state.
    fn render(&mut self, frame: &FrameInput) -> Result<(), FrameError>;

    /// Resize the output. Called for every posted viewport, including an
    /// unchanged one. Never touches the state textures.
    fn resize(&mut self, viewport: Viewport);
}

/// One drawn point sprite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub index: u32,
    /// Centre in normalized device coordinates.
    pub center: Vec2,
    /// Diameter in output pixels.
    pub size_px: f32,
}

/// Everything a [`CpuBackend`] render produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteFrame {
    /// Output resolution in physical pixels.
    pub resolution: Vec2,
    pub canvas_opacity: f32,
    pub radius: f32,
    /// Index of the state texture the frame was read from.
    pub source_slot: usize,
    pub sprites: Vec<Sprite>,
}

#[derive(Debug)]
struct HostState {
    layout: StateLayout,
    base: StateTexels,
    textures: PingPong<StateTexels>,
    size_factors: Vec<f32>,
}

/// Host reference backend.
#[derive(Debug, Default)]
pub struct CpuBackend {
    state: Option<HostState>,
    viewport: Viewport,
    last_frame: Option<SpriteFrame>,
    steps: u64,
}

impl CpuBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layout(&self) -> Option<StateLayout> {
        self.state.as_ref().map(|s| s.layout)
    }

    /// The texture the next render reads.
    pub fn current_state(&self) -> Option<&StateTexels> {
        self.state.as_ref().map(|s| s.textures.current())
    }

    /// The texture the next advance writes.
    pub fn target_state(&self) -> Option<&StateTexels> {
        self.state.as_ref().map(|s| s.textures.target())
    }

    pub fn current_slot(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.textures.current_index())
    }

    pub fn base(&self) -> Option<&StateTexels> {
        self.state.as_ref().map(|s| &s.base)
    }

    pub fn size_factors(&self) -> &[f32] {
        self.state.as_ref().map_or(&[], |s| s.size_factors.as_slice())
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn last_frame(&self) -> Option<&SpriteFrame> {
        self.last_frame.as_ref()
    }

    /// Number of advances performed.
    pub fn steps(&self) -> u64 {
        self.steps
    }
}

impl CloudBackend for CpuBackend {
    fn upload(&mut self, state: &InitialState) -> Result<(), CloudError> {
        if state.layout.count() == 0 {
            return Err(CloudError::EmptyGeometry);
        }
        self.state = Some(HostState {
            layout: state.layout,
            base: state.base.clone(),
            textures: PingPong::new(state.textures.0.clone(), state.textures.1.clone()),
            size_factors: state.size_factors.clone(),
        });
        self.last_frame = None;
        self.steps = 0;
        Ok(())
    }

    fn advance(&mut self, step: &StepInput) -> Result<(), FrameError> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| FrameError::Dispatch("advance before upload".into()))?;

        let (current, next) = state.textures.split();
        if flow::advance(current, &state.base, next, step.time, step.delta, &step.params) {
            state.textures.flip();
            self.steps += 1;
        }
        Ok(())
    }

    fn render(&mut self, frame: &FrameInput) -> Result<(), FrameError> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| FrameError::Dispatch("render before upload".into()))?;

        let resolution = frame.viewport.resolution();
        let view_proj = frame.camera.view_proj(frame.viewport.aspect());
        let current = state.textures.current();

        let sprites = state
            .layout
            .draw_range()
            .zip(current.particles())
            .zip(&state.size_factors)
            .map(|((index, record), size_factor)| {
                let position: Vec3 = record.position();
                let clip = view_proj * position.extend(1.0);
                let depth = frame.camera.view_depth(position);
                Sprite {
                    index,
                    center: clip.truncate().truncate() / clip.w,
                    size_px: frame.visual_config.sprite_size_px(
                        &frame.visual,
                        *size_factor,
                        resolution.y,
                        depth,
                    ),
                }
            })
            .collect();

        self.last_frame = Some(SpriteFrame {
            resolution,
            canvas_opacity: frame.visual.canvas_opacity,
            radius: frame.visual.radius,
            source_slot: state.textures.current_index(),
            sprites,
        });
        Ok(())
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BaseGeometry;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn uploaded(count: u32) -> CpuBackend {
        let geometry = BaseGeometry::fibonacci_sphere(0.5, count);
        let state = InitialState::generate(geometry.positions(), 0.25, &mut StdRng::seed_from_u64(11));
        let mut backend = CpuBackend::new();
        backend.upload(&state).unwrap();
        backend
    }

    fn frame_input(viewport: Viewport) -> FrameInput {
        let visual_config = VisualConfig::default();
        FrameInput {
            visual: DerivedVisualParameters {
                radius: visual_config.base_radius,
                canvas_opacity: 0.5,
            },
            visual_config,
            viewport,
            camera: Camera::new(),
        }
    }

    #[test]
    fn test_advance_flips_slots() {
        let mut backend = uploaded(20);
        assert_eq!(backend.current_slot(), Some(0));
        let step = StepInput {
            time: 0.0,
            delta: 0.016,
            params: SimulationParameters::default(),
        };
        backend.advance(&step).unwrap();
        assert_eq!(backend.current_slot(), Some(1));
        assert_eq!(backend.steps(), 1);
        backend.advance(&step).unwrap();
        assert_eq!(backend.current_slot(), Some(0));
    }

    #[test]
    fn test_advance_leaves_previous_current_untouched() {
        let mut backend = uploaded(20);
        let before = backend.current_state().unwrap().clone();
        backend
            .advance(&StepInput {
                time: 1.0,
                delta: 0.016,
                params: SimulationParameters::default(),
            })
            .unwrap();
        assert_eq!(backend.target_state().unwrap(), &before);
        assert_ne!(backend.current_state().unwrap(), &before);
    }

    #[test]
    fn test_render_draws_only_live_particles() {
        let mut backend = uploaded(10);
        assert_eq!(backend.layout().unwrap().side(), 4);
        backend.render(&frame_input(Viewport::new(800, 600, 1.0))).unwrap();

        let frame = backend.last_frame().unwrap();
        assert_eq!(frame.sprites.len(), 10);
        assert_eq!(frame.sprites.last().map(|s| s.index), Some(9));
        assert_eq!(frame.canvas_opacity, 0.5);
    }

    #[test]
    fn test_render_scales_with_resolution() {
        let mut backend = uploaded(16);
        backend.render(&frame_input(Viewport::new(800, 600, 1.0))).unwrap();
        let small = backend.last_frame().unwrap().clone();
        backend.render(&frame_input(Viewport::new(1600, 1200, 2.0))).unwrap();
        let large = backend.last_frame().unwrap();

        assert_eq!(large.resolution, Vec2::new(3200.0, 2400.0));
        for (a, b) in small.sprites.iter().zip(&large.sprites) {
            assert!((b.size_px - a.size_px * 4.0).abs() <= a.size_px * 1e-4 + 1e-6);
            assert_eq!(a.center, b.center);
        }
    }

    #[test]
    fn test_use_before_upload_is_a_frame_error() {
        let mut backend = CpuBackend::new();
        assert!(backend.render(&frame_input(Viewport::default())).is_err());
        assert!(backend
            .advance(&StepInput {
                time: 0.0,
                delta: 0.016,
                params: SimulationParameters::default(),
            })
            .is_err());
    }
}
