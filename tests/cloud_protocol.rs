//! Frame protocol tests against the host reference backend.

use flowcloud::backend::{CloudBackend, CpuBackend, FrameInput, StepInput};
use flowcloud::error::{CloudError, FrameError, GpuError};
use flowcloud::flow::MAX_STEP_SECONDS;
use flowcloud::geometry::{BaseGeometry, ParticleGeometry};
use flowcloud::state::{self, InitialState};
use flowcloud::{CloudConfig, PointCloud, StateLayout, Vec2, Viewport};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn sphere_config(count: u32) -> CloudConfig {
    CloudConfig::new()
        .with_particle_geometry(ParticleGeometry::Fibonacci {
            radius: 0.02,
            count,
        })
        .with_seed(1234)
}

fn cloud(config: &CloudConfig) -> PointCloud<CpuBackend> {
    PointCloud::new(config, CpuBackend::new(), Viewport::new(800, 600, 1.0)).unwrap()
}

/// Wraps a [`CpuBackend`] and fails the requested calls.
#[derive(Default)]
struct FlakyBackend {
    inner: CpuBackend,
    fail_upload: bool,
    fail_next_advance: bool,
    fail_next_render: bool,
}

impl CloudBackend for FlakyBackend {
    fn upload(&mut self, state: &InitialState) -> Result<(), CloudError> {
        if self.fail_upload {
            return Err(GpuError::NoAdapter.into());
        }
        self.inner.upload(state)
    }

    fn advance(&mut self, step: &StepInput) -> Result<(), FrameError> {
        if std::mem::take(&mut self.fail_next_advance) {
            return Err(FrameError::Dispatch("injected".into()));
        }
        self.inner.advance(step)
    }

    fn render(&mut self, frame: &FrameInput) -> Result<(), FrameError> {
        if std::mem::take(&mut self.fail_next_render) {
            return Err(FrameError::Dispatch("injected".into()));
        }
        self.inner.render(frame)
    }

    fn resize(&mut self, viewport: Viewport) {
        self.inner.resize(viewport)
    }
}

#[test]
fn test_initialized_particles_lie_near_sphere() {
    let config = sphere_config(16384);
    let cloud = cloud(&config);
    assert_eq!(cloud.layout().count(), 16384);
    assert_eq!(cloud.layout().side(), 128);

    let anchors = BaseGeometry::fibonacci_sphere(0.02, 16384);
    let state = cloud.backend().current_state().unwrap();
    for (record, anchor) in state.particles().iter().zip(anchors.positions()) {
        let offset = record.position() - *anchor;
        assert!(offset.abs().max_element() <= 0.25);
        assert!((anchor.length() - 0.02).abs() < 1e-6);
    }
}

#[test]
fn test_anchor_seeking_step_never_moves_away() {
    let geometry = BaseGeometry::fibonacci_sphere(0.02, 16384);
    let mut rng = StdRng::seed_from_u64(99);
    let mut initial = InitialState::generate(geometry.positions(), 0.25, &mut rng);
    // Anchor on the exact sphere so every particle starts off its anchor.
    initial.base = state::initialize(geometry.positions(), initial.layout, 0.0, &mut rng).0;

    let mut backend = CpuBackend::new();
    backend.upload(&initial).unwrap();
    let before = backend.current_state().unwrap().clone();

    let config = CloudConfig::new()
        .with_flow_field_influence(0.0)
        .with_flow_field_strength(1.0);
    backend
        .advance(&StepInput {
            time: 0.0,
            delta: 0.016,
            params: config.simulation,
        })
        .unwrap();

    let after = backend.current_state().unwrap();
    let base = backend.base().unwrap();
    for ((a, b), anchor) in before.particles().iter().zip(after.particles()).zip(base.particles()) {
        let d_before = (a.position() - anchor.position()).length();
        let d_after = (b.position() - anchor.position()).length();
        assert!(d_after <= d_before);
        assert_eq!(a.aux, b.aux);
    }
}

#[test]
fn test_resize_changes_resolution_but_not_state_shape() {
    let mut cloud = cloud(&sphere_config(1000));
    let layout = cloud.layout();
    let texels = cloud.backend().current_state().unwrap().texels().len();

    cloud.tick(0.0, 0.0);
    let small = cloud.backend().last_frame().unwrap().clone();
    assert_eq!(small.resolution, Vec2::new(800.0, 600.0));

    cloud.resize(1600, 1200, 2.0);
    cloud.tick(0.0, 0.0);
    let large = cloud.backend().last_frame().unwrap();

    assert_eq!(large.resolution, Vec2::new(3200.0, 2400.0));
    assert_eq!(cloud.layout(), layout);
    assert_eq!(cloud.backend().layout(), Some(layout));
    assert_eq!(cloud.backend().current_state().unwrap().texels().len(), texels);
    assert_eq!(large.sprites.len(), 1000);
    for (a, b) in small.sprites.iter().zip(&large.sprites) {
        assert!((b.size_px - 4.0 * a.size_px).abs() <= a.size_px * 1e-4 + 1e-6);
    }
}

#[test]
fn test_only_latest_resize_is_applied() {
    let mut cloud = cloud(&sphere_config(100));
    cloud.resize(320, 240, 1.0);
    cloud.resize(1024, 768, 1.5);
    cloud.tick(0.0, 0.016);
    assert_eq!(cloud.viewport(), Viewport::new(1024, 768, 1.5));
    assert_eq!(cloud.backend().viewport(), Viewport::new(1024, 768, 1.5));
}

#[test]
fn test_set_progress_is_idempotent() {
    let mut cloud = cloud(&sphere_config(100));
    cloud.set_progress(0.42);
    cloud.tick(0.0, 0.016);
    let first = cloud.visual();
    cloud.set_progress(0.42);
    cloud.tick(0.016, 0.016);
    assert_eq!(cloud.visual(), first);
    assert_eq!(first.canvas_opacity, 0.42);
}

#[test]
fn test_progress_clamped_at_boundaries() {
    let mut cloud = cloud(&sphere_config(100));
    cloud.set_progress(-0.3);
    cloud.tick(0.0, 0.016);
    assert_eq!(cloud.canvas_opacity(), 0.0);
    assert_eq!(cloud.visual().radius, 0.02);

    cloud.set_progress(1.7);
    cloud.tick(0.016, 0.016);
    assert_eq!(cloud.canvas_opacity(), 1.0);
    assert_eq!(cloud.visual().radius, 0.02 + 0.1);
    assert_eq!(cloud.backend().last_frame().unwrap().canvas_opacity, 1.0);
}

#[test]
fn test_progress_merges_to_latest_value() {
    let mut cloud = cloud(&sphere_config(100));
    cloud.set_progress(0.9);
    cloud.set_progress(0.1);
    cloud.set_progress(0.5);
    cloud.tick(0.0, 0.016);
    assert_eq!(cloud.progress(), 0.5);
    assert_eq!(cloud.backend().last_frame().unwrap().canvas_opacity, 0.5);
}

#[test]
fn test_render_reads_freshly_written_texture() {
    let mut cloud = cloud(&sphere_config(50));
    for frame in 1..=6 {
        cloud.tick(frame as f64 * 0.016, 0.016);
        let rendered = cloud.backend().last_frame().unwrap();
        assert_eq!(Some(rendered.source_slot), cloud.backend().current_slot());
        assert_eq!(rendered.source_slot, frame % 2);
    }
}

#[test]
fn test_stalled_frame_matches_clamped_step() {
    let config = sphere_config(200);
    let mut stalled = cloud(&config);
    let mut clamped = cloud(&config);

    stalled.tick(2.0, 30.0);
    clamped.tick(2.0, MAX_STEP_SECONDS as f64);

    assert_eq!(
        stalled.backend().current_state().unwrap(),
        clamped.backend().current_state().unwrap()
    );
}

#[test]
fn test_failed_advance_skips_frame_and_recovers() {
    let config = sphere_config(64);
    let mut cloud = PointCloud::new(&config, FlakyBackend::default(), Viewport::default()).unwrap();

    cloud.backend_mut().fail_next_advance = true;
    let outcome = cloud.tick(0.016, 0.016);
    assert!(!outcome.advanced);
    assert!(!outcome.rendered);
    assert_eq!(cloud.skipped_frames(), 1);
    assert_eq!(cloud.backend().inner.current_slot(), Some(0));
    assert!(cloud.backend().inner.last_frame().is_none());

    let outcome = cloud.tick(0.032, 0.016);
    assert!(outcome.advanced && outcome.rendered);
    assert_eq!(cloud.backend().inner.current_slot(), Some(1));
}

#[test]
fn test_failed_render_keeps_advanced_state() {
    let config = sphere_config(64);
    let mut cloud = PointCloud::new(&config, FlakyBackend::default(), Viewport::default()).unwrap();

    cloud.backend_mut().fail_next_render = true;
    let outcome = cloud.tick(0.016, 0.016);
    assert!(outcome.advanced);
    assert!(!outcome.rendered);
    assert_eq!(cloud.skipped_frames(), 1);
    assert_eq!(cloud.frames(), 1);
}

#[test]
fn test_failed_upload_produces_no_cloud() {
    let backend = FlakyBackend {
        fail_upload: true,
        ..FlakyBackend::default()
    };
    let result = PointCloud::new(&sphere_config(64), backend, Viewport::default());
    assert!(matches!(result, Err(CloudError::Gpu(GpuError::NoAdapter))));
}

#[test]
fn test_same_seed_same_initial_state() {
    let config = sphere_config(500);
    let a = cloud(&config);
    let b = cloud(&config);
    assert_eq!(a.backend().current_state(), b.backend().current_state());
    assert_eq!(a.backend().size_factors(), b.backend().size_factors());
}

#[test]
fn test_default_sphere_layout_round_trips() {
    let count = BaseGeometry::uv_sphere(0.02, 128, 128).len() as u32;
    let layout = StateLayout::new(count);
    assert_eq!(count, 16641);
    assert_eq!(layout.side(), 129);
    for i in layout.draw_range() {
        assert_eq!(layout.uv_to_index(layout.index_to_uv(i)), Some(i));
    }
}
