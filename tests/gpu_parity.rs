//! The compute pass against the host reference step.
//!
//! Needs a GPU adapter; without one the test logs and returns.

use flowcloud::geometry::ParticleGeometry;
use flowcloud::gpu::{GpuBackend, GpuContext};
use flowcloud::{CloudConfig, CpuBackend, PointCloud, Viewport};

const TICKS: u32 = 30;
const DT: f64 = 1.0 / 60.0;
const TOLERANCE: f32 = 1e-3;

fn parity_config() -> CloudConfig {
    CloudConfig::new()
        .with_particle_geometry(ParticleGeometry::Fibonacci {
            radius: 0.02,
            count: 1000,
        })
        .with_seed(11)
}

#[test]
fn test_gpu_advance_matches_host_advance() {
    let context = match pollster::block_on(GpuContext::headless()) {
        Ok(context) => context,
        Err(e) => {
            eprintln!("skipping GPU comparison: {}", e);
            return;
        }
    };

    let config = parity_config();
    let viewport = Viewport::new(320, 240, 1.0);
    let mut gpu = PointCloud::new(&config, GpuBackend::headless(context, viewport, &config), viewport)
        .unwrap();
    let mut cpu = PointCloud::new(&config, CpuBackend::new(), viewport).unwrap();

    assert_eq!(
        &gpu.backend().read_state().unwrap(),
        cpu.backend().current_state().unwrap()
    );

    for frame in 1..=TICKS {
        let elapsed = frame as f64 * DT;
        gpu.tick(elapsed, DT);
        cpu.tick(elapsed, DT);
    }

    assert_eq!(gpu.skipped_frames(), 0);
    assert_eq!(gpu.backend().current_slot(), cpu.backend().current_slot());

    let on_gpu = gpu.backend().read_state().unwrap();
    let on_host = cpu.backend().current_state().unwrap();
    let mut worst = 0.0f32;
    for (g, h) in on_gpu.particles().iter().zip(on_host.particles()) {
        worst = worst.max((g.position() - h.position()).abs().max_element());
        assert_eq!(g.aux, h.aux);
    }
    assert!(worst < TOLERANCE, "max GPU/host deviation {}", worst);
}
