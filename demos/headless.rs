//! # Headless Run
//!
//! Runs the GPU pipeline offscreen for a fixed number of frames, then reads
//! the state texture back and reports how far particles drifted from where
//! they started.
//!
//! Run with: `cargo run --example headless --release -- [frames]`

use flowcloud::gpu::{GpuBackend, GpuContext};
use flowcloud::{CloudConfig, PointCloud, Viewport};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let frames: u32 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(240);

    let config = CloudConfig::new().with_seed(7);
    let viewport = Viewport::new(800, 600, 1.0);

    let context = pollster::block_on(GpuContext::headless())?;
    println!("Adapter: {}", context.adapter_info.name);

    let backend = GpuBackend::headless(context, viewport, &config);
    let mut cloud = PointCloud::new(&config, backend, viewport)?;
    let start = cloud.backend().read_state()?;

    println!(
        "Particles: {} ({}x{} state texture)",
        cloud.layout().count(),
        cloud.layout().side(),
        cloud.layout().side()
    );

    let dt = 1.0 / 60.0;
    for frame in 0..frames {
        cloud.set_progress(frame as f32 / frames as f32);
        cloud.tick(frame as f64 * dt, dt);
    }

    let end = cloud.backend().read_state()?;
    let drift: f32 = start
        .particles()
        .iter()
        .zip(end.particles())
        .map(|(a, b)| (b.position() - a.position()).length())
        .sum::<f32>()
        / cloud.layout().count() as f32;

    println!("Frames: {} ({} skipped)", cloud.frames(), cloud.skipped_frames());
    println!("Mean drift from start: {:.4}", drift);
    println!("Final canvas opacity: {:.3}", cloud.canvas_opacity());
    Ok(())
}
