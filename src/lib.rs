//! # flowcloud
//!
//! An animated point cloud whose motion runs as a GPU feedback loop over
//! texture-encoded state.
//!
//! Each particle is one texel of an `S x S` `Rgba32Float` texture
//! (`xyz = position`, `w = aux`), with `S = ceil(sqrt(N))`. A compute pass
//! reads the current texture plus an immutable anchor texture and writes the
//! next one; the two state textures ping-pong every frame. The renderer draws
//! the first `N` texels as point sprites straight from the freshly written
//! texture.
//!
//! One external scalar, a scroll progress in `[0, 1]`, drives the sprite
//! radius and the canvas opacity.
//!
//! ## Quick Start
//!
//! ```ignore
//! use flowcloud::prelude::*;
//!
//! fn main() -> Result<(), CloudError> {
//!     let config = CloudConfig::new()
//!         .with_flow_field_influence(0.9)
//!         .with_flow_field_strength(1.5)
//!         .with_seed(7);
//!     flowcloud::window::run(config)
//! }
//! ```
//!
//! ## Driving a cloud yourself
//!
//! [`PointCloud`] is generic over its [`CloudBackend`]. Hosts call
//! [`set_progress`](PointCloud::set_progress) and
//! [`resize`](PointCloud::resize) whenever they like; both are applied at
//! the start of the next [`tick`](PointCloud::tick).
//!
//! ```ignore
//! let mut cloud = PointCloud::new(&config, CpuBackend::new(), Viewport::new(800, 600, 1.0))?;
//! cloud.set_progress(0.4);
//! cloud.tick(0.016, 0.016);
//! assert_eq!(cloud.canvas_opacity(), 0.4);
//! ```
//!
//! ## Modules
//!
//! | Concern | Module |
//! |---------|--------|
//! | Texel layout, index/UV mapping | [`layout`] |
//! | Anchor shapes | [`geometry`] |
//! | Seeding, ping-pong | [`state`] |
//! | Flow field and host step | [`noise`], [`flow`] |
//! | Progress coupling | [`params`] |
//! | Frame protocol | [`cloud`], [`backend`] |
//! | WGSL | [`shader`] |
//! | wgpu implementation | [`gpu`] |

pub mod backend;
pub mod camera;
pub mod cloud;
pub mod config;
pub mod error;
pub mod flow;
pub mod geometry;
pub mod gpu;
pub mod layout;
pub mod noise;
pub mod params;
pub mod shader;
pub mod state;
pub mod time;
pub mod viewport;
pub mod window;

pub use backend::{CloudBackend, CpuBackend, FrameInput, Sprite, SpriteFrame, StepInput};
pub use camera::Camera;
pub use cloud::{FrameOutcome, Mailbox, PointCloud};
pub use config::CloudConfig;
pub use error::{CloudError, FrameError, GpuError};
pub use flow::SimulationParameters;
pub use geometry::{BaseGeometry, ParticleGeometry};
pub use glam::{Vec2, Vec3, Vec4};
pub use gpu::{GpuBackend, GpuContext};
pub use layout::StateLayout;
pub use params::{DerivedVisualParameters, ParameterController, VisualConfig};
pub use state::{InitialState, ParticleRecord, PingPong, StateTexels};
pub use time::Clock;
pub use viewport::Viewport;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use flowcloud::prelude::*;
/// ```
pub mod prelude {
    pub use crate::backend::{CloudBackend, CpuBackend};
    pub use crate::camera::Camera;
    pub use crate::cloud::{FrameOutcome, PointCloud};
    pub use crate::config::CloudConfig;
    pub use crate::error::{CloudError, FrameError, GpuError};
    pub use crate::flow::SimulationParameters;
    pub use crate::geometry::ParticleGeometry;
    pub use crate::gpu::{FrameTarget, GpuBackend, GpuContext};
    pub use crate::params::{DerivedVisualParameters, VisualConfig};
    pub use crate::time::Clock;
    pub use crate::viewport::Viewport;
    pub use crate::{Vec2, Vec3, Vec4};
}
