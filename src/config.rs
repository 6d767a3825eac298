//! Point cloud configuration.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::camera::Camera;
use crate::flow::SimulationParameters;
use crate::geometry::ParticleGeometry;
use crate::params::VisualConfig;
use crate::state::DEFAULT_JITTER;

/// Every tunable of a point cloud.
///
/// Use method chaining to configure, then hand it to
/// [`PointCloud::new`](crate::cloud::PointCloud::new) or
/// [`window::run`](crate::window::run).
#[derive(Debug, Clone, PartialEq)]
pub struct CloudConfig {
    pub geometry: ParticleGeometry,
    pub simulation: SimulationParameters,
    pub visual: VisualConfig,
    pub camera: Camera,
    /// Per-axis jitter added to every anchor at seeding time.
    pub jitter: f32,
    /// Seed for initialization. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Background colour, RGBA.
    pub clear_color: [f32; 4],
    /// Sprite colour, RGB.
    pub particle_color: [f32; 3],
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            geometry: ParticleGeometry::default(),
            simulation: SimulationParameters::default(),
            visual: VisualConfig::default(),
            camera: Camera::new(),
            jitter: DEFAULT_JITTER,
            seed: None,
            clear_color: [1.0, 1.0, 1.0, 1.0],
            particle_color: [0.0, 0.0, 0.0],
        }
    }
}

impl CloudConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shape the anchors are sampled from.
    pub fn with_particle_geometry(mut self, geometry: ParticleGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Blend between anchor seeking (0) and flow following (1).
    pub fn with_flow_field_influence(mut self, influence: f32) -> Self {
        self.simulation.flow_field_influence = influence;
        self
    }

    pub fn with_flow_field_strength(mut self, strength: f32) -> Self {
        self.simulation.flow_field_strength = strength;
        self
    }

    pub fn with_flow_field_frequency(mut self, frequency: f32) -> Self {
        self.simulation.flow_field_frequency = frequency;
        self
    }

    /// Radius at progress 0.
    pub fn with_base_radius(mut self, radius: f32) -> Self {
        self.visual.base_radius = radius;
        self
    }

    /// Radius gained over the full progress range.
    pub fn with_radius_delta(mut self, delta: f32) -> Self {
        self.visual.radius_delta = delta;
        self
    }

    pub fn with_particle_size(mut self, size: f32) -> Self {
        self.visual.particle_size = size;
        self
    }

    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_jitter(mut self, jitter: f32) -> Self {
        self.jitter = jitter;
        self
    }

    /// Make initialization reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_clear_color(mut self, rgba: [f32; 4]) -> Self {
        self.clear_color = rgba;
        self
    }

    pub fn with_particle_color(mut self, rgb: [f32; 3]) -> Self {
        self.particle_color = rgb;
        self
    }

    /// Random source for initialization.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_defaults_follow_reference_scene() {
        let config = CloudConfig::default();
        assert_eq!(config.simulation.flow_field_influence, 0.9);
        assert_eq!(config.simulation.flow_field_strength, 1.5);
        assert_eq!(config.simulation.flow_field_frequency, 0.7);
        assert_eq!(config.visual.base_radius, 0.02);
        assert_eq!(config.jitter, 0.25);
        assert_eq!(config.geometry.build().len(), 129 * 129);
    }

    #[test]
    fn test_builder_chain() {
        let config = CloudConfig::new()
            .with_flow_field_influence(0.0)
            .with_flow_field_strength(1.0)
            .with_radius_delta(0.5)
            .with_particle_size(0.1)
            .with_seed(42);
        assert_eq!(config.simulation.flow_field_influence, 0.0);
        assert_eq!(config.simulation.flow_field_strength, 1.0);
        assert_eq!(config.visual.radius_delta, 0.5);
        assert_eq!(config.visual.particle_size, 0.1);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let config = CloudConfig::new().with_seed(7);
        let a: u64 = config.rng().gen();
        let b: u64 = config.rng().gen();
        assert_eq!(a, b);
    }
}
