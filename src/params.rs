//! Scroll-progress coupling: derives the sprite radius and canvas opacity.

/// Tuning for the visual parameters and sprite sizing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualConfig {
    /// Radius at progress 0.
    pub base_radius: f32,
    /// Radius gained between progress 0 and 1.
    pub radius_delta: f32,
    /// Base sprite size, in fractions of the output height at unit depth.
    pub particle_size: f32,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            base_radius: 0.02,
            radius_delta: 0.1,
            particle_size: 0.07,
        }
    }
}

impl VisualConfig {
    /// `base_radius + p * radius_delta`, with `p` clamped to `[0, 1]`.
    pub fn radius(&self, progress: f32) -> f32 {
        self.base_radius + clamp_progress(progress) * self.radius_delta
    }

    /// Sprite growth factor for `radius` relative to the base radius.
    pub fn radius_scale(&self, radius: f32) -> f32 {
        if self.base_radius.abs() > f32::EPSILON {
            radius / self.base_radius
        } else {
            1.0
        }
    }

    /// Sprite diameter in output pixels.
    ///
    /// `resolution_y` is the output height in physical pixels and `depth` the
    /// view-space distance of the sprite centre from the camera.
    pub fn sprite_size_px(
        &self,
        visual: &DerivedVisualParameters,
        size_factor: f32,
        resolution_y: f32,
        depth: f32,
    ) -> f32 {
        self.particle_size * size_factor * resolution_y * self.radius_scale(visual.radius)
            / depth.max(MIN_SPRITE_DEPTH)
    }
}

/// Depth floor used when attenuating sprite size.
pub const MIN_SPRITE_DEPTH: f32 = 1e-4;

/// `clamp(p, 0, 1)`; NaN maps to 0.
pub fn clamp_progress(progress: f32) -> f32 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    }
}

/// Canvas opacity for a progress value: the clamped progress itself.
pub fn canvas_opacity(progress: f32) -> f32 {
    clamp_progress(progress)
}

/// Values the renderer and host read every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedVisualParameters {
    pub radius: f32,
    pub canvas_opacity: f32,
}

/// Turns external progress into [`DerivedVisualParameters`].
///
/// Derivation is a pure function of the latest progress; nothing accumulates,
/// so replaying any progress value in any direction gives the same result.
#[derive(Debug, Clone)]
pub struct ParameterController {
    config: VisualConfig,
    progress: f32,
    derived: DerivedVisualParameters,
}

impl ParameterController {
    /// Controller at progress 0: base radius, fully transparent canvas.
    pub fn new(config: VisualConfig) -> Self {
        Self {
            config,
            progress: 0.0,
            derived: derive(&config, 0.0),
        }
    }

    /// Apply a new progress value and return the derived parameters.
    pub fn on_progress(&mut self, progress: f32) -> DerivedVisualParameters {
        self.progress = clamp_progress(progress);
        self.derived = derive(&self.config, self.progress);
        self.derived
    }

    #[inline]
    pub fn derived(&self) -> DerivedVisualParameters {
        self.derived
    }

    #[inline]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    #[inline]
    pub fn config(&self) -> &VisualConfig {
        &self.config
    }
}

fn derive(config: &VisualConfig, progress: f32) -> DerivedVisualParameters {
    DerivedVisualParameters {
        radius: config.radius(progress),
        canvas_opacity: canvas_opacity(progress),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_endpoints() {
        let config = VisualConfig::default();
        assert_eq!(config.radius(0.0), config.base_radius);
        assert_eq!(config.radius(1.0), config.base_radius + config.radius_delta);
    }

    #[test]
    fn test_radius_monotonic() {
        let config = VisualConfig::default();
        let mut last = config.radius(0.0);
        for i in 1..=1000 {
            let r = config.radius(i as f32 / 1000.0);
            assert!(r >= last);
            last = r;
        }
    }

    #[test]
    fn test_opacity_clamps() {
        assert_eq!(canvas_opacity(-0.3), 0.0);
        assert_eq!(canvas_opacity(1.7), 1.0);
        assert_eq!(canvas_opacity(0.42), 0.42);
        assert_eq!(canvas_opacity(f32::NAN), 0.0);
    }

    #[test]
    fn test_controller_starts_transparent() {
        let controller = ParameterController::new(VisualConfig::default());
        assert_eq!(controller.derived().canvas_opacity, 0.0);
        assert_eq!(controller.derived().radius, 0.02);
    }

    #[test]
    fn test_on_progress_is_idempotent() {
        let mut controller = ParameterController::new(VisualConfig::default());
        let first = controller.on_progress(0.42);
        let second = controller.on_progress(0.42);
        assert_eq!(first, second);
    }

    #[test]
    fn test_reverse_travel_is_exact() {
        let mut controller = ParameterController::new(VisualConfig::default());
        let forward = controller.on_progress(0.3);
        controller.on_progress(0.9);
        controller.on_progress(1.0);
        let back = controller.on_progress(0.3);
        assert_eq!(forward, back);
        assert_eq!(controller.on_progress(0.0), ParameterController::new(VisualConfig::default()).derived());
    }

    #[test]
    fn test_out_of_range_progress_clamped() {
        let mut controller = ParameterController::new(VisualConfig::default());
        let high = controller.on_progress(1.7);
        assert_eq!(high.canvas_opacity, 1.0);
        assert_eq!(high.radius, VisualConfig::default().radius(1.0));
        assert_eq!(controller.progress(), 1.0);
    }

    #[test]
    fn test_sprite_size_scales_with_resolution_and_radius() {
        let config = VisualConfig::default();
        let base = DerivedVisualParameters {
            radius: config.base_radius,
            canvas_opacity: 1.0,
        };
        let grown = DerivedVisualParameters {
            radius: config.radius(1.0),
            ..base
        };
        let small = config.sprite_size_px(&base, 0.5, 600.0, 10.0);
        assert!((small - 0.07 * 0.5 * 600.0 / 10.0).abs() < 1e-5);
        assert!((config.sprite_size_px(&base, 0.5, 2400.0, 10.0) - small * 4.0).abs() < 1e-4);
        assert!((config.sprite_size_px(&grown, 0.5, 600.0, 10.0) - small * 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_radius_scale_with_zero_base() {
        let config = VisualConfig {
            base_radius: 0.0,
            ..VisualConfig::default()
        };
        assert_eq!(config.radius_scale(0.5), 1.0);
    }
}
