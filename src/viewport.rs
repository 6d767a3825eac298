//! Output viewport: logical size plus device pixel ratio.

use glam::{UVec2, Vec2};

/// Device pixel ratios above this are rendered at this ratio.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Logical viewport size and the pixel ratio it is rendered at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
}

impl Viewport {
    /// Viewport with the given ratio. Non-positive or NaN ratios become 1.
    pub fn new(width: u32, height: u32, pixel_ratio: f32) -> Self {
        let pixel_ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio
        } else {
            1.0
        };
        Self {
            width,
            height,
            pixel_ratio,
        }
    }

    /// Viewport for a window: logical size from the physical size and scale
    /// factor, ratio capped at [`MAX_PIXEL_RATIO`].
    pub fn from_window(physical: winit::dpi::PhysicalSize<u32>, scale_factor: f64) -> Self {
        let scale = if scale_factor.is_finite() && scale_factor > 0.0 {
            scale_factor
        } else {
            1.0
        };
        let logical = physical.to_logical::<f64>(scale);
        Self::new(
            logical.width.round() as u32,
            logical.height.round() as u32,
            (scale as f32).min(MAX_PIXEL_RATIO),
        )
    }

    /// Output resolution in physical pixels: `(width, height) * pixel_ratio`.
    pub fn resolution(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32) * self.pixel_ratio
    }

    /// Framebuffer size, at least 1x1.
    pub fn framebuffer_size(&self) -> UVec2 {
        let resolution = self.resolution().round();
        UVec2::new(resolution.x as u32, resolution.y as u32).max(UVec2::ONE)
    }

    /// Width over height, 1 for degenerate viewports.
    pub fn aspect(&self) -> f32 {
        if self.width == 0 || self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800, 600, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalSize;

    #[test]
    fn test_resolution_includes_pixel_ratio() {
        let viewport = Viewport::new(1600, 1200, 2.0);
        assert_eq!(viewport.resolution(), Vec2::new(3200.0, 2400.0));
        assert_eq!(viewport.framebuffer_size(), UVec2::new(3200, 2400));
    }

    #[test]
    fn test_invalid_pixel_ratio() {
        assert_eq!(Viewport::new(10, 10, 0.0).pixel_ratio, 1.0);
        assert_eq!(Viewport::new(10, 10, -2.0).pixel_ratio, 1.0);
        assert_eq!(Viewport::new(10, 10, f32::NAN).pixel_ratio, 1.0);
    }

    #[test]
    fn test_from_window_caps_ratio() {
        let viewport = Viewport::from_window(PhysicalSize::new(3000, 1500), 3.0);
        assert_eq!((viewport.width, viewport.height), (1000, 500));
        assert_eq!(viewport.pixel_ratio, MAX_PIXEL_RATIO);
        assert_eq!(viewport.framebuffer_size(), UVec2::new(2000, 1000));
    }

    #[test]
    fn test_empty_framebuffer_is_one_pixel() {
        let viewport = Viewport::new(0, 0, 1.0);
        assert!(viewport.is_empty());
        assert_eq!(viewport.framebuffer_size(), UVec2::ONE);
        assert_eq!(viewport.aspect(), 1.0);
    }
}
