//! Base geometry: the anchor positions particles are seeded from.

use std::f32::consts::PI;

use glam::Vec3;

/// Immutable list of anchor positions, one per particle.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseGeometry {
    positions: Vec<Vec3>,
}

impl BaseGeometry {
    /// Wrap an arbitrary point list.
    pub fn from_positions(positions: Vec<Vec3>) -> Self {
        Self { positions }
    }

    /// Vertices of a latitude/longitude sphere.
    ///
    /// Produces `(width_segments + 1) * (height_segments + 1)` points, seam and
    /// pole duplicates included, in row-major order from the north pole.
    pub fn uv_sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);

        let mut positions =
            Vec::with_capacity((width_segments as usize + 1) * (height_segments as usize + 1));
        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            let theta = v * PI;

            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let phi = u * PI * 2.0;

                positions.push(Vec3::new(
                    -radius * theta.sin() * phi.cos(),
                    radius * theta.cos(),
                    radius * theta.sin() * phi.sin(),
                ));
            }
        }

        Self { positions }
    }

    /// `count` points spread evenly over a sphere surface (golden-angle spiral).
    pub fn fibonacci_sphere(radius: f32, count: u32) -> Self {
        let golden_angle = PI * (3.0 - 5.0_f32.sqrt());
        let positions = (0..count)
            .map(|i| {
                let y = if count == 1 {
                    0.0
                } else {
                    1.0 - 2.0 * i as f32 / (count - 1) as f32
                };
                let ring = (1.0 - y * y).max(0.0).sqrt();
                let angle = golden_angle * i as f32;
                Vec3::new(angle.cos() * ring, y, angle.sin() * ring) * radius
            })
            .collect();

        Self { positions }
    }

    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Recipe for the base geometry, kept in [`CloudConfig`](crate::CloudConfig).
#[derive(Debug, Clone, PartialEq)]
pub enum ParticleGeometry {
    /// Latitude/longitude sphere, one particle per vertex.
    UvSphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    /// Exactly `count` points on a sphere.
    Fibonacci { radius: f32, count: u32 },
    /// Caller-supplied anchors.
    Points(Vec<Vec3>),
}

impl ParticleGeometry {
    pub fn build(&self) -> BaseGeometry {
        match self {
            ParticleGeometry::UvSphere {
                radius,
                width_segments,
                height_segments,
            } => BaseGeometry::uv_sphere(*radius, *width_segments, *height_segments),
            ParticleGeometry::Fibonacci { radius, count } => {
                BaseGeometry::fibonacci_sphere(*radius, *count)
            }
            ParticleGeometry::Points(points) => BaseGeometry::from_positions(points.clone()),
        }
    }
}

impl Default for ParticleGeometry {
    fn default() -> Self {
        ParticleGeometry::UvSphere {
            radius: 0.02,
            width_segments: 128,
            height_segments: 128,
        }
    }
}
