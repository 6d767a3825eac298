//! Square state-texture layout.
//!
//! Particles live in a square texture of side `S = ceil(sqrt(N))`. Particle
//! `i` occupies texel `(i mod S, i div S)` and is addressed by the renderer
//! at the texel centre `((x + 0.5) / S, (y + 0.5) / S)`. Texels with index
//! `>= N` are padding and are never drawn.

use std::ops::Range;

use glam::{UVec2, Vec2};

/// Shape of a state texture for a fixed particle count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateLayout {
    count: u32,
    side: u32,
}

impl StateLayout {
    /// Layout for `count` particles.
    pub fn new(count: u32) -> Self {
        Self {
            count,
            side: side_for(count),
        }
    }

    /// Number of live particles `N`.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Texture side length `S`.
    #[inline]
    pub fn side(&self) -> u32 {
        self.side
    }

    /// Total number of texels, `S * S`.
    #[inline]
    pub fn texel_count(&self) -> usize {
        self.side as usize * self.side as usize
    }

    /// Number of unused texels at the end of the texture.
    #[inline]
    pub fn padding(&self) -> usize {
        self.texel_count() - self.count as usize
    }

    /// Instances the renderer may draw. Never exceeds `N`.
    #[inline]
    pub fn draw_range(&self) -> Range<u32> {
        0..self.count
    }

    /// Texel coordinate of particle `index`.
    ///
    /// The mapping is row-major; `index` is expected to be below [`count`](Self::count).
    #[inline]
    pub fn index_to_texel(&self, index: u32) -> UVec2 {
        UVec2::new(index % self.side, index / self.side)
    }

    /// Particle index stored at `texel`, or `None` for padding and out-of-range texels.
    pub fn texel_to_index(&self, texel: UVec2) -> Option<u32> {
        if texel.x >= self.side || texel.y >= self.side {
            return None;
        }
        let index = texel.y as u64 * self.side as u64 + texel.x as u64;
        if index < self.count as u64 {
            Some(index as u32)
        } else {
            None
        }
    }

    /// UV of the centre of particle `index`'s texel.
    pub fn index_to_uv(&self, index: u32) -> Vec2 {
        let texel = self.index_to_texel(index);
        let side = self.side as f32;
        Vec2::new(
            (texel.x as f32 + 0.5) / side,
            (texel.y as f32 + 0.5) / side,
        )
    }

    /// Particle index for a UV inside the texture, or `None` for padding.
    pub fn uv_to_index(&self, uv: Vec2) -> Option<u32> {
        if self.side == 0 || !(0.0..1.0).contains(&uv.x) || !(0.0..1.0).contains(&uv.y) {
            return None;
        }
        let side = self.side as f32;
        let x = ((uv.x * side).floor() as u32).min(self.side - 1);
        let y = ((uv.y * side).floor() as u32).min(self.side - 1);
        self.texel_to_index(UVec2::new(x, y))
    }
}

/// Smallest `s` with `s * s >= count`.
fn side_for(count: u32) -> u32 {
    let count = count as u64;
    let mut side = (count as f64).sqrt().ceil() as u64;
    while side * side < count {
        side += 1;
    }
    while side > 0 && (side - 1) * (side - 1) >= count {
        side -= 1;
    }
    side as u32
}
