//! Simulation state: texel records, host images of state textures, seeding,
//! and the ping-pong pair.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rand::Rng;

use crate::layout::StateLayout;

/// Default per-axis jitter applied to anchors at seeding time.
pub const DEFAULT_JITTER: f32 = 0.25;

/// One texel of a state texture: position plus a static per-particle seed.
///
/// Matches an `Rgba32Float` texel: `xyz = position`, `w = aux`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleRecord {
    pub position: [f32; 3],
    pub aux: f32,
}

impl ParticleRecord {
    pub fn new(position: Vec3, aux: f32) -> Self {
        Self {
            position: position.to_array(),
            aux,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

/// Host-side image of one state texture.
///
/// Always holds `S * S` texels; only the first `N` are particles.
#[derive(Debug, Clone, PartialEq)]
pub struct StateTexels {
    layout: StateLayout,
    texels: Vec<ParticleRecord>,
}

impl StateTexels {
    /// All-zero texture for `layout`.
    pub fn zeroed(layout: StateLayout) -> Self {
        Self {
            layout,
            texels: vec![ParticleRecord::zeroed(); layout.texel_count()],
        }
    }

    /// Rebuild from a full `S * S` texel list, e.g. after GPU readback.
    ///
    /// Returns `None` if the length does not match the layout.
    pub fn from_texels(layout: StateLayout, texels: Vec<ParticleRecord>) -> Option<Self> {
        (texels.len() == layout.texel_count()).then_some(Self { layout, texels })
    }

    #[inline]
    pub fn layout(&self) -> StateLayout {
        self.layout
    }

    /// Every texel, padding included.
    #[inline]
    pub fn texels(&self) -> &[ParticleRecord] {
        &self.texels
    }

    /// The `N` live particles.
    #[inline]
    pub fn particles(&self) -> &[ParticleRecord] {
        &self.texels[..self.layout.count() as usize]
    }

    #[inline]
    pub fn particles_mut(&mut self) -> &mut [ParticleRecord] {
        let count = self.layout.count() as usize;
        &mut self.texels[..count]
    }

    /// Raw texel bytes in row-major order, 16 bytes per texel.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }

    /// Overwrite this texture with `other`. Layouts must match.
    pub fn copy_from(&mut self, other: &StateTexels) {
        debug_assert_eq!(self.layout, other.layout);
        self.texels.copy_from_slice(&other.texels);
    }
}

/// Seed both state textures from the anchors.
///
/// Every particle gets `anchor + jitter`, each axis drawn uniformly from
/// `[-jitter, jitter]`, and an `aux` drawn uniformly from `[0, 1)`. The two
/// returned textures are identical.
pub fn initialize<R: Rng + ?Sized>(
    base_positions: &[Vec3],
    layout: StateLayout,
    jitter: f32,
    rng: &mut R,
) -> (StateTexels, StateTexels) {
    debug_assert_eq!(base_positions.len(), layout.count() as usize);
    let jitter = jitter.abs();

    let mut texture = StateTexels::zeroed(layout);
    for (record, anchor) in texture.particles_mut().iter_mut().zip(base_positions) {
        let offset = Vec3::new(
            rng.gen_range(-jitter..=jitter),
            rng.gen_range(-jitter..=jitter),
            rng.gen_range(-jitter..=jitter),
        );
        *record = ParticleRecord::new(*anchor + offset, rng.gen::<f32>());
    }

    (texture.clone(), texture)
}

/// Static per-particle sprite size factors in `[0, 1)`.
pub fn size_factors<R: Rng + ?Sized>(count: u32, rng: &mut R) -> Vec<f32> {
    (0..count).map(|_| rng.gen::<f32>()).collect()
}

/// Everything a backend needs to start simulating.
#[derive(Debug, Clone)]
pub struct InitialState {
    pub layout: StateLayout,
    /// Anchor texture the compute pass pulls particles toward. Never mutated.
    pub base: StateTexels,
    /// The two ping-pong textures at `t = 0`.
    pub textures: (StateTexels, StateTexels),
    /// One sprite size factor per particle.
    pub size_factors: Vec<f32>,
}

impl InitialState {
    /// Seed a simulation from `base_positions`.
    ///
    /// The anchor texture is the seeded texture itself, so the jitter is part
    /// of each particle's anchor.
    pub fn generate<R: Rng + ?Sized>(
        base_positions: &[Vec3],
        jitter: f32,
        rng: &mut R,
    ) -> Self {
        let layout = StateLayout::new(base_positions.len() as u32);
        let textures = initialize(base_positions, layout, jitter, rng);
        let size_factors = size_factors(layout.count(), rng);

        Self {
            layout,
            base: textures.0.clone(),
            textures,
            size_factors,
        }
    }
}

/// Two buffers and a flag naming the current one.
///
/// The current slot is the read source; the other slot is the write target.
/// [`split`](Self::split) hands out both without aliasing, and
/// [`flip`](Self::flip) makes the just-written slot current.
#[derive(Debug)]
pub struct PingPong<T> {
    slots: [T; 2],
    current: usize,
}

impl<T> PingPong<T> {
    /// Pair with `first` as the current slot.
    pub fn new(first: T, second: T) -> Self {
        Self {
            slots: [first, second],
            current: 0,
        }
    }

    #[inline]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[inline]
    pub fn target_index(&self) -> usize {
        1 - self.current
    }

    #[inline]
    pub fn current(&self) -> &T {
        &self.slots[self.current]
    }

    #[inline]
    pub fn target(&self) -> &T {
        &self.slots[1 - self.current]
    }

    /// `(read, write)` for one step.
    pub fn split(&mut self) -> (&T, &mut T) {
        let (first, second) = self.slots.split_at_mut(1);
        if self.current == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        }
    }

    /// Make the write target current.
    #[inline]
    pub fn flip(&mut self) {
        self.current = 1 - self.current;
    }

    #[inline]
    pub fn slot(&self, index: usize) -> &T {
        &self.slots[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BaseGeometry;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_record_is_one_rgba32f_texel() {
        assert_eq!(std::mem::size_of::<ParticleRecord>(), 16);
    }

    #[test]
    fn test_initialize_textures_identical() {
        let geometry = BaseGeometry::fibonacci_sphere(1.0, 101);
        let layout = StateLayout::new(101);
        let mut rng = StdRng::seed_from_u64(7);
        let (a, b) = initialize(geometry.positions(), layout, DEFAULT_JITTER, &mut rng);
        assert_eq!(a, b);
        assert_eq!(a.texels().len(), 121);
        assert_eq!(a.particles().len(), 101);
    }

    #[test]
    fn test_initialize_jitter_and_aux_bounds() {
        let geometry = BaseGeometry::fibonacci_sphere(0.02, 2000);
        let layout = StateLayout::new(2000);
        let mut rng = StdRng::seed_from_u64(1);
        let (a, _) = initialize(geometry.positions(), layout, 0.25, &mut rng);

        for (record, anchor) in a.particles().iter().zip(geometry.positions()) {
            let offset = record.position() - *anchor;
            assert!(offset.abs().max_element() <= 0.25);
            assert!((0.0..1.0).contains(&record.aux));
        }
    }

    #[test]
    fn test_initialize_leaves_padding_zeroed() {
        let geometry = BaseGeometry::fibonacci_sphere(1.0, 10);
        let mut rng = StdRng::seed_from_u64(3);
        let (a, _) = initialize(geometry.positions(), StateLayout::new(10), 0.25, &mut rng);
        assert!(a.texels()[10..].iter().all(|t| *t == ParticleRecord::zeroed()));
    }

    #[test]
    fn test_initialize_is_reproducible_for_a_seed() {
        let geometry = BaseGeometry::fibonacci_sphere(1.0, 64);
        let a = InitialState::generate(geometry.positions(), 0.25, &mut StdRng::seed_from_u64(9));
        let b = InitialState::generate(geometry.positions(), 0.25, &mut StdRng::seed_from_u64(9));
        assert_eq!(a.textures.0, b.textures.0);
        assert_eq!(a.size_factors, b.size_factors);
    }

    #[test]
    fn test_zero_jitter_matches_anchors() {
        let geometry = BaseGeometry::uv_sphere(1.0, 8, 4);
        let state = InitialState::generate(geometry.positions(), 0.0, &mut StdRng::seed_from_u64(2));
        for (record, anchor) in state.base.particles().iter().zip(geometry.positions()) {
            assert_eq!(record.position(), *anchor);
        }
    }

    #[test]
    fn test_ping_pong_split_never_aliases() {
        let mut pair = PingPong::new(vec![1], vec![2]);
        {
            let (read, write) = pair.split();
            assert_eq!(read, &vec![1]);
            write[0] = 3;
        }
        pair.flip();
        assert_eq!(pair.current(), &vec![3]);
        assert_eq!(pair.target(), &vec![1]);
        let (read, write) = pair.split();
        assert_eq!(read, &vec![3]);
        assert_eq!(write, &mut vec![1]);
    }

    #[test]
    fn test_ping_pong_double_flip_restores() {
        let mut pair = PingPong::new('a', 'b');
        pair.flip();
        assert_eq!(pair.current_index(), 1);
        assert_eq!(pair.target_index(), 0);
        pair.flip();
        assert_eq!(*pair.current(), 'a');
    }
}
