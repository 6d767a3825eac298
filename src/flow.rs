//! Flow-field state advance.
//!
//! Host reference of the compute pass. For each particle:
//!
//! ```text
//! pull         = min(strength * dt, 1)
//! flow         = normalize(F(position, t)) * strength * dt
//! displacement = mix((anchor - position) * pull, flow, influence)
//! next         = position + displacement
//! ```
//!
//! With `influence = 0` every particle moves straight toward its anchor and
//! never overshoots it. `aux` is carried through unchanged.

use glam::Vec3;

use crate::noise::noise3;
use crate::state::{ParticleRecord, StateTexels};

/// Largest time step ever integrated, in seconds.
pub const MAX_STEP_SECONDS: f32 = 1.0 / 15.0;

/// Elapsed time is slowed by this factor before it enters the noise field.
pub const FLOW_TIME_SCALE: f32 = 0.2;

/// Per-component offsets into the noise field so x, y and z decorrelate.
pub const FLOW_COMPONENT_OFFSETS: [[f32; 3]; 3] = [
    [0.0, 0.0, 0.0],
    [31.41, 0.0, 17.23],
    [0.0, 47.89, 9.17],
];

/// Session-constant flow field tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParameters {
    /// `0` = pure anchor seeking, `1` = pure flow following.
    pub flow_field_influence: f32,
    /// Speed multiplier for both anchor pull and flow.
    pub flow_field_strength: f32,
    /// Spatial frequency of the flow field.
    pub flow_field_frequency: f32,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            flow_field_influence: 0.9,
            flow_field_strength: 1.5,
            flow_field_frequency: 0.7,
        }
    }
}

impl SimulationParameters {
    /// Clamp into the documented ranges. NaN falls back to the range floor.
    pub fn sanitized(self) -> Self {
        Self {
            flow_field_influence: finite_or_zero(self.flow_field_influence).clamp(0.0, 1.0),
            flow_field_strength: finite_or_zero(self.flow_field_strength).max(0.0),
            flow_field_frequency: finite_or_zero(self.flow_field_frequency).max(0.0),
        }
    }
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Step length actually integrated for a reported frame delta.
///
/// `None` means the step is a no-op: zero, negative or NaN deltas.
/// Anything larger than [`MAX_STEP_SECONDS`] is clamped to it.
pub fn clamp_step(delta_seconds: f32) -> Option<f32> {
    if delta_seconds.is_nan() || delta_seconds <= 0.0 {
        None
    } else {
        Some(delta_seconds.min(MAX_STEP_SECONDS))
    }
}

/// Unit flow direction at `position` and elapsed time `time`.
///
/// Zero where the sampled field vanishes.
pub fn flow_direction(position: Vec3, time: f32, frequency: f32) -> Vec3 {
    let t = Vec3::splat(time * FLOW_TIME_SCALE);
    let p = position * frequency;
    let [ox, oy, oz] = FLOW_COMPONENT_OFFSETS.map(Vec3::from_array);
    Vec3::new(
        noise3(p + ox + t),
        noise3(p + oy + t),
        noise3(p + oz + t),
    )
    .normalize_or_zero()
}

/// Advance one particle by an already-clamped step `dt`.
pub fn advance_particle(
    current: ParticleRecord,
    anchor: ParticleRecord,
    time: f32,
    dt: f32,
    params: &SimulationParameters,
) -> ParticleRecord {
    let position = current.position();
    let reach = params.flow_field_strength * dt;

    let pull = (anchor.position() - position) * reach.min(1.0);
    let flow = flow_direction(position, time, params.flow_field_frequency) * reach;
    let displacement = pull.lerp(flow, params.flow_field_influence);

    ParticleRecord::new(position + displacement, current.aux)
}

/// Write the successor of `current` into `next`.
///
/// Returns `false` and copies `current` through when `delta_seconds` is a
/// no-op step. Padding texels are copied unchanged.
pub fn advance(
    current: &StateTexels,
    base: &StateTexels,
    next: &mut StateTexels,
    time: f32,
    delta_seconds: f32,
    params: &SimulationParameters,
) -> bool {
    debug_assert_eq!(current.layout(), base.layout());
    debug_assert_eq!(current.layout(), next.layout());

    next.copy_from(current);
    let Some(dt) = clamp_step(delta_seconds) else {
        return false;
    };

    let params = params.sanitized();
    for ((out, record), anchor) in next
        .particles_mut()
        .iter_mut()
        .zip(current.particles())
        .zip(base.particles())
    {
        *out = advance_particle(*record, *anchor, time, dt, &params);
    }
    true
}
